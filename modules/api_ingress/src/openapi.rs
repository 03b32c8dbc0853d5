use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder};

pub const TITLE: &str = "MedBook API";

/// Fold the modules' documents into the one served at `/openapi.json`.
pub fn assemble(modules: impl IntoIterator<Item = OpenApi>) -> OpenApi {
    let mut doc = OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(TITLE)
                .version(env!("CARGO_PKG_VERSION"))
                .description(Some("Doctor directory and appointment booking"))
                .build(),
        )
        .build();
    for module in modules {
        doc.merge(module);
    }
    doc
}
