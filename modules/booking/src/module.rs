use std::sync::Arc;

use arc_swap::ArcSwapOption;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::{openapi, routes};
use crate::config::BookingConfig;
use crate::domain::service::Service;
use crate::infra::security::Argon2Credentials;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::SeaOrmBookingRepository;

/// The booking module: owns the domain service once `init` has run.
#[derive(Default)]
pub struct Booking {
    // Keep the domain service behind ArcSwap for cheap read-mostly access.
    service: ArcSwapOption<Service>,
}

impl Clone for Booking {
    fn clone(&self) -> Self {
        Self {
            service: ArcSwapOption::new(self.service.load_full()),
        }
    }
}

impl Booking {
    /// Migrate the schema, wire the repository into the service and create the
    /// bootstrap admin when one is configured.
    pub async fn init(&self, cfg: BookingConfig, db: DatabaseConnection) -> anyhow::Result<()> {
        info!("Initializing booking module");
        debug!(
            "Loaded booking config: default_page_size={}, max_page_size={}, session_ttl={:?}",
            cfg.default_page_size, cfg.max_page_size, cfg.session_ttl
        );

        self.migrate(&db).await?;

        let repo = Arc::new(SeaOrmBookingRepository::new(db));
        let service = Service::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo,
            Arc::new(Argon2Credentials),
            cfg.service_config(),
        );

        if let Some(admin) = cfg.bootstrap_admin {
            let created = service
                .ensure_admin(admin.into())
                .await
                .map_err(|e| anyhow::anyhow!("bootstrap admin: {e}"))?;
            if created {
                info!("Bootstrap admin account created");
            }
        }

        self.service.store(Some(Arc::new(service)));
        Ok(())
    }

    pub async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running booking database migrations");
        Migrator::up(db, None).await?;
        info!("Booking database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> Option<Arc<Service>> {
        self.service.load_full()
    }

    pub fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering booking REST routes");

        let service = self
            .service()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))?;

        let router = routes::register_routes(router, service);
        info!("Booking REST routes registered successfully");
        Ok(router)
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        openapi::document()
    }
}
