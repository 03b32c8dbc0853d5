//! Static error definitions for catalog-driven problem building.
use axum::http::StatusCode;

use crate::problem::{Problem, ProblemResponse};

/// Static error definition from a module's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    /// Convert this error definition into a Problem with the given detail.
    #[inline]
    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            self.title,
            detail,
        )
        .with_code(self.code)
        .with_type(self.type_url)
    }

    /// Build the full response for one request, tagging it with the request path
    /// and the id of the current tracing span when there is one.
    pub fn respond(&self, detail: impl Into<String>, instance: &str) -> ProblemResponse {
        let problem = self.to_problem(detail).with_instance(instance);
        let problem = match tracing::Span::current().id() {
            Some(id) => problem.with_request_id(id.into_u64().to_string()),
            None => problem,
        };
        ProblemResponse(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOT_FOUND: ErrDef = ErrDef {
        status: 404,
        title: "Not Found",
        code: "test.not_found.v1",
        type_url: "https://errors.medbook.dev/test.not_found.v1",
    };

    #[test]
    fn err_def_to_problem_works() {
        let problem = NOT_FOUND.to_problem("Resource missing");
        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "Not Found");
        assert_eq!(problem.detail, "Resource missing");
        assert_eq!(problem.code, "test.not_found.v1");
        assert_eq!(
            problem.type_url,
            "https://errors.medbook.dev/test.not_found.v1"
        );
    }

    #[test]
    fn respond_sets_instance() {
        let resp = NOT_FOUND.respond("gone", "/doctors/1");
        assert_eq!(resp.0.instance, "/doctors/1");
        assert_eq!(resp.0.message, "gone");
    }
}
