use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use http_problem::ProblemResponse;

use crate::api::rest::error::map_domain_error;
use crate::contract::Actor;
use crate::domain::error::DomainError;
use crate::domain::service::Service;
use crate::errors::ErrorCode;

/// Identity from the `Authorization: Bearer <token>` header.
///
/// `None` when the header is absent, so the service's gate decides whether the
/// operation needs one. A header that is present but invalid is rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct BearerActor(pub Option<Actor>);

impl BearerActor {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

fn bearer_token(raw: &str) -> Option<&str> {
    let (scheme, token) = raw.trim().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
}

impl<S> FromRequestParts<S> for BearerActor
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };
        let instance = parts.uri.path().to_string();

        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or_else(|| {
                map_domain_error(
                    &DomainError::unauthenticated("expected 'Authorization: Bearer <token>'"),
                    &instance,
                )
            })?;

        let svc = parts
            .extensions
            .get::<Arc<Service>>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("booking service missing from request extensions");
                ErrorCode::booking_internal_database_v1
                    .to_response("An internal error occurred", &instance)
            })?;

        let actor = svc
            .authenticate(token)
            .await
            .map_err(|e| map_domain_error(&e, &instance))?;
        Ok(Self(Some(actor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
