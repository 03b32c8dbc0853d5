use http_problem::ProblemResponse;

use crate::domain::error::DomainError;
use crate::errors::ErrorCode;

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    let code = match e {
        DomainError::AccountNotFound { .. } => ErrorCode::booking_account_not_found_v1,
        DomainError::DoctorNotFound { .. } => ErrorCode::booking_doctor_not_found_v1,
        DomainError::DoctorProfileMissing { .. } => ErrorCode::booking_doctor_profile_missing_v1,
        DomainError::AppointmentNotFound { .. } => ErrorCode::booking_appointment_not_found_v1,
        DomainError::EmailAlreadyExists { .. } => ErrorCode::booking_account_email_conflict_v1,
        DomainError::Validation { .. } => ErrorCode::booking_validation_v1,
        DomainError::SlotUnavailable { .. } => ErrorCode::booking_appointment_slot_unavailable_v1,
        DomainError::SlotAlreadyBooked { .. } => ErrorCode::booking_appointment_slot_conflict_v1,
        DomainError::StaleAppointment { .. } => ErrorCode::booking_appointment_stale_v1,
        DomainError::InvalidCredentials => ErrorCode::booking_auth_invalid_credentials_v1,
        DomainError::Unauthenticated { .. } => ErrorCode::booking_auth_unauthenticated_v1,
        DomainError::Forbidden { .. } => ErrorCode::booking_auth_forbidden_v1,
        DomainError::InvalidTransition { .. } => {
            ErrorCode::booking_appointment_invalid_transition_v1
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            return ErrorCode::booking_internal_database_v1
                .to_response("An internal error occurred", instance);
        }
    };
    code.to_response(e.to_string(), instance)
}

/// A request the extractor could not decode (bad JSON, query or path).
pub fn invalid_request(detail: impl Into<String>, instance: &str) -> ProblemResponse {
    ErrorCode::booking_validation_v1.to_response(detail, instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::AppointmentStatus;
    use uuid::Uuid;

    #[test]
    fn status_codes_follow_the_error_kind() {
        let cases = [
            (DomainError::doctor_not_found(Uuid::nil()), 404),
            (DomainError::validation("limit", "must be at least 1"), 400),
            (DomainError::unauthenticated("no token"), 401),
            (DomainError::InvalidCredentials, 401),
            (DomainError::forbidden("nope"), 403),
            (
                DomainError::InvalidTransition {
                    from: AppointmentStatus::Cancelled,
                    to: AppointmentStatus::Completed,
                },
                409,
            ),
            (DomainError::StaleAppointment { id: Uuid::nil() }, 409),
            (DomainError::database("disk full"), 500),
        ];
        for (err, status) in cases {
            assert_eq!(map_domain_error(&err, "/x").0.status, status, "{err}");
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let resp = map_domain_error(&DomainError::database("secret table xyz"), "/doctors");
        assert!(!resp.0.detail.contains("xyz"));
        assert_eq!(resp.0.code, "booking.internal.database.v1");
    }

    #[test]
    fn invalid_transition_carries_its_code() {
        let resp = map_domain_error(
            &DomainError::InvalidTransition {
                from: AppointmentStatus::Cancelled,
                to: AppointmentStatus::Completed,
            },
            "/appointments/1",
        );
        assert_eq!(resp.0.code, "booking.appointment.invalid_transition.v1");
        assert_eq!(resp.0.instance, "/appointments/1");
        assert!(resp.0.message.contains("cancelled"));
    }
}
