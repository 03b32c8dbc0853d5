//! Error catalog for the booking module.
//!
//! Each code is stable on the wire; bump the `vN` suffix instead of changing
//! the meaning of an existing one.

use http_problem::{ErrDef, Problem, ProblemResponse};

macro_rules! catalog {
    ($($variant:ident => ($status:literal, $title:literal, $code:literal)),+ $(,)?) => {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $($variant),+
        }

        impl ErrorCode {
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$variant),+];

            pub const fn def(self) -> ErrDef {
                match self {
                    $(ErrorCode::$variant => ErrDef {
                        status: $status,
                        title: $title,
                        code: $code,
                        type_url: concat!("https://errors.medbook.dev/", $code),
                    }),+
                }
            }
        }
    };
}

catalog! {
    booking_account_not_found_v1 => (404, "Account Not Found", "booking.account.not_found.v1"),
    booking_account_email_conflict_v1 => (409, "Email Already Exists", "booking.account.email_conflict.v1"),
    booking_doctor_not_found_v1 => (404, "Doctor Not Found", "booking.doctor.not_found.v1"),
    booking_doctor_profile_missing_v1 => (404, "Doctor Profile Not Found", "booking.doctor.profile_missing.v1"),
    booking_appointment_not_found_v1 => (404, "Appointment Not Found", "booking.appointment.not_found.v1"),
    booking_appointment_slot_unavailable_v1 => (400, "Slot Unavailable", "booking.appointment.slot_unavailable.v1"),
    booking_appointment_slot_conflict_v1 => (409, "Slot Already Booked", "booking.appointment.slot_conflict.v1"),
    booking_appointment_stale_v1 => (409, "Appointment Changed", "booking.appointment.stale.v1"),
    booking_appointment_invalid_transition_v1 => (409, "Invalid Status Transition", "booking.appointment.invalid_transition.v1"),
    booking_validation_v1 => (400, "Invalid Input", "booking.validation.v1"),
    booking_auth_unauthenticated_v1 => (401, "Unauthenticated", "booking.auth.unauthenticated.v1"),
    booking_auth_invalid_credentials_v1 => (401, "Invalid Credentials", "booking.auth.invalid_credentials.v1"),
    booking_auth_forbidden_v1 => (403, "Forbidden", "booking.auth.forbidden.v1"),
    booking_internal_database_v1 => (500, "Internal Error", "booking.internal.database.v1"),
}

impl ErrorCode {
    pub fn status(self) -> u16 {
        self.def().status
    }

    pub fn to_problem(self, detail: impl Into<String>) -> Problem {
        self.def().to_problem(detail)
    }

    pub fn to_response(self, detail: impl Into<String>, instance: &str) -> ProblemResponse {
        self.def().respond(detail, instance)
    }
}
