use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::rest::{dto, handlers};

#[derive(OpenApi)]
#[openapi(
    info(title = "MedBook booking API", description = "Doctors, appointments and accounts"),
    paths(
        handlers::register,
        handlers::login,
        handlers::profile,
        handlers::update_profile,
        handlers::list_doctors,
        handlers::get_doctor,
        handlers::my_doctor_profile,
        handlers::create_doctor,
        handlers::update_doctor,
        handlers::book_appointment,
        handlers::list_appointments,
        handlers::get_appointment,
        handlers::update_appointment_status,
    ),
    components(schemas(
        http_problem::Problem,
        dto::AccountDto,
        dto::AuthResponse,
        dto::RegisterReq,
        dto::LoginReq,
        dto::UpdateProfileReq,
        dto::DayAvailabilityDto,
        dto::DoctorDto,
        dto::CreateDoctorReq,
        dto::UpdateDoctorReq,
        dto::AppointmentDto,
        dto::BookAppointmentReq,
        dto::UpdateStatusReq,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "users", description = "Registration, login and own account"),
        (name = "doctors", description = "Doctor directory"),
        (name = "appointments", description = "Appointment ledger"),
    )
)]
pub struct BookingApi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// The module's OpenAPI document.
pub fn document() -> utoipa::openapi::OpenApi {
    BookingApi::openapi()
}
