use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the booking REST surface on `router`.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let api = Router::new()
        .route("/users/register", post(handlers::register))
        .route("/users/login", post(handlers::login))
        .route(
            "/users/profile",
            get(handlers::profile).put(handlers::update_profile),
        )
        .route(
            "/doctors",
            get(handlers::list_doctors).post(handlers::create_doctor),
        )
        // Static segment wins over `{id}` in axum's router.
        .route("/doctors/me", get(handlers::my_doctor_profile))
        .route(
            "/doctors/{id}",
            get(handlers::get_doctor).put(handlers::update_doctor),
        )
        .route(
            "/appointments",
            get(handlers::list_appointments).post(handlers::book_appointment),
        )
        .route(
            "/appointments/{id}",
            get(handlers::get_appointment).put(handlers::update_appointment_status),
        )
        .layer(Extension(service));

    router.merge(api)
}
