use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use http_problem::{Problem, ProblemResponse};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::rest::auth::BearerActor;
use crate::api::rest::dto::{
    parse_status, AccountDto, AppointmentDto, AuthResponse, BookAppointmentReq, CreateDoctorReq,
    DoctorDto, ListAppointmentsQuery, ListDoctorsQuery, LoginReq, RegisterReq, UpdateDoctorReq,
    UpdateProfileReq, UpdateStatusReq,
};
use crate::api::rest::error::{invalid_request, map_domain_error};
use crate::contract::{AppointmentQuery, DoctorPatch, NewDoctor};
use crate::domain::error::{DomainError, ErrorKind};
use crate::domain::service::Service;

type Svc = Extension<Arc<Service>>;

fn fail(e: DomainError, uri: &Uri) -> ProblemResponse {
    // Internal errors are logged by the mapper.
    if e.kind() != ErrorKind::Internal {
        warn!(kind = ?e.kind(), "Request rejected: {}", e);
    }
    map_domain_error(&e, uri.path())
}

fn body<T>(r: Result<Json<T>, JsonRejection>, uri: &Uri) -> Result<T, ProblemResponse> {
    r.map(|Json(v)| v)
        .map_err(|rej| invalid_request(rej.body_text(), uri.path()))
}

fn query<T>(r: Result<Query<T>, QueryRejection>, uri: &Uri) -> Result<T, ProblemResponse> {
    r.map(|Query(v)| v)
        .map_err(|rej| invalid_request(rej.body_text(), uri.path()))
}

fn path_id(r: Result<Path<Uuid>, PathRejection>, uri: &Uri) -> Result<Uuid, ProblemResponse> {
    r.map(|Path(v)| v)
        .map_err(|rej| invalid_request(rej.body_text(), uri.path()))
}

// --- accounts ---

#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Patient registered", body = AuthResponse),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 409, description = "Conflict", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "users"
)]
pub async fn register(
    uri: Uri,
    Extension(svc): Svc,
    req: Result<Json<RegisterReq>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ProblemResponse> {
    let req = body(req, &uri)?;
    info!("Registering patient {}", req.email);

    let session = svc
        .register_patient(req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Session issued", body = AuthResponse),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "users"
)]
pub async fn login(
    uri: Uri,
    Extension(svc): Svc,
    req: Result<Json<LoginReq>, JsonRejection>,
) -> Result<Json<AuthResponse>, ProblemResponse> {
    let req = body(req, &uri)?;

    let session = svc
        .login(&req.email, &req.password)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    get,
    path = "/users/profile",
    responses(
        (status = 200, description = "Own account", body = AccountDto),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn profile(
    uri: Uri,
    Extension(svc): Svc,
    actor: BearerActor,
) -> Result<Json<AccountDto>, ProblemResponse> {
    let account = svc
        .get_account(actor.actor())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    put,
    path = "/users/profile",
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Updated account", body = AccountDto),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn update_profile(
    uri: Uri,
    Extension(svc): Svc,
    actor: BearerActor,
    req: Result<Json<UpdateProfileReq>, JsonRejection>,
) -> Result<Json<AccountDto>, ProblemResponse> {
    let req = body(req, &uri)?;

    let account = svc
        .update_account(actor.actor(), req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(account.into()))
}

// --- doctors ---

#[utoipa::path(
    get,
    path = "/doctors",
    params(
        ("specialization" = Option<String>, Query, description = "Exact specialization"),
        ("search" = Option<String>, Query, description = "Case-insensitive name substring"),
        ("limit" = Option<u64>, Query, description = "Maximum number of doctors (default 20)")
    ),
    responses(
        (status = 200, description = "Doctors, oldest profile first", body = Vec<DoctorDto>),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "doctors"
)]
pub async fn list_doctors(
    uri: Uri,
    Extension(svc): Svc,
    q: Result<Query<ListDoctorsQuery>, QueryRejection>,
) -> Result<Json<Vec<DoctorDto>>, ProblemResponse> {
    let q = query(q, &uri)?;
    info!("Listing doctors with query: {:?}", q);

    let doctors = svc
        .list_doctors(q.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(doctors.into_iter().map(DoctorDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}",
    params(("id" = Uuid, Path, description = "Doctor profile id")),
    responses(
        (status = 200, description = "Doctor found", body = DoctorDto),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "doctors"
)]
pub async fn get_doctor(
    uri: Uri,
    Extension(svc): Svc,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DoctorDto>, ProblemResponse> {
    let id = path_id(id, &uri)?;

    let doctor = svc.get_doctor(id).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(doctor.into()))
}

#[utoipa::path(
    get,
    path = "/doctors/me",
    responses(
        (status = 200, description = "Calling doctor's profile", body = DoctorDto),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "doctors",
    security(("bearer" = []))
)]
pub async fn my_doctor_profile(
    uri: Uri,
    Extension(svc): Svc,
    actor: BearerActor,
) -> Result<Json<DoctorDto>, ProblemResponse> {
    let doctor = svc
        .my_doctor_profile(actor.actor())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(doctor.into()))
}

#[utoipa::path(
    post,
    path = "/doctors",
    request_body = CreateDoctorReq,
    responses(
        (status = 201, description = "Doctor account and profile created", body = DoctorDto),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 409, description = "Conflict", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "doctors",
    security(("bearer" = []))
)]
pub async fn create_doctor(
    uri: Uri,
    Extension(svc): Svc,
    actor: BearerActor,
    req: Result<Json<CreateDoctorReq>, JsonRejection>,
) -> Result<(StatusCode, Json<DoctorDto>), ProblemResponse> {
    let req = body(req, &uri)?;
    let new = NewDoctor::try_from(req).map_err(|msg| invalid_request(msg, uri.path()))?;

    let doctor = svc
        .create_doctor(actor.actor(), new)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(doctor.into())))
}

#[utoipa::path(
    put,
    path = "/doctors/{id}",
    params(("id" = Uuid, Path, description = "Doctor profile id")),
    request_body = UpdateDoctorReq,
    responses(
        (status = 200, description = "Updated doctor", body = DoctorDto),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "doctors",
    security(("bearer" = []))
)]
pub async fn update_doctor(
    uri: Uri,
    Extension(svc): Svc,
    actor: BearerActor,
    id: Result<Path<Uuid>, PathRejection>,
    req: Result<Json<UpdateDoctorReq>, JsonRejection>,
) -> Result<Json<DoctorDto>, ProblemResponse> {
    let id = path_id(id, &uri)?;
    let req = body(req, &uri)?;
    let patch = DoctorPatch::try_from(req).map_err(|msg| invalid_request(msg, uri.path()))?;

    let doctor = svc
        .update_doctor(actor.actor(), id, patch)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(doctor.into()))
}

// --- appointments ---

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = BookAppointmentReq,
    responses(
        (status = 201, description = "Appointment booked as pending", body = AppointmentDto),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Conflict", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "appointments",
    security(("bearer" = []))
)]
pub async fn book_appointment(
    uri: Uri,
    Extension(svc): Svc,
    actor: BearerActor,
    req: Result<Json<BookAppointmentReq>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentDto>), ProblemResponse> {
    let req = body(req, &uri)?;

    let appt = svc
        .book_appointment(actor.actor(), req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(appt.into())))
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(
        ("status" = Option<String>, Query, description = "pending, confirmed, completed or cancelled"),
        ("limit" = Option<u64>, Query, description = "Maximum number of appointments (default 20)")
    ),
    responses(
        (status = 200, description = "Appointments visible to the caller", body = Vec<AppointmentDto>),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "appointments",
    security(("bearer" = []))
)]
pub async fn list_appointments(
    uri: Uri,
    Extension(svc): Svc,
    actor: BearerActor,
    q: Result<Query<ListAppointmentsQuery>, QueryRejection>,
) -> Result<Json<Vec<AppointmentDto>>, ProblemResponse> {
    let q = query(q, &uri)?;
    let q = AppointmentQuery::try_from(q).map_err(|msg| invalid_request(msg, uri.path()))?;

    let items = svc
        .list_appointments(actor.actor(), q)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(items.into_iter().map(AppointmentDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment found", body = AppointmentDto),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "appointments",
    security(("bearer" = []))
)]
pub async fn get_appointment(
    uri: Uri,
    Extension(svc): Svc,
    actor: BearerActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AppointmentDto>, ProblemResponse> {
    let id = path_id(id, &uri)?;

    let appt = svc
        .get_appointment(actor.actor(), id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(appt.into()))
}

#[utoipa::path(
    put,
    path = "/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Appointment moved to the requested status", body = AppointmentDto),
        (status = 400, description = "Invalid input", body = Problem),
        (status = 401, description = "Unauthenticated", body = Problem),
        (status = 403, description = "Forbidden", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Conflict", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "appointments",
    security(("bearer" = []))
)]
pub async fn update_appointment_status(
    uri: Uri,
    Extension(svc): Svc,
    actor: BearerActor,
    id: Result<Path<Uuid>, PathRejection>,
    req: Result<Json<UpdateStatusReq>, JsonRejection>,
) -> Result<Json<AppointmentDto>, ProblemResponse> {
    let id = path_id(id, &uri)?;
    let req = body(req, &uri)?;
    let to = parse_status(&req.status).map_err(|msg| invalid_request(msg, uri.path()))?;
    info!("Changing appointment {} status to {}", id, to);

    let appt = svc
        .change_status(actor.actor(), id, to)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(appt.into()))
}
