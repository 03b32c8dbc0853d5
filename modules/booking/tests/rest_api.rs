//! HTTP surface tests: drive the booking router in-process with `oneshot`.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use booking::api::rest::routes::register_routes;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{ADMIN_EMAIL, ADMIN_PASSWORD};

async fn app() -> Router {
    register_routes(Router::new(), common::service().await)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn token_for(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({ "name": "Pat", "email": email, "password": "password1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

fn assert_problem(body: &Value, status: StatusCode, code: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], status.as_u16());
    assert_eq!(body["code"], code);
    assert_eq!(body["message"], body["detail"]);
}

#[tokio::test]
async fn register_and_fetch_profile() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "password1",
            "phone": "+1 555 0100"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "patient");
    assert_eq!(body["user"]["phone"], "+1 555 0100");
    assert!(body["user"].get("password").is_none());
    assert!(body["expiresAt"].is_string());
    let token = body["token"].as_str().unwrap();

    let (status, me) = call(&app, Method::GET, "/users/profile", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "alice@example.com");
    assert!(me["createdAt"].is_string());

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({ "name": "Alice", "email": "ALICE@example.com", "password": "password1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_problem(&body, StatusCode::CONFLICT, "booking.account.email_conflict.v1");
}

#[tokio::test]
async fn authentication_errors_are_problem_documents() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/users/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_problem(&body, StatusCode::UNAUTHORIZED, "booking.auth.unauthenticated.v1");

    let (status, body) = call(&app, Method::GET, "/users/profile", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["instance"], "/users/profile");

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": ADMIN_EMAIL, "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_problem(&body, StatusCode::UNAUTHORIZED, "booking.auth.invalid_credentials.v1");
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = app().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/users/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );

    let (status, body) = call(&app, Method::GET, "/doctors/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_problem(&body, StatusCode::BAD_REQUEST, "booking.validation.v1");

    let (status, _) = call(&app, Method::GET, "/doctors?limit=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::GET, "/doctors?limit=ten", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_problem(&body, StatusCode::BAD_REQUEST, "booking.validation.v1");
}

#[tokio::test]
async fn empty_query_parameters_mean_unfiltered() {
    let app = app().await;
    let token = register(&app, "forms@example.com").await;

    let (status, list) = call(
        &app,
        Method::GET,
        "/doctors?specialization=&search=&limit=",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{list}");
    assert!(list.is_array());

    let (status, list) = call(
        &app,
        Method::GET,
        "/appointments?status=&limit=",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{list}");
    assert!(list.is_array());
}

#[tokio::test]
async fn profile_can_be_edited_over_http() {
    let app = app().await;
    let token = register(&app, "editor@example.com").await;

    let (status, me) = call(
        &app,
        Method::PUT,
        "/users/profile",
        Some(&token),
        Some(json!({ "name": "Eddie Editor", "phone": "555-0123", "password": "fresh-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{me}");
    assert_eq!(me["name"], "Eddie Editor");
    assert_eq!(me["phone"], "555-0123");
    assert_eq!(me["email"], "editor@example.com");
    assert!(me.get("password").is_none());

    let (status, me) = call(&app, Method::GET, "/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Eddie Editor");
    token_for(&app, "editor@example.com", "fresh-pass").await;

    let (status, me) = call(
        &app,
        Method::PUT,
        "/users/profile",
        Some(&token),
        Some(json!({ "phone": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(me.get("phone").is_none());
    assert_eq!(me["name"], "Eddie Editor");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/users/profile",
        Some(&token),
        Some(json!({ "name": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_problem(&body, StatusCode::BAD_REQUEST, "booking.validation.v1");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/users/profile",
        None,
        Some(json!({ "name": "Nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_problem(&body, StatusCode::UNAUTHORIZED, "booking.auth.unauthenticated.v1");
}

#[tokio::test]
async fn doctor_directory_over_http() {
    let app = app().await;
    let admin = token_for(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let patient = register(&app, "browser@example.com").await;

    let new_doctor = json!({
        "name": "Dr. Who",
        "email": "who@clinic.test",
        "password": "password1",
        "specialization": "Cardiology",
        "consultationFee": 750,
        "availability": [
            { "day": "monday", "start": "09:00", "end": "12:00" },
            { "day": "friday", "start": "13:00", "end": "17:00", "isAvailable": true }
        ]
    });

    let (status, body) = call(
        &app,
        Method::POST,
        "/doctors",
        Some(&patient),
        Some(new_doctor.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_problem(&body, StatusCode::FORBIDDEN, "booking.auth.forbidden.v1");

    let (status, created) =
        call(&app, Method::POST, "/doctors", Some(&admin), Some(new_doctor)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["consultationFee"], 750);
    assert_eq!(created["availability"].as_array().unwrap().len(), 7);
    let id = created["id"].as_str().unwrap().to_string();

    // Public directory, bare array.
    let (status, list) = call(&app, Method::GET, "/doctors?search=WHO", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, one) = call(&app, Method::GET, &format!("/doctors/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["name"], "Dr. Who");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/doctors/{}", uuid::Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_problem(&body, StatusCode::NOT_FOUND, "booking.doctor.not_found.v1");

    let doctor = token_for(&app, "who@clinic.test", "password1").await;
    let (status, mine) = call(&app, Method::GET, "/doctors/me", Some(&doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["id"], id.as_str());

    let (status, patched) = call(
        &app,
        Method::PUT,
        &format!("/doctors/{id}"),
        Some(&doctor),
        Some(json!({ "bio": "Time traveller", "experienceYears": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{patched}");
    assert_eq!(patched["bio"], "Time traveller");
    assert_eq!(patched["experienceYears"], 0);
    assert_eq!(patched["consultationFee"], 750);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/doctors/{id}"),
        Some(&doctor),
        Some(json!({ "consultationFee": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_problem(&body, StatusCode::BAD_REQUEST, "booking.validation.v1");

    let (status, cleared) = call(
        &app,
        Method::PUT,
        &format!("/doctors/{id}"),
        Some(&doctor),
        Some(json!({ "bio": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared.get("bio").is_none());

    let (status, renamed) = call(
        &app,
        Method::PUT,
        &format!("/doctors/{id}"),
        Some(&doctor),
        Some(json!({ "name": "Dr. Who Else", "phone": "555-0777" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{renamed}");
    assert_eq!(renamed["name"], "Dr. Who Else");
    assert_eq!(renamed["phone"], "555-0777");

    let (status, list) = call(&app, Method::GET, "/doctors?search=else", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["name"], "Dr. Who Else");
    assert_eq!(list[0]["phone"], "555-0777");

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/doctors/{id}"),
        Some(&doctor),
        Some(json!({ "name": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_problem(&body, StatusCode::BAD_REQUEST, "booking.validation.v1");
}

#[tokio::test]
async fn appointment_flow_over_http() {
    let app = app().await;
    let admin = token_for(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (_, created) = call(
        &app,
        Method::POST,
        "/doctors",
        Some(&admin),
        Some(json!({
            "name": "Dr. Flow",
            "email": "flow@clinic.test",
            "password": "password1",
            "specialization": "ENT"
        })),
    )
    .await;
    let doctor_id = created["id"].as_str().unwrap().to_string();
    let doctor = token_for(&app, "flow@clinic.test", "password1").await;
    let patient = register(&app, "flow@example.com").await;

    let booking = json!({
        "doctorId": doctor_id,
        "date": "2024-03-15",
        "timeSlot": "10:00 AM",
        "reason": "Sore throat"
    });
    let (status, appt) = call(
        &app,
        Method::POST,
        "/appointments",
        Some(&patient),
        Some(booking.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{appt}");
    assert_eq!(appt["status"], "pending");
    assert_eq!(appt["timeSlot"], "10:00 AM");
    assert_eq!(appt["isPaid"], false);
    let appt_id = appt["id"].as_str().unwrap().to_string();

    let (status, body) =
        call(&app, Method::POST, "/appointments", Some(&patient), Some(booking)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_problem(&body, StatusCode::CONFLICT, "booking.appointment.slot_conflict.v1");

    let uri = format!("/appointments/{appt_id}");
    let (status, body) = call(
        &app,
        Method::PUT,
        &uri,
        Some(&doctor),
        Some(json!({ "status": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_problem(&body, StatusCode::BAD_REQUEST, "booking.validation.v1");

    let (status, body) = call(
        &app,
        Method::PUT,
        &uri,
        Some(&patient),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_problem(&body, StatusCode::FORBIDDEN, "booking.auth.forbidden.v1");

    let (status, body) = call(
        &app,
        Method::PUT,
        &uri,
        Some(&patient),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, body) = call(
        &app,
        Method::PUT,
        &uri,
        Some(&doctor),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_problem(
        &body,
        StatusCode::CONFLICT,
        "booking.appointment.invalid_transition.v1",
    );

    let (status, list) = call(
        &app,
        Method::GET,
        "/appointments?status=cancelled",
        Some(&doctor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::GET, "/appointments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app,
        Method::GET,
        "/appointments?status=someday",
        Some(&patient),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
