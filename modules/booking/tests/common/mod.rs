#![allow(dead_code)]

use std::sync::Arc;

use booking::config::BootstrapAdmin;
use booking::contract::{Actor, BookingRequest, Doctor, NewAccount, NewDoctor};
use booking::domain::service::Service;
use booking::{Booking, BookingConfig};
use chrono::NaiveDate;
use sea_orm::{ConnectOptions, Database};

pub const ADMIN_EMAIL: &str = "admin@medbook.test";
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// In-memory SQLite with a single connection so every query sees the same database.
pub async fn connect() -> sea_orm::DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    Database::connect(opts).await.expect("connect sqlite")
}

pub async fn service_with(cfg: BookingConfig) -> Arc<Service> {
    let module = Booking::default();
    module.init(cfg, connect().await).await.expect("init booking");
    module.service().expect("service initialized")
}

pub async fn service() -> Arc<Service> {
    service_with(BookingConfig {
        bootstrap_admin: Some(BootstrapAdmin {
            name: "Root Admin".into(),
            email: ADMIN_EMAIL.into(),
            password: ADMIN_PASSWORD.into(),
        }),
        ..BookingConfig::default()
    })
    .await
}

pub fn new_account(name: &str, email: &str) -> NewAccount {
    NewAccount {
        name: name.into(),
        email: email.into(),
        password: "password1".into(),
        phone: None,
    }
}

pub async fn admin(svc: &Service) -> Actor {
    let session = svc.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.expect("admin login");
    Actor::from(&session.account)
}

pub async fn patient(svc: &Service, email: &str) -> Actor {
    let session = svc
        .register_patient(new_account("Pat Patient", email))
        .await
        .expect("register patient");
    Actor::from(&session.account)
}

pub fn new_doctor(name: &str, email: &str, specialization: &str) -> NewDoctor {
    NewDoctor {
        account: new_account(name, email),
        specialization: specialization.into(),
        experience_years: Some(5),
        consultation_fee: None,
        address: None,
        availability: None,
        bio: None,
        image_url: None,
    }
}

/// Creates a doctor through the admin and returns it with the doctor's own actor.
pub async fn doctor(svc: &Service, name: &str, email: &str, specialization: &str) -> (Doctor, Actor) {
    let admin = admin(svc).await;
    let doctor = svc
        .create_doctor(Some(&admin), new_doctor(name, email, specialization))
        .await
        .expect("create doctor");
    let session = svc.login(email, "password1").await.expect("doctor login");
    (doctor, Actor::from(&session.account))
}

/// Friday 2024-03-15.
pub fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
}

pub fn booking(doctor: &Doctor, date: NaiveDate, slot: &str) -> BookingRequest {
    BookingRequest {
        doctor_id: doctor.profile.id,
        date,
        time_slot: slot.into(),
        reason: "Checkup".into(),
    }
}
