//! Row ↔ contract conversions.

use anyhow::{anyhow, Context};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::contract::{
    Account, Appointment, AppointmentStatus, DayAvailability, Doctor, DoctorProfile, Role,
    WeeklyAvailability,
};
use crate::domain::availability::{parse_weekday, weekday_name};
use crate::infra::storage::entity::{accounts, appointments, doctor_profiles};

const STORED_TIME: &str = "%H:%M";

/// JSON shape of one availability entry in `doctor_profiles.availability`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDay {
    day: String,
    start: String,
    end: String,
    is_available: bool,
}

pub fn availability_to_json(w: &WeeklyAvailability) -> serde_json::Value {
    let days: Vec<StoredDay> = w
        .days()
        .iter()
        .map(|d| StoredDay {
            day: weekday_name(d.day).to_string(),
            start: d.start.format(STORED_TIME).to_string(),
            end: d.end.format(STORED_TIME).to_string(),
            is_available: d.is_available,
        })
        .collect();
    serde_json::to_value(days).unwrap_or(serde_json::Value::Array(Vec::new()))
}

pub fn availability_from_json(v: serde_json::Value) -> anyhow::Result<WeeklyAvailability> {
    let stored: Vec<StoredDay> =
        serde_json::from_value(v).context("availability column is not a day list")?;
    let days = stored
        .into_iter()
        .map(|d| {
            Ok(DayAvailability {
                day: parse_weekday(&d.day).ok_or_else(|| anyhow!("unknown day '{}'", d.day))?,
                start: NaiveTime::parse_from_str(&d.start, STORED_TIME)
                    .with_context(|| format!("bad start time '{}'", d.start))?,
                end: NaiveTime::parse_from_str(&d.end, STORED_TIME)
                    .with_context(|| format!("bad end time '{}'", d.end))?,
                is_available: d.is_available,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    WeeklyAvailability::from_entries(days).map_err(|e| anyhow!("stored availability: {e}"))
}

pub fn account_from_row(m: accounts::Model) -> anyhow::Result<Account> {
    let role = Role::parse(&m.role).ok_or_else(|| anyhow!("unknown role '{}'", m.role))?;
    Ok(Account {
        id: m.id,
        name: m.name,
        email: m.email,
        role,
        phone: m.phone,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub fn profile_from_row(m: doctor_profiles::Model) -> anyhow::Result<DoctorProfile> {
    Ok(DoctorProfile {
        id: m.id,
        account_id: m.account_id,
        specialization: m.specialization,
        experience_years: m.experience_years,
        consultation_fee: m.consultation_fee,
        address: m.address,
        availability: availability_from_json(m.availability)
            .with_context(|| format!("doctor profile {}", m.id))?,
        bio: m.bio,
        image_url: m.image_url,
        rating: m.rating,
        review_count: m.review_count,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

/// Join result of `doctor_profiles` with its owning account.
pub fn doctor_from_rows(
    profile: doctor_profiles::Model,
    account: Option<accounts::Model>,
) -> anyhow::Result<Doctor> {
    let account =
        account.ok_or_else(|| anyhow!("doctor profile {} has no owning account", profile.id))?;
    Ok(Doctor {
        profile: profile_from_row(profile)?,
        name: account.name,
        email: account.email,
        phone: account.phone,
    })
}

pub fn appointment_from_row(m: appointments::Model) -> anyhow::Result<Appointment> {
    let status = AppointmentStatus::parse(&m.status)
        .ok_or_else(|| anyhow!("appointment {} has unknown status '{}'", m.id, m.status))?;
    Ok(Appointment {
        id: m.id,
        patient_id: m.patient_id,
        doctor_id: m.doctor_id,
        doctor_account_id: m.doctor_account_id,
        date: m.date,
        time_slot: m.time_slot,
        reason: m.reason,
        status,
        is_paid: m.is_paid,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

/// Key claimed by an active appointment under the unique slot index.
pub fn slot_key(a: &Appointment) -> Option<String> {
    (a.status != AppointmentStatus::Cancelled).then(|| {
        format!(
            "{}/{}/{}",
            a.doctor_id,
            a.date.format("%Y-%m-%d"),
            a.time_slot.format("%H:%M")
        )
    })
}
