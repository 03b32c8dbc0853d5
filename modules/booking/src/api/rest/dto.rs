use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{
    Account, AccountPatch, Appointment, AppointmentQuery, AppointmentStatus, BookingRequest,
    DayAvailability, Doctor, DoctorPatch, DoctorQuery, NewAccount, NewDoctor, Session,
};
use crate::domain::availability::{format_slot, parse_slot, parse_weekday, weekday_name};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Query-string number where `limit=` means "not given".
fn blank_as_none<'de, D>(de: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(de)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("limit must be a number, got '{raw}'"))),
        _ => Ok(None),
    }
}

// --- accounts ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// `patient`, `doctor` or `admin`.
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AccountDto,
}

impl From<Account> for AccountDto {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            role: a.role.as_str().to_string(),
            phone: a.phone,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Self-service profile edit. Email and role are fixed.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileReq {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    /// New password; omit to keep the current one.
    #[serde(default)]
    pub password: Option<String>,
}

impl From<UpdateProfileReq> for AccountPatch {
    fn from(r: UpdateProfileReq) -> Self {
        Self {
            name: r.name.into(),
            phone: r.phone.into(),
            password: r.password,
        }
    }
}

impl From<Session> for AuthResponse {
    fn from(s: Session) -> Self {
        Self {
            token: s.token,
            expires_at: s.expires_at,
            user: s.account.into(),
        }
    }
}

impl From<RegisterReq> for NewAccount {
    fn from(r: RegisterReq) -> Self {
        Self {
            name: r.name,
            email: r.email,
            password: r.password,
            phone: r.phone,
        }
    }
}

// --- doctors ---

/// One weekday entry; times are rendered like "9:00 AM" and accepted as
/// "9:00 AM", "9:00am" or "09:00".
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailabilityDto {
    #[schema(example = "monday")]
    pub day: String,
    #[schema(example = "9:00 AM")]
    pub start: String,
    #[schema(example = "6:00 PM")]
    pub end: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

impl From<&DayAvailability> for DayAvailabilityDto {
    fn from(d: &DayAvailability) -> Self {
        Self {
            day: weekday_name(d.day).to_string(),
            start: format_slot(d.start),
            end: format_slot(d.end),
            is_available: d.is_available,
        }
    }
}

impl TryFrom<DayAvailabilityDto> for DayAvailability {
    type Error = String;

    fn try_from(d: DayAvailabilityDto) -> Result<Self, Self::Error> {
        let day = parse_weekday(&d.day).ok_or_else(|| format!("unknown day '{}'", d.day))?;
        let start = parse_slot(&d.start).ok_or_else(|| format!("bad start time '{}'", d.start))?;
        let end = parse_slot(&d.end).ok_or_else(|| format!("bad end time '{}'", d.end))?;
        Ok(Self {
            day,
            start,
            end,
            is_available: d.is_available,
        })
    }
}

fn days_from_dto(days: Vec<DayAvailabilityDto>) -> Result<Vec<DayAvailability>, String> {
    days.into_iter().map(DayAvailability::try_from).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDto {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub specialization: String,
    pub experience_years: i32,
    pub consultation_fee: i64,
    pub address: String,
    pub availability: Vec<DayAvailabilityDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub rating: f64,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Doctor> for DoctorDto {
    fn from(d: Doctor) -> Self {
        let p = d.profile;
        Self {
            id: p.id,
            account_id: p.account_id,
            name: d.name,
            email: d.email,
            phone: d.phone,
            specialization: p.specialization,
            experience_years: p.experience_years,
            consultation_fee: p.consultation_fee,
            address: p.address,
            availability: p.availability.days().iter().map(Into::into).collect(),
            bio: p.bio,
            image_url: p.image_url,
            rating: p.rating,
            review_count: p.review_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListDoctorsQuery {
    pub specialization: Option<String>,
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<u64>,
}

impl From<ListDoctorsQuery> for DoctorQuery {
    fn from(q: ListDoctorsQuery) -> Self {
        Self {
            specialization: q.specialization,
            search: q.search,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorReq {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub consultation_fee: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub availability: Option<Vec<DayAvailabilityDto>>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl TryFrom<CreateDoctorReq> for NewDoctor {
    type Error = String;

    fn try_from(r: CreateDoctorReq) -> Result<Self, Self::Error> {
        Ok(Self {
            account: NewAccount {
                name: r.name,
                email: r.email,
                password: r.password,
                phone: r.phone,
            },
            specialization: r.specialization.unwrap_or_default(),
            experience_years: r.experience_years,
            consultation_fee: r.consultation_fee,
            address: r.address,
            availability: r.availability.map(days_from_dto).transpose()?,
            bio: r.bio,
            image_url: r.image_url,
        })
    }
}

/// Partial update: omit a field to keep it, send `null` to clear it (optional
/// fields only), send a value to replace it.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorReq {
    /// Display name of the owning account; cannot be cleared.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    /// Phone of the owning account.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub specialization: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub experience_years: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub consultation_fee: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Vec<DayAvailabilityDto>>)]
    pub availability: Option<Option<Vec<DayAvailabilityDto>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
}

impl TryFrom<UpdateDoctorReq> for DoctorPatch {
    type Error = String;

    fn try_from(r: UpdateDoctorReq) -> Result<Self, Self::Error> {
        let availability = match r.availability {
            Some(Some(days)) => Some(Some(days_from_dto(days)?)),
            Some(None) => Some(None),
            None => None,
        };
        Ok(Self {
            name: r.name.into(),
            phone: r.phone.into(),
            specialization: r.specialization.into(),
            experience_years: r.experience_years.into(),
            consultation_fee: r.consultation_fee.into(),
            address: r.address.into(),
            availability: availability.into(),
            bio: r.bio.into(),
            image_url: r.image_url.into(),
        })
    }
}

// --- appointments ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDto {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_account_id: Uuid,
    pub date: NaiveDate,
    #[schema(example = "10:00 AM")]
    pub time_slot: String,
    pub reason: String,
    /// `pending`, `confirmed`, `completed` or `cancelled`.
    pub status: String,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentDto {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            patient_id: a.patient_id,
            doctor_id: a.doctor_id,
            doctor_account_id: a.doctor_account_id,
            date: a.date,
            time_slot: format_slot(a.time_slot),
            reason: a.reason,
            status: a.status.as_str().to_string(),
            is_paid: a.is_paid,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentReq {
    pub doctor_id: Uuid,
    #[schema(example = "2024-03-15")]
    pub date: NaiveDate,
    #[schema(example = "10:00 AM")]
    pub time_slot: String,
    pub reason: String,
}

impl From<BookAppointmentReq> for BookingRequest {
    fn from(r: BookAppointmentReq) -> Self {
        Self {
            doctor_id: r.doctor_id,
            date: r.date,
            time_slot: r.time_slot,
            reason: r.reason,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    #[schema(example = "confirmed")]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListAppointmentsQuery {
    pub status: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<u64>,
}

impl TryFrom<ListAppointmentsQuery> for AppointmentQuery {
    type Error = String;

    fn try_from(q: ListAppointmentsQuery) -> Result<Self, Self::Error> {
        let status = q
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_status(&s))
            .transpose()?;
        Ok(Self {
            status,
            limit: q.limit,
        })
    }
}

pub fn parse_status(raw: &str) -> Result<AppointmentStatus, String> {
    AppointmentStatus::parse(raw.trim()).ok_or_else(|| {
        format!(
            "unknown status '{}'; expected one of pending, confirmed, completed, cancelled",
            raw
        )
    })
}
