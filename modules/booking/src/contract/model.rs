use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use uuid::Uuid;

/// Closed set of account roles. Fixed at account creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Identity record. Credentials never leave the storage layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating an account; the role is chosen by the operation, not the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub account_id: Uuid,
    pub role: Role,
}

impl From<&Account> for Actor {
    fn from(a: &Account) -> Self {
        Self {
            account_id: a.id,
            role: a.role,
        }
    }
}

/// An issued bearer token together with the account it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub account: Account,
    pub expires_at: DateTime<Utc>,
}

/// One weekday of a doctor's template. `start`/`end` only matter when available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAvailability {
    pub day: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_available: bool,
}

/// Seven day entries ordered Monday → Sunday; see `domain::availability` for
/// the constructors that establish this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyAvailability {
    pub(crate) days: Vec<DayAvailability>,
}

impl WeeklyAvailability {
    pub fn days(&self) -> &[DayAvailability] {
        &self.days
    }

    pub fn day(&self, day: Weekday) -> &DayAvailability {
        &self.days[day.num_days_from_monday() as usize]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub specialization: String,
    pub experience_years: i32,
    pub consultation_fee: i64,
    pub address: String,
    pub availability: WeeklyAvailability,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub rating: f64,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A profile joined with the owning account's contact fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Doctor {
    pub profile: DoctorProfile,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Account and profile fields for creating a doctor. `None` picks the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoctor {
    pub account: NewAccount,
    pub specialization: String,
    pub experience_years: Option<i32>,
    pub consultation_fee: Option<i64>,
    pub address: Option<String>,
    pub availability: Option<Vec<DayAvailability>>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
}

/// One field of a partial update: absent, explicitly cleared, or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldUpdate::Keep)
    }
}

impl<T> From<Option<Option<T>>> for FieldUpdate<T> {
    fn from(v: Option<Option<T>>) -> Self {
        match v {
            None => FieldUpdate::Keep,
            Some(None) => FieldUpdate::Clear,
            Some(Some(v)) => FieldUpdate::Set(v),
        }
    }
}

/// Partial update of a doctor profile. `name` and `phone` live on the owning
/// account and are written together with the profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoctorPatch {
    pub name: FieldUpdate<String>,
    pub phone: FieldUpdate<String>,
    pub specialization: FieldUpdate<String>,
    pub experience_years: FieldUpdate<i32>,
    pub consultation_fee: FieldUpdate<i64>,
    pub address: FieldUpdate<String>,
    pub availability: FieldUpdate<Vec<DayAvailability>>,
    pub bio: FieldUpdate<String>,
    pub image_url: FieldUpdate<String>,
}

/// Self-service edit of the caller's own account. Email and role are fixed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountPatch {
    pub name: FieldUpdate<String>,
    pub phone: FieldUpdate<String>,
    /// New password; `None` keeps the current one.
    pub password: Option<String>,
}

/// Doctor directory filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoctorQuery {
    /// Exact match.
    pub specialization: Option<String>,
    /// Case-insensitive substring of the doctor's name.
    pub search: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// Doctor profile id.
    pub doctor_id: Uuid,
    /// Account that owns the doctor profile.
    pub doctor_account_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: NaiveTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A patient's booking request; `time_slot` is parsed by the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppointmentQuery {
    pub status: Option<AppointmentStatus>,
    pub limit: Option<u64>,
}
