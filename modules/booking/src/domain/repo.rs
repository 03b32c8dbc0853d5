use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::contract::{Account, Appointment, AppointmentStatus, Doctor, DoctorProfile};

/// Self-describing password hash (PHC string: algorithm, parameters, salt, hash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest(pub String);

/// Case-folded form of a name used for directory search. Stored next to the
/// name so matching does not depend on the database's `LOWER`.
pub fn name_search_key(name: &str) -> String {
    name.to_lowercase()
}

/// Normalized doctor listing filter; the service resolves defaults and clamps `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorFilter {
    pub specialization: Option<String>,
    /// Already folded with [`name_search_key`].
    pub search: Option<String>,
    pub limit: u64,
}

/// New values for the mutable account columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountChanges {
    pub name: String,
    pub phone: Option<String>,
    /// Replaces the stored hash when set.
    pub password: Option<PasswordDigest>,
    pub updated_at: DateTime<Utc>,
}

/// Which appointments a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentScope {
    All,
    Patient(Uuid),
    DoctorAccount(Uuid),
}

/// Persistence port for accounts.
#[async_trait]
pub trait AccountsRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>>;
    /// Lookup for login; `email` is already normalized.
    async fn find_credentials(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<(Account, PasswordDigest)>>;
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool>;
    /// Returns `false` when the email is already taken.
    async fn insert(&self, account: Account, digest: PasswordDigest) -> anyhow::Result<bool>;
    /// Returns `false` if the account is gone.
    async fn update(&self, id: Uuid, changes: AccountChanges) -> anyhow::Result<bool>;
}

/// Persistence port for doctor profiles (always read joined with the owning account).
#[async_trait]
pub trait DoctorsRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Doctor>>;
    async fn find_by_account(&self, account_id: Uuid) -> anyhow::Result<Option<Doctor>>;
    /// Oldest profile first.
    async fn list(&self, filter: &DoctorFilter) -> anyhow::Result<Vec<Doctor>>;
    /// Insert the account and its profile atomically.
    /// Returns `false` (and writes nothing) when the email is already taken.
    async fn insert_with_account(
        &self,
        account: Account,
        digest: PasswordDigest,
        profile: DoctorProfile,
    ) -> anyhow::Result<bool>;
    /// Overwrite the mutable profile columns and, when given, the owning
    /// account's columns in the same transaction. Returns `false` if the
    /// profile is gone.
    async fn update(
        &self,
        profile: DoctorProfile,
        owner: Option<AccountChanges>,
    ) -> anyhow::Result<bool>;
}

/// Persistence port for the appointment ledger.
#[async_trait]
pub trait AppointmentsRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Appointment>>;
    /// Whether an active (not cancelled) appointment holds this slot.
    async fn slot_taken(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        slot: NaiveTime,
    ) -> anyhow::Result<bool>;
    /// Returns `false` when another active appointment already claimed the slot.
    async fn insert(&self, appt: Appointment) -> anyhow::Result<bool>;
    /// Most recent first.
    async fn list(
        &self,
        scope: AppointmentScope,
        status: Option<AppointmentStatus>,
        limit: u64,
    ) -> anyhow::Result<Vec<Appointment>>;
    /// Compare-and-set on the status column. Returns `false` if the stored
    /// status no longer equals `from`.
    async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
}

/// Persistence port for issued bearer sessions, keyed by token digest.
#[async_trait]
pub trait SessionsRepository: Send + Sync {
    async fn insert(
        &self,
        token_digest: String,
        account_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    /// The account behind a session that is still valid at `now`.
    async fn find_account(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Account>>;
    /// Drop sessions that expired before `now`; returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> anyhow::Result<u64>;
}
