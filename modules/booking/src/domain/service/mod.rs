//! Domain service: business rules for accounts, the doctor directory and the
//! appointment ledger. Depends only on ports, never on infra types.

use std::sync::Arc;
use std::time::Duration;

use crate::contract::{Actor, FieldUpdate, NewAccount};
use crate::domain::authz::{authorize, Access, Action};
use crate::domain::error::DomainError;
use crate::domain::ports::CredentialsPort;
use crate::domain::repo::{
    AccountsRepository, AppointmentsRepository, DoctorsRepository, PasswordDigest,
    SessionsRepository,
};

mod accounts;
mod appointments;
mod doctors;

#[derive(Clone)]
pub struct Service {
    accounts: Arc<dyn AccountsRepository>,
    doctors: Arc<dyn DoctorsRepository>,
    appointments: Arc<dyn AppointmentsRepository>,
    sessions: Arc<dyn SessionsRepository>,
    credentials: Arc<dyn CredentialsPort>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_name_length: usize,
    pub min_password_length: usize,
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub session_ttl: Duration,
    pub default_consultation_fee: i64,
    pub default_address: String,
    pub default_image_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_name_length: 100,
            min_password_length: 6,
            default_page_size: 20,
            max_page_size: 100,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            default_consultation_fee: 500,
            default_address: "MedConnect Medical Center, New Delhi".to_string(),
            default_image_url: "/images/doctor.jpg".to_string(),
        }
    }
}

impl Service {
    pub fn new(
        accounts: Arc<dyn AccountsRepository>,
        doctors: Arc<dyn DoctorsRepository>,
        appointments: Arc<dyn AppointmentsRepository>,
        sessions: Arc<dyn SessionsRepository>,
        credentials: Arc<dyn CredentialsPort>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            accounts,
            doctors,
            appointments,
            sessions,
            credentials,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // --- shared helpers ---

    fn page_limit(&self, requested: Option<u64>) -> Result<u64, DomainError> {
        match requested {
            None => Ok(self.config.default_page_size),
            Some(0) => Err(DomainError::validation("limit", "must be at least 1")),
            Some(n) => Ok(n.min(self.config.max_page_size)),
        }
    }

    /// Trim, validate and lower-case the account fields.
    fn normalize_new_account(&self, new: NewAccount) -> Result<NewAccount, DomainError> {
        let name = self.validate_name(&new.name)?;
        let email = normalize_email(&new.email)?;
        self.validate_password(&new.password)?;
        Ok(NewAccount {
            name,
            email,
            password: new.password,
            phone: normalize_phone(new.phone),
        })
    }

    fn validate_name(&self, raw: &str) -> Result<String, DomainError> {
        let name = raw.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }
        if name.chars().count() > self.config.max_name_length {
            return Err(DomainError::validation(
                "name",
                format!("must be at most {} characters", self.config.max_name_length),
            ));
        }
        Ok(name)
    }

    fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        if password.chars().count() < self.config.min_password_length {
            return Err(DomainError::validation(
                "password",
                format!(
                    "must be at least {} characters",
                    self.config.min_password_length
                ),
            ));
        }
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<PasswordDigest, DomainError> {
        self.credentials
            .hash_password(password)
            .map_err(|e| DomainError::database(format!("password hashing failed: {e:#}")))
    }

    /// Apply name/phone edits to the owning account's current values.
    fn apply_contact_patch(
        &self,
        current_name: &str,
        current_phone: Option<&str>,
        name: FieldUpdate<String>,
        phone: FieldUpdate<String>,
    ) -> Result<(String, Option<String>), DomainError> {
        let name = match name {
            FieldUpdate::Keep => current_name.to_string(),
            FieldUpdate::Clear => return Err(DomainError::validation("name", "cannot be null")),
            FieldUpdate::Set(v) => self.validate_name(&v)?,
        };
        let phone = match phone {
            FieldUpdate::Keep => current_phone.map(str::to_string),
            FieldUpdate::Clear => None,
            FieldUpdate::Set(v) => normalize_phone(Some(v)),
        };
        Ok((name, phone))
    }
}

fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

pub(crate) fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') || !email.contains('.') {
        return Err(DomainError::validation(
            "email",
            format!("'{}' is not a valid email", raw.trim()),
        ));
    }
    Ok(email)
}

/// Map the authorization decision onto the error taxonomy.
fn gate(actor: Option<&Actor>, action: Action) -> Result<(), DomainError> {
    match authorize(actor, action) {
        Access::Allowed => Ok(()),
        Access::Unauthenticated => Err(DomainError::unauthenticated("authentication required")),
        Access::Forbidden => Err(DomainError::forbidden(forbidden_reason(action))),
    }
}

fn require_actor(actor: Option<&Actor>) -> Result<&Actor, DomainError> {
    actor.ok_or_else(|| DomainError::unauthenticated("authentication required"))
}

fn forbidden_reason(action: Action) -> &'static str {
    match action {
        Action::CreateDoctor => "only admins can create doctors",
        Action::UpdateDoctor { .. } => "only an admin or the owning doctor can update this profile",
        Action::ViewOwnDoctorProfile => "only doctors have a doctor profile",
        Action::BookAppointment => "only patients can book appointments",
        Action::ViewAppointment { .. } => "not a party to this appointment",
        Action::ChangeAppointmentStatus { .. } => "not a party to this appointment",
        Action::ListAppointments | Action::ViewOwnAccount | Action::UpdateOwnAccount => {
            "access denied"
        }
    }
}
