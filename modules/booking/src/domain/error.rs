use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use crate::contract::AppointmentStatus;

/// Machine-readable error category shared by every `DomainError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Unauthenticated,
    Forbidden,
    InvalidTransition,
    Conflict,
    Internal,
}

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Account not found: {id}")]
    AccountNotFound { id: Uuid },

    #[error("Doctor not found: {id}")]
    DoctorNotFound { id: Uuid },

    #[error("No doctor profile for account {account_id}")]
    DoctorProfileMissing { account_id: Uuid },

    #[error("Appointment not found: {id}")]
    AppointmentNotFound { id: Uuid },

    #[error("Account with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Slot {slot} on {date} is not available: {reason}")]
    SlotUnavailable {
        date: NaiveDate,
        slot: NaiveTime,
        reason: String,
    },

    #[error("Slot {slot} on {date} is already booked")]
    SlotAlreadyBooked { date: NaiveDate, slot: NaiveTime },

    #[error("Appointment {id} was modified concurrently")]
    StaleAppointment { id: Uuid },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not authenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Cannot move appointment from '{from}' to '{to}'")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::AccountNotFound { .. }
            | DomainError::DoctorNotFound { .. }
            | DomainError::DoctorProfileMissing { .. }
            | DomainError::AppointmentNotFound { .. } => ErrorKind::NotFound,
            DomainError::Validation { .. } | DomainError::SlotUnavailable { .. } => {
                ErrorKind::InvalidInput
            }
            DomainError::EmailAlreadyExists { .. }
            | DomainError::SlotAlreadyBooked { .. }
            | DomainError::StaleAppointment { .. } => ErrorKind::Conflict,
            DomainError::InvalidCredentials | DomainError::Unauthenticated { .. } => {
                ErrorKind::Unauthenticated
            }
            DomainError::Forbidden { .. } => ErrorKind::Forbidden,
            DomainError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            DomainError::Database { .. } => ErrorKind::Internal,
        }
    }

    pub fn account_not_found(id: Uuid) -> Self {
        Self::AccountNotFound { id }
    }

    pub fn doctor_not_found(id: Uuid) -> Self {
        Self::DoctorNotFound { id }
    }

    pub fn appointment_not_found(id: Uuid) -> Self {
        Self::AppointmentNotFound { id }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
