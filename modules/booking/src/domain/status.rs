//! Appointment lifecycle.
//!
//! ```text
//!            confirm (doctor)           complete (doctor)
//!  pending ───────────────────▶ confirmed ───────────────▶ completed
//!     │  └──────────────── complete (doctor) ──────────────▶   ▲ terminal
//!     │                          │
//!     └── cancel (either) ───────┴── cancel (either) ──▶ cancelled (terminal)
//! ```

use crate::contract::{Actor, Appointment, AppointmentStatus};

/// Which side of an appointment an actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Patient,
    Doctor,
}

impl Party {
    /// The actor's relationship to `appt`, if any. Admins are not a party.
    pub fn of(actor: &Actor, appt: &Appointment) -> Option<Party> {
        if actor.account_id == appt.doctor_account_id {
            Some(Party::Doctor)
        } else if actor.account_id == appt.patient_id {
            Some(Party::Patient)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The current state has no outgoing edges.
    Terminal { from: AppointmentStatus },
    /// No edge from `from` to `to` (includes `from == to`).
    Unreachable {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    /// The edge exists but this party may not take it.
    NotPermitted {
        party: Party,
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    /// Parties allowed to move `self → to`; `None` when there is no such edge.
    fn edge(self, to: AppointmentStatus) -> Option<&'static [Party]> {
        use AppointmentStatus::*;
        const DOCTOR: &[Party] = &[Party::Doctor];
        const EITHER: &[Party] = &[Party::Patient, Party::Doctor];
        match (self, to) {
            (Pending, Confirmed) => Some(DOCTOR),
            (Pending, Cancelled) => Some(EITHER),
            (Pending, Completed) => Some(DOCTOR),
            (Confirmed, Completed) => Some(DOCTOR),
            (Confirmed, Cancelled) => Some(EITHER),
            _ => None,
        }
    }

    /// Validate one transition requested by `party`; returns the new state.
    pub fn transition(
        self,
        to: AppointmentStatus,
        party: Party,
    ) -> Result<AppointmentStatus, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal { from: self });
        }
        let allowed = self
            .edge(to)
            .ok_or(TransitionError::Unreachable { from: self, to })?;
        if !allowed.contains(&party) {
            return Err(TransitionError::NotPermitted {
                party,
                from: self,
                to,
            });
        }
        Ok(to)
    }
}
