use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{gate, require_actor, Service};
use crate::contract::{
    Actor, Appointment, AppointmentQuery, AppointmentStatus, BookingRequest, Role,
};
use crate::domain::authz::Action;
use crate::domain::availability::parse_slot;
use crate::domain::error::DomainError;
use crate::domain::repo::AppointmentScope;
use crate::domain::status::{Party, TransitionError};

impl Service {
    #[instrument(
        name = "booking.service.book_appointment",
        skip(self, actor, req),
        fields(doctor_id = %req.doctor_id, date = %req.date, time_slot = %req.time_slot)
    )]
    pub async fn book_appointment(
        &self,
        actor: Option<&Actor>,
        req: BookingRequest,
    ) -> Result<Appointment, DomainError> {
        gate(actor, Action::BookAppointment)?;
        let patient_id = require_actor(actor)?.account_id;
        info!("Booking appointment");

        let slot = parse_slot(&req.time_slot).ok_or_else(|| {
            DomainError::validation(
                "time_slot",
                format!("'{}' is not a time like \"10:00 AM\"", req.time_slot),
            )
        })?;
        let reason = req.reason.trim().to_string();
        if reason.is_empty() {
            return Err(DomainError::validation("reason", "must not be empty"));
        }

        let doctor = self.get_doctor(req.doctor_id).await?;
        doctor
            .profile
            .availability
            .check_slot(req.date, slot)
            .map_err(|r| DomainError::SlotUnavailable {
                date: req.date,
                slot,
                reason: r.to_string(),
            })?;

        if self
            .appointments
            .slot_taken(doctor.profile.id, req.date, slot)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::SlotAlreadyBooked {
                date: req.date,
                slot,
            });
        }

        let now = Utc::now();
        let appt = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: doctor.profile.id,
            doctor_account_id: doctor.profile.account_id,
            date: req.date,
            time_slot: slot,
            reason,
            status: AppointmentStatus::Pending,
            is_paid: false,
            created_at: now,
            updated_at: now,
        };

        // The unique slot index decides concurrent bookings that both passed the check above.
        let inserted = self
            .appointments
            .insert(appt.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !inserted {
            warn!("Lost booking race for slot");
            return Err(DomainError::SlotAlreadyBooked {
                date: req.date,
                slot,
            });
        }

        info!("Booked appointment id={}", appt.id);
        Ok(appt)
    }

    #[instrument(
        name = "booking.service.get_appointment",
        skip(self, actor),
        fields(appointment_id = %id)
    )]
    pub async fn get_appointment(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
    ) -> Result<Appointment, DomainError> {
        let actor = require_actor(actor)?;
        let appt = self.load_appointment(id).await?;
        gate(
            Some(actor),
            Action::ViewAppointment {
                patient_id: appt.patient_id,
                doctor_account_id: appt.doctor_account_id,
            },
        )?;
        Ok(appt)
    }

    /// Role-scoped listing: patients see their bookings, doctors the bookings
    /// on their profile, admins everything.
    #[instrument(name = "booking.service.list_appointments", skip(self, actor))]
    pub async fn list_appointments(
        &self,
        actor: Option<&Actor>,
        query: AppointmentQuery,
    ) -> Result<Vec<Appointment>, DomainError> {
        gate(actor, Action::ListAppointments)?;
        let actor = require_actor(actor)?;
        let limit = self.page_limit(query.limit)?;

        let scope = match actor.role {
            Role::Patient => AppointmentScope::Patient(actor.account_id),
            Role::Doctor => AppointmentScope::DoctorAccount(actor.account_id),
            Role::Admin => AppointmentScope::All,
        };

        let items = self
            .appointments
            .list(scope, query.status, limit)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Listed {} appointments", items.len());
        Ok(items)
    }

    /// Move an appointment along its lifecycle. Checks run in order:
    /// party membership, terminal state, edge existence, then which side may take the edge.
    #[instrument(
        name = "booking.service.change_status",
        skip(self, actor),
        fields(appointment_id = %id, to = %to)
    )]
    pub async fn change_status(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        to: AppointmentStatus,
    ) -> Result<Appointment, DomainError> {
        let actor = require_actor(actor)?;
        let mut appt = self.load_appointment(id).await?;

        gate(
            Some(actor),
            Action::ChangeAppointmentStatus {
                patient_id: appt.patient_id,
                doctor_account_id: appt.doctor_account_id,
            },
        )?;
        let party = Party::of(actor, &appt)
            .ok_or_else(|| DomainError::forbidden("not a party to this appointment"))?;

        let from = appt.status;
        let next = from.transition(to, party).map_err(|e| match e {
            TransitionError::Terminal { from } => DomainError::InvalidTransition { from, to },
            TransitionError::Unreachable { from, to } => DomainError::InvalidTransition { from, to },
            TransitionError::NotPermitted { party, from, to } => DomainError::forbidden(format!(
                "{} cannot move appointment from '{}' to '{}'",
                match party {
                    Party::Patient => "patient",
                    Party::Doctor => "doctor",
                },
                from,
                to
            )),
        })?;

        let now = Utc::now();
        let swapped = self
            .appointments
            .update_status(id, from, next, now)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !swapped {
            warn!("Appointment status changed concurrently");
            return Err(DomainError::StaleAppointment { id });
        }

        appt.status = next;
        appt.updated_at = now;
        info!("Appointment moved {} -> {}", from, next);
        Ok(appt)
    }

    async fn load_appointment(&self, id: Uuid) -> Result<Appointment, DomainError> {
        self.appointments
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::appointment_not_found(id))
    }
}
