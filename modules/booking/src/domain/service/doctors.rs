use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{gate, require_actor, Service};
use crate::contract::{
    Account, Actor, DayAvailability, Doctor, DoctorPatch, DoctorProfile, DoctorQuery, FieldUpdate,
    NewDoctor, Role, WeeklyAvailability,
};
use crate::domain::authz::Action;
use crate::domain::error::DomainError;
use crate::domain::repo::{name_search_key, AccountChanges, DoctorFilter};

impl Service {
    #[instrument(name = "booking.service.list_doctors", skip(self))]
    pub async fn list_doctors(&self, query: DoctorQuery) -> Result<Vec<Doctor>, DomainError> {
        let filter = DoctorFilter {
            specialization: non_blank(query.specialization),
            search: non_blank(query.search).map(|s| name_search_key(&s)),
            limit: self.page_limit(query.limit)?,
        };

        let doctors = self
            .doctors
            .list(&filter)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        debug!("Listed {} doctors", doctors.len());
        Ok(doctors)
    }

    #[instrument(name = "booking.service.get_doctor", skip(self), fields(doctor_id = %id))]
    pub async fn get_doctor(&self, id: Uuid) -> Result<Doctor, DomainError> {
        self.doctors
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::doctor_not_found(id))
    }

    #[instrument(name = "booking.service.my_doctor_profile", skip(self, actor))]
    pub async fn my_doctor_profile(&self, actor: Option<&Actor>) -> Result<Doctor, DomainError> {
        gate(actor, Action::ViewOwnDoctorProfile)?;
        let account_id = require_actor(actor)?.account_id;
        self.doctors
            .find_by_account(account_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or(DomainError::DoctorProfileMissing { account_id })
    }

    /// Create a Doctor account together with its profile.
    #[instrument(
        name = "booking.service.create_doctor",
        skip(self, actor, new),
        fields(email = %new.account.email, specialization = %new.specialization)
    )]
    pub async fn create_doctor(
        &self,
        actor: Option<&Actor>,
        new: NewDoctor,
    ) -> Result<Doctor, DomainError> {
        gate(actor, Action::CreateDoctor)?;
        info!("Creating doctor");

        // Everything is validated before the first write.
        let account_fields = self.normalize_new_account(new.account)?;
        let specialization = required_text("specialization", &new.specialization)?;
        let experience_years = new.experience_years.unwrap_or(0);
        validate_non_negative("experience_years", i64::from(experience_years))?;
        let consultation_fee = new
            .consultation_fee
            .unwrap_or(self.config.default_consultation_fee);
        validate_non_negative("consultation_fee", consultation_fee)?;
        let address = match new.address {
            Some(a) => required_text("address", &a)?,
            None => self.config.default_address.clone(),
        };
        let availability = match new.availability {
            Some(days) => build_availability(days)?,
            None => WeeklyAvailability::standard(),
        };
        let image_url =
            non_blank(new.image_url).or_else(|| Some(self.config.default_image_url.clone()));

        if self
            .accounts
            .email_exists(&account_fields.email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::email_already_exists(account_fields.email));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: account_fields.name,
            email: account_fields.email,
            role: Role::Doctor,
            phone: account_fields.phone,
            created_at: now,
            updated_at: now,
        };
        let profile = DoctorProfile {
            id: Uuid::new_v4(),
            account_id: account.id,
            specialization,
            experience_years,
            consultation_fee,
            address,
            availability,
            bio: non_blank(new.bio),
            image_url,
            rating: 0.0,
            review_count: 0,
            created_at: now,
            updated_at: now,
        };
        let digest = self.hash_password(&account_fields.password)?;

        let inserted = self
            .doctors
            .insert_with_account(account.clone(), digest, profile.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !inserted {
            return Err(DomainError::email_already_exists(account.email));
        }

        info!("Created doctor profile id={}", profile.id);
        Ok(Doctor {
            profile,
            name: account.name,
            email: account.email,
            phone: account.phone,
        })
    }

    #[instrument(
        name = "booking.service.update_doctor",
        skip(self, actor, patch),
        fields(doctor_id = %id)
    )]
    pub async fn update_doctor(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        mut patch: DoctorPatch,
    ) -> Result<Doctor, DomainError> {
        let actor = require_actor(actor)?;
        info!("Updating doctor");

        let mut current = self.get_doctor(id).await?;
        gate(
            Some(actor),
            Action::UpdateDoctor {
                owner_account_id: current.profile.account_id,
            },
        )?;

        let now = Utc::now();
        let owner = if patch.name.is_keep() && patch.phone.is_keep() {
            None
        } else {
            let (name, phone) = self.apply_contact_patch(
                &current.name,
                current.phone.as_deref(),
                std::mem::take(&mut patch.name),
                std::mem::take(&mut patch.phone),
            )?;
            Some(AccountChanges {
                name,
                phone,
                password: None,
                updated_at: now,
            })
        };
        apply_patch(&mut current.profile, patch)?;
        current.profile.updated_at = now;

        let updated = self
            .doctors
            .update(current.profile.clone(), owner.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !updated {
            return Err(DomainError::doctor_not_found(id));
        }
        if let Some(owner) = owner {
            current.name = owner.name;
            current.phone = owner.phone;
        }

        info!("Updated doctor");
        Ok(current)
    }
}

fn apply_patch(profile: &mut DoctorProfile, patch: DoctorPatch) -> Result<(), DomainError> {
    if let Some(v) = required_update("specialization", patch.specialization)? {
        profile.specialization = required_text("specialization", &v)?;
    }
    if let Some(v) = required_update("experience_years", patch.experience_years)? {
        validate_non_negative("experience_years", i64::from(v))?;
        profile.experience_years = v;
    }
    if let Some(v) = required_update("consultation_fee", patch.consultation_fee)? {
        validate_non_negative("consultation_fee", v)?;
        profile.consultation_fee = v;
    }
    if let Some(v) = required_update("address", patch.address)? {
        profile.address = required_text("address", &v)?;
    }
    if let Some(days) = required_update("availability", patch.availability)? {
        profile.availability = build_availability(days)?;
    }
    match patch.bio {
        FieldUpdate::Keep => {}
        FieldUpdate::Clear => profile.bio = None,
        FieldUpdate::Set(v) => profile.bio = non_blank(Some(v)),
    }
    match patch.image_url {
        FieldUpdate::Keep => {}
        FieldUpdate::Clear => profile.image_url = None,
        FieldUpdate::Set(v) => profile.image_url = non_blank(Some(v)),
    }
    Ok(())
}

/// `Keep` → `None`, `Set(v)` → `Some(v)`; clearing a required field is rejected.
fn required_update<T>(field: &str, update: FieldUpdate<T>) -> Result<Option<T>, DomainError> {
    match update {
        FieldUpdate::Keep => Ok(None),
        FieldUpdate::Clear => Err(DomainError::validation(field, "cannot be null")),
        FieldUpdate::Set(v) => Ok(Some(v)),
    }
}

fn required_text(field: &str, raw: &str) -> Result<String, DomainError> {
    let v = raw.trim();
    if v.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(v.to_string())
}

fn validate_non_negative(field: &str, v: i64) -> Result<(), DomainError> {
    if v < 0 {
        return Err(DomainError::validation(field, "must not be negative"));
    }
    Ok(())
}

fn build_availability(days: Vec<DayAvailability>) -> Result<WeeklyAvailability, DomainError> {
    WeeklyAvailability::from_entries(days)
        .map_err(|e| DomainError::validation("availability", e.to_string()))
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
