//! Role and ownership gate.
//!
//! Pure: the caller resolves ownership (who owns the profile or appointment)
//! and passes it in with the action. State-machine rules for status changes
//! are applied afterwards by `domain::status`.

use uuid::Uuid;

use crate::contract::{Actor, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateDoctor,
    UpdateDoctor { owner_account_id: Uuid },
    ViewOwnDoctorProfile,
    BookAppointment,
    ViewAppointment { patient_id: Uuid, doctor_account_id: Uuid },
    ListAppointments,
    ChangeAppointmentStatus { patient_id: Uuid, doctor_account_id: Uuid },
    ViewOwnAccount,
    UpdateOwnAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Forbidden,
    Unauthenticated,
}

pub fn authorize(actor: Option<&Actor>, action: Action) -> Access {
    let Some(actor) = actor else {
        return Access::Unauthenticated;
    };
    let me = actor.account_id;

    let allowed = match action {
        Action::CreateDoctor => matches!(actor.role, Role::Admin),
        Action::UpdateDoctor { owner_account_id } => match actor.role {
            Role::Admin => true,
            Role::Doctor => owner_account_id == me,
            Role::Patient => false,
        },
        Action::ViewOwnDoctorProfile => matches!(actor.role, Role::Doctor),
        Action::BookAppointment => matches!(actor.role, Role::Patient),
        Action::ViewAppointment {
            patient_id,
            doctor_account_id,
        } => match actor.role {
            Role::Admin => true,
            Role::Doctor => doctor_account_id == me,
            Role::Patient => patient_id == me,
        },
        Action::ListAppointments | Action::ViewOwnAccount | Action::UpdateOwnAccount => true,
        Action::ChangeAppointmentStatus {
            patient_id,
            doctor_account_id,
        } => match actor.role {
            Role::Admin => false,
            Role::Doctor => doctor_account_id == me,
            Role::Patient => patient_id == me,
        },
    };

    if allowed {
        Access::Allowed
    } else {
        Access::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            account_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn missing_actor_is_unauthenticated() {
        for action in [
            Action::CreateDoctor,
            Action::BookAppointment,
            Action::ListAppointments,
            Action::ViewOwnAccount,
            Action::UpdateOwnAccount,
        ] {
            assert_eq!(authorize(None, action), Access::Unauthenticated);
        }
    }

    #[test]
    fn only_admin_creates_doctors() {
        assert_eq!(
            authorize(Some(&actor(Role::Admin)), Action::CreateDoctor),
            Access::Allowed
        );
        assert_eq!(
            authorize(Some(&actor(Role::Doctor)), Action::CreateDoctor),
            Access::Forbidden
        );
        assert_eq!(
            authorize(Some(&actor(Role::Patient)), Action::CreateDoctor),
            Access::Forbidden
        );
    }

    #[test]
    fn doctor_updates_only_own_profile() {
        let doc = actor(Role::Doctor);
        let own = Action::UpdateDoctor {
            owner_account_id: doc.account_id,
        };
        let other = Action::UpdateDoctor {
            owner_account_id: Uuid::new_v4(),
        };
        assert_eq!(authorize(Some(&doc), own), Access::Allowed);
        assert_eq!(authorize(Some(&doc), other), Access::Forbidden);
        assert_eq!(authorize(Some(&actor(Role::Admin)), other), Access::Allowed);
        assert_eq!(
            authorize(Some(&actor(Role::Patient)), other),
            Access::Forbidden
        );
    }

    #[test]
    fn only_patients_book() {
        assert_eq!(
            authorize(Some(&actor(Role::Patient)), Action::BookAppointment),
            Access::Allowed
        );
        assert_eq!(
            authorize(Some(&actor(Role::Doctor)), Action::BookAppointment),
            Access::Forbidden
        );
        assert_eq!(
            authorize(Some(&actor(Role::Admin)), Action::BookAppointment),
            Access::Forbidden
        );
    }

    #[test]
    fn appointment_visibility() {
        let patient = actor(Role::Patient);
        let doctor = actor(Role::Doctor);
        let view = Action::ViewAppointment {
            patient_id: patient.account_id,
            doctor_account_id: doctor.account_id,
        };
        assert_eq!(authorize(Some(&patient), view), Access::Allowed);
        assert_eq!(authorize(Some(&doctor), view), Access::Allowed);
        assert_eq!(authorize(Some(&actor(Role::Admin)), view), Access::Allowed);
        assert_eq!(
            authorize(Some(&actor(Role::Patient)), view),
            Access::Forbidden
        );
        assert_eq!(
            authorize(Some(&actor(Role::Doctor)), view),
            Access::Forbidden
        );
    }

    #[test]
    fn status_changes_are_for_parties_only() {
        let patient = actor(Role::Patient);
        let doctor = actor(Role::Doctor);
        let change = Action::ChangeAppointmentStatus {
            patient_id: patient.account_id,
            doctor_account_id: doctor.account_id,
        };
        assert_eq!(authorize(Some(&patient), change), Access::Allowed);
        assert_eq!(authorize(Some(&doctor), change), Access::Allowed);
        assert_eq!(
            authorize(Some(&actor(Role::Admin)), change),
            Access::Forbidden
        );
        assert_eq!(
            authorize(Some(&actor(Role::Doctor)), change),
            Access::Forbidden
        );
    }
}
