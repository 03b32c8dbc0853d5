use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_account_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: NaiveTime,
    pub reason: String,
    pub status: String,
    pub is_paid: bool,
    /// `doctor/date/HH:MM` while the appointment is active, NULL once cancelled.
    #[sea_orm(unique)]
    pub slot_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::PatientId",
        to = "super::accounts::Column::Id",
        on_delete = "Restrict"
    )]
    Patient,
    #[sea_orm(
        belongs_to = "super::doctor_profiles::Entity",
        from = "Column::DoctorId",
        to = "super::doctor_profiles::Column::Id",
        on_delete = "Restrict"
    )]
    Doctor,
}

impl Related<super::doctor_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Doctor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
