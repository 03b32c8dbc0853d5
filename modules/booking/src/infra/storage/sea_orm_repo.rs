//! SeaORM-backed implementation of the booking persistence ports.
//!
//! Generic over the connection so tests can hand it an in-memory SQLite
//! `DatabaseConnection`. The store needs `TransactionTrait` for the
//! account+profile insert.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::contract::{Account, Appointment, AppointmentStatus, Doctor, DoctorProfile};
use crate::domain::repo::{
    name_search_key, AccountChanges, AccountsRepository, AppointmentScope, AppointmentsRepository,
    DoctorFilter, DoctorsRepository, PasswordDigest, SessionsRepository,
};
use crate::infra::storage::entity::{accounts, appointments, doctor_profiles, sessions};
use crate::infra::storage::mapper;

pub struct SeaOrmBookingRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmBookingRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Escape `%`, `_` and `\` so user text matches literally inside LIKE.
fn like_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn account_row(account: Account, digest: PasswordDigest) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id),
        name_search: Set(name_search_key(&account.name)),
        name: Set(account.name),
        email: Set(account.email),
        password_hash: Set(digest.0),
        role: Set(account.role.as_str().to_string()),
        phone: Set(account.phone),
        created_at: Set(account.created_at),
        updated_at: Set(account.updated_at),
    }
}

/// Only the columns in `changes` are written.
fn account_changes_row(id: Uuid, changes: AccountChanges) -> accounts::ActiveModel {
    let mut row = accounts::ActiveModel {
        id: Set(id),
        name_search: Set(name_search_key(&changes.name)),
        name: Set(changes.name),
        phone: Set(changes.phone),
        updated_at: Set(changes.updated_at),
        ..Default::default()
    };
    if let Some(digest) = changes.password {
        row.password_hash = Set(digest.0);
    }
    row
}

fn profile_row(p: DoctorProfile) -> doctor_profiles::ActiveModel {
    doctor_profiles::ActiveModel {
        id: Set(p.id),
        account_id: Set(p.account_id),
        specialization: Set(p.specialization),
        experience_years: Set(p.experience_years),
        consultation_fee: Set(p.consultation_fee),
        address: Set(p.address),
        availability: Set(mapper::availability_to_json(&p.availability)),
        bio: Set(p.bio),
        image_url: Set(p.image_url),
        rating: Set(p.rating),
        review_count: Set(p.review_count),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    }
}

#[async_trait::async_trait]
impl<C> AccountsRepository for SeaOrmBookingRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let found = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("accounts.find_by_id failed")?;
        found.map(mapper::account_from_row).transpose()
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<(Account, PasswordDigest)>> {
        let found = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("accounts.find_credentials failed")?;
        let Some(row) = found else {
            return Ok(None);
        };
        let digest = PasswordDigest(row.password_hash.clone());
        Ok(Some((mapper::account_from_row(row)?, digest)))
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        let count = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("accounts.email_exists failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, account: Account, digest: PasswordDigest) -> anyhow::Result<bool> {
        match accounts::Entity::insert(account_row(account, digest))
            .exec_without_returning(&self.conn)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e).context("accounts.insert failed"),
        }
    }

    async fn update(&self, id: Uuid, changes: AccountChanges) -> anyhow::Result<bool> {
        match account_changes_row(id, changes).update(&self.conn).await {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(e) => Err(e).with_context(|| format!("accounts.update {id} failed")),
        }
    }
}

#[async_trait::async_trait]
impl<C> DoctorsRepository for SeaOrmBookingRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Doctor>> {
        let found = doctor_profiles::Entity::find_by_id(id)
            .find_also_related(accounts::Entity)
            .one(&self.conn)
            .await
            .context("doctors.find_by_id failed")?;
        found
            .map(|(p, a)| mapper::doctor_from_rows(p, a))
            .transpose()
    }

    async fn find_by_account(&self, account_id: Uuid) -> anyhow::Result<Option<Doctor>> {
        let found = doctor_profiles::Entity::find()
            .filter(doctor_profiles::Column::AccountId.eq(account_id))
            .find_also_related(accounts::Entity)
            .one(&self.conn)
            .await
            .context("doctors.find_by_account failed")?;
        found
            .map(|(p, a)| mapper::doctor_from_rows(p, a))
            .transpose()
    }

    async fn list(&self, filter: &DoctorFilter) -> anyhow::Result<Vec<Doctor>> {
        let mut select = doctor_profiles::Entity::find().find_also_related(accounts::Entity);
        if let Some(spec) = &filter.specialization {
            select = select.filter(doctor_profiles::Column::Specialization.eq(spec.as_str()));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", like_escape(search));
            select = select.filter(
                Expr::col((accounts::Entity, accounts::Column::NameSearch))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }
        let rows = select
            .order_by_asc(doctor_profiles::Column::CreatedAt)
            .limit(filter.limit)
            .all(&self.conn)
            .await
            .context("doctors.list failed")?;
        rows.into_iter()
            .map(|(p, a)| mapper::doctor_from_rows(p, a))
            .collect()
    }

    async fn insert_with_account(
        &self,
        account: Account,
        digest: PasswordDigest,
        profile: DoctorProfile,
    ) -> anyhow::Result<bool> {
        let txn = self
            .conn
            .begin()
            .await
            .context("doctors.insert_with_account: begin failed")?;

        match accounts::Entity::insert(account_row(account, digest))
            .exec_without_returning(&txn)
            .await
        {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                txn.rollback()
                    .await
                    .context("doctors.insert_with_account: rollback failed")?;
                return Ok(false);
            }
            Err(e) => return Err(e).context("doctors.insert_with_account: account insert failed"),
        }

        // Dropping `txn` on error rolls the account insert back.
        doctor_profiles::Entity::insert(profile_row(profile))
            .exec_without_returning(&txn)
            .await
            .context("doctors.insert_with_account: profile insert failed")?;

        txn.commit()
            .await
            .context("doctors.insert_with_account: commit failed")?;
        Ok(true)
    }

    async fn update(
        &self,
        profile: DoctorProfile,
        owner: Option<AccountChanges>,
    ) -> anyhow::Result<bool> {
        let id = profile.id;
        let account_id = profile.account_id;
        let mut row = profile_row(profile);
        // Identity and creation time never change.
        row.account_id = sea_orm::ActiveValue::NotSet;
        row.created_at = sea_orm::ActiveValue::NotSet;

        let txn = self
            .conn
            .begin()
            .await
            .with_context(|| format!("doctors.update {id}: begin failed"))?;

        match row.update(&txn).await {
            Ok(_) => {}
            Err(DbErr::RecordNotUpdated) => {
                txn.rollback()
                    .await
                    .with_context(|| format!("doctors.update {id}: rollback failed"))?;
                return Ok(false);
            }
            Err(e) => return Err(e).with_context(|| format!("doctors.update {id} failed")),
        }

        if let Some(changes) = owner {
            account_changes_row(account_id, changes)
                .update(&txn)
                .await
                .with_context(|| format!("doctors.update {id}: owner account update failed"))?;
        }

        txn.commit()
            .await
            .with_context(|| format!("doctors.update {id}: commit failed"))?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl<C> AppointmentsRepository for SeaOrmBookingRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Appointment>> {
        let found = appointments::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("appointments.find_by_id failed")?;
        found.map(mapper::appointment_from_row).transpose()
    }

    async fn slot_taken(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        slot: NaiveTime,
    ) -> anyhow::Result<bool> {
        let count = appointments::Entity::find()
            .filter(appointments::Column::DoctorId.eq(doctor_id))
            .filter(appointments::Column::Date.eq(date))
            .filter(appointments::Column::TimeSlot.eq(slot))
            .filter(appointments::Column::Status.ne(AppointmentStatus::Cancelled.as_str()))
            .count(&self.conn)
            .await
            .context("appointments.slot_taken failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, appt: Appointment) -> anyhow::Result<bool> {
        let row = appointments::ActiveModel {
            id: Set(appt.id),
            patient_id: Set(appt.patient_id),
            doctor_id: Set(appt.doctor_id),
            doctor_account_id: Set(appt.doctor_account_id),
            date: Set(appt.date),
            time_slot: Set(appt.time_slot),
            slot_key: Set(mapper::slot_key(&appt)),
            reason: Set(appt.reason),
            status: Set(appt.status.as_str().to_string()),
            is_paid: Set(appt.is_paid),
            created_at: Set(appt.created_at),
            updated_at: Set(appt.updated_at),
        };
        match appointments::Entity::insert(row)
            .exec_without_returning(&self.conn)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e).context("appointments.insert failed"),
        }
    }

    async fn list(
        &self,
        scope: AppointmentScope,
        status: Option<AppointmentStatus>,
        limit: u64,
    ) -> anyhow::Result<Vec<Appointment>> {
        let mut select = appointments::Entity::find();
        select = match scope {
            AppointmentScope::All => select,
            AppointmentScope::Patient(id) => {
                select.filter(appointments::Column::PatientId.eq(id))
            }
            AppointmentScope::DoctorAccount(id) => {
                select.filter(appointments::Column::DoctorAccountId.eq(id))
            }
        };
        if let Some(st) = status {
            select = select.filter(appointments::Column::Status.eq(st.as_str()));
        }
        let rows = select
            .order_by_desc(appointments::Column::Date)
            .order_by_desc(appointments::Column::TimeSlot)
            .order_by_desc(appointments::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("appointments.list failed")?;
        rows.into_iter().map(mapper::appointment_from_row).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut update = appointments::Entity::update_many()
            .col_expr(appointments::Column::Status, Expr::value(to.as_str()))
            .col_expr(appointments::Column::UpdatedAt, Expr::value(at))
            .filter(appointments::Column::Id.eq(id))
            .filter(appointments::Column::Status.eq(from.as_str()));
        if to == AppointmentStatus::Cancelled {
            update = update.col_expr(
                appointments::Column::SlotKey,
                Expr::value(Option::<String>::None),
            );
        }
        let res = update
            .exec(&self.conn)
            .await
            .context("appointments.update_status failed")?;
        Ok(res.rows_affected == 1)
    }
}

#[async_trait::async_trait]
impl<C> SessionsRepository for SeaOrmBookingRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn insert(
        &self,
        token_digest: String,
        account_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let row = sessions::ActiveModel {
            token_digest: Set(token_digest),
            account_id: Set(account_id),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
        };
        sessions::Entity::insert(row)
            .exec_without_returning(&self.conn)
            .await
            .context("sessions.insert failed")?;
        Ok(())
    }

    async fn find_account(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Account>> {
        let found = sessions::Entity::find_by_id(token_digest.to_string())
            .find_also_related(accounts::Entity)
            .one(&self.conn)
            .await
            .context("sessions.find_account failed")?;
        match found {
            Some((session, Some(account))) if session.expires_at > now => {
                mapper::account_from_row(account).map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let res = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await
            .context("sessions.purge_expired failed")?;
        Ok(res.rows_affected)
    }
}
