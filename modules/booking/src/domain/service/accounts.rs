use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{gate, normalize_email, require_actor, Service};
use crate::contract::{Account, AccountPatch, Actor, NewAccount, Role, Session};
use crate::domain::authz::Action;
use crate::domain::error::DomainError;
use crate::domain::repo::AccountChanges;

impl Service {
    #[instrument(
        name = "booking.service.register_patient",
        skip(self, new),
        fields(email = %new.email)
    )]
    pub async fn register_patient(&self, new: NewAccount) -> Result<Session, DomainError> {
        info!("Registering patient");

        let new = self.normalize_new_account(new)?;
        // Fail before writing anything if no session could be issued.
        self.session_expiry(Utc::now())?;
        let account = self.create_account(new, Role::Patient).await?;
        let session = self.issue_session(account).await?;

        info!("Registered patient id={}", session.account.id);
        Ok(session)
    }

    #[instrument(name = "booking.service.login", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, DomainError> {
        debug!("Login attempt");

        let email = normalize_email(email).map_err(|_| DomainError::InvalidCredentials)?;
        let (account, digest) = self
            .accounts
            .find_credentials(&email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or(DomainError::InvalidCredentials)?;

        if !self.credentials.verify_password(password, &digest) {
            debug!("Password mismatch for account id={}", account.id);
            return Err(DomainError::InvalidCredentials);
        }

        let session = self.issue_session(account).await?;
        info!("Login succeeded for account id={}", session.account.id);
        Ok(session)
    }

    /// Resolve a bearer token to the acting identity.
    #[instrument(name = "booking.service.authenticate", skip_all)]
    pub async fn authenticate(&self, token: &str) -> Result<Actor, DomainError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::unauthenticated("missing bearer token"));
        }
        let digest = self.credentials.token_digest(token);
        let account = self
            .sessions
            .find_account(&digest, Utc::now())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::unauthenticated("invalid or expired token"))?;
        debug!(account_id = %account.id, "Token accepted");
        Ok(Actor::from(&account))
    }

    #[instrument(name = "booking.service.get_account", skip(self, actor))]
    pub async fn get_account(&self, actor: Option<&Actor>) -> Result<Account, DomainError> {
        gate(actor, Action::ViewOwnAccount)?;
        let id = require_actor(actor)?.account_id;
        self.accounts
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::account_not_found(id))
    }

    /// Edit the caller's own name, phone or password.
    #[instrument(name = "booking.service.update_account", skip(self, actor, patch))]
    pub async fn update_account(
        &self,
        actor: Option<&Actor>,
        patch: AccountPatch,
    ) -> Result<Account, DomainError> {
        gate(actor, Action::UpdateOwnAccount)?;
        let id = require_actor(actor)?.account_id;
        let mut account = self
            .accounts
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::account_not_found(id))?;

        let (name, phone) =
            self.apply_contact_patch(&account.name, account.phone.as_deref(), patch.name, patch.phone)?;
        let password = match patch.password {
            Some(p) => {
                self.validate_password(&p)?;
                Some(self.hash_password(&p)?)
            }
            None => None,
        };
        let password_changed = password.is_some();

        let changes = AccountChanges {
            name,
            phone,
            password,
            updated_at: Utc::now(),
        };
        let updated = self
            .accounts
            .update(id, changes.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !updated {
            return Err(DomainError::account_not_found(id));
        }

        account.name = changes.name;
        account.phone = changes.phone;
        account.updated_at = changes.updated_at;
        info!(password_changed, "Updated account id={}", id);
        Ok(account)
    }

    /// Create the configured admin account unless its email is already registered.
    /// Returns whether an account was created.
    #[instrument(
        name = "booking.service.ensure_admin",
        skip(self, new),
        fields(email = %new.email)
    )]
    pub async fn ensure_admin(&self, new: NewAccount) -> Result<bool, DomainError> {
        let new = self.normalize_new_account(new)?;
        let exists = self
            .accounts
            .email_exists(&new.email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if exists {
            debug!("Admin account already present");
            return Ok(false);
        }
        match self.create_account(new, Role::Admin).await {
            Ok(account) => {
                info!("Bootstrap admin created id={}", account.id);
                Ok(true)
            }
            // Another instance won the race.
            Err(DomainError::EmailAlreadyExists { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_account(&self, new: NewAccount, role: Role) -> Result<Account, DomainError> {
        if self
            .accounts
            .email_exists(&new.email)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::email_already_exists(new.email));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            role,
            phone: new.phone,
            created_at: now,
            updated_at: now,
        };
        let digest = self.hash_password(&new.password)?;

        let inserted = self
            .accounts
            .insert(account.clone(), digest)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !inserted {
            return Err(DomainError::email_already_exists(account.email));
        }
        Ok(account)
    }

    async fn issue_session(&self, account: Account) -> Result<Session, DomainError> {
        let now = Utc::now();
        let expires_at = self.session_expiry(now)?;

        match self.sessions.purge_expired(now).await {
            Ok(0) => {}
            Ok(n) => debug!("Purged {} expired sessions", n),
            Err(e) => warn!("Failed to purge expired sessions: {:#}", e),
        }

        let token = self.credentials.new_token();
        self.sessions
            .insert(self.credentials.token_digest(&token), account.id, expires_at)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        Ok(Session {
            token,
            account,
            expires_at,
        })
    }

    /// `now + session_ttl`; a TTL beyond the calendar range is a configuration error.
    fn session_expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, DomainError> {
        TimeDelta::from_std(self.config.session_ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                DomainError::validation("session_ttl", "expiry is out of the supported date range")
            })
    }
}
