use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    accounts::{
        password::{hash_password, verify_password},
        repo::UserStore,
        repo_types::NewUser,
        tokens::{display_name, expiration_from, generate_token, is_expired, Clock, TokenPurpose},
    },
    error::AccountError,
    notify::{Mail, Notifier},
};

fn verification_mail(email: &str, token: &str) -> Mail {
    Mail {
        to: email.to_string(),
        subject: "Verify Account".to_string(),
        body: format!("Your verification token is {token}. It expires in 10 minutes."),
    }
}

fn reset_mail(email: &str, token: &str) -> Mail {
    Mail {
        to: email.to_string(),
        subject: "Password Reset".to_string(),
        body: format!(
            "Hello {},\n\nYou can now change your password.\n\nReset Token: {token}\nThis token expires in 10 minutes.\n",
            display_name(email)
        ),
    }
}

/// Owns the account lifecycle: signup, verification, login and password reset.
///
/// Holds no state of its own; every decision is made against the store, and
/// token consumption relies on the store's conditional updates.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Creates an unverified account and mails its verification token.
    #[instrument(skip(self, password))]
    pub async fn signup(&self, email: &str, password: &str) -> Result<Uuid, AccountError> {
        if email.is_empty() || password.is_empty() {
            return Err(AccountError::Invalid("Email and password required"));
        }
        if self.store.find_by_email(email).await?.is_some() {
            warn!("email already registered");
            return Err(AccountError::Conflict);
        }

        let now = self.clock.now();
        let token = generate_token();
        let user = NewUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            verification_token: token.clone(),
            verification_expiration: expiration_from(now),
            created_at: now,
        };

        // A concurrent signup can still take the address between the lookup and here.
        let id = self.store.insert(user).await?.ok_or_else(|| {
            warn!("email registered concurrently");
            AccountError::Conflict
        })?;
        info!(user_id = %id, "user signed up");

        self.deliver(verification_mail(email, &token)).await;
        Ok(id)
    }

    /// Marks the account verified when `token` matches and has not expired.
    #[instrument(skip(self, token))]
    pub async fn verify(&self, email: &str, token: &str) -> Result<(), AccountError> {
        let invalid = AccountError::InvalidToken(TokenPurpose::Verification);
        let user = match self.store.find_by_email(email).await? {
            Some(u) if u.verification_token.as_deref() == Some(token) => u,
            _ => {
                warn!("verification token mismatch");
                return Err(invalid);
            }
        };

        let expires_at = user.verification_expiration.ok_or_else(|| {
            anyhow::anyhow!("user {} has a verification token without expiration", user.id)
        })?;
        if is_expired(expires_at, self.clock.now()) {
            warn!(user_id = %user.id, "verification token expired");
            return Err(AccountError::Expired(TokenPurpose::Verification));
        }

        if !self.store.consume_verification(user.id, token).await? {
            warn!(user_id = %user.id, "verification token consumed concurrently");
            return Err(invalid);
        }
        info!(user_id = %user.id, "account verified");
        Ok(())
    }

    /// Confirms credentials. Verification is checked before the password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Uuid, AccountError> {
        let user = self.store.find_by_email(email).await?.ok_or_else(|| {
            warn!("login unknown email");
            AccountError::NotFound
        })?;

        if !user.verified {
            warn!(user_id = %user.id, "login before verification");
            return Err(AccountError::Unverified);
        }
        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AccountError::WrongPassword);
        }

        info!(user_id = %user.id, "user logged in");
        Ok(user.id)
    }

    /// Issues a fresh reset token, replacing any outstanding one.
    #[instrument(skip(self))]
    pub async fn request_reset(&self, email: &str) -> Result<(), AccountError> {
        let user = self.store.find_by_email(email).await?.ok_or_else(|| {
            warn!("reset requested for unknown email");
            AccountError::NotFound
        })?;

        let token = generate_token();
        let expires_at = expiration_from(self.clock.now());
        if !self.store.set_reset_token(user.id, &token, expires_at).await? {
            return Err(AccountError::NotFound);
        }
        info!(user_id = %user.id, "reset token issued");

        self.deliver(reset_mail(&user.email, &token)).await;
        Ok(())
    }

    /// Replaces the password of whoever holds `token`, consuming it.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AccountError> {
        if token.is_empty() || new_password.is_empty() {
            return Err(AccountError::Invalid("Token and new password required"));
        }

        let invalid = AccountError::InvalidToken(TokenPurpose::Reset);
        let Some(user) = self.store.find_by_reset_token(token).await? else {
            warn!("unknown reset token");
            return Err(invalid);
        };

        let expires_at = user.reset_expiration.ok_or_else(|| {
            anyhow::anyhow!("user {} has a reset token without expiration", user.id)
        })?;
        if is_expired(expires_at, self.clock.now()) {
            warn!(user_id = %user.id, "reset token expired");
            return Err(AccountError::Expired(TokenPurpose::Reset));
        }

        let hash = hash_password(new_password)?;
        if !self.store.consume_reset(user.id, token, &hash).await? {
            warn!(user_id = %user.id, "reset token consumed concurrently");
            return Err(invalid);
        }
        info!(user_id = %user.id, "password reset");
        Ok(())
    }

    /// Sends after the store has committed; failures are logged, never propagated.
    async fn deliver(&self, mail: Mail) {
        match self.notifier.send(&mail).await {
            Ok(()) => debug!(subject = %mail.subject, "notification sent"),
            Err(e) => warn!(error = %e, subject = %mail.subject, "notification failed"),
        }
    }
}
