use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::accounts::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, email, password_hash, verified, verification_token, \
     verification_expiration, reset_token, reset_expiration, created_at";

/// Persistence for user records.
///
/// The `consume_*` methods are conditional: they only change the row while
/// the stored token still equals `token`, and report whether they did.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_reset_token(&self, token: &str) -> anyhow::Result<Option<User>>;

    /// Returns `None` when the email is already taken.
    async fn insert(&self, user: NewUser) -> anyhow::Result<Option<Uuid>>;

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<bool>;

    async fn consume_verification(&self, id: Uuid, token: &str) -> anyhow::Result<bool>;

    async fn consume_reset(&self, id: Uuid, token: &str, password_hash: &str)
        -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.db)
            .instrument(info_span!("db.query", db.operation = "SELECT", db.table = "users"))
            .await
            .context("select user by email")?;
        Ok(user)
    }

    async fn find_by_reset_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        // Reset tokens share one namespace; the oldest holder wins on a collision.
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1 ORDER BY created_at LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(token)
            .fetch_optional(&self.db)
            .instrument(info_span!("db.query", db.operation = "SELECT", db.table = "users"))
            .await
            .context("select user by reset token")?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (id, email, password_hash, verified,
                               verification_token, verification_expiration, created_at)
            VALUES ($1, $2, $3, FALSE, $4, $5, $6)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.verification_token)
        .bind(user.verification_expiration)
        .bind(user.created_at)
        .fetch_optional(&self.db)
        .instrument(info_span!("db.query", db.operation = "INSERT", db.table = "users"))
        .await
        .context("insert user")?;
        Ok(id)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_expiration = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.db)
        .instrument(info_span!("db.query", db.operation = "UPDATE", db.table = "users"))
        .await
        .context("store reset token")?;
        Ok(res.rows_affected() == 1)
    }

    async fn consume_verification(&self, id: Uuid, token: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
            SET verified = TRUE,
                verification_token = NULL,
                verification_expiration = NULL
            WHERE id = $1 AND verification_token = $2
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .instrument(info_span!("db.query", db.operation = "UPDATE", db.table = "users"))
        .await
        .context("consume verification token")?;
        Ok(res.rows_affected() == 1)
    }

    async fn consume_reset(
        &self,
        id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $3,
                reset_token = NULL,
                reset_expiration = NULL
            WHERE id = $1 AND reset_token = $2
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(password_hash)
        .execute(&self.db)
        .instrument(info_span!("db.query", db.operation = "UPDATE", db.table = "users"))
        .await
        .context("consume reset token")?;
        Ok(res.rows_affected() == 1)
    }
}
