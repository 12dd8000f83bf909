use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String, // unique, stored as given
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string
    pub verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    pub verification_expiration: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    pub reset_expiration: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Values for a freshly signed-up, unverified user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub verification_token: String,
    pub verification_expiration: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

