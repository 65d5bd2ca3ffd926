use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted record of one issued token pair.
///
/// Only SHA-256 fingerprints of the raw tokens are stored; the row is the
/// server-side proof that a refresh token is still live. Deleting it
/// invalidates the refresh token, which is how rotation enforces single use.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenPair {
    pub id: Uuid,
    pub researcher_id: Uuid,
    pub access_token_hash: String,
    pub refresh_token_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a fresh token pair row.
#[derive(Debug, Clone)]
pub struct NewTokenPair {
    pub researcher_id: Uuid,
    pub access_token_hash: String,
    pub refresh_token_hash: String,
}
