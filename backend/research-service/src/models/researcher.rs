use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Failed logins allowed before an account locks.
pub const MAX_LOGIN_ATTEMPTS: i32 = 3;

/// Researcher account - core identity entity.
///
/// Accounts are never hard-deleted; a blocked account keeps its rows and is
/// recognized by an exhausted attempt counter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Researcher {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub institution: String,
    pub remaining_login_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Researcher {
    /// An account with no attempts left is locked out until an operator
    /// resets the counter.
    pub fn is_blocked(&self) -> bool {
        self.remaining_login_attempts <= 0
    }
}

/// Fields for inserting a new account; the password is already the Argon2
/// hash, never the wire digest.
#[derive(Debug, Clone)]
pub struct NewResearcher {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub institution: String,
}

/// The `password` field on the wire is the client-side SHA-256 of the
/// cleartext, as a 64-char lowercase hex digest. The server never sees the
/// cleartext password.
pub fn validate_hex_digest(value: &str) -> Result<(), ValidationError> {
    if value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new("expected a sha-256 hex digest"))
    }
}

/// Researcher registration request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_hex_digest"))]
    pub password: String,
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub institution: String,
}

/// Researcher login request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_hex_digest"))]
    pub password: String,
}

/// Body returned by register and login. Key casing is part of the public
/// API contract with the web client.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub researcher_id: Uuid,
    pub researcher_name: String,
    pub researcher_username: String,
}

impl From<&Researcher> for SessionResponse {
    fn from(researcher: &Researcher) -> Self {
        Self {
            researcher_id: researcher.id,
            researcher_name: researcher.name.clone(),
            researcher_username: researcher.username.clone(),
        }
    }
}

/// Full profile for the authenticated researcher, `GET /researchers/me`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub researcher_id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    pub institution: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Researcher> for ProfileResponse {
    fn from(researcher: &Researcher) -> Self {
        Self {
            researcher_id: researcher.id,
            name: researcher.name.clone(),
            email: researcher.email.clone(),
            username: researcher.username.clone(),
            institution: researcher.institution.clone(),
            created_at: researcher.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_digest_validation() {
        let digest = "a".repeat(64);
        assert!(validate_hex_digest(&digest).is_ok());

        assert!(validate_hex_digest("too-short").is_err());
        let not_hex = "z".repeat(64);
        assert!(validate_hex_digest(&not_hex).is_err());
    }

    #[test]
    fn test_register_request_rejects_plain_password() {
        let request = RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            password: "hunter2".to_string(),
            username: "ada".to_string(),
            institution: "Example Institute".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_session_response_uses_camel_case_keys() {
        let researcher = Researcher {
            id: Uuid::new_v4(),
            email: "ada@example.org".to_string(),
            username: "ada".to_string(),
            password_hash: "hash".to_string(),
            name: "Ada".to_string(),
            institution: "Example Institute".to_string(),
            remaining_login_attempts: MAX_LOGIN_ATTEMPTS,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let body = serde_json::to_value(SessionResponse::from(&researcher)).unwrap();
        assert_eq!(body["researcherId"], serde_json::json!(researcher.id));
        assert_eq!(body["researcherName"], "Ada");
        assert_eq!(body["researcherUsername"], "ada");

        let profile = serde_json::to_value(ProfileResponse::from(&researcher)).unwrap();
        assert_eq!(profile["researcherId"], serde_json::json!(researcher.id));
        assert_eq!(profile["institution"], "Example Institute");
        assert!(profile.get("createdAt").is_some());
        assert!(profile.get("password_hash").is_none());
    }

    #[test]
    fn test_blocked_researcher() {
        let mut researcher = Researcher {
            id: Uuid::new_v4(),
            email: "ada@example.org".to_string(),
            username: "ada".to_string(),
            password_hash: "hash".to_string(),
            name: "Ada".to_string(),
            institution: "Example Institute".to_string(),
            remaining_login_attempts: MAX_LOGIN_ATTEMPTS,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!researcher.is_blocked());

        researcher.remaining_login_attempts = 0;
        assert!(researcher.is_blocked());
    }
}
