/// JWT issuance and verification using HS256.
///
/// Access and refresh tokens are signed with distinct secrets, so a token
/// presented in the wrong slot never verifies. Keys are built once at
/// startup from `AuthSettings` and travel with the application state.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthSettings;

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 30;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 90;

/// Claims carried by the short-lived access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (researcher ID)
    pub sub: String,
    /// Random nonce, makes every issued token unique
    pub nonce: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims carried by the long-lived refresh token.
///
/// Deliberately carries no researcher ID: the owner is only recoverable
/// through the stored fingerprint, so a refresh token alone names nobody.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// Random nonce, makes every issued token unique
    pub nonce: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
        }
    }

    pub fn from_settings(auth: &AuthSettings) -> Self {
        Self::new(&auth.access_token_secret, &auth.refresh_token_secret)
    }

    /// Generate a new access token for a researcher
    pub fn issue_access_token(
        &self,
        researcher_id: Uuid,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: researcher_id.to_string(),
            nonce: nonce(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding)
    }

    /// Generate a new refresh token
    pub fn issue_refresh_token(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = RefreshClaims {
            nonce: nonce(),
            iat: now.timestamp(),
            exp: (now + Duration::days(REFRESH_TOKEN_TTL_DAYS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding)
    }

    /// Validate and decode an access token
    pub fn verify_access_token(
        &self,
        token: &str,
    ) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
        let data = decode::<AccessClaims>(
            token,
            &self.access_decoding,
            &Validation::new(jsonwebtoken::Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    /// Validate and decode a refresh token
    pub fn verify_refresh_token(
        &self,
        token: &str,
    ) -> Result<RefreshClaims, jsonwebtoken::errors::Error> {
        let data = decode::<RefreshClaims>(
            token,
            &self.refresh_decoding,
            &Validation::new(jsonwebtoken::Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

fn nonce() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..16).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keys() -> JwtKeys {
        JwtKeys::new("access-secret-for-tests", "refresh-secret-for-tests")
    }

    #[test]
    fn test_issue_access_token() {
        let keys = test_keys();
        let token = keys.issue_access_token(Uuid::new_v4()).unwrap();

        assert!(!token.is_empty());
        // JWT tokens have 3 parts separated by dots
        assert_eq!(token.matches('.').count(), 2);
    }

    #[test]
    fn test_verify_valid_access_token() {
        let keys = test_keys();
        let researcher_id = Uuid::new_v4();

        let token = keys.issue_access_token(researcher_id).unwrap();
        let claims = keys.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, researcher_id.to_string());
        assert!(!claims.nonce.is_empty());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_invalid_token() {
        let keys = test_keys();
        assert!(keys.verify_access_token("not.a.token").is_err());
        assert!(keys.verify_refresh_token("not.a.token").is_err());
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let keys = test_keys();

        let access = keys.issue_access_token(Uuid::new_v4()).unwrap();
        let refresh = keys.issue_refresh_token().unwrap();

        assert!(keys.verify_refresh_token(&access).is_err());
        assert!(keys.verify_access_token(&refresh).is_err());
    }

    #[test]
    fn test_tokens_from_different_keys_are_rejected() {
        let keys = test_keys();
        let other = JwtKeys::new("different-access-secret", "different-refresh-secret");

        let token = other.issue_access_token(Uuid::new_v4()).unwrap();
        let err = keys.verify_access_token(&token).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::InvalidSignature
        ));
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let keys = test_keys();

        let access = keys.issue_access_token(Uuid::new_v4()).unwrap();
        let refresh = keys.issue_refresh_token().unwrap();

        let access_claims = keys.verify_access_token(&access).unwrap();
        let refresh_claims = keys.verify_refresh_token(&refresh).unwrap();

        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn test_expired_access_token_is_rejected() {
        let keys = test_keys();
        let now = Utc::now();
        let claims = AccessClaims {
            sub: Uuid::new_v4().to_string(),
            nonce: nonce(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("access-secret-for-tests".as_bytes()),
        )
        .unwrap();

        let err = keys.verify_access_token(&token).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn test_nonce_makes_consecutive_tokens_distinct() {
        let keys = test_keys();
        let researcher_id = Uuid::new_v4();

        let first = keys.issue_access_token(researcher_id).unwrap();
        let second = keys.issue_access_token(researcher_id).unwrap();
        assert_ne!(first, second);
    }
}
