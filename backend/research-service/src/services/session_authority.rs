//! Account registration and the session lifecycle: issuance, verification
//! with transparent rotation, login with lockout, logout.
//!
//! Every session is a pair of JWTs plus one `token_pairs` row holding their
//! fingerprints. The access token authenticates statelessly for its 30
//! minutes; once it dies, the refresh token is exchanged for a whole new
//! pair and the old row is deleted in the same transaction. A refresh token
//! whose row is gone is dead, which is what makes each one single-use.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{researcher_repo, token_repo};
use crate::error::AuthFailure;
use crate::models::{NewResearcher, NewTokenPair, Researcher, TokenPair};
use crate::security::{password, sha256_hex, JwtKeys};

/// Researcher account creation, lookups, and lockout bookkeeping.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create(&self, account: &NewResearcher) -> Result<Researcher, sqlx::Error>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Researcher>, sqlx::Error>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Researcher>, sqlx::Error>;
    async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error>;
    async fn username_exists(&self, username: &str) -> Result<bool, sqlx::Error>;
    async fn record_failed_login(&self, id: Uuid) -> Result<Researcher, sqlx::Error>;
    async fn reset_login_attempts(&self, id: Uuid) -> Result<(), sqlx::Error>;
}

/// Token pair persistence keyed by refresh token fingerprint.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert_pair(&self, pair: &NewTokenPair) -> Result<(), sqlx::Error>;
    async fn find_by_refresh_hash(
        &self,
        refresh_hash: &str,
    ) -> Result<Option<TokenPair>, sqlx::Error>;
    /// Atomic exchange; false means the presented token was already spent.
    async fn rotate_pair(
        &self,
        old_refresh_hash: &str,
        replacement: &NewTokenPair,
    ) -> Result<bool, sqlx::Error>;
    async fn delete_by_refresh_hash(&self, refresh_hash: &str) -> Result<bool, sqlx::Error>;
    async fn delete_all_for_researcher(&self, researcher_id: Uuid) -> Result<u64, sqlx::Error>;
}

/// Postgres-backed store used in production.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create(&self, account: &NewResearcher) -> Result<Researcher, sqlx::Error> {
        researcher_repo::create_researcher(&self.pool, account).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Researcher>, sqlx::Error> {
        researcher_repo::find_by_id(&self.pool, id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Researcher>, sqlx::Error> {
        researcher_repo::find_by_email(&self.pool, email).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        researcher_repo::email_exists(&self.pool, email).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, sqlx::Error> {
        researcher_repo::username_exists(&self.pool, username).await
    }

    async fn record_failed_login(&self, id: Uuid) -> Result<Researcher, sqlx::Error> {
        researcher_repo::record_failed_login(&self.pool, id).await
    }

    async fn reset_login_attempts(&self, id: Uuid) -> Result<(), sqlx::Error> {
        researcher_repo::reset_login_attempts(&self.pool, id).await
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert_pair(&self, pair: &NewTokenPair) -> Result<(), sqlx::Error> {
        token_repo::insert_pair(&self.pool, pair).await.map(|_| ())
    }

    async fn find_by_refresh_hash(
        &self,
        refresh_hash: &str,
    ) -> Result<Option<TokenPair>, sqlx::Error> {
        token_repo::find_by_refresh_hash(&self.pool, refresh_hash).await
    }

    async fn rotate_pair(
        &self,
        old_refresh_hash: &str,
        replacement: &NewTokenPair,
    ) -> Result<bool, sqlx::Error> {
        token_repo::rotate_pair(&self.pool, old_refresh_hash, replacement).await
    }

    async fn delete_by_refresh_hash(&self, refresh_hash: &str) -> Result<bool, sqlx::Error> {
        token_repo::delete_by_refresh_hash(&self.pool, refresh_hash).await
    }

    async fn delete_all_for_researcher(&self, researcher_id: Uuid) -> Result<u64, sqlx::Error> {
        token_repo::delete_all_for_researcher(&self.pool, researcher_id).await
    }
}

/// Raw token pair as handed to the client. Only fingerprints of these
/// strings are ever stored.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Outcome of a successful `authenticate` call.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub researcher_id: Uuid,
    /// Present when the access token was dead and the refresh token was
    /// exchanged. The HTTP layer must hand these to the client.
    pub rotated: Option<IssuedTokens>,
    presented_refresh: Option<String>,
}

impl AuthenticatedSession {
    /// The refresh token currently bound to this session: the rotated one
    /// when an exchange just happened, otherwise the one presented.
    pub fn live_refresh_token(&self) -> Option<&str> {
        self.rotated
            .as_ref()
            .map(|tokens| tokens.refresh_token.as_str())
            .or(self.presented_refresh.as_deref())
    }
}

pub struct SessionAuthority<S> {
    keys: JwtKeys,
    store: S,
}

pub type PgSessionAuthority = SessionAuthority<PgStore>;

impl<S: Clone> Clone for SessionAuthority<S> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S> SessionAuthority<S>
where
    S: AccountStore + TokenStore,
{
    pub fn new(keys: JwtKeys, store: S) -> Self {
        Self { keys, store }
    }

    /// Create an account and open its first session.
    ///
    /// The uniqueness pre-checks give the form its field-level errors. The
    /// unique indexes stay authoritative: a concurrent registration that
    /// slips past both checks still comes back as the taken-field failure,
    /// not a server fault.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        wire_digest: &str,
        name: &str,
        institution: &str,
    ) -> Result<(Researcher, IssuedTokens), AuthFailure> {
        if self.store.email_exists(email).await? {
            return Err(AuthFailure::EmailTaken);
        }
        if self.store.username_exists(username).await? {
            return Err(AuthFailure::UsernameTaken);
        }

        let account = NewResearcher {
            email: email.to_owned(),
            username: username.to_owned(),
            password_hash: password::hash_password(wire_digest)?,
            name: name.to_owned(),
            institution: institution.to_owned(),
        };

        let researcher = match self.store.create(&account).await {
            Ok(researcher) => researcher,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(taken_field(e.constraint()));
            }
            Err(err) => return Err(err.into()),
        };

        let tokens = self.issue_session(researcher.id).await?;
        tracing::info!(
            researcher_id = %researcher.id,
            username = %researcher.username,
            "Researcher registered"
        );

        Ok((researcher, tokens))
    }

    /// Issue a fresh token pair and record its fingerprints.
    ///
    /// A failed insert is logged and swallowed: the client still gets a
    /// working session, it just cannot be refreshed once the access token
    /// expires.
    pub async fn issue_session(&self, researcher_id: Uuid) -> Result<IssuedTokens, AuthFailure> {
        let access_token = self
            .keys
            .issue_access_token(researcher_id)
            .map_err(|e| AuthFailure::Unexpected(e.to_string()))?;
        let refresh_token = self
            .keys
            .issue_refresh_token()
            .map_err(|e| AuthFailure::Unexpected(e.to_string()))?;

        let pair = NewTokenPair {
            researcher_id,
            access_token_hash: sha256_hex(&access_token),
            refresh_token_hash: sha256_hex(&refresh_token),
        };

        if let Err(err) = self.store.insert_pair(&pair).await {
            tracing::warn!(
                researcher_id = %researcher_id,
                error = %err,
                "Failed to persist token pair; session will not survive past the access token"
            );
        }

        Ok(IssuedTokens {
            access_token,
            refresh_token,
        })
    }

    /// Verify a session from its cookies.
    ///
    /// A live access token authenticates on its own. A dead one falls
    /// through to the refresh token, which when valid is exchanged for a
    /// brand new pair; the caller forwards the rotated tokens to the
    /// client. Replaying a spent refresh token fails because its row is
    /// gone.
    pub async fn authenticate(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<AuthenticatedSession, AuthFailure> {
        let access_token = access_token.ok_or(AuthFailure::NoAccessToken)?;

        match self.keys.verify_access_token(access_token) {
            Ok(claims) => {
                let researcher_id = Uuid::parse_str(&claims.sub)
                    .map_err(|e| AuthFailure::Unexpected(format!("Malformed subject claim: {e}")))?;

                let researcher = self
                    .store
                    .find_by_id(researcher_id)
                    .await?
                    .ok_or(AuthFailure::AccountNotFound)?;
                if researcher.is_blocked() {
                    return Err(AuthFailure::AccountBlocked);
                }

                Ok(AuthenticatedSession {
                    researcher_id,
                    rotated: None,
                    presented_refresh: refresh_token.map(str::to_owned),
                })
            }
            Err(err) if is_token_defect(&err) => self.refresh_session(refresh_token).await,
            Err(err) => Err(AuthFailure::Unexpected(err.to_string())),
        }
    }

    /// Exchange a refresh token for a new pair (single use).
    async fn refresh_session(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<AuthenticatedSession, AuthFailure> {
        let refresh_token = refresh_token.ok_or(AuthFailure::NoRefreshToken)?;

        if let Err(err) = self.keys.verify_refresh_token(refresh_token) {
            return Err(if is_token_defect(&err) {
                AuthFailure::InvalidRefreshToken
            } else {
                AuthFailure::Unexpected(err.to_string())
            });
        }

        // The claims name no account; the stored fingerprint does.
        let presented_hash = sha256_hex(refresh_token);
        let record = self
            .store
            .find_by_refresh_hash(&presented_hash)
            .await?
            .ok_or(AuthFailure::InvalidRefreshToken)?;

        let researcher = self
            .store
            .find_by_id(record.researcher_id)
            .await?
            .ok_or(AuthFailure::AccountNotFound)?;
        if researcher.is_blocked() {
            return Err(AuthFailure::AccountBlocked);
        }

        let access_token = self
            .keys
            .issue_access_token(record.researcher_id)
            .map_err(|e| AuthFailure::Unexpected(e.to_string()))?;
        let new_refresh_token = self
            .keys
            .issue_refresh_token()
            .map_err(|e| AuthFailure::Unexpected(e.to_string()))?;

        let replacement = NewTokenPair {
            researcher_id: record.researcher_id,
            access_token_hash: sha256_hex(&access_token),
            refresh_token_hash: sha256_hex(&new_refresh_token),
        };

        if !self.store.rotate_pair(&presented_hash, &replacement).await? {
            // Lost the race: a concurrent request spent this token first.
            return Err(AuthFailure::InvalidRefreshToken);
        }

        tracing::info!(researcher_id = %record.researcher_id, "Refresh token exchanged");

        Ok(AuthenticatedSession {
            researcher_id: record.researcher_id,
            rotated: Some(IssuedTokens {
                access_token,
                refresh_token: new_refresh_token,
            }),
            presented_refresh: Some(refresh_token.to_owned()),
        })
    }

    /// Password login. Counts down the attempt budget on wrong passwords,
    /// refills it on success, and replaces whatever session the browser
    /// was carrying before issuing the new pair.
    pub async fn login(
        &self,
        email: &str,
        wire_digest: &str,
        presented_refresh: Option<&str>,
    ) -> Result<(Researcher, IssuedTokens), AuthFailure> {
        let researcher = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthFailure::UnknownEmail)?;

        // Blocked wins over a wrong password: no probing a locked account.
        if researcher.is_blocked() {
            return Err(AuthFailure::AccountBlocked);
        }

        if let Err(failure) = password::verify_password(wire_digest, &researcher.password_hash) {
            if failure == AuthFailure::IncorrectPassword {
                let updated = self.store.record_failed_login(researcher.id).await?;
                tracing::warn!(
                    researcher_id = %researcher.id,
                    remaining = updated.remaining_login_attempts,
                    "Failed login attempt"
                );
            }
            return Err(failure);
        }

        self.store.reset_login_attempts(researcher.id).await?;

        // Session replacement before issuance: drop the session this
        // browser presented, or every session when it presented none.
        match presented_refresh {
            Some(token) => {
                self.store
                    .delete_by_refresh_hash(&sha256_hex(token))
                    .await?;
            }
            None => {
                self.store.delete_all_for_researcher(researcher.id).await?;
            }
        }

        let tokens = self.issue_session(researcher.id).await?;
        tracing::info!(researcher_id = %researcher.id, "Researcher logged in");

        Ok((researcher, tokens))
    }

    /// Close the current session. Deleting an already-gone record is a
    /// graceful no-op, so logout never fails on a stale cookie.
    pub async fn logout(&self, session: &AuthenticatedSession) -> Result<(), AuthFailure> {
        if let Some(refresh_token) = session.live_refresh_token() {
            let removed = self
                .store
                .delete_by_refresh_hash(&sha256_hex(refresh_token))
                .await?;
            if removed {
                tracing::info!(researcher_id = %session.researcher_id, "Session closed");
            }
        }
        Ok(())
    }
}

/// Which unique index a racing registration tripped. Only email and
/// username carry unique constraints on the researchers table.
fn taken_field(constraint: Option<&str>) -> AuthFailure {
    match constraint {
        Some(name) if name.contains("username") => AuthFailure::UsernameTaken,
        _ => AuthFailure::EmailTaken,
    }
}

/// Token-shaped verification failures: expiry, bad signature, garbage
/// input. These mean "this token does not authenticate", as opposed to a
/// server-side fault with the keys themselves.
fn is_token_defect(err: &jsonwebtoken::errors::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::ExpiredSignature
            | ErrorKind::ImmatureSignature
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_defects_fall_through() {
        for kind in [
            ErrorKind::ExpiredSignature,
            ErrorKind::InvalidSignature,
            ErrorKind::InvalidToken,
        ] {
            let err = jsonwebtoken::errors::Error::from(kind);
            assert!(is_token_defect(&err));
        }
    }

    #[test]
    fn test_key_faults_do_not_fall_through() {
        let err = jsonwebtoken::errors::Error::from(ErrorKind::InvalidKeyFormat);
        assert!(!is_token_defect(&err));
    }

    #[test]
    fn test_taken_field_names_the_constraint() {
        assert_eq!(
            taken_field(Some("researchers_username_key")),
            AuthFailure::UsernameTaken
        );
        assert_eq!(
            taken_field(Some("researchers_email_key")),
            AuthFailure::EmailTaken
        );
        assert_eq!(taken_field(None), AuthFailure::EmailTaken);
    }

    #[test]
    fn test_live_refresh_token_prefers_rotated() {
        let session = AuthenticatedSession {
            researcher_id: Uuid::new_v4(),
            rotated: Some(IssuedTokens {
                access_token: "new-access".to_string(),
                refresh_token: "new-refresh".to_string(),
            }),
            presented_refresh: Some("old-refresh".to_string()),
        };
        assert_eq!(session.live_refresh_token(), Some("new-refresh"));

        let unrotated = AuthenticatedSession {
            researcher_id: Uuid::new_v4(),
            rotated: None,
            presented_refresh: Some("old-refresh".to_string()),
        };
        assert_eq!(unrotated.live_refresh_token(), Some("old-refresh"));
    }
}
