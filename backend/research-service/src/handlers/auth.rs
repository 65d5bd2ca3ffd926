//! Registration, login, and logout, plus the session cookie contract.
//!
//! Both session cookies are HttpOnly; in production and staging they are
//! additionally Secure with SameSite=None so the browser client can ride
//! cross-site, relaxed to SameSite=Lax in development.

use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    web, HttpRequest, HttpResponse,
};
use validator::Validate;

use crate::config::ServerSettings;
use crate::error::{ApiError, AuthFailure, Result};
use crate::middleware::CurrentSession;
use crate::models::researcher::{LoginRequest, RegisterRequest, SessionResponse};
use crate::services::IssuedTokens;
use crate::AppState;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Cookie lifetimes in seconds, matching the token validity windows.
const ACCESS_COOKIE_TTL: i64 = 30 * 60;
const REFRESH_COOKIE_TTL: i64 = 90 * 24 * 60 * 60;

/// POST /auth/register
///
/// Duplicate email or username comes back as a 400 with the taken field
/// named, whether caught by the pre-checks or by the unique index under a
/// concurrent registration.
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let (researcher, tokens) = state
        .authority
        .register(
            &payload.email,
            &payload.username,
            &payload.password,
            &payload.name,
            &payload.institution,
        )
        .await?;

    let (access, refresh) = session_cookies(&tokens, &state.settings.server);
    Ok(HttpResponse::Ok()
        .cookie(access)
        .cookie(refresh)
        .json(SessionResponse::from(&researcher)))
}

/// POST /auth/login
///
/// A refresh cookie presented alongside the credentials marks the session
/// this browser is replacing; with no cookie, every stored session for the
/// account is purged before the new pair is issued.
pub async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let presented_refresh = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());

    let (researcher, tokens) = state
        .authority
        .login(&payload.email, &payload.password, presented_refresh.as_deref())
        .await
        .map_err(login_failure)?;

    let (access, refresh) = session_cookies(&tokens, &state.settings.server);
    Ok(HttpResponse::Ok()
        .cookie(access)
        .cookie(refresh)
        .json(SessionResponse::from(&researcher)))
}

/// POST /auth/logout
///
/// Runs behind the session gate. The clearing cookies double as the signal
/// to the gate that no rotated pair should be attached to this response.
pub async fn logout(state: web::Data<AppState>, session: CurrentSession) -> Result<HttpResponse> {
    state.authority.logout(&session.0).await?;

    let (access, refresh) = clearing_cookies(&state.settings.server);
    Ok(HttpResponse::Ok()
        .cookie(access)
        .cookie(refresh)
        .json(serde_json::json!({ "message": "Logged out" })))
}

/// Build the paired session cookies for an issued token pair.
pub fn session_cookies(
    tokens: &IssuedTokens,
    server: &ServerSettings,
) -> (Cookie<'static>, Cookie<'static>) {
    (
        session_cookie(
            ACCESS_COOKIE,
            tokens.access_token.clone(),
            Duration::seconds(ACCESS_COOKIE_TTL),
            server,
        ),
        session_cookie(
            REFRESH_COOKIE,
            tokens.refresh_token.clone(),
            Duration::seconds(REFRESH_COOKIE_TTL),
            server,
        ),
    )
}

/// Expired replacements that make the browser drop both session cookies.
pub fn clearing_cookies(server: &ServerSettings) -> (Cookie<'static>, Cookie<'static>) {
    (
        session_cookie(ACCESS_COOKIE, String::new(), Duration::ZERO, server),
        session_cookie(REFRESH_COOKIE, String::new(), Duration::ZERO, server),
    )
}

fn session_cookie(
    name: &'static str,
    value: String,
    max_age: Duration,
    server: &ServerSettings,
) -> Cookie<'static> {
    let builder = Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .max_age(max_age);

    let builder = if server.secure_cookies() {
        builder.secure(true).same_site(SameSite::None)
    } else {
        builder.same_site(SameSite::Lax)
    };

    builder.finish()
}

/// Login reports every credential failure as a 400 with the reason in the
/// message; the form shows it verbatim. Contrast with the gate mapping in
/// `error.rs`, which covers already-established sessions.
fn login_failure(failure: AuthFailure) -> ApiError {
    match failure {
        AuthFailure::AccountBlocked => ApiError::BadRequest(
            "Password entered incorrectly three times, please reset your password".to_string(),
        ),
        AuthFailure::UnknownEmail | AuthFailure::IncorrectPassword => {
            ApiError::BadRequest(failure.to_string())
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{error::ResponseError, http::StatusCode};

    fn server(app_env: &str) -> ServerSettings {
        ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 8080,
            app_env: app_env.to_string(),
            allowed_origin: "http://localhost:3000".to_string(),
        }
    }

    fn tokens() -> IssuedTokens {
        IssuedTokens {
            access_token: "access.jwt.value".to_string(),
            refresh_token: "refresh.jwt.value".to_string(),
        }
    }

    #[test]
    fn test_development_cookies_are_lax_and_not_secure() {
        let (access, refresh) = session_cookies(&tokens(), &server("development"));

        assert_eq!(access.name(), ACCESS_COOKIE);
        assert_eq!(access.value(), "access.jwt.value");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.secure(), None);
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(access.max_age(), Some(Duration::seconds(1_800)));

        assert_eq!(refresh.name(), REFRESH_COOKIE);
        assert_eq!(refresh.max_age(), Some(Duration::seconds(7_776_000)));
    }

    #[test]
    fn test_production_cookies_are_secure_cross_site() {
        let (access, refresh) = session_cookies(&tokens(), &server("production"));

        assert_eq!(access.secure(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::None));
        assert_eq!(refresh.secure(), Some(true));
        assert_eq!(refresh.same_site(), Some(SameSite::None));
        assert_eq!(refresh.http_only(), Some(true));
    }

    #[test]
    fn test_clearing_cookies_expire_immediately() {
        let (access, refresh) = clearing_cookies(&server("development"));

        assert_eq!(access.value(), "");
        assert_eq!(access.max_age(), Some(Duration::ZERO));
        assert_eq!(refresh.value(), "");
        assert_eq!(refresh.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn test_login_failures_map_to_400() {
        for failure in [
            AuthFailure::AccountBlocked,
            AuthFailure::UnknownEmail,
            AuthFailure::IncorrectPassword,
        ] {
            let api = login_failure(failure);
            assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_blocked_login_message_mentions_reset() {
        let api = login_failure(AuthFailure::AccountBlocked);
        assert!(api.to_string().contains("reset your password"));
    }

    #[test]
    fn test_unexpected_login_failure_is_500() {
        let api = login_failure(AuthFailure::Unexpected("store down".to_string()));
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
