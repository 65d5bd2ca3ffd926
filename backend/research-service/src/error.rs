use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Session verification and login failures.
///
/// `authenticate` and `login` report through this enum; the HTTP layer
/// decides the status code per call site (a blocked account is 403 at the
/// middleware gate but 400 on the login form).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("No access token provided")]
    NoAccessToken,

    #[error("No refresh token provided")]
    NoRefreshToken,

    #[error("Refresh token is invalid or already used")]
    InvalidRefreshToken,

    #[error("Account is blocked")]
    AccountBlocked,

    #[error("Account no longer exists")]
    AccountNotFound,

    #[error("No account for this email")]
    UnknownEmail,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl From<sqlx::Error> for AuthFailure {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error during session check: {}", err);
        AuthFailure::Unexpected(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_type = match self {
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Authentication(_) => "AUTHENTICATION_ERROR",
            ApiError::Authorization(_) => "AUTHORIZATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
        };

        let message = self.to_string();
        let details = match self {
            ApiError::Database(e) => Some(e.to_string()),
            _ => None,
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        HttpResponse::build(status_code).json(error_response)
    }
}

// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

/// Status mapping used by the session gate on protected routes and by
/// registration. Login uses its own 400 mapping instead (see
/// handlers::auth).
impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::NoAccessToken
            | AuthFailure::NoRefreshToken
            | AuthFailure::AccountNotFound => ApiError::Authentication(failure.to_string()),
            AuthFailure::InvalidRefreshToken | AuthFailure::AccountBlocked => {
                ApiError::Authorization(failure.to_string())
            }
            AuthFailure::UnknownEmail | AuthFailure::IncorrectPassword => {
                ApiError::Authentication(failure.to_string())
            }
            AuthFailure::EmailTaken | AuthFailure::UsernameTaken => {
                ApiError::Validation(failure.to_string())
            }
            AuthFailure::Unexpected(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_status_mapping() {
        let cases = [
            (AuthFailure::NoAccessToken, StatusCode::UNAUTHORIZED),
            (AuthFailure::NoRefreshToken, StatusCode::UNAUTHORIZED),
            (AuthFailure::AccountNotFound, StatusCode::UNAUTHORIZED),
            (AuthFailure::InvalidRefreshToken, StatusCode::FORBIDDEN),
            (AuthFailure::AccountBlocked, StatusCode::FORBIDDEN),
            (
                AuthFailure::Unexpected("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (failure, expected) in cases {
            let api: ApiError = failure.into();
            assert_eq!(api.status_code(), expected);
        }
    }

    #[test]
    fn test_not_found_is_404() {
        let err = ApiError::NotFound("patient".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_identity_maps_to_400() {
        for failure in [AuthFailure::EmailTaken, AuthFailure::UsernameTaken] {
            let api: ApiError = failure.into();
            assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        }

        let api: ApiError = AuthFailure::EmailTaken.into();
        assert!(api.to_string().contains("already registered"));
    }

    #[test]
    fn test_validation_errors_convert_to_400() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("code", validator::ValidationError::new("length"));
        let err: ApiError = errors.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
