// HTTP API Error Types
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::api::problem::{Problem, Violation};
use crate::auth::{AuthError, TokenError};
use crate::database::manager::DatabaseError;
use crate::validation::Violations;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationFailed(Vec<Violation>),
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized { realm: Option<String> },

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found (empty body)
    NotFound,

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

/// Deliberately vague: callers must not learn whether the username or the
/// password was wrong.
pub const BAD_CREDENTIALS: &str = "Bad credentials";

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationFailed(_) => "Constraint Violation",
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized { .. } => BAD_CREDENTIALS,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound => "Not Found",
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to problem body; `None` for 404, which has no body
    pub fn to_problem(&self) -> Option<Problem> {
        match self {
            ApiError::ValidationFailed(violations) => Some(Problem::constraint_violation(violations.clone())),
            ApiError::NotFound => None,
            _ => Some(Problem::from_status(self.status_code(), self.message())),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(realm: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            realm: Some(realm.into()),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<Violations> for ApiError {
    fn from(violations: Violations) -> Self {
        ApiError::ValidationFailed(violations.into_vec())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Constraint(msg) => {
                tracing::warn!("Constraint violation: {}", msg);
                ApiError::conflict("The request conflicts with existing data")
            }
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database misconfigured: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::QueryError(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                match sqlx_err {
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                        ApiError::service_unavailable("Database temporarily unavailable")
                    }
                    _ => ApiError::internal_server_error("Database error occurred"),
                }
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserNotFound | AuthError::BadCredentials => {
                tracing::warn!("Authentication rejected: {}", err);
                ApiError::Unauthorized { realm: None }
            }
            AuthError::InvalidHash(msg) => {
                tracing::error!("Unusable stored credential, expected an argon2 PHC hash: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            AuthError::Store(db) => db.into(),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(msg) => {
                tracing::warn!("Bearer token rejected: {}", msg);
                ApiError::Unauthorized { realm: None }
            }
            TokenError::Generation(_) | TokenError::InvalidSecret => {
                tracing::error!("Token service failure: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let challenge = match &self {
            ApiError::Unauthorized { realm: Some(realm) } => {
                HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm)).ok()
            }
            _ => None,
        };

        let mut response = match self.to_problem() {
            Some(problem) => problem.into_response(),
            None => self.status_code().into_response(),
        };

        if let Some(value) = challenge {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}
