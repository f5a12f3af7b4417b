use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::auth::{Authenticator, Principal, TokenService};
use crate::config::SecurityConfig;
use crate::database::models::ROLE_USER;
use crate::error::ApiError;

use super::csrf::is_safe_method;

/// Everything the security layers need, shared by the login endpoint
#[derive(Clone)]
pub struct SecurityState {
    pub authenticator: Authenticator,
    pub tokens: TokenService,
    pub realm: String,
    pub csrf_enabled: bool,
}

impl SecurityState {
    pub fn new(config: &SecurityConfig, authenticator: Authenticator) -> Self {
        Self {
            authenticator,
            tokens: TokenService::new(config),
            realm: config.realm.clone(),
            csrf_enabled: config.csrf_enabled,
        }
    }
}

enum Credentials {
    Basic { username: String, password: String },
    Bearer(String),
}

/// Authenticates unsafe requests and requires the `USER` role.
///
/// Safe methods pass through untouched. On success the [`Principal`] is
/// available to handlers as a request extension.
pub async fn require_user(
    State(security): State<SecurityState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_safe_method(request.method()) {
        return Ok(next.run(request).await);
    }

    let principal = authenticate(&security, request.headers()).await?;

    if !principal.has_role(ROLE_USER) {
        tracing::warn!("User {} lacks role {}", principal.username, ROLE_USER);
        return Err(ApiError::forbidden("Access is denied"));
    }

    tracing::debug!("Authenticated {} for {} {}", principal.username, request.method(), request.uri().path());
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

async fn authenticate(security: &SecurityState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let challenge = |err: ApiError| match err {
        ApiError::Unauthorized { .. } => ApiError::unauthorized(&security.realm),
        other => other,
    };

    match extract_credentials(headers) {
        Some(Credentials::Basic { username, password }) => security
            .authenticator
            .authenticate(&username, &password)
            .await
            .map_err(|e| challenge(e.into())),
        Some(Credentials::Bearer(token)) => security.tokens.validate(&token).map_err(|e| challenge(e.into())),
        None => Err(ApiError::unauthorized(&security.realm)),
    }
}

/// Parse the Authorization header; anything unrecognised counts as absent
fn extract_credentials(headers: &HeaderMap) -> Option<Credentials> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, rest) = value.trim().split_once(' ')?;
    let rest = rest.trim();

    if scheme.eq_ignore_ascii_case("basic") {
        let decoded = STANDARD.decode(rest).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        })
    } else if scheme.eq_ignore_ascii_case("bearer") && !rest.is_empty() {
        Some(Credentials::Bearer(rest.to_string()))
    } else {
        None
    }
}
