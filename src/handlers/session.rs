// GET /csrf and POST /auth/login

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::api::ValidJson;
use crate::error::ApiResult;
use crate::middleware::{generate_token, token_cookie, SecurityState, CSRF_HEADER};
use crate::validation::Violations;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfToken {
    pub token: String,
    pub header_name: &'static str,
}

/// Exchange a username and password for a bearer token
pub async fn login(
    State(security): State<SecurityState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let mut violations = Violations::new();
    let username = violations.not_empty("username", request.username, "Username cannot be empty");
    let password = violations.not_empty("password", request.password, "Password cannot be empty");
    let (username, password) = violations.finish(username.zip(password))?;

    let principal = security.authenticator.authenticate(&username, &password).await?;
    let token = security.tokens.issue(&principal)?;
    tracing::info!("Issued token for {}", principal.username);

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: security.tokens.expires_in_secs(),
        username: principal.username,
    }))
}

/// Issue a double-submit token as both cookie and body
pub async fn csrf_token(jar: CookieJar) -> (CookieJar, Json<CsrfToken>) {
    let token = generate_token();
    let jar = jar.add(token_cookie(token.clone()));
    (
        jar,
        Json(CsrfToken {
            token,
            header_name: CSRF_HEADER,
        }),
    )
}
