pub mod auth;
pub mod csrf;

pub use auth::{require_user, SecurityState};
pub use csrf::{csrf_protection, generate_token, token_cookie, CSRF_COOKIE, CSRF_HEADER};
