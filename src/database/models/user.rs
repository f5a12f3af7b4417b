use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ROLE_USER: &str = "USER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2 PHC string, never the plaintext
    #[serde(skip_serializing)]
    pub password: String,
    pub roles: Vec<String>,
}
