use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::User;

/// Read access to user records for the authentication check, plus insert
/// for the `create-user` command.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn insert(&self, user: &User) -> Result<User, DatabaseError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, roles FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, password, roles) VALUES ($1, $2, $3, $4) \
             RETURNING id, username, password, roles",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.roles)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert(&self, user: &User) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(DatabaseError::Constraint(format!("username '{}' already exists", user.username)));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(user.clone())
    }
}
