#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use unconv_api::auth::hash_password;
use unconv_api::database::models::{User, ROLE_USER};
use unconv_api::database::UserStore;
use unconv_api::{AppConfig, AppContext};

pub const USERNAME: &str = "username";
pub const PASSWORD: &str = "password";
/// Seeded user holding no roles at all
pub const GUEST: &str = "guest";

const XSRF: &str = "integration-xsrf";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serve a fresh in-memory app on an unused port.
    ///
    /// Each `#[tokio::test]` owns its runtime, so every test gets its own
    /// server task.
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;

        let ctx = AppContext::in_memory(config);
        seed_user(&ctx, USERNAME, PASSWORD, &[ROLE_USER]).await?;
        seed_user(&ctx, GUEST, PASSWORD, &[]).await?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        let app = ctx.router();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Mutating request carrying a matching CSRF cookie/header pair and
    /// Basic credentials of the seeded `USER`.
    pub fn authorized(&self, method: Method, path: &str) -> RequestBuilder {
        self.with_csrf(method, path).basic_auth(USERNAME, Some(PASSWORD))
    }

    pub fn with_csrf(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("Cookie", format!("XSRF-TOKEN={}", XSRF))
            .header("X-XSRF-TOKEN", XSRF)
    }

    /// POST `body` to `/<entity>` and return the created JSON
    pub async fn create(&self, entity: &str, body: Value) -> Result<Value> {
        let res = self
            .authorized(Method::POST, &format!("/{}", entity))
            .json(&body)
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create {} failed: {}", entity, res.status());
        Ok(res.json().await?)
    }
}

async fn seed_user(ctx: &AppContext, username: &str, password: &str, roles: &[&str]) -> Result<()> {
    ctx.users
        .insert(&User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password: hash_password(password)?,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        })
        .await?;
    Ok(())
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap_or_default().to_string()
}
