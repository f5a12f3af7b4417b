use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use unconv_api::app::Backend;
use unconv_api::auth::hash_password;
use unconv_api::database::models::{User, ROLE_USER};
use unconv_api::database::UserStore;
use unconv_api::{AppConfig, AppContext};

#[derive(Parser)]
#[command(name = "unconv-api", version, about = "Produce catalogue and sensor system REST API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Add a user that may call mutating endpoints
    CreateUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Repeat for several roles
        #[arg(long = "role", default_values_t = vec![ROLE_USER.to_string()])]
        roles: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateUser {
            username,
            password,
            roles,
        } => create_user(config, username, password, roles).await,
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    tracing::info!("Starting unconv-api in {:?} mode", config.environment);
    if config.is_development() {
        tracing::warn!("Using development defaults; set APP_ENV for staging or production");
    }
    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is empty; bearer tokens are disabled");
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let ctx = AppContext::from_config(config).await.context("failed to initialise stores")?;
    let app = ctx.router();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn create_user(config: AppConfig, username: String, password: String, roles: Vec<String>) -> Result<()> {
    if username.trim().is_empty() || password.is_empty() {
        bail!("username and password must not be empty");
    }

    let ctx = AppContext::from_config(config).await.context("failed to initialise stores")?;
    if matches!(ctx.backend, Backend::Memory(_)) {
        bail!("create-user needs DATABASE_URL; in-memory users vanish when the command exits");
    }

    let user = User {
        id: Uuid::new_v4(),
        username,
        password: hash_password(&password)?,
        roles,
    };
    let created = ctx.users.insert(&user).await.context("failed to store user")?;

    tracing::info!("Created user {} with roles {:?}", created.username, created.roles);
    Ok(())
}
