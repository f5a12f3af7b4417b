//! Application assembly: stores, services, security layers and routes.

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::Authenticator;
use crate::config::AppConfig;
use crate::database::models::{Fruit, FruitProduct, Heater, Offer, SensorLocation, SensorSystem};
use crate::database::{
    DatabaseError, DatabaseManager, Entity, EntityStore, MemoryDatabase, MemoryUserStore, PgUserStore, Repository,
    UserStore,
};
use crate::handlers::{self, entity};
use crate::middleware::{csrf_protection, require_user, SecurityState};
use crate::services::EntityService;

/// Where entity rows live
#[derive(Clone)]
pub enum Backend {
    Postgres(PgPool),
    Memory(MemoryDatabase),
}

impl Backend {
    pub fn pool(&self) -> Option<PgPool> {
        match self {
            Backend::Postgres(pool) => Some(pool.clone()),
            Backend::Memory(_) => None,
        }
    }

    pub fn store<E: Entity>(&self) -> Arc<dyn EntityStore<E>> {
        match self {
            Backend::Postgres(pool) => Arc::new(Repository::<E>::new(pool.clone())),
            Backend::Memory(db) => db.store::<E>(),
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub backend: Backend,
    pub users: Arc<dyn UserStore>,
}

impl AppContext {
    /// Connects to PostgreSQL when a URL is configured, otherwise keeps
    /// everything in process memory.
    pub async fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        if config.database.url.is_none() {
            tracing::warn!("DATABASE_URL not set, using in-memory stores; data is lost on exit");
            return Ok(Self::in_memory(config));
        }

        let pool = DatabaseManager::connect(&config.database).await?;
        Ok(Self::postgres(config, pool))
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config,
            backend: Backend::Memory(MemoryDatabase::new()),
            users: Arc::new(MemoryUserStore::new()),
        }
    }

    pub fn postgres(config: AppConfig, pool: PgPool) -> Self {
        Self {
            config,
            users: Arc::new(PgUserStore::new(pool.clone())),
            backend: Backend::Postgres(pool),
        }
    }

    fn service<E: Entity>(&self) -> EntityService<E> {
        EntityService::new(self.backend.store::<E>(), self.config.pagination)
    }

    pub fn router(&self) -> Router {
        let security = SecurityState::new(&self.config.security, Authenticator::new(Arc::clone(&self.users)));

        // route_layer: the last layer added runs first, so CSRF is checked
        // before credentials.
        let entities = Router::new()
            .merge(entity::routes(self.service::<Heater>()))
            .merge(entity::routes(self.service::<Fruit>()))
            .merge(entity::routes(self.service::<Offer>()))
            .merge(entity::routes(self.service::<FruitProduct>()))
            .merge(entity::routes(self.service::<SensorLocation>()))
            .merge(entity::routes(self.service::<SensorSystem>()))
            .route_layer(from_fn_with_state(security.clone(), require_user))
            .route_layer(from_fn_with_state(security.clone(), csrf_protection));

        let session = Router::new()
            .route("/auth/login", post(handlers::login))
            .route("/csrf", get(handlers::csrf_token))
            .with_state(security);

        let health = Router::new()
            .route("/health", get(handlers::health))
            .with_state(self.backend.pool());

        Router::new()
            .merge(health)
            .merge(session)
            .merge(entities)
            .layer(self.cors())
            .layer(TraceLayer::new_for_http())
    }

    fn cors(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .config
            .security
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-xsrf-token"),
            ])
            .expose_headers([header::WWW_AUTHENTICATE])
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::database::models::{User, ROLE_USER};
    use crate::middleware::CSRF_HEADER;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    const TOKEN: &str = "test-token";

    async fn app_with_user(roles: &[&str]) -> Router {
        let ctx = AppContext::in_memory(AppConfig::development());
        ctx.users
            .insert(&User {
                id: Uuid::new_v4(),
                username: "username".into(),
                password: hash_password("password").unwrap(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
            })
            .await
            .unwrap();
        ctx.router()
    }

    fn basic() -> String {
        format!("Basic {}", STANDARD.encode("username:password"))
    }

    fn mutation(method: Method, uri: &str, body: Value, csrf: bool, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if csrf {
            builder = builder
                .header(header::COOKIE, format!("XSRF-TOKEN={}", TOKEN))
                .header(CSRF_HEADER, TOKEN);
        }
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn mutation_without_csrf_is_forbidden() {
        let app = app_with_user(&[ROLE_USER]).await;
        let response = app
            .oneshot(mutation(Method::POST, "/Heater", json!({"text": "warm"}), false, Some(&basic())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn mutation_without_credentials_is_challenged() {
        let app = app_with_user(&[ROLE_USER]).await;
        let response = app
            .oneshot(mutation(Method::POST, "/Heater", json!({"text": "warm"}), true, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Basic realm=\"unconv\"");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = app_with_user(&[ROLE_USER]).await;
        let auth = format!("Basic {}", STANDARD.encode("username:nope"));
        let response = app
            .oneshot(mutation(Method::POST, "/Heater", json!({"text": "warm"}), true, Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["detail"], "Bad credentials");
    }

    #[tokio::test]
    async fn user_without_role_is_forbidden() {
        let app = app_with_user(&[]).await;
        let response = app
            .oneshot(mutation(Method::POST, "/Heater", json!({"text": "warm"}), true, Some(&basic())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn authorized_create_returns_created_entity() {
        let app = app_with_user(&[ROLE_USER]).await;
        let response = app
            .oneshot(mutation(Method::POST, "/Heater", json!({"text": "warm"}), true, Some(&basic())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["text"], "warm");
        assert!(Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request_problem() {
        let app = app_with_user(&[ROLE_USER]).await;
        let mut request = mutation(Method::POST, "/Heater", json!({}), true, Some(&basic()));
        *request.body_mut() = Body::from("{ not json");
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/problem+json");
        assert_eq!(json_body(response).await["title"], "Bad Request");
    }

    #[tokio::test]
    async fn reads_are_public_and_unknown_ids_are_empty_404() {
        let app = app_with_user(&[ROLE_USER]).await;

        let response = app.clone().oneshot(get_req("/Fruit")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = json_body(response).await;
        assert_eq!(page["totalPages"], 0);
        assert_eq!(page["isFirst"], true);
        assert_eq!(page["isLast"], true);

        let response = app.clone().oneshot(get_req("/Fruit/not-a-uuid")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());

        let response = app.oneshot(get_req(&format!("/Fruit/{}", Uuid::new_v4()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn undecodable_query_is_bad_request_problem() {
        let app = app_with_user(&[ROLE_USER]).await;
        let response = app.oneshot(get_req("/Heater?page=1&page=2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/problem+json");
        assert_eq!(json_body(response).await["title"], "Bad Request");
    }

    #[tokio::test]
    async fn bad_page_size_is_constraint_problem() {
        let app = app_with_user(&[ROLE_USER]).await;
        let response = app.oneshot(get_req("/Offer?size=1000")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["violations"][0]["field"], "size");
    }

    #[tokio::test]
    async fn login_issues_usable_bearer_token() {
        let app = app_with_user(&[ROLE_USER]).await;
        let login = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"username": "username", "password": "password"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["tokenType"], "Bearer");
        let bearer = format!("Bearer {}", body["token"].as_str().unwrap());

        let response = app
            .oneshot(mutation(Method::POST, "/Offer", json!({"badgeColor": "red", "description": "2 for 1"}), true, Some(&bearer)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn csrf_endpoint_sets_cookie() {
        let app = app_with_user(&[ROLE_USER]).await;
        let response = app.oneshot(get_req("/csrf")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        let body = json_body(response).await;
        assert!(cookie.starts_with(&format!("XSRF-TOKEN={}", body["token"].as_str().unwrap())));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("HttpOnly"));
        assert_eq!(body["headerName"], CSRF_HEADER);
    }

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let app = app_with_user(&[ROLE_USER]).await;
        let response = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["database"], "memory");
    }
}
