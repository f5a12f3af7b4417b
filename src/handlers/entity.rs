//! Uniform CRUD routes, one set per entity type:
//!
//! - `GET    /<Name>?page=&size=&sortBy=&sortDir=`
//! - `GET    /<Name>/:id`
//! - `POST   /<Name>`
//! - `PUT    /<Name>/:id`
//! - `DELETE /<Name>/:id`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::{ValidJson, ValidQuery};
use crate::database::Entity;
use crate::error::{ApiError, ApiResult};
use crate::filter::{Page, PageParams};
use crate::services::EntityService;

pub fn routes<E: Entity>(service: EntityService<E>) -> Router {
    Router::new()
        .route(&format!("/{}", E::NAME), get(list::<E>).post(create::<E>))
        .route(
            &format!("/{}/:id", E::NAME),
            get(show::<E>).put(update::<E>).delete(remove::<E>),
        )
        .with_state(service)
}

/// Ids that are not UUIDs cannot exist, so they are simply not found.
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

async fn list<E: Entity>(
    State(service): State<EntityService<E>>,
    ValidQuery(params): ValidQuery<PageParams>,
) -> ApiResult<Json<Page<E>>> {
    service.list(&params).await.map(Json)
}

async fn show<E: Entity>(State(service): State<EntityService<E>>, Path(id): Path<String>) -> ApiResult<Json<E>> {
    service.get(parse_id(&id)?).await.map(Json)
}

async fn create<E: Entity>(
    State(service): State<EntityService<E>>,
    ValidJson(payload): ValidJson<E::Payload>,
) -> ApiResult<(StatusCode, Json<E>)> {
    let created = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update<E: Entity>(
    State(service): State<EntityService<E>>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<E::Payload>,
) -> ApiResult<Json<E>> {
    service.update(parse_id(&id)?, payload).await.map(Json)
}

async fn remove<E: Entity>(State(service): State<EntityService<E>>, Path(id): Path<String>) -> ApiResult<Json<E>> {
    service.delete(parse_id(&id)?).await.map(Json)
}
