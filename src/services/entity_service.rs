use std::sync::Arc;

use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::database::{Entity, EntityStore};
use crate::error::{ApiError, ApiResult};
use crate::filter::{Page, PageParams, PageRequest};

/// Uniform list/get/create/update/delete for one entity type
pub struct EntityService<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
    pagination: PaginationConfig,
}

impl<E: Entity> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pagination: self.pagination,
        }
    }
}

impl<E: Entity> EntityService<E> {
    pub fn new(store: Arc<dyn EntityStore<E>>, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    pub async fn list(&self, params: &PageParams) -> ApiResult<Page<E>> {
        let request = PageRequest::from_params(params, &self.pagination, E::SORT_FIELDS)?;
        let (rows, total) = self.store.find_page(&request).await?;
        Ok(Page::new(rows, total, &request))
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<E> {
        self.store.find_by_id(id).await?.ok_or(ApiError::NotFound)
    }

    pub async fn create(&self, payload: E::Payload) -> ApiResult<E> {
        let entity = E::from_payload(Uuid::new_v4(), payload)?;
        let created = self.store.insert(&entity).await?;
        tracing::info!("Created {} {}", E::NAME, created.id());
        Ok(created)
    }

    /// Existence is checked before the payload is validated, so a missing id
    /// is a 404 even when the body is invalid.
    pub async fn update(&self, id: Uuid, payload: E::Payload) -> ApiResult<E> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(ApiError::NotFound);
        }

        let entity = E::from_payload(id, payload)?;
        let updated = self.store.update(&entity).await?.ok_or(ApiError::NotFound)?;
        tracing::info!("Updated {} {}", E::NAME, id);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<E> {
        let removed = self.store.delete(id).await?.ok_or(ApiError::NotFound)?;
        tracing::info!("Deleted {} {}", E::NAME, id);
        Ok(removed)
    }
}
