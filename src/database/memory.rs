//! In-process stores used when no database is configured, and by tests.
//!
//! Lock order is always the store's own rows first, then the shared
//! [`ReferenceIndex`]; the index lock is never held while waiting on rows.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::store::{Entity, EntityStore, Reference};
use crate::filter::{FilterOrder, PageRequest};

/// Which rows exist in which table, and what each row points at.
///
/// Shared by every store of one in-memory backend so that inserts and
/// deletes can be checked against rows of other entity types.
#[derive(Clone, Default)]
pub struct ReferenceIndex {
    rows: Arc<RwLock<HashMap<(&'static str, Uuid), Vec<Reference>>>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entity`, failing when one of its references is dangling
    async fn link<T: Entity>(&self, entity: &T) -> Result<(), DatabaseError> {
        let references = entity.references();
        let mut rows = self.rows.write().await;
        if let Some(missing) = references.iter().find(|r| !rows.contains_key(&(r.table, r.id))) {
            return Err(DatabaseError::Constraint(format!(
                "{} {} references missing {} {}",
                T::TABLE,
                entity.id(),
                missing.table,
                missing.id
            )));
        }
        rows.insert((T::TABLE, entity.id()), references);
        Ok(())
    }

    /// Forget `id`, failing while any row still points at it
    async fn unlink<T: Entity>(&self, id: Uuid) -> Result<(), DatabaseError> {
        let target = Reference::new(T::TABLE, id);
        let mut rows = self.rows.write().await;
        if let Some(((table, referrer), _)) = rows.iter().find(|(_, refs)| refs.contains(&target)) {
            return Err(DatabaseError::Constraint(format!(
                "{} {} is still referenced by {} {}",
                T::TABLE,
                id,
                table,
                referrer
            )));
        }
        rows.remove(&(T::TABLE, id));
        Ok(())
    }
}

pub struct MemoryStore<T> {
    rows: Arc<RwLock<HashMap<Uuid, T>>>,
    references: ReferenceIndex,
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self::with_index(ReferenceIndex::new())
    }

    /// Store whose references are checked against `references`
    pub fn with_index(references: ReferenceIndex) -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            references,
        }
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for MemoryStore<T> {
    async fn find_page(&self, request: &PageRequest) -> Result<(Vec<T>, u64), DatabaseError> {
        let rows = self.rows.read().await;

        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows.values() {
            let value = serde_json::to_value(row).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
            keyed.push((value, row));
        }
        keyed.sort_by(|(a, _), (b, _)| FilterOrder::compare(&request.order, a, b));

        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let window = keyed
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, row)| row.clone())
            .collect();

        Ok((window, rows.len() as u64))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, entity: &T) -> Result<T, DatabaseError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&entity.id()) {
            return Err(DatabaseError::Constraint(format!("duplicate id {} in {}", entity.id(), T::TABLE)));
        }
        self.references.link(entity).await?;
        rows.insert(entity.id(), entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &T) -> Result<Option<T>, DatabaseError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&entity.id()) {
            Some(slot) => {
                self.references.link(entity).await?;
                *slot = entity.clone();
                Ok(Some(entity.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&id) {
            return Ok(None);
        }
        self.references.unlink::<T>(id).await?;
        Ok(rows.remove(&id))
    }
}

type AnyStore = Arc<dyn Any + Send + Sync>;

/// One store per entity type over a common [`ReferenceIndex`]
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    references: ReferenceIndex,
    stores: Arc<Mutex<HashMap<TypeId, AnyStore>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store for `T`, created on first use
    pub fn store<T: Entity>(&self) -> Arc<MemoryStore<T>> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(MemoryStore::<T>::with_index(self.references.clone())) as AnyStore);

        match Arc::clone(entry).downcast::<MemoryStore<T>>() {
            Ok(store) => store,
            Err(_) => {
                tracing::error!("Memory store slot for {} holds another type, replacing it", T::TABLE);
                let store = Arc::new(MemoryStore::<T>::with_index(self.references.clone()));
                *entry = Arc::clone(&store) as AnyStore;
                store
            }
        }
    }
}
