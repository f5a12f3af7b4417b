use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    FromRow, Postgres,
};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::{PageRequest, SortField};
use crate::validation::Violations;

pub type PgQueryAs<'q, O> = QueryAs<'q, Postgres, O, PgArguments>;

/// Foreign key value held by a row: the referenced table and id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub table: &'static str,
    pub id: Uuid,
}

impl Reference {
    pub fn new(table: &'static str, id: Uuid) -> Self {
        Self { table, id }
    }
}

/// A persisted domain record exposed under `/<NAME>`.
pub trait Entity:
    Clone + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static + for<'r> FromRow<'r, PgRow>
{
    /// Request body accepted by create and update
    type Payload: DeserializeOwned + Send + 'static;

    /// Route segment, e.g. `FruitProduct`
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Columns written on insert/update, excluding `id`, in bind order
    const COLUMNS: &'static [&'static str];
    const SORT_FIELDS: &'static [SortField];

    fn id(&self) -> Uuid;

    /// Validate `payload` field by field and build the entity with `id`.
    fn from_payload(id: Uuid, payload: Self::Payload) -> Result<Self, Violations>;

    /// Bind `COLUMNS` in order.
    fn bind_columns<'q, O>(&'q self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O>;

    /// Rows this one points at. PostgreSQL enforces these with foreign keys;
    /// the in-memory stores check them explicitly.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// Persistence gateway for one entity type
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Ordered window for `request` plus the total row count
    async fn find_page(&self, request: &PageRequest) -> Result<(Vec<E>, u64), DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, DatabaseError>;

    async fn insert(&self, entity: &E) -> Result<E, DatabaseError>;

    /// `None` when no row has the entity's id
    async fn update(&self, entity: &E) -> Result<Option<E>, DatabaseError>;

    /// Removed row, `None` when absent
    async fn delete(&self, id: Uuid) -> Result<Option<E>, DatabaseError>;
}
