use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::store::{Entity, EntityStore};
use crate::filter::{FilterOrder, PageRequest};

/// Count and page select read the same snapshot
const PAGE_SNAPSHOT_SQL: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

/// PostgreSQL-backed store for `T`
pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    fn select_page_sql(request: &PageRequest) -> String {
        format!(
            "SELECT * FROM \"{}\" {} LIMIT $1 OFFSET $2",
            T::TABLE,
            FilterOrder::generate(&request.order)
        )
    }

    fn insert_sql() -> String {
        let columns: Vec<String> = std::iter::once("id")
            .chain(T::COLUMNS.iter().copied())
            .map(quote_identifier)
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            T::TABLE,
            columns.join(", "),
            placeholders.join(", ")
        )
    }

    fn update_sql() -> String {
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ${}", quote_identifier(c), i + 2))
            .collect();
        format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = $1 RETURNING *",
            T::TABLE,
            assignments.join(", ")
        )
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for Repository<T> {
    async fn find_page(&self, request: &PageRequest) -> Result<(Vec<T>, u64), DatabaseError> {
        let limit = i64::try_from(request.limit()).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        let offset = i64::try_from(request.offset()).map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(PAGE_SNAPSHOT_SQL).execute(&mut *tx).await?;

        let count_sql = format!("SELECT COUNT(*) AS count FROM \"{}\"", T::TABLE);
        let row = sqlx::query(&count_sql).fetch_one(&mut *tx).await?;
        let total: i64 = row.try_get("count")?;

        let sql = Self::select_page_sql(request);
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((rows, u64::try_from(total).unwrap_or(0)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM \"{}\" WHERE \"id\" = $1", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn insert(&self, entity: &T) -> Result<T, DatabaseError> {
        let sql = Self::insert_sql();
        let query = sqlx::query_as::<_, T>(&sql).bind(entity.id());
        let row = entity.bind_columns(query).fetch_one(&self.pool).await?;
        Ok(row)
    }

    async fn update(&self, entity: &T) -> Result<Option<T>, DatabaseError> {
        let sql = Self::update_sql();
        let query = sqlx::query_as::<_, T>(&sql).bind(entity.id());
        let row = entity.bind_columns(query).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1 RETURNING *", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }
}

/// Quote SQL identifier to prevent injection
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{FruitProduct, Heater};
    use crate::filter::{SortDirection, SortField, SortOrder};

    #[test]
    fn insert_sql_lists_id_then_columns() {
        assert_eq!(
            Repository::<Heater>::insert_sql(),
            "INSERT INTO \"heaters\" (\"id\", \"text\") VALUES ($1, $2) RETURNING *"
        );
    }

    #[test]
    fn update_sql_binds_id_first() {
        let sql = Repository::<FruitProduct>::update_sql();
        assert!(sql.starts_with("UPDATE \"fruit_products\" SET \"cost_price\" = $2, \"fruit_id\" = $3"));
        assert!(sql.ends_with("WHERE \"id\" = $1 RETURNING *"));
    }

    #[test]
    fn page_reads_share_one_read_only_snapshot() {
        assert!(PAGE_SNAPSHOT_SQL.starts_with("SET TRANSACTION"));
        assert!(PAGE_SNAPSHOT_SQL.contains("REPEATABLE READ"));
        assert!(PAGE_SNAPSHOT_SQL.contains("READ ONLY"));
    }

    #[test]
    fn page_sql_orders_then_limits() {
        let request = PageRequest::new(
            2,
            10,
            SortOrder {
                field: SortField::new("text", "text"),
                direction: SortDirection::Desc,
            },
        );
        assert_eq!(
            Repository::<Heater>::select_page_sql(&request),
            "SELECT * FROM \"heaters\" ORDER BY \"text\" DESC, \"id\" DESC LIMIT $1 OFFSET $2"
        );
    }
}
