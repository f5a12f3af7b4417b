use std::cmp::Ordering;

use serde_json::Value;

use super::types::{SortDirection, SortField, SortOrder};

pub struct FilterOrder;

impl FilterOrder {
    /// Resolve `sortBy`/`sortDir` against the sortable fields of an entity.
    ///
    /// Unknown fields fall back to `id` and unknown directions to ascending;
    /// neither is an error.
    pub fn resolve(sort_by: Option<&str>, sort_dir: Option<&str>, fields: &[SortField]) -> SortOrder {
        let direction = SortDirection::parse_lenient(sort_dir);

        let field = match sort_by.map(str::trim).filter(|s| !s.is_empty()) {
            None => SortField::ID,
            Some(name) => match fields.iter().find(|f| f.field == name || f.column == name) {
                Some(found) => *found,
                None => {
                    tracing::debug!("Unknown sort field '{}', falling back to id", name);
                    SortField::ID
                }
            },
        };

        SortOrder { field, direction }
    }

    /// `ORDER BY` clause. Non-id orderings tie-break on id in the same
    /// direction so ascending and descending pages are exact reverses.
    pub fn generate(order: &SortOrder) -> String {
        let dir = order.direction.to_sql();
        if order.field.column == SortField::ID.column {
            format!("ORDER BY \"id\" {}", dir)
        } else {
            format!("ORDER BY \"{}\" {}, \"id\" {}", order.field.column, dir, dir)
        }
    }

    /// In-process equivalent of [`FilterOrder::generate`] over serialized entities.
    pub fn compare(order: &SortOrder, a: &Value, b: &Value) -> Ordering {
        let primary = compare_values(&a[order.field.field], &b[order.field.field]);
        let ordering = primary.then_with(|| compare_values(&a["id"], &b["id"]));
        match order.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

// Nulls sort last in ascending order, matching PostgreSQL's default.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
