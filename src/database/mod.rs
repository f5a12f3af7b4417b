pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;
pub mod users;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryDatabase, MemoryStore, ReferenceIndex};
pub use repository::Repository;
pub use store::{Entity, EntityStore, Reference};
pub use users::{MemoryUserStore, PgUserStore, UserStore};
