pub mod filter_order;
pub mod page;
pub mod types;

pub use filter_order::FilterOrder;
pub use page::{Page, PageParams, PageRequest};
pub use types::*;
