pub mod extract;
pub mod problem;

pub use extract::{ValidJson, ValidQuery};
pub use problem::{Problem, Violation};
