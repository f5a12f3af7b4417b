// handlers/mod.rs - HTTP handlers
//
// entity  - generic CRUD routes mounted once per entity type
// session - login and anti-forgery token issuance (public)
// health  - liveness and database ping (public)

pub mod entity;
pub mod health;
pub mod session;

pub use health::health;
pub use session::{csrf_token, login};
