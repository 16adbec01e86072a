//! MySQL access for the personal data and authentication `users` tables.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;

pub use config::DbConfig;
pub use pool::{connect, get_db, DbError};
