//! Database layer
//!
//! SQLite storage for socialhub: connection pool creation, code-embedded
//! migrations, and one repository per entity.
//!
//! # Usage
//!
//! ```ignore
//! use socialhub::config::DatabaseConfig;
//! use socialhub::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, ping, DbPool};
