//! MySQL persistence adapters using `sqlx`.
//!
//! Concrete implementations of the schema and order ports. Adapters only
//! translate between `sqlx` rows and domain types; the rules about what may
//! be committed live in the domain services.
//!
//! # Example
//!
//! ```ignore
//! use storefront::domain::SchemaName;
//! use storefront::outbound::persistence::{DbPool, MySqlOrderRepository, PoolConfig};
//!
//! let pool = DbPool::connect(&PoolConfig::new("localhost", 3306, "app")).await?;
//! let orders = MySqlOrderRepository::new(pool, &SchemaName::default());
//! ```

mod error_mapping;
mod mysql_order_repository;
mod mysql_schema_repository;
mod pool;
mod statements;

pub use mysql_order_repository::{MySqlOrderRepository, MySqlOrderTransaction};
pub use mysql_schema_repository::MySqlSchemaRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
