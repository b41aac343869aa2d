//! Domain ports for the hexagonal boundary between the core and the database.

mod macros;
pub(crate) use macros::define_port_error;

mod order_repository;
mod schema_repository;

#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{OrderRepository, OrderRepositoryError, OrderTransaction};
#[cfg(test)]
pub use schema_repository::MockSchemaRepository;
pub use schema_repository::{SchemaRepository, SchemaRepositoryError};
