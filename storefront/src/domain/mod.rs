//! Domain primitives, ports, and services.
//!
//! Purpose: hold the schema guard/provisioner and the order mutations
//! independently of the MySQL driver. Adapters under `crate::outbound`
//! implement the ports declared in [`ports`].
//!
//! Public surface:
//! - `Error` / `ErrorCode`: failure reported by every service operation.
//! - `OrderId`, `OrderItems`, `SchemaName`: validated primitives.
//! - `SchemaService`: guard (`exists`) and provisioner (`provision`, `ensure`).
//! - `OrderCommandService`: create, remove-by-description, delete-by-id.

pub mod error;
pub mod order;
pub mod ports;
pub mod schema;

mod order_service;
mod schema_service;

pub use self::error::{Error, ErrorCode};
pub use self::order::{
    CreatedOrder, DeletionSummary, ORDER_DATE_FORMAT, OrderId, OrderItems, OrderValidationError,
    RemovalOutcome, RemovalReport,
};
pub use self::order_service::OrderCommandService;
pub use self::schema::{DEFAULT_SCHEMA, SchemaName, SchemaNameError, SchemaStatus};
pub use self::schema_service::SchemaService;
