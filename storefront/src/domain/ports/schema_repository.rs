//! Port for probing and creating the storefront schema.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by schema repository adapters.
    pub enum SchemaRepositoryError {
        /// The server reported that the schema does not exist.
        UnknownSchema { schema: String } =>
            "schema `{schema}` does not exist",
        /// Repository connection could not be established or was lost.
        Connection { message: String } =>
            "schema repository connection failed: {message}",
        /// Statement failed for a reason unrelated to schema absence.
        Query { message: String } =>
            "schema repository statement failed: {message}",
    }
}

/// Port for the schema guard and provisioner.
///
/// Adapters are bound to a single schema name at construction time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// Select the schema as current, failing with
    /// [`SchemaRepositoryError::UnknownSchema`] when it is absent.
    async fn select_schema(&self) -> Result<(), SchemaRepositoryError>;

    /// Create the schema.
    async fn create_schema(&self) -> Result<(), SchemaRepositoryError>;

    /// Create the `order` table.
    async fn create_order_table(&self) -> Result<(), SchemaRepositoryError>;

    /// Create the `order_details` table with its cascading foreign key.
    async fn create_order_details_table(&self) -> Result<(), SchemaRepositoryError>;
}
