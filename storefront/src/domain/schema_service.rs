//! Schema guard and provisioner.
//!
//! The guard answers whether the configured schema exists; the provisioner
//! creates it together with the `order` and `order_details` tables.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::Error;
use crate::domain::SchemaStatus;
use crate::domain::ports::{SchemaRepository, SchemaRepositoryError};

fn map_repository_error(error: SchemaRepositoryError) -> Error {
    match error {
        SchemaRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("schema repository unavailable: {message}"))
        }
        SchemaRepositoryError::Query { message } => {
            Error::internal(format!("schema repository error: {message}"))
        }
        SchemaRepositoryError::UnknownSchema { schema } => {
            Error::internal(format!("schema `{schema}` is missing"))
        }
    }
}

/// Service guarding and provisioning the storefront schema.
#[derive(Clone)]
pub struct SchemaService<R> {
    schema_repo: Arc<R>,
}

impl<R> SchemaService<R> {
    /// Create a new service over the schema repository.
    pub fn new(schema_repo: Arc<R>) -> Self {
        Self { schema_repo }
    }
}

impl<R> SchemaService<R>
where
    R: SchemaRepository,
{
    /// Report whether the schema exists.
    ///
    /// Only the "unknown database" condition maps to `false`; every other
    /// failure is returned as an error.
    pub async fn exists(&self) -> Result<bool, Error> {
        match self.schema_repo.select_schema().await {
            Ok(()) => Ok(true),
            Err(SchemaRepositoryError::UnknownSchema { schema }) => {
                debug!(%schema, "schema selection reported unknown database");
                Ok(false)
            }
            Err(other) => Err(map_repository_error(other)),
        }
    }

    /// Create the schema and both tables.
    ///
    /// Any failure aborts provisioning; callers must not assume the tables
    /// exist afterwards.
    pub async fn provision(&self) -> Result<(), Error> {
        info!("creating storefront schema");
        self.schema_repo
            .create_schema()
            .await
            .map_err(map_repository_error)?;

        if !self.exists().await? {
            return Err(Error::internal(
                "schema still missing after CREATE SCHEMA succeeded",
            ));
        }

        self.schema_repo
            .create_order_table()
            .await
            .map_err(map_repository_error)?;
        info!(table = "order", "created table");

        self.schema_repo
            .create_order_details_table()
            .await
            .map_err(map_repository_error)?;
        info!(table = "order_details", "created table");

        Ok(())
    }

    /// Provision the schema only when the guard reports it absent.
    pub async fn ensure(&self) -> Result<SchemaStatus, Error> {
        if self.exists().await? {
            debug!("schema already present");
            return Ok(SchemaStatus::AlreadyPresent);
        }
        info!("storefront schema does not exist");
        self.provision().await?;
        Ok(SchemaStatus::Provisioned)
    }
}

#[cfg(test)]
#[path = "schema_service_tests.rs"]
mod tests;
