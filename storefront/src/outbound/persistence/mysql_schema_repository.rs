//! MySQL-backed `SchemaRepository` implementation using `sqlx`.
//!
//! `USE` and DDL go through the text protocol because MySQL refuses to
//! prepare them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::SchemaName;
use crate::domain::ports::{SchemaRepository, SchemaRepositoryError};

use super::error_mapping::{ER_BAD_DB_ERROR, map_sqlx_error, sql_state, vendor_code};
use super::pool::DbPool;
use super::statements::Statements;

/// `sqlx`-backed implementation of the schema repository port.
#[derive(Clone)]
pub struct MySqlSchemaRepository {
    pool: DbPool,
    schema: SchemaName,
    statements: Arc<Statements>,
}

impl MySqlSchemaRepository {
    /// Create a repository bound to `schema`.
    pub fn new(pool: DbPool, schema: SchemaName) -> Self {
        let statements = Arc::new(Statements::new(&schema));
        Self {
            pool,
            schema,
            statements,
        }
    }

    async fn run(&self, label: &'static str, sql: &str) -> Result<(), SchemaRepositoryError> {
        debug!(schema = %self.schema, statement = label, "executing schema statement");
        sqlx::raw_sql(sql)
            .execute(self.pool.inner())
            .await
            .map(|_| ())
            .map_err(map_schema_error)
    }
}

fn map_schema_error(error: sqlx::Error) -> SchemaRepositoryError {
    map_sqlx_error(
        error,
        SchemaRepositoryError::query,
        SchemaRepositoryError::connection,
    )
}

/// Map a failed `USE` into the port error, logging the server's codes.
fn classify_select_error(schema: &SchemaName, error: sqlx::Error) -> SchemaRepositoryError {
    let code = vendor_code(&error);
    debug!(
        %schema,
        vendor_code = code,
        sql_state = sql_state(&error).as_deref(),
        "schema selection failed"
    );
    if code == Some(ER_BAD_DB_ERROR) {
        SchemaRepositoryError::unknown_schema(schema.as_str())
    } else {
        map_schema_error(error)
    }
}

#[async_trait]
impl SchemaRepository for MySqlSchemaRepository {
    async fn select_schema(&self) -> Result<(), SchemaRepositoryError> {
        match sqlx::raw_sql(&self.statements.use_schema)
            .execute(self.pool.inner())
            .await
        {
            Ok(_) => Ok(()),
            Err(error) => Err(classify_select_error(&self.schema, error)),
        }
    }

    async fn create_schema(&self) -> Result<(), SchemaRepositoryError> {
        self.run("create_schema", &self.statements.create_schema)
            .await
    }

    async fn create_order_table(&self) -> Result<(), SchemaRepositoryError> {
        self.run("create_order_table", &self.statements.create_order_table)
            .await
    }

    async fn create_order_details_table(&self) -> Result<(), SchemaRepositoryError> {
        self.run(
            "create_order_details_table",
            &self.statements.create_order_details_table,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn select_failures_without_vendor_code_are_not_unknown_schema() {
        let schema = SchemaName::default();

        assert!(matches!(
            classify_select_error(&schema, sqlx::Error::PoolTimedOut),
            SchemaRepositoryError::Connection { .. }
        ));
        assert!(matches!(
            classify_select_error(&schema, sqlx::Error::RowNotFound),
            SchemaRepositoryError::Query { .. }
        ));
    }
}
