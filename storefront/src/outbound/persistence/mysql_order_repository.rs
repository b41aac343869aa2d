//! MySQL-backed `OrderRepository` implementation using `sqlx`.
//!
//! Each [`MySqlOrderTransaction`] wraps a `sqlx` transaction, which issues
//! `ROLLBACK` when dropped before `commit`. No auto-commit toggling is
//! required on the shared connection.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{MySql, Transaction};
use tracing::debug;

use crate::domain::OrderId;
use crate::domain::SchemaName;
use crate::domain::ports::{OrderRepository, OrderRepositoryError, OrderTransaction};

use super::error_mapping::map_sqlx_error;
use super::pool::DbPool;
use super::statements::Statements;

fn map_order_error(error: sqlx::Error) -> OrderRepositoryError {
    map_sqlx_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

/// `sqlx`-backed implementation of the order repository port.
#[derive(Clone)]
pub struct MySqlOrderRepository {
    pool: DbPool,
    statements: Arc<Statements>,
}

impl MySqlOrderRepository {
    /// Create a repository writing to the tables of `schema`.
    pub fn new(pool: DbPool, schema: &SchemaName) -> Self {
        Self {
            pool,
            statements: Arc::new(Statements::new(schema)),
        }
    }
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, OrderRepositoryError> {
        let tx = self.pool.begin().await.map_err(map_order_error)?;
        debug!("began order transaction");
        Ok(Box::new(MySqlOrderTransaction {
            tx: Some(tx),
            statements: Arc::clone(&self.statements),
        }))
    }
}

/// Open transaction on the pooled connection.
pub struct MySqlOrderTransaction {
    tx: Option<Transaction<'static, MySql>>,
    statements: Arc<Statements>,
}

fn active<'a>(
    tx: &'a mut Option<Transaction<'static, MySql>>,
) -> Result<&'a mut Transaction<'static, MySql>, OrderRepositoryError> {
    tx.as_mut().ok_or(OrderRepositoryError::TransactionClosed)
}

fn order_id_from_row(raw: Option<i32>) -> Option<OrderId> {
    raw.and_then(|value| OrderId::new(value).ok())
}

#[async_trait]
impl OrderTransaction for MySqlOrderTransaction {
    async fn insert_order(
        &mut self,
        order_date: NaiveDateTime,
    ) -> Result<OrderId, OrderRepositoryError> {
        let tx = active(&mut self.tx)?;
        let result = sqlx::query(&self.statements.insert_order)
            .bind(order_date)
            .execute(&mut **tx)
            .await
            .map_err(map_order_error)?;
        OrderId::from_generated_key(result.last_insert_id())
            .map_err(|err| OrderRepositoryError::query(err.to_string()))
    }

    async fn insert_detail(
        &mut self,
        order_id: OrderId,
        item_description: &str,
    ) -> Result<u64, OrderRepositoryError> {
        let tx = active(&mut self.tx)?;
        let result = sqlx::query(&self.statements.insert_detail)
            .bind(order_id.get())
            .bind(item_description)
            .execute(&mut **tx)
            .await
            .map_err(map_order_error)?;
        Ok(result.rows_affected())
    }

    async fn find_order_ids_by_description(
        &mut self,
        item_description: &str,
    ) -> Result<Vec<OrderId>, OrderRepositoryError> {
        let tx = active(&mut self.tx)?;
        let rows: Vec<(Option<i32>,)> = sqlx::query_as(&self.statements.find_order_ids)
            .bind(item_description)
            .fetch_all(&mut **tx)
            .await
            .map_err(map_order_error)?;
        // Orphaned details carry a NULL order_id and own nothing.
        Ok(rows
            .into_iter()
            .filter_map(|(raw,)| order_id_from_row(raw))
            .collect())
    }

    async fn delete_details(&mut self, order_id: OrderId) -> Result<u64, OrderRepositoryError> {
        let tx = active(&mut self.tx)?;
        let result = sqlx::query(&self.statements.delete_details)
            .bind(order_id.get())
            .execute(&mut **tx)
            .await
            .map_err(map_order_error)?;
        Ok(result.rows_affected())
    }

    async fn delete_order(&mut self, order_id: OrderId) -> Result<u64, OrderRepositoryError> {
        let tx = active(&mut self.tx)?;
        let result = sqlx::query(&self.statements.delete_order)
            .bind(order_id.get())
            .execute(&mut **tx)
            .await
            .map_err(map_order_error)?;
        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> Result<(), OrderRepositoryError> {
        let tx = self
            .tx
            .take()
            .ok_or(OrderRepositoryError::TransactionClosed)?;
        tx.commit().await.map_err(map_order_error)?;
        debug!("committed order transaction");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), OrderRepositoryError> {
        let tx = self
            .tx
            .take()
            .ok_or(OrderRepositoryError::TransactionClosed)?;
        tx.rollback().await.map_err(map_order_error)?;
        debug!("rolled back order transaction");
        Ok(())
    }
}
