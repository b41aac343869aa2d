//! Port for transactional order persistence.
//!
//! The order service drives every mutation through an [`OrderTransaction`]
//! obtained from [`OrderRepository::begin`]. Implementations must roll back
//! any work still pending when the transaction is dropped without an explicit
//! `commit` or `rollback`.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::OrderId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established or was lost.
        Connection { message: String } =>
            "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "order repository query failed: {message}",
        /// The transaction was used after commit or rollback.
        TransactionClosed =>
            "order transaction already finished",
    }
}

/// Port for opening order transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Start a new transaction on the shared connection.
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, OrderRepositoryError>;
}

/// Unit of work spanning one order mutation.
#[async_trait]
pub trait OrderTransaction: Send {
    /// Insert an `order` row and return its generated key.
    async fn insert_order(
        &mut self,
        order_date: NaiveDateTime,
    ) -> Result<OrderId, OrderRepositoryError>;

    /// Insert one `order_details` row, returning the affected-row count.
    async fn insert_detail(
        &mut self,
        order_id: OrderId,
        item_description: &str,
    ) -> Result<u64, OrderRepositoryError>;

    /// Ids of every order owning a detail with this description, in detail
    /// insertion order and possibly repeated.
    async fn find_order_ids_by_description(
        &mut self,
        item_description: &str,
    ) -> Result<Vec<OrderId>, OrderRepositoryError>;

    /// Delete the detail rows of an order, returning the affected-row count.
    async fn delete_details(&mut self, order_id: OrderId) -> Result<u64, OrderRepositoryError>;

    /// Delete an order row, returning the affected-row count.
    async fn delete_order(&mut self, order_id: OrderId) -> Result<u64, OrderRepositoryError>;

    /// Make the transaction's work durable.
    async fn commit(&mut self) -> Result<(), OrderRepositoryError>;

    /// Discard the transaction's work.
    async fn rollback(&mut self) -> Result<(), OrderRepositoryError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn transaction_closed_has_fixed_message() {
        assert_eq!(
            OrderRepositoryError::transaction_closed().to_string(),
            "order transaction already finished"
        );
    }

    #[rstest]
    fn connection_error_formats_message() {
        let err = OrderRepositoryError::connection("pool timed out");
        assert!(err.to_string().contains("pool timed out"));
    }
}
