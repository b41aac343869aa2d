//! Order mutation service.
//!
//! Each operation runs inside exactly one [`OrderTransaction`]. Every failure
//! path rolls the transaction back before reporting the error, so callers
//! only ever observe "all of it happened" or "none of it happened".

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDateTime, SubsecRound};
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{OrderRepository, OrderRepositoryError, OrderTransaction};
use crate::domain::{
    CreatedOrder, DeletionSummary, Error, ORDER_DATE_FORMAT, OrderId, OrderItems, RemovalOutcome,
    RemovalReport,
};

fn map_repository_error(error: OrderRepositoryError) -> Error {
    match error {
        OrderRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("order repository unavailable: {message}"))
        }
        OrderRepositoryError::Query { message } => {
            Error::internal(format!("order repository error: {message}"))
        }
        OrderRepositoryError::TransactionClosed => {
            Error::internal("order transaction used after it finished")
        }
    }
}

/// Roll back after a failed step and hand back the original error.
async fn abandon(tx: &mut dyn OrderTransaction, error: Error) -> Error {
    warn!(error = %error, "rolling back order transaction");
    if let Err(rollback_error) = tx.rollback().await {
        warn!(error = %rollback_error, "rollback failed; dropping transaction");
    }
    error
}

/// Service implementing the create and delete order operations.
#[derive(Clone)]
pub struct OrderCommandService<R> {
    order_repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> OrderCommandService<R> {
    /// Create a new service with the order repository and a clock used to
    /// stamp new orders.
    pub fn new(order_repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { order_repo, clock }
    }
}

impl<R> OrderCommandService<R>
where
    R: OrderRepository,
{
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, Error> {
        self.order_repo.begin().await.map_err(map_repository_error)
    }

    /// Create an order with one detail row per item.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Aborted`] when fewer detail rows
    /// were inserted than items submitted; nothing is persisted in that case.
    pub async fn create_order(&self, items: &OrderItems) -> Result<CreatedOrder, Error> {
        let order_date = self.clock.local().trunc_subsecs(0).naive_local();
        let mut tx = self.begin().await?;

        let outcome = Self::insert_order_with_details(tx.as_mut(), order_date, items).await;
        let (order_id, inserted) = match outcome {
            Ok(value) => value,
            Err(error) => return Err(abandon(tx.as_mut(), error).await),
        };

        let expected = items.len() as u64;
        if inserted != expected {
            let error = Error::aborted(format!(
                "inserted {inserted} order details for {expected} items"
            ));
            return Err(abandon(tx.as_mut(), error).await);
        }

        tx.commit().await.map_err(map_repository_error)?;

        info!(
            order_id = %order_id,
            order_date = %order_date.format(ORDER_DATE_FORMAT),
            items = expected,
            "created order"
        );
        Ok(CreatedOrder {
            order_id,
            order_date,
            item_count: items.len(),
        })
    }

    async fn insert_order_with_details(
        tx: &mut dyn OrderTransaction,
        order_date: NaiveDateTime,
        items: &OrderItems,
    ) -> Result<(OrderId, u64), Error> {
        let order_id = tx
            .insert_order(order_date)
            .await
            .map_err(map_repository_error)?;
        debug!(order_id = %order_id, "inserted order row");

        let mut inserted = 0_u64;
        for item in items.iter() {
            inserted += tx
                .insert_detail(order_id, item)
                .await
                .map_err(map_repository_error)?;
        }
        Ok((order_id, inserted))
    }

    /// Delete the orders owning each item description.
    ///
    /// Runs as one batch: an ambiguous description or any statement failure
    /// rolls back every deletion made for earlier items.
    pub async fn remove_orders(&self, items: &OrderItems) -> Result<RemovalReport, Error> {
        let mut tx = self.begin().await?;

        let report = match Self::remove_each(tx.as_mut(), items).await {
            Ok(report) => report,
            Err(error) => return Err(abandon(tx.as_mut(), error).await),
        };

        tx.commit().await.map_err(map_repository_error)?;
        info!(removed = report.removed_count(), "committed order removal batch");
        Ok(report)
    }

    async fn remove_each(
        tx: &mut dyn OrderTransaction,
        items: &OrderItems,
    ) -> Result<RemovalReport, Error> {
        let mut report = RemovalReport::default();
        for item in items.iter() {
            let owners: BTreeSet<OrderId> = tx
                .find_order_ids_by_description(item)
                .await
                .map_err(map_repository_error)?
                .into_iter()
                .collect();

            let mut owners = owners.into_iter();
            let outcome = match (owners.next(), owners.next()) {
                (None, _) => RemovalOutcome::NotFound {
                    item: item.to_owned(),
                },
                (Some(order_id), None) => {
                    let changes = tx
                        .delete_order(order_id)
                        .await
                        .map_err(map_repository_error)?;
                    if changes == 1 {
                        RemovalOutcome::Removed {
                            item: item.to_owned(),
                            order_id,
                        }
                    } else {
                        RemovalOutcome::NotFound {
                            item: item.to_owned(),
                        }
                    }
                }
                (Some(first), Some(second)) => {
                    return Err(Error::conflict(format!(
                        "item `{item}` belongs to several orders (at least {first} and {second})"
                    )));
                }
            };

            match &outcome {
                RemovalOutcome::Removed { order_id, .. } => {
                    info!(%item, order_id = %order_id, "deleted order");
                }
                RemovalOutcome::NotFound { .. } => info!(%item, "no order found for item"),
            }
            report.push(outcome);
        }
        Ok(report)
    }

    /// Delete one order and its details.
    ///
    /// Detail rows are removed explicitly before the order row, so the result
    /// holds even when the cascading foreign key is missing.
    pub async fn delete_order(&self, order_id: OrderId) -> Result<DeletionSummary, Error> {
        let mut tx = self.begin().await?;

        let counts = Self::delete_with_details(tx.as_mut(), order_id).await;
        let (details_removed, orders_removed) = match counts {
            Ok(value) => value,
            Err(error) => return Err(abandon(tx.as_mut(), error).await),
        };

        if orders_removed != 1 {
            let error = Error::not_found(format!(
                "order {order_id} does not correspond to a unique existing order"
            ));
            return Err(abandon(tx.as_mut(), error).await);
        }

        tx.commit().await.map_err(map_repository_error)?;
        info!(order_id = %order_id, details_removed, "deleted order");
        Ok(DeletionSummary {
            order_id,
            details_removed,
        })
    }

    async fn delete_with_details(
        tx: &mut dyn OrderTransaction,
        order_id: OrderId,
    ) -> Result<(u64, u64), Error> {
        let details = tx
            .delete_details(order_id)
            .await
            .map_err(map_repository_error)?;
        debug!(order_id = %order_id, details, "removed order details");
        let orders = tx
            .delete_order(order_id)
            .await
            .map_err(map_repository_error)?;
        Ok((details, orders))
    }
}

#[cfg(test)]
#[path = "order_service_tests.rs"]
mod tests;
