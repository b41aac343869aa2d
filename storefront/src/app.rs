//! One storefront invocation: schema guard, provisioner, then a mutation.

use std::fmt;
use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::config::ConnectionSettings;
use crate::domain::ports::{OrderRepository, SchemaRepository};
use crate::domain::{
    CreatedOrder, DeletionSummary, Error, ORDER_DATE_FORMAT, OrderCommandService, OrderId,
    OrderItems, RemovalOutcome, RemovalReport, SchemaService, SchemaStatus,
};
use crate::outbound::persistence::{
    DbPool, MySqlOrderRepository, MySqlSchemaRepository, PoolError,
};

/// Validated request for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorefrontCommand {
    /// Only make sure the schema and tables exist.
    Provision,
    /// Create an order with these items.
    CreateOrder(OrderItems),
    /// Delete the orders owning these item descriptions.
    RemoveOrders(OrderItems),
    /// Delete one order by id.
    DeleteOrder(OrderId),
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Provisioned {
        schema: SchemaStatus,
    },
    Created {
        schema: SchemaStatus,
        order: CreatedOrder,
    },
    Removed {
        schema: SchemaStatus,
        report: RemovalReport,
    },
    Deleted {
        schema: SchemaStatus,
        summary: DeletionSummary,
    },
}

impl CommandOutcome {
    /// Schema status observed before the mutation ran.
    pub fn schema_status(&self) -> SchemaStatus {
        match self {
            Self::Provisioned { schema }
            | Self::Created { schema, .. }
            | Self::Removed { schema, .. }
            | Self::Deleted { schema, .. } => *schema,
        }
    }
}

/// Renders `key=value` lines for stdout.
impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "schema_status={}", self.schema_status())?;
        match self {
            Self::Provisioned { .. } => Ok(()),
            Self::Created { order, .. } => {
                writeln!(f, "order_id={}", order.order_id)?;
                writeln!(f, "order_date={}", order.order_date.format(ORDER_DATE_FORMAT))?;
                writeln!(f, "items={}", order.item_count)
            }
            Self::Removed { report, .. } => {
                for outcome in report.outcomes() {
                    match outcome {
                        RemovalOutcome::Removed { item, order_id } => {
                            writeln!(f, "removed={item} order_id={order_id}")?;
                        }
                        RemovalOutcome::NotFound { item } => writeln!(f, "not_found={item}")?,
                    }
                }
                writeln!(f, "removed_count={}", report.removed_count())
            }
            Self::Deleted { summary, .. } => {
                writeln!(f, "deleted_order_id={}", summary.order_id)?;
                writeln!(f, "details_removed={}", summary.details_removed)
            }
        }
    }
}

/// Failure of one run, tagged with the stage that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorefrontError {
    /// The schema guard or provisioner failed; no mutation was attempted.
    #[error("schema setup failed: {0}")]
    Schema(#[source] Error),
    /// The order mutation failed and was rolled back.
    #[error("{0}")]
    Order(#[source] Error),
}

impl StorefrontError {
    /// Underlying domain error.
    pub fn error(&self) -> &Error {
        match self {
            Self::Schema(err) | Self::Order(err) => err,
        }
    }
}

/// Wires the schema service and the order service for one run.
pub struct Storefront<S, O> {
    schema: SchemaService<S>,
    orders: OrderCommandService<O>,
}

impl<S, O> Storefront<S, O> {
    pub fn new(schema_repo: Arc<S>, order_repo: Arc<O>, clock: Arc<dyn Clock>) -> Self {
        Self {
            schema: SchemaService::new(schema_repo),
            orders: OrderCommandService::new(order_repo, clock),
        }
    }
}

impl<S, O> Storefront<S, O>
where
    S: SchemaRepository,
    O: OrderRepository,
{
    /// Ensure the schema, then run `command`.
    ///
    /// # Errors
    ///
    /// Schema failures stop the run before any mutation is attempted.
    pub async fn run(&self, command: &StorefrontCommand) -> Result<CommandOutcome, StorefrontError> {
        let schema = self.schema.ensure().await.map_err(StorefrontError::Schema)?;
        info!(status = %schema, "schema ready");

        let outcome = match command {
            StorefrontCommand::Provision => CommandOutcome::Provisioned { schema },
            StorefrontCommand::CreateOrder(items) => CommandOutcome::Created {
                schema,
                order: self
                    .orders
                    .create_order(items)
                    .await
                    .map_err(StorefrontError::Order)?,
            },
            StorefrontCommand::RemoveOrders(items) => CommandOutcome::Removed {
                schema,
                report: self
                    .orders
                    .remove_orders(items)
                    .await
                    .map_err(StorefrontError::Order)?,
            },
            StorefrontCommand::DeleteOrder(order_id) => CommandOutcome::Deleted {
                schema,
                summary: self
                    .orders
                    .delete_order(*order_id)
                    .await
                    .map_err(StorefrontError::Order)?,
            },
        };
        Ok(outcome)
    }
}

/// Storefront backed by MySQL.
pub type MySqlStorefront = Storefront<MySqlSchemaRepository, MySqlOrderRepository>;

/// Open the connection and build the MySQL-backed storefront.
///
/// The pool is returned too so the caller can close it after the run.
pub async fn connect(
    settings: &ConnectionSettings,
    clock: Arc<dyn Clock>,
) -> Result<(MySqlStorefront, DbPool), PoolError> {
    let pool = DbPool::connect(&settings.pool_config()).await?;
    info!(
        host = settings.host(),
        port = settings.port(),
        schema = %settings.schema(),
        "connected to mysql"
    );
    let schema_repo = MySqlSchemaRepository::new(pool.clone(), settings.schema().clone());
    let order_repo = MySqlOrderRepository::new(pool.clone(), settings.schema());
    let storefront = Storefront::new(Arc::new(schema_repo), Arc::new(order_repo), clock);
    Ok((storefront, pool))
}
