//! Command-line surface: argument parsing, run orchestration, exit codes.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mockable::DefaultClock;
use tokio::runtime::Builder;
use tracing::{error, info};

use crate::app::{self, CommandOutcome, StorefrontCommand, StorefrontError};
use crate::config::{ConfigError, ConnectionSettings, DefaultCredentialEnv, StorefrontSettings};
use crate::domain::{ErrorCode, OrderId, OrderItems, OrderValidationError};
use crate::outbound::persistence::PoolError;
use crate::telemetry::LogFormat;

/// Exit status for a successful run.
pub const EXIT_OK: u8 = 0;
/// Exit status for unexpected internal failures.
pub const EXIT_INTERNAL: u8 = 1;
/// Exit status clap uses for usage errors.
pub const EXIT_USAGE: u8 = 2;
/// Exit status for configuration, connection, or schema failures.
pub const EXIT_ENVIRONMENT: u8 = 3;
/// Exit status for rejected requests.
pub const EXIT_BUSINESS_RULE: u8 = 4;

/// `storefront` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "storefront",
    about = "Create and delete storefront orders in MySQL",
    version
)]
pub struct Cli {
    /// Log output format written to stderr.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

/// Mutually exclusive operations; each run performs exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Ensure the schema and tables exist.
    Provision,
    /// Create an order with the given items.
    CreateOrder {
        #[arg(value_name = "ITEM", required = true, num_args = 1..)]
        items: Vec<String>,
    },
    /// Delete the orders owning the given item descriptions.
    RemoveOrders {
        #[arg(value_name = "ITEM", required = true, num_args = 1..)]
        items: Vec<String>,
    },
    /// Delete one order and its details.
    DeleteOrder {
        #[arg(value_name = "ORDER_ID", allow_negative_numbers = true)]
        order_id: i32,
    },
}

impl TryFrom<&Command> for StorefrontCommand {
    type Error = OrderValidationError;

    fn try_from(command: &Command) -> Result<Self, Self::Error> {
        Ok(match command {
            Command::Provision => Self::Provision,
            Command::CreateOrder { items } => Self::CreateOrder(OrderItems::new(items.clone())?),
            Command::RemoveOrders { items } => Self::RemoveOrders(OrderItems::new(items.clone())?),
            Command::DeleteOrder { order_id } => Self::DeleteOrder(OrderId::new(*order_id)?),
        })
    }
}

/// Failures that end a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] OrderValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error(transparent)]
    Connect(#[from] PoolError),
    #[error("{}: {}", .0.error().code(), .0)]
    Storefront(#[from] StorefrontError),
}

impl RunError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArguments(_) => EXIT_BUSINESS_RULE,
            Self::Config(_) | Self::Connect(_) | Self::Storefront(StorefrontError::Schema(_)) => {
                EXIT_ENVIRONMENT
            }
            Self::Runtime(_) => EXIT_INTERNAL,
            Self::Storefront(StorefrontError::Order(err)) => match err.code() {
                code if code.is_business_rule() => EXIT_BUSINESS_RULE,
                ErrorCode::ServiceUnavailable => EXIT_ENVIRONMENT,
                _ => EXIT_INTERNAL,
            },
        }
    }
}

/// Resolve configuration, connect, and run one command.
pub fn run(cli: &Cli) -> Result<CommandOutcome, RunError> {
    let command = StorefrontCommand::try_from(&cli.command)?;
    let settings = StorefrontSettings::load()?.resolve(&DefaultCredentialEnv)?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(RunError::Runtime)?;
    runtime.block_on(run_with_settings(&settings, &command))
}

async fn run_with_settings(
    settings: &ConnectionSettings,
    command: &StorefrontCommand,
) -> Result<CommandOutcome, RunError> {
    let (storefront, pool) = app::connect(settings, Arc::new(DefaultClock)).await?;
    let result = storefront.run(command).await;
    pool.close().await;
    Ok(result?)
}

/// Run, print the outcome, and translate the result into an exit status.
pub fn main_with(cli: &Cli) -> ExitCode {
    match run(cli) {
        Ok(outcome) => {
            print!("{outcome}");
            info!("run complete");
            ExitCode::from(EXIT_OK)
        }
        Err(err) => {
            error!(error = %err, "run failed");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use rstest::rstest;

    use super::*;
    use crate::domain::Error;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("storefront").chain(args.iter().copied()))
    }

    #[rstest]
    fn create_order_collects_items_in_order() {
        let cli = parse(&["create-order", "shoes", "shirt", "socks"]).expect("valid args");

        assert_eq!(
            cli.command,
            Command::CreateOrder {
                items: vec!["shoes".into(), "shirt".into(), "socks".into()]
            }
        );
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[rstest]
    #[case(&["create-order"])]
    #[case(&["remove-orders"])]
    #[case(&["delete-order", "six"])]
    #[case(&["delete-order"])]
    fn malformed_arguments_are_usage_errors(#[case] args: &[&str]) {
        let error = parse(args).expect_err("usage error");

        assert_ne!(error.kind(), ErrorKind::DisplayHelp);
        assert_eq!(error.exit_code(), i32::from(EXIT_USAGE));
    }

    #[rstest]
    fn log_format_is_global() {
        let cli = parse(&["provision", "--log-format", "json"]).expect("valid args");

        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.command, Command::Provision);
    }

    #[rstest]
    #[case(0)]
    #[case(-6)]
    fn non_positive_order_id_is_rejected_before_connecting(#[case] order_id: i32) {
        let command = Command::DeleteOrder { order_id };

        let result = StorefrontCommand::try_from(&command);

        assert!(result.is_err());
        let cli = Cli {
            log_format: LogFormat::Text,
            command,
        };
        let error = run(&cli).expect_err("validation fails");
        assert_eq!(error.exit_code(), EXIT_BUSINESS_RULE);
    }

    #[rstest]
    fn delete_order_accepts_positive_id() {
        let command = Command::DeleteOrder { order_id: 6 };

        assert_eq!(
            StorefrontCommand::try_from(&command),
            Ok(StorefrontCommand::DeleteOrder(OrderId::new(6).expect("id")))
        );
    }

    #[rstest]
    #[case(Error::not_found("gone"), EXIT_BUSINESS_RULE)]
    #[case(Error::conflict("ambiguous"), EXIT_BUSINESS_RULE)]
    #[case(Error::aborted("short insert"), EXIT_BUSINESS_RULE)]
    #[case(Error::service_unavailable("refused"), EXIT_ENVIRONMENT)]
    #[case(Error::internal("boom"), EXIT_INTERNAL)]
    fn order_errors_map_to_exit_codes(#[case] error: Error, #[case] expected: u8) {
        let err = RunError::from(StorefrontError::Order(error));

        assert_eq!(err.exit_code(), expected);
    }

    #[rstest]
    #[case(Error::internal("CREATE TABLE failed"))]
    #[case(Error::service_unavailable("refused"))]
    fn schema_errors_use_environment_status(#[case] error: Error) {
        let err = RunError::from(StorefrontError::Schema(error));

        assert_eq!(err.exit_code(), EXIT_ENVIRONMENT);
    }

    #[rstest]
    fn configuration_errors_use_environment_status() {
        assert_eq!(
            RunError::from(ConfigError::MissingUser).exit_code(),
            EXIT_ENVIRONMENT
        );
    }

    #[rstest]
    fn order_error_display_includes_code() {
        let error = Error::new(ErrorCode::NotFound, "order 6 missing");
        let err = RunError::from(StorefrontError::Order(error));

        assert_eq!(err.to_string(), "not_found: order 6 missing");
    }
}
