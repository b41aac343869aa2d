//! Storefront entry-point: parse arguments, install tracing, run one command.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::process::ExitCode;

use clap::Parser;
use storefront::cli::{Cli, main_with};
use storefront::telemetry::init_tracing;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    main_with(&cli)
}
