//! Storefront library modules.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
