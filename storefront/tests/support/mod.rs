//! Shared fixtures for storefront integration tests.

#![allow(dead_code, reason = "each test crate uses a different subset")]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use storefront::app::Storefront;
use storefront::domain::OrderItems;
use storefront::test_support::{FixedClock, InMemoryOrderRepository, InMemorySchemaRepository};

pub type InMemoryStorefront = Storefront<InMemorySchemaRepository, InMemoryOrderRepository>;

/// Build a storefront over the given in-memory stores with a frozen clock.
pub fn in_memory_storefront(
    schema: &InMemorySchemaRepository,
    orders: &InMemoryOrderRepository,
) -> InMemoryStorefront {
    Storefront::new(
        Arc::new(schema.clone()),
        Arc::new(orders.clone()),
        Arc::new(FixedClock::fixture()),
    )
}

pub fn items(values: &[&str]) -> OrderItems {
    OrderItems::new(values.iter().copied()).expect("non-empty items")
}

pub fn placed_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .expect("valid fixture timestamp")
}

/// Returns the variable's value, or prints a skip marker when it is unset.
pub fn live_mysql_user(variable: &str) -> Option<String> {
    match std::env::var(variable) {
        Ok(user) if !user.is_empty() => Some(user),
        _ => {
            eprintln!("SKIP-TEST-MYSQL: {variable} not set");
            None
        }
    }
}
