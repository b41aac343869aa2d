//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: MySQL-backed repositories using `sqlx`

pub mod persistence;
