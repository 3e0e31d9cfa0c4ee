//! Market-making keeper for binary-outcome CLOB markets.
//!
//! The keeper quotes both outcome tokens of one Polymarket-style binary
//! market from a constant-product bonding curve, keeping the live order book
//! reconciled with the desired quote set on a fixed interval.
//!
//! # Architecture
//!
//! Three pieces cooperate per tick:
//!
//! ```text
//! snapshot cache  ──►  pricing engine  ──►  reconciliation
//! (orders+balances)    (desired orders)     (cancel + place diff)
//! ```
//!
//! The cache is refreshed by a single background worker so the tick itself
//! never waits on balance queries; the pricing engine is pure; the
//! reconciliation loop applies the diff best-effort and trusts the next tick
//! to repair whatever failed.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`clob`]: Venue API trait, HTTP client, and test mock
//! - [`market`]: Market identity and reference prices
//! - [`orderbook`]: Order types and the cached snapshot
//! - [`pricing`]: Bonding-curve ladders and capital allocation
//! - [`strategy`]: Quoting strategies and the order diff
//! - [`keeper`]: The per-tick reconciliation loop
//! - [`utils`]: Utility functions

pub mod clob;
pub mod config;
pub mod error;
pub mod keeper;
pub mod market;
pub mod metrics;
pub mod orderbook;
pub mod pricing;
pub mod strategy;
pub mod utils;

pub use config::Config;
pub use error::{BotError, Result};
pub use keeper::Keeper;
