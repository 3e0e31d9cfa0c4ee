//! Keeper order state: order types and the cached venue snapshot.

pub mod manager;
pub mod types;

pub use manager::OrderBookManager;
pub use types::{Balances, CompetitorBook, Order, PriceLevel, Side, Snapshot};
