//! Mock CLOB collaborator for unit and integration testing.
//!
//! Implements [`ClobApi`] against in-memory state with per-call failure
//! injection, so the cache, pricing, and reconciliation paths can be tested
//! without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;

use crate::error::ClobError;
use crate::orderbook::CompetitorBook;

use super::client::{ClobApi, OpenOrder, OrderArgs};

/// Which mock calls should fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockFailures {
    /// Fail open-order fetches.
    pub orders: bool,
    /// Fail balance fetches.
    pub balances: bool,
    /// Fail midpoint fetches.
    pub midpoint: bool,
    /// Fail spread fetches.
    pub spread: bool,
    /// Fail order book fetches.
    pub book: bool,
    /// Reject order placement.
    pub place: bool,
    /// Reject cancels.
    pub cancel: bool,
}

#[derive(Debug, Default)]
struct MockState {
    open_orders: Vec<OpenOrder>,
    collateral: Decimal,
    token_balances: HashMap<String, Decimal>,
    midpoints: HashMap<String, Decimal>,
    spreads: HashMap<String, Decimal>,
    books: HashMap<String, CompetitorBook>,
    placed: Vec<OrderArgs>,
    cancelled: Vec<String>,
    cancel_all_calls: u64,
    spread_calls: u64,
    failures: MockFailures,
}

/// In-memory [`ClobApi`] implementation.
#[derive(Debug, Clone, Default)]
pub struct MockClob {
    state: Arc<Mutex<MockState>>,
    next_id: Arc<AtomicU64>,
}

impl MockClob {
    /// Create an empty mock venue.
    pub fn new() -> Self {
        Self::default()
    }

    fn mock_error(call: &str) -> ClobError {
        ClobError::Parse {
            endpoint: call.to_string(),
            reason: "mock failure".to_string(),
        }
    }

    /// Configure which calls fail.
    pub fn set_failures(&self, failures: MockFailures) {
        self.state.lock().unwrap().failures = failures;
    }

    /// Set the collateral balance.
    pub fn set_collateral(&self, balance: Decimal) {
        self.state.lock().unwrap().collateral = balance;
    }

    /// Set the balance of an outcome token.
    pub fn set_token_balance(&self, token_id: impl Into<String>, balance: Decimal) {
        self.state
            .lock()
            .unwrap()
            .token_balances
            .insert(token_id.into(), balance);
    }

    /// Set the midpoint price for a token.
    pub fn set_midpoint(&self, token_id: impl Into<String>, mid: Decimal) {
        self.state.lock().unwrap().midpoints.insert(token_id.into(), mid);
    }

    /// Set the top-of-book spread for a token.
    pub fn set_spread(&self, token_id: impl Into<String>, spread: Decimal) {
        self.state.lock().unwrap().spreads.insert(token_id.into(), spread);
    }

    /// Set the competitor book for a token.
    pub fn set_book(&self, token_id: impl Into<String>, book: CompetitorBook) {
        self.state.lock().unwrap().books.insert(token_id.into(), book);
    }

    /// Seed a live open order.
    pub fn add_open_order(&self, order: OpenOrder) {
        self.state.lock().unwrap().open_orders.push(order);
    }

    /// Orders placed through the mock, in call order.
    pub fn placed(&self) -> Vec<OrderArgs> {
        self.state.lock().unwrap().placed.clone()
    }

    /// Order ids cancelled through the mock, in call order.
    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }

    /// How many times cancel-all was invoked.
    pub fn cancel_all_calls(&self) -> u64 {
        self.state.lock().unwrap().cancel_all_calls
    }

    /// How many times the spread was queried.
    pub fn spread_calls(&self) -> u64 {
        self.state.lock().unwrap().spread_calls
    }
}

impl ClobApi for MockClob {
    async fn get_open_orders(&self, _condition_id: &str) -> Result<Vec<OpenOrder>, ClobError> {
        let state = self.state.lock().unwrap();
        if state.failures.orders {
            return Err(Self::mock_error("get_orders"));
        }
        Ok(state.open_orders.clone())
    }

    async fn get_collateral_balance(&self) -> Result<Decimal, ClobError> {
        let state = self.state.lock().unwrap();
        if state.failures.balances {
            return Err(Self::mock_error("balance_allowance"));
        }
        Ok(state.collateral)
    }

    async fn get_token_balance(&self, token_id: &str) -> Result<Decimal, ClobError> {
        let state = self.state.lock().unwrap();
        if state.failures.balances {
            return Err(Self::mock_error("balance_allowance"));
        }
        Ok(state.token_balances.get(token_id).copied().unwrap_or_default())
    }

    async fn place_order(&self, args: &OrderArgs) -> Result<String, ClobError> {
        let mut state = self.state.lock().unwrap();
        if state.failures.place {
            return Err(ClobError::OrderRejected {
                reason: "mock rejection".to_string(),
            });
        }
        state.placed.push(args.clone());
        let id = format!("mock-order-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        Ok(id)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<bool, ClobError> {
        let mut state = self.state.lock().unwrap();
        if state.failures.cancel {
            return Ok(false);
        }
        state.cancelled.push(order_id.to_string());
        state.open_orders.retain(|o| o.id != order_id);
        Ok(true)
    }

    async fn cancel_all(&self) -> Result<bool, ClobError> {
        let mut state = self.state.lock().unwrap();
        if state.failures.cancel {
            return Ok(false);
        }
        state.cancel_all_calls += 1;
        state.open_orders.clear();
        Ok(true)
    }

    async fn get_midpoint(&self, token_id: &str) -> Result<Decimal, ClobError> {
        let state = self.state.lock().unwrap();
        if state.failures.midpoint {
            return Err(Self::mock_error("get_midpoint"));
        }
        state
            .midpoints
            .get(token_id)
            .copied()
            .ok_or_else(|| Self::mock_error("get_midpoint"))
    }

    async fn get_spread(&self, token_id: &str) -> Result<Decimal, ClobError> {
        let mut state = self.state.lock().unwrap();
        state.spread_calls += 1;
        if state.failures.spread {
            return Err(Self::mock_error("get_spread"));
        }
        state
            .spreads
            .get(token_id)
            .copied()
            .ok_or_else(|| Self::mock_error("get_spread"))
    }

    async fn get_order_book(&self, token_id: &str) -> Result<CompetitorBook, ClobError> {
        let state = self.state.lock().unwrap();
        if state.failures.book {
            return Err(Self::mock_error("get_order_book"));
        }
        Ok(state.books.get(token_id).cloned().unwrap_or_default())
    }
}
