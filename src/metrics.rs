//! Prometheus metrics for keeper monitoring.
//!
//! This module provides metrics for:
//! - CLOB request latency
//! - Order placement and cancellation counts
//! - Synchronization tick outcomes
//! - Cached balance levels

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

// === Metric Name Constants ===

/// CLOB request latency metric name.
pub const METRIC_CLOB_REQUEST_LATENCY: &str = "clob_request_latency_ms";
/// Orders placed counter metric name.
pub const METRIC_ORDERS_PLACED: &str = "orders_placed_total";
/// Orders cancelled counter metric name.
pub const METRIC_ORDERS_CANCELLED: &str = "orders_cancelled_total";
/// Completed synchronization ticks counter metric name.
pub const METRIC_SYNC_RUNS: &str = "sync_runs_total";
/// Skipped synchronization ticks counter metric name.
pub const METRIC_SYNC_SKIPS: &str = "sync_skips_total";
/// Collateral balance gauge metric name.
pub const METRIC_COLLATERAL_BALANCE: &str = "collateral_balance";
/// Outcome token balance gauge metric name.
pub const METRIC_TOKEN_BALANCE: &str = "token_balance";
/// Live open order count gauge metric name.
pub const METRIC_OPEN_ORDERS: &str = "open_orders";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_CLOB_REQUEST_LATENCY,
        "CLOB request latency in milliseconds"
    );

    describe_counter!(METRIC_ORDERS_PLACED, "Total number of orders placed");
    describe_counter!(METRIC_ORDERS_CANCELLED, "Total number of orders cancelled");
    describe_counter!(
        METRIC_SYNC_RUNS,
        "Total number of completed synchronization ticks"
    );
    describe_counter!(
        METRIC_SYNC_SKIPS,
        "Total number of synchronization ticks skipped on an unusable snapshot"
    );

    describe_gauge!(METRIC_COLLATERAL_BALANCE, "Cached collateral balance");
    describe_gauge!(
        METRIC_TOKEN_BALANCE,
        "Cached outcome token balance, labelled per token"
    );
    describe_gauge!(METRIC_OPEN_ORDERS, "Number of open orders in the cache");

    debug!("Metrics initialized");
}

/// Record CLOB request latency, labelled by endpoint and outcome.
pub fn record_clob_latency(endpoint: &str, status: &str, start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(
        METRIC_CLOB_REQUEST_LATENCY,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string(),
    )
    .record(latency_ms);
}

/// Increment the orders placed counter.
pub fn inc_orders_placed() {
    counter!(METRIC_ORDERS_PLACED).increment(1);
}

/// Increment the orders cancelled counter.
pub fn inc_orders_cancelled() {
    counter!(METRIC_ORDERS_CANCELLED).increment(1);
}

/// Increment the completed synchronization tick counter.
pub fn inc_sync_runs() {
    counter!(METRIC_SYNC_RUNS).increment(1);
}

/// Increment the skipped synchronization tick counter.
pub fn inc_sync_skips() {
    counter!(METRIC_SYNC_SKIPS).increment(1);
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Publish cached balances as gauges.
pub fn set_balance_gauges(collateral: Decimal, token_a: Decimal, token_b: Decimal) {
    gauge!(METRIC_COLLATERAL_BALANCE).set(to_f64(collateral));
    gauge!(METRIC_TOKEN_BALANCE, "token" => "A").set(to_f64(token_a));
    gauge!(METRIC_TOKEN_BALANCE, "token" => "B").set(to_f64(token_b));
}

/// Publish the cached open-order count as a gauge.
pub fn set_open_orders_gauge(count: usize) {
    gauge!(METRIC_OPEN_ORDERS).set(count as f64);
}
