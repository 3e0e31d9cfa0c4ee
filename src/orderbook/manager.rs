//! Snapshot cache of the keeper's own venue state.
//!
//! A single background worker refreshes the cache on an interval; readers get
//! cheap cloned snapshots and never block on the network. Every mutation of
//! venue state (place, cancel) flows through here so the cache can be patched
//! optimistically between refreshes.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clob::{ClobApi, OrderArgs};
use crate::market::Market;
use crate::metrics;

use super::{Balances, Order, Snapshot};

/// Caches open orders and balances for one market.
#[derive(Debug)]
pub struct OrderBookManager<C> {
    clob: Arc<C>,
    market: Market,
    snapshot: Arc<RwLock<Snapshot>>,
    refresh_interval: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<C: ClobApi> OrderBookManager<C> {
    pub fn new(clob: Arc<C>, market: Market, refresh_interval: Duration) -> Self {
        Self {
            clob,
            market,
            snapshot: Arc::new(RwLock::new(Snapshot::default())),
            refresh_interval,
            worker: Mutex::new(None),
        }
    }

    /// Current snapshot, cloned out of the cache.
    pub fn get_snapshot(&self) -> Snapshot {
        self.snapshot.read().expect("snapshot lock poisoned").clone()
    }

    /// Fetch orders and balances from the venue and swap in a new snapshot.
    ///
    /// Partial failure keeps the stale portion: a failed order fetch leaves
    /// the cached orders, a failed balance fetch leaves the cached balances.
    pub async fn refresh(&self) {
        Self::refresh_cache(&self.clob, &self.market, &self.snapshot).await;
    }

    async fn refresh_cache(clob: &C, market: &Market, snapshot: &RwLock<Snapshot>) {
        let (orders_result, balances_result) = tokio::join!(
            clob.get_open_orders(&market.condition_id),
            Self::fetch_balances(clob, market),
        );

        let orders = match orders_result {
            Ok(open_orders) => {
                let mut orders = Vec::with_capacity(open_orders.len());
                for open in open_orders {
                    match market.token_from_id(&open.token_id) {
                        Some(token) => orders.push(
                            Order::new(open.side, token, open.price, open.size).with_id(open.id),
                        ),
                        // Orders for other markets can show up when the
                        // venue ignores the market filter.
                        None => warn!(
                            order_id = %open.id,
                            token_id = %open.token_id,
                            "Skipping open order for unknown token"
                        ),
                    }
                }
                Some(orders)
            }
            Err(error) => {
                warn!(%error, "Open order fetch failed, keeping cached orders");
                None
            }
        };

        if let Some(balances) = &balances_result {
            metrics::set_balance_gauges(balances.collateral, balances.token_a, balances.token_b);
        }

        let mut cached = snapshot.write().expect("snapshot lock poisoned");
        if let Some(orders) = orders {
            metrics::set_open_orders_gauge(orders.len());
            cached.orders = orders;
        }
        if balances_result.is_some() {
            cached.balances = balances_result;
        }
        cached.taken_at = OffsetDateTime::now_utc();
        debug!(
            orders = cached.orders.len(),
            usable = cached.is_usable(),
            "Snapshot refreshed"
        );
    }

    /// Fetch all three balances; any failure discards the whole set so the
    /// snapshot never mixes balances from different refreshes.
    async fn fetch_balances(clob: &C, market: &Market) -> Option<Balances> {
        let result = tokio::try_join!(
            clob.get_collateral_balance(),
            clob.get_token_balance(&market.token_a_id),
            clob.get_token_balance(&market.token_b_id),
        );
        match result {
            Ok((collateral, token_a, token_b)) => Some(Balances {
                collateral,
                token_a,
                token_b,
            }),
            Err(error) => {
                warn!(%error, "Balance fetch failed, keeping cached balances");
                None
            }
        }
    }

    /// Place a desired order; returns it with the venue id on success.
    ///
    /// The placed order is patched into the cache immediately so the next
    /// tick sees it before the refresh worker does.
    pub async fn place_order(&self, order: &Order) -> Option<Order> {
        let args = OrderArgs {
            token_id: self.market.token_id(order.token).to_string(),
            side: order.side,
            price: order.price,
            size: order.size,
        };
        match self.clob.place_order(&args).await {
            Ok(id) => {
                let placed = order.clone().with_id(id);
                info!(order = %placed, "Placed order");
                metrics::inc_orders_placed();
                self.snapshot
                    .write()
                    .expect("snapshot lock poisoned")
                    .orders
                    .push(placed.clone());
                Some(placed)
            }
            Err(error) => {
                error!(order = %order, %error, "Order placement failed");
                None
            }
        }
    }

    /// Cancel a live order. An order with no id was never placed, so there is
    /// nothing to cancel and the call trivially succeeds.
    pub async fn cancel_order(&self, order: &Order) -> bool {
        let Some(id) = &order.id else {
            return true;
        };
        match self.clob.cancel_order(id).await {
            Ok(true) => {
                info!(order = %order, "Cancelled order");
                metrics::inc_orders_cancelled();
                self.snapshot
                    .write()
                    .expect("snapshot lock poisoned")
                    .orders
                    .retain(|o| o.id.as_deref() != Some(id.as_str()));
                true
            }
            Ok(false) => {
                warn!(order = %order, "Venue refused cancel");
                false
            }
            Err(error) => {
                error!(order = %order, %error, "Cancel failed");
                false
            }
        }
    }

    /// Cancel every open keeper order, clearing the cache on success.
    pub async fn cancel_all(&self) -> bool {
        match self.clob.cancel_all().await {
            Ok(true) => {
                info!("Cancelled all orders");
                self.snapshot
                    .write()
                    .expect("snapshot lock poisoned")
                    .orders
                    .clear();
                true
            }
            Ok(false) => {
                warn!("Venue refused cancel-all");
                false
            }
            Err(error) => {
                error!(%error, "Cancel-all failed");
                false
            }
        }
    }

    /// Start the single refresh worker. Idempotent; a second call is a no-op.
    pub fn start(&self) {
        let mut worker = self.worker.lock().expect("worker lock poisoned");
        if worker.is_some() {
            return;
        }
        let clob = Arc::clone(&self.clob);
        let market = self.market.clone();
        let snapshot = Arc::clone(&self.snapshot);
        let interval = self.refresh_interval;
        info!(interval_secs = interval.as_secs(), "Starting snapshot refresh worker");
        *worker = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                Self::refresh_cache(&clob, &market, &snapshot).await;
            }
        }));
    }

    /// Stop the refresh worker.
    pub fn stop(&self) {
        if let Some(handle) = self.worker.lock().expect("worker lock poisoned").take() {
            handle.abort();
            info!("Stopped snapshot refresh worker");
        }
    }
}

impl<C> Drop for OrderBookManager<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.lock().expect("worker lock poisoned").take() {
            handle.abort();
        }
    }
}
