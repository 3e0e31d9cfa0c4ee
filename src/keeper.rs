//! The reconciliation loop: one tick from cached snapshot to venue actions.
//!
//! Each tick reads the cached snapshot, derives pricing inputs from the
//! competitor books, asks the strategy for a diff, and applies cancels before
//! placements. Every step is best-effort; a tick never takes the keeper down.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::clob::ClobApi;
use crate::market::{PriceFeed, Token, TokenMap};
use crate::metrics;
use crate::orderbook::{OrderBookManager, PriceLevel};
use crate::pricing::QuoteInputs;
use crate::strategy::Strategy;

/// Orchestrates one market's quoting.
pub struct Keeper<C> {
    manager: Arc<OrderBookManager<C>>,
    feed: PriceFeed<C>,
    strategy: Strategy,
    static_spread: Decimal,
    collateral_cap: Decimal,
}

impl<C: ClobApi> Keeper<C> {
    pub fn new(manager: Arc<OrderBookManager<C>>, feed: PriceFeed<C>, strategy: Strategy) -> Self {
        let static_spread = strategy.static_spread();
        let collateral_cap = strategy.collateral_cap();
        Self {
            manager,
            feed,
            strategy,
            static_spread,
            collateral_cap,
        }
    }

    /// Run one reconciliation tick. Returns the number of venue actions
    /// performed (successful cancels plus placements).
    ///
    /// Never panics and never returns an error: a tick that cannot proceed
    /// logs why and leaves the book untouched for the next interval.
    pub async fn synchronize(&self) -> usize {
        let snapshot = self.manager.get_snapshot();
        let Some(balances) = snapshot.balances.filter(|_| snapshot.is_usable()) else {
            warn!("Snapshot not usable yet, skipping tick");
            metrics::inc_sync_skips();
            return 0;
        };

        let prices = self.feed.target_prices().await;
        let (venue_spread, book_a, book_b) = tokio::join!(
            self.feed.venue_spread(),
            self.feed.order_book(Token::A),
            self.feed.order_book(Token::B),
        );

        let cap = balances.collateral.min(self.collateral_cap);
        let spreads = TokenMap::new(
            self.derived_spread(prices.a, &book_a.bids, cap),
            self.derived_spread(prices.b, &book_b.bids, cap),
        );
        // No competitor ask to join: offer at the reference price itself.
        // Adding a spread here could push the quote past 1 near resolution.
        let sell_prices = TokenMap::new(
            book_a.best_ask().unwrap_or(prices.a),
            book_b.best_ask().unwrap_or(prices.b),
        );
        debug!(
            price_a = %prices.a,
            venue_spread = ?venue_spread,
            best_bid_a = ?book_a.best_bid(),
            spread_a = %spreads.a,
            spread_b = %spreads.b,
            "Tick inputs"
        );

        let inputs = QuoteInputs {
            prices,
            spreads,
            sell_prices,
        };
        let (to_cancel, to_place) =
            match self.strategy.get_orders(&snapshot.orders, &inputs, &balances) {
                Ok(diff) => diff,
                Err(err) => {
                    error!(error = %err, "Strategy failed, skipping tick");
                    metrics::inc_sync_skips();
                    return 0;
                }
            };

        if !to_cancel.is_empty() || !to_place.is_empty() {
            info!(
                cancels = to_cancel.len(),
                placements = to_place.len(),
                "Reconciling order book"
            );
        }

        // Cancels first: freed collateral funds the placements.
        let mut actions = 0;
        for order in &to_cancel {
            if self.manager.cancel_order(order).await {
                actions += 1;
            }
        }
        for order in &to_place {
            if self.manager.place_order(order).await.is_some() {
                actions += 1;
            }
        }

        metrics::inc_sync_runs();
        actions
    }

    /// Quoting spread implied by the depth of the competitor bids.
    ///
    /// Walks the bid levels accumulating notional until it exceeds the
    /// deployable collateral; the keeper quotes just behind that much depth
    /// so its ladder sits where fills are meaningful. Books too thin to
    /// absorb the capital fall back to the static spread.
    fn derived_spread(&self, mid: Decimal, bids: &[PriceLevel], cap: Decimal) -> Decimal {
        let mut depth = Decimal::ZERO;
        for level in bids {
            depth += level.notional();
            if depth > cap {
                let spread = mid - level.price;
                if spread > Decimal::ZERO {
                    return spread;
                }
                break;
            }
        }
        self.static_spread
    }

    /// Pull all quotes and stop the refresh worker. Called once on shutdown.
    pub async fn shutdown(&self) {
        info!("Shutting down, cancelling all orders");
        if !self.manager.cancel_all().await {
            warn!("Cancel-all failed during shutdown, orders may remain live");
        }
        self.manager.stop();
    }
}
