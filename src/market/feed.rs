//! Reference prices and competitor books for one market.
//!
//! Every accessor degrades instead of failing: a broken feed yields a
//! randomized default price or an empty book so a tick can still run.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::clob::ClobApi;
use crate::orderbook::CompetitorBook;
use crate::utils::randomize_default_price;

use super::{Market, Token, TokenMap};

/// Prices are consumed on a 2-decimal grid.
const PRICE_DECIMALS: u32 = 2;

/// Venue-backed price feed for a binary market.
#[derive(Debug, Clone)]
pub struct PriceFeed<C> {
    clob: Arc<C>,
    market: Market,
}

impl<C: ClobApi> PriceFeed<C> {
    pub fn new(clob: Arc<C>, market: Market) -> Self {
        Self { clob, market }
    }

    /// Complementary reference prices for both tokens.
    ///
    /// Token A's price is the venue midpoint; token B is always its
    /// complement so the pair sums to one. When the midpoint is
    /// unavailable the price falls back to a jittered default rather than
    /// pinning every degraded keeper to the same quote.
    pub async fn target_prices(&self) -> TokenMap<Decimal> {
        let price_a = match self.clob.get_midpoint(self.market.token_id(Token::A)).await {
            Ok(mid) => mid.round_dp_with_strategy(
                PRICE_DECIMALS,
                RoundingStrategy::MidpointAwayFromZero,
            ),
            Err(error) => {
                let fallback = randomize_default_price();
                warn!(%error, %fallback, "Midpoint unavailable, using randomized default");
                fallback
            }
        };
        TokenMap::new(price_a, Decimal::ONE - price_a)
    }

    /// Venue top-of-book spread for token A, if the venue can report one.
    pub async fn venue_spread(&self) -> Option<Decimal> {
        match self.clob.get_spread(self.market.token_id(Token::A)).await {
            Ok(spread) => Some(spread),
            Err(error) => {
                warn!(%error, "Spread unavailable");
                None
            }
        }
    }

    /// Competitor order book for a token, empty when the fetch fails.
    pub async fn order_book(&self, token: Token) -> CompetitorBook {
        match self.clob.get_order_book(self.market.token_id(token)).await {
            Ok(book) => book,
            Err(error) => {
                warn!(%token, %error, "Order book unavailable, treating as empty");
                CompetitorBook::default()
            }
        }
    }
}
