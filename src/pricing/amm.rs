//! Constant-product bonding-curve pricing for one outcome token.
//!
//! Given a reference price, the AMM builds a descending ladder of buy levels
//! inside a depth band and sizes them from a virtual-liquidity curve so the
//! levels partition the allocated capital. The sell side is a single level:
//! the whole token inventory offered at the best competitive ask.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::debug;

use crate::error::PricingError;
use crate::market::Token;
use crate::orderbook::{Order, Side};
use crate::utils::round_down;

/// Sizes are quoted to 2 decimal places, always rounded down.
const SIZE_DECIMALS: u32 = 2;

/// Pricing parameters for the AMM, loaded from the strategy config file.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AmmConfig {
    /// Lowest price the keeper will ever quote.
    pub p_min: Decimal,
    /// Highest price the keeper will ever quote.
    pub p_max: Decimal,
    /// Static quoting spread, used when no competitive spread is derivable.
    pub spread: Decimal,
    /// Price step between successive buy levels.
    pub delta: Decimal,
    /// Half-width of the quoting band around the reference price.
    pub depth: Decimal,
    /// Hard cap on collateral deployed across both tokens.
    pub max_collateral: Decimal,
    /// Venue price grid resolution.
    pub min_tick: Decimal,
    /// Minimum order size; smaller levels are dropped, not resized.
    pub min_size: Decimal,
}

impl AmmConfig {
    /// Reject inconsistent configurations. Fatal at construction.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.p_min <= Decimal::ZERO || self.p_min >= self.p_max {
            return Err(PricingError::InvalidConfig(format!(
                "p_min must satisfy 0 < p_min < p_max (p_min={}, p_max={})",
                self.p_min, self.p_max
            )));
        }
        if self.spread >= self.depth {
            return Err(PricingError::InvalidConfig(format!(
                "spread must be strictly less than depth (spread={}, depth={})",
                self.spread, self.depth
            )));
        }
        if self.delta <= Decimal::ZERO {
            return Err(PricingError::InvalidConfig(format!(
                "delta must be positive (delta={})",
                self.delta
            )));
        }
        if self.min_tick <= Decimal::ZERO {
            return Err(PricingError::InvalidConfig(format!(
                "min_tick must be positive (min_tick={})",
                self.min_tick
            )));
        }
        if self.min_size < Decimal::ZERO {
            return Err(PricingError::InvalidConfig(format!(
                "min_size must be non-negative (min_size={})",
                self.min_size
            )));
        }
        if self.max_collateral < Decimal::ZERO {
            return Err(PricingError::InvalidConfig(format!(
                "max_collateral must be non-negative (max_collateral={})",
                self.max_collateral
            )));
        }
        Ok(())
    }

    /// Number of decimal places on the venue price grid.
    pub fn tick_decimals(&self) -> u32 {
        self.min_tick.normalize().scale()
    }
}

/// Price ladder for one token, recomputed fresh every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ladder {
    /// Reference price the ladder was built from.
    pub p_i: Decimal,
    /// Upper bound, clipped to the depth band and the tick grid.
    pub p_u: Decimal,
    /// Lower bound, clipped to the depth band and the tick grid.
    pub p_l: Decimal,
    /// Buy prices, descending from `p_i - spread` to `p_l` in steps of delta.
    pub buy_prices: Vec<Decimal>,
}

impl Ladder {
    /// Whether the ladder has no buy levels.
    pub fn is_empty(&self) -> bool {
        self.buy_prices.is_empty()
    }
}

/// Bonding-curve market maker for a single outcome token.
#[derive(Debug, Clone)]
pub struct Amm {
    token: Token,
    config: AmmConfig,
}

fn sqrt(value: Decimal) -> Result<Decimal, PricingError> {
    if value <= Decimal::ZERO {
        return Err(PricingError::Math(format!(
            "square root of non-positive price {value}"
        )));
    }
    value
        .sqrt()
        .ok_or_else(|| PricingError::Math(format!("square root of {value} failed")))
}

impl Amm {
    /// Create an AMM for one token. The config must already be validated.
    pub fn new(token: Token, config: AmmConfig) -> Self {
        Self { token, config }
    }

    /// The token this AMM quotes.
    pub fn token(&self) -> Token {
        self.token
    }

    fn round_tick(&self, price: Decimal, strategy: RoundingStrategy) -> Decimal {
        price.round_dp_with_strategy(self.config.tick_decimals(), strategy)
    }

    /// Build the price ladder around a reference price.
    ///
    /// Bounds get a half-tick inward adjustment before grid rounding so no
    /// ladder price can touch or cross `p_min`/`p_max`.
    pub fn ladder(&self, p_i: Decimal, spread: Decimal) -> Ladder {
        let half_tick = self.config.min_tick / dec!(2);
        let p_u = self.round_tick(
            (p_i + self.config.depth).min(self.config.p_max) - half_tick,
            RoundingStrategy::ToZero,
        );
        let p_l = self.round_tick(
            (p_i - self.config.depth).max(self.config.p_min) + half_tick,
            RoundingStrategy::AwayFromZero,
        );
        debug!(token = %self.token, %p_i, %p_u, %p_l, "Computed ladder bounds");

        let mut buy_prices = Vec::new();
        let mut price = self.round_tick(p_i - spread, RoundingStrategy::MidpointAwayFromZero);
        while price >= p_l {
            if price <= p_u {
                buy_prices.push(price);
            }
            price = self.round_tick(price - self.config.delta, RoundingStrategy::MidpointAwayFromZero);
        }
        debug!(token = %self.token, ?buy_prices, "Computed buy ladder");

        Ladder {
            p_i,
            p_u,
            p_l,
            buy_prices,
        }
    }

    /// Marginal capital efficiency at the top of the buy ladder.
    ///
    /// Zero when the ladder has no buy levels; used only for collateral
    /// allocation, never as an order.
    pub fn phi(&self, ladder: &Ladder) -> Result<Decimal, PricingError> {
        let Some(&best) = ladder.buy_prices.first() else {
            return Ok(Decimal::ZERO);
        };
        let denom = sqrt(ladder.p_i)? - sqrt(ladder.p_l)?;
        if denom <= Decimal::ZERO {
            return Err(PricingError::Math(format!(
                "degenerate ladder: p_i={} p_l={}",
                ladder.p_i, ladder.p_l
            )));
        }
        Ok((Decimal::ONE / denom) * (Decimal::ONE / sqrt(best)? - Decimal::ONE / sqrt(ladder.p_i)?))
    }

    /// Cumulative buy size obtainable at `p_t` with `collateral` capital.
    ///
    /// Virtual liquidity: `L = collateral / (sqrt(p_i) - sqrt(p_l))`; the size
    /// at a target price is `L * (1/sqrt(p_t) - 1/sqrt(p_i))`.
    pub fn buy_size(
        &self,
        collateral: Decimal,
        p_t: Decimal,
        ladder: &Ladder,
    ) -> Result<Decimal, PricingError> {
        let denom = sqrt(ladder.p_i)? - sqrt(ladder.p_l)?;
        if denom <= Decimal::ZERO {
            return Err(PricingError::Math(format!(
                "degenerate ladder: p_i={} p_l={}",
                ladder.p_i, ladder.p_l
            )));
        }
        let liquidity = collateral / denom;
        Ok(liquidity * (Decimal::ONE / sqrt(p_t)? - Decimal::ONE / sqrt(ladder.p_i)?))
    }

    /// Successive differences of a cumulative sequence.
    ///
    /// Summing the output reproduces the input's last element, so the levels
    /// partition (not duplicate) the cumulative curve.
    pub fn diff(cumulative: &[Decimal]) -> Vec<Decimal> {
        cumulative
            .iter()
            .enumerate()
            .map(|(i, &value)| if i == 0 { value } else { value - cumulative[i - 1] })
            .collect()
    }

    /// Buy orders for the ladder, sized from `collateral`.
    ///
    /// Sizes are computed cumulatively from the reference price outward, then
    /// converted to per-level increments and rounded down. Levels below
    /// `min_size` are dropped entirely.
    pub fn buy_orders(
        &self,
        ladder: &Ladder,
        collateral: Decimal,
    ) -> Result<Vec<Order>, PricingError> {
        let cumulative = ladder
            .buy_prices
            .iter()
            .map(|&p_t| self.buy_size(collateral, p_t, ladder))
            .collect::<Result<Vec<_>, _>>()?;

        let orders = Self::diff(&cumulative)
            .into_iter()
            .map(|size| round_down(size, SIZE_DECIMALS))
            .zip(ladder.buy_prices.iter())
            .filter(|(size, _)| *size >= self.config.min_size && *size > Decimal::ZERO)
            .map(|(size, &price)| Order::new(Side::Buy, self.token, price, size))
            .collect();

        Ok(orders)
    }

    /// Sell orders: the entire token inventory at a single competitive price.
    ///
    /// Inventory is the scarce resource, so it is fully offered at the top of
    /// book rather than laddered.
    pub fn sell_orders(&self, best_ask: Decimal, balance: Decimal) -> Vec<Order> {
        let price = self.round_tick(best_ask, RoundingStrategy::MidpointAwayFromZero);
        let size = round_down(balance, SIZE_DECIMALS);
        if size >= self.config.min_size && size > Decimal::ZERO {
            vec![Order::new(Side::Sell, self.token, price, size)]
        } else {
            Vec::new()
        }
    }
}
