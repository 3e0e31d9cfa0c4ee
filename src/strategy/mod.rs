//! Quoting strategies and the desired-vs-live order diff.

pub mod amm_strategy;
pub mod bands;

use std::path::Path;

use strum::{Display, EnumString};
use tracing::info;

use crate::error::{BotError, PricingError};
use crate::orderbook::{Balances, Order};
use crate::pricing::QuoteInputs;

pub use amm_strategy::AmmStrategy;
pub use bands::{Band, BandsConfig, BandsStrategy};

/// Which quoting strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum StrategyKind {
    /// Bonding-curve ladders sized from allocated collateral.
    #[strum(serialize = "amm")]
    Amm,
    /// Fixed margin bands with amount targets.
    #[strum(serialize = "bands")]
    Bands,
}

/// A configured quoting strategy.
#[derive(Debug, Clone)]
pub enum Strategy {
    Amm(AmmStrategy),
    Bands(BandsStrategy),
}

impl Strategy {
    /// Load a strategy from its JSON config file. Invalid parameters are
    /// fatal here rather than at the first tick.
    pub fn load(kind: StrategyKind, config_path: &Path) -> Result<Self, BotError> {
        let raw = std::fs::read_to_string(config_path)?;
        let strategy = match kind {
            StrategyKind::Amm => Self::Amm(AmmStrategy::new(serde_json::from_str(&raw)?)?),
            StrategyKind::Bands => Self::Bands(BandsStrategy::new(serde_json::from_str(&raw)?)?),
        };
        info!(%kind, config = %config_path.display(), "Loaded strategy");
        Ok(strategy)
    }

    /// Static quoting spread used when no competitive spread can be derived.
    pub fn static_spread(&self) -> rust_decimal::Decimal {
        match self {
            Self::Amm(amm) => amm.config().spread,
            // Bands ignore the spread input; top-up prices come from the
            // band margins themselves.
            Self::Bands(bands) => bands.reference_margin(),
        }
    }

    /// Cap on collateral considered deployable in one tick.
    pub fn collateral_cap(&self) -> rust_decimal::Decimal {
        match self {
            Self::Amm(amm) => amm.config().max_collateral,
            Self::Bands(_) => rust_decimal::Decimal::MAX,
        }
    }

    /// Compute the orders to cancel and to place for one tick.
    pub fn get_orders(
        &self,
        live_orders: &[Order],
        inputs: &QuoteInputs,
        balances: &Balances,
    ) -> Result<(Vec<Order>, Vec<Order>), PricingError> {
        match self {
            Self::Amm(amm) => amm.get_orders(live_orders, inputs, balances),
            Self::Bands(bands) => Ok(bands.get_orders(live_orders, inputs, balances)),
        }
    }
}

/// Diff live orders against a desired set by exact quote identity.
///
/// Matching is a multiset operation on (side, token, price, size): each live
/// order consumes at most one desired order. Leftover live orders are
/// cancelled and leftover desired orders are placed; a changed quote is
/// always a cancel plus a fresh placement, never an amend.
pub fn diff_orders(live_orders: &[Order], desired: Vec<Order>) -> (Vec<Order>, Vec<Order>) {
    let mut to_place = desired;
    let mut to_cancel = Vec::new();
    for live in live_orders {
        match to_place.iter().position(|d| d.matches(live)) {
            Some(index) => {
                to_place.remove(index);
            }
            None => to_cancel.push(live.clone()),
        }
    }
    (to_cancel, to_place)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Token;
    use crate::orderbook::Side;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn buy(price: rust_decimal::Decimal, size: rust_decimal::Decimal) -> Order {
        Order::new(Side::Buy, Token::A, price, size)
    }

    #[test]
    fn strategy_kind_parses_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(StrategyKind::from_str("amm").unwrap(), StrategyKind::Amm);
        assert_eq!(StrategyKind::from_str("AMM").unwrap(), StrategyKind::Amm);
        assert_eq!(StrategyKind::from_str("Bands").unwrap(), StrategyKind::Bands);
        assert!(StrategyKind::from_str("martingale").is_err());
    }

    #[test]
    fn matching_orders_are_left_alone() {
        let live = vec![buy(dec!(0.40), dec!(25)).with_id("live-1")];
        let desired = vec![buy(dec!(0.40), dec!(25))];

        let (cancels, places) = diff_orders(&live, desired);
        assert!(cancels.is_empty());
        assert!(places.is_empty());
    }

    #[test]
    fn changed_price_is_cancel_plus_place() {
        let live = vec![buy(dec!(0.40), dec!(25)).with_id("live-1")];
        let desired = vec![buy(dec!(0.41), dec!(25))];

        let (cancels, places) = diff_orders(&live, desired);
        assert_eq!(cancels.len(), 1);
        assert_eq!(cancels[0].id.as_deref(), Some("live-1"));
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].price, dec!(0.41));
    }

    #[test]
    fn changed_size_is_cancel_plus_place() {
        let live = vec![buy(dec!(0.40), dec!(25)).with_id("live-1")];
        let desired = vec![buy(dec!(0.40), dec!(30))];

        let (cancels, places) = diff_orders(&live, desired);
        assert_eq!(cancels.len(), 1);
        assert_eq!(places.len(), 1);
    }

    #[test]
    fn duplicate_quotes_match_as_a_multiset() {
        // Two identical live orders but only one desired: exactly one cancel.
        let live = vec![
            buy(dec!(0.40), dec!(25)).with_id("live-1"),
            buy(dec!(0.40), dec!(25)).with_id("live-2"),
        ];
        let desired = vec![buy(dec!(0.40), dec!(25))];

        let (cancels, places) = diff_orders(&live, desired);
        assert_eq!(cancels.len(), 1);
        assert!(places.is_empty());
    }

    #[test]
    fn empty_desired_cancels_everything() {
        let live = vec![
            buy(dec!(0.40), dec!(25)).with_id("live-1"),
            buy(dec!(0.39), dec!(30)).with_id("live-2"),
        ];
        let (cancels, places) = diff_orders(&live, Vec::new());
        assert_eq!(cancels.len(), 2);
        assert!(places.is_empty());
    }
}
