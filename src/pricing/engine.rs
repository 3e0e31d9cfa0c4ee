//! Two-sided quote generation across both outcome tokens.
//!
//! Combines a per-token [`Amm`] pair: splits deployable collateral between
//! the tokens by their marginal capital efficiency, then emits the full
//! desired order set for one tick.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::PricingError;
use crate::market::{Token, TokenMap};
use crate::orderbook::{Balances, Order};
use crate::utils::round_down;

use super::amm::{Amm, AmmConfig};

/// Reference prices at or beyond which one outcome is nearly resolved.
const EXTREME_LOW: Decimal = dec!(0.1);
const EXTREME_HIGH: Decimal = dec!(0.9);

/// Per-tick pricing inputs gathered by the keeper.
#[derive(Debug, Clone)]
pub struct QuoteInputs {
    /// Reference price per token; complementary (`a + b == 1`).
    pub prices: TokenMap<Decimal>,
    /// Quoting spread per token, competitive or static fallback.
    pub spreads: TokenMap<Decimal>,
    /// Price for the single sell level per token.
    pub sell_prices: TokenMap<Decimal>,
}

/// Pricing engine for a binary market: one [`Amm`] per outcome token plus
/// collateral allocation between them.
#[derive(Debug, Clone)]
pub struct AmmEngine {
    amms: TokenMap<Amm>,
    max_collateral: Decimal,
}

impl AmmEngine {
    /// Build an engine from a validated config.
    pub fn new(config: AmmConfig) -> Result<Self, PricingError> {
        config.validate()?;
        Ok(Self {
            amms: TokenMap::new(Amm::new(Token::A, config), Amm::new(Token::B, config)),
            max_collateral: config.max_collateral,
        })
    }

    /// Compute the complete desired order set for one tick.
    ///
    /// Pure with respect to venue state: the same inputs always produce the
    /// same orders. Never places or cancels anything.
    pub fn expected_orders(
        &self,
        inputs: &QuoteInputs,
        balances: &Balances,
    ) -> Result<Vec<Order>, PricingError> {
        let ladder_a = self.amms.a.ladder(inputs.prices.a, inputs.spreads.a);
        let ladder_b = self.amms.b.ladder(inputs.prices.b, inputs.spreads.b);

        let sells_a = self.amms.a.sell_orders(inputs.sell_prices.a, balances.token_a);
        let sells_b = self.amms.b.sell_orders(inputs.sell_prices.b, balances.token_b);

        let best_sell = |sells: &[Order]| sells.first().map(|o| o.size).unwrap_or_default();
        let phi_a = self.amms.a.phi(&ladder_a)?;
        let phi_b = self.amms.b.phi(&ladder_b)?;

        let total = balances.collateral.min(self.max_collateral);
        let (alloc_a, alloc_b) =
            Self::collateral_allocation(total, best_sell(&sells_a), best_sell(&sells_b), phi_a, phi_b);
        debug!(%total, %alloc_a, %alloc_b, "Allocated collateral");

        let mut buys_a = self.amms.a.buy_orders(&ladder_a, alloc_a)?;
        let mut buys_b = self.amms.b.buy_orders(&ladder_b, alloc_b)?;

        // Near resolution, an empty buy ladder on either token means a fill
        // on the other side could not be hedged back. Quote sells only.
        let extreme = inputs.prices.a <= EXTREME_LOW || inputs.prices.a >= EXTREME_HIGH;
        if extreme && (buys_a.is_empty() || buys_b.is_empty()) {
            debug!(price_a = %inputs.prices.a, "Extreme price band, suppressing all buys");
            buys_a.clear();
            buys_b.clear();
        }

        let mut orders = sells_a;
        orders.extend(sells_b);
        orders.extend(buys_a);
        orders.extend(buys_b);
        Ok(orders)
    }

    /// Split `total` collateral between the tokens so the keeper's inventory
    /// exposure stays balanced.
    ///
    /// Solves `sell_a + total_a * phi_a == sell_b + total_b * phi_b` for
    /// `total_a`, clamped to `[0, total]`. Token A gets the rounded-down
    /// share and token B the exact remainder, so the parts always sum to
    /// `total`.
    fn collateral_allocation(
        total: Decimal,
        sell_a: Decimal,
        sell_b: Decimal,
        phi_a: Decimal,
        phi_b: Decimal,
    ) -> (Decimal, Decimal) {
        if phi_a.is_zero() && phi_b.is_zero() {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        let alloc_a = ((sell_a - sell_b + total * phi_b) / (phi_a + phi_b))
            .clamp(Decimal::ZERO, total);
        let alloc_a = round_down(alloc_a, 2);
        (alloc_a, total - alloc_a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::Side;
    use pretty_assertions::assert_eq;

    fn test_config() -> AmmConfig {
        AmmConfig {
            p_min: dec!(0.05),
            p_max: dec!(0.95),
            spread: dec!(0.02),
            delta: dec!(0.01),
            depth: dec!(0.10),
            max_collateral: dec!(500),
            min_tick: dec!(0.01),
            min_size: dec!(15),
        }
    }

    fn inputs_at(price_a: Decimal) -> QuoteInputs {
        QuoteInputs {
            prices: TokenMap::new(price_a, Decimal::ONE - price_a),
            spreads: TokenMap::new(dec!(0.02), dec!(0.02)),
            sell_prices: TokenMap::new(price_a + dec!(0.02), Decimal::ONE - price_a + dec!(0.02)),
        }
    }

    fn no_inventory(collateral: Decimal) -> Balances {
        Balances {
            collateral,
            token_a: Decimal::ZERO,
            token_b: Decimal::ZERO,
        }
    }

    #[test]
    fn engine_rejects_invalid_config() {
        let config = AmmConfig {
            spread: dec!(0.20),
            ..test_config()
        };
        assert!(AmmEngine::new(config).is_err());
    }

    #[test]
    fn symmetric_midpoint_splits_collateral_evenly() {
        let engine = AmmEngine::new(test_config()).unwrap();
        let orders = engine
            .expected_orders(&inputs_at(dec!(0.50)), &no_inventory(dec!(1000)))
            .unwrap();

        assert!(!orders.is_empty());
        assert!(orders.iter().all(|o| o.side == Side::Buy));

        let notional =
            |token: Token| -> Decimal { orders.iter().filter(|o| o.token == token).map(|o| o.price * o.size).sum() };
        let spent_a = notional(Token::A);
        let spent_b = notional(Token::B);
        assert!(spent_a > Decimal::ZERO);
        // Mirror-image ladders: the two sides spend the same.
        assert_eq!(spent_a, spent_b);
    }

    #[test]
    fn deployment_is_capped_at_max_collateral() {
        let engine = AmmEngine::new(test_config()).unwrap();
        let orders = engine
            .expected_orders(&inputs_at(dec!(0.50)), &no_inventory(dec!(100000)))
            .unwrap();

        let spent: Decimal = orders
            .iter()
            .filter(|o| o.side == Side::Buy)
            .map(|o| o.price * o.size)
            .sum();
        assert!(spent <= dec!(500));
    }

    #[test]
    fn inventory_produces_sell_orders() {
        let engine = AmmEngine::new(test_config()).unwrap();
        let balances = Balances {
            collateral: Decimal::ZERO,
            token_a: dec!(80),
            token_b: Decimal::ZERO,
        };
        let orders = engine
            .expected_orders(&inputs_at(dec!(0.50)), &balances)
            .unwrap();

        let sells: Vec<_> = orders.iter().filter(|o| o.side == Side::Sell).collect();
        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].token, Token::A);
        assert_eq!(sells[0].size, dec!(80));
        assert_eq!(sells[0].price, dec!(0.52));
        // No collateral, no buys.
        assert!(orders.iter().all(|o| o.side == Side::Sell));
    }

    #[test]
    fn extreme_price_suppresses_buys() {
        let config = AmmConfig {
            p_min: dec!(0.02),
            p_max: dec!(0.98),
            ..test_config()
        };
        let engine = AmmEngine::new(config).unwrap();

        // At p_a = 0.95 the token B ladder sits near p_max where sizes are
        // enormous per unit collateral; the token A ladder is squeezed
        // against p_min. With modest capital token A's levels round below
        // min_size, emptying its ladder and tripping suppression.
        let orders = engine
            .expected_orders(&inputs_at(dec!(0.95)), &no_inventory(dec!(40)))
            .unwrap();
        assert!(orders.iter().all(|o| o.side == Side::Sell));
    }

    #[test]
    fn band_boundary_itself_counts_as_extreme() {
        let config = AmmConfig {
            p_min: dec!(0.02),
            p_max: dec!(0.98),
            ..test_config()
        };
        let engine = AmmEngine::new(config).unwrap();

        // Exactly 0.9 is inside the band, not just beyond it.
        let orders = engine
            .expected_orders(&inputs_at(dec!(0.9)), &no_inventory(dec!(40)))
            .unwrap();
        assert!(orders.iter().all(|o| o.side == Side::Sell));
    }

    #[test]
    fn allocation_sums_exactly_to_total() {
        let (a, b) = AmmEngine::collateral_allocation(
            dec!(333.337),
            dec!(10),
            dec!(4),
            dec!(0.31),
            dec!(0.27),
        );
        assert_eq!(a + b, dec!(333.337));
        assert!(a >= Decimal::ZERO && b >= Decimal::ZERO);
        assert_eq!(a, round_down(a, 2));
    }

    #[test]
    fn allocation_is_zero_when_no_ladder_exists() {
        let (a, b) = AmmEngine::collateral_allocation(
            dec!(100),
            dec!(5),
            dec!(5),
            Decimal::ZERO,
            Decimal::ZERO,
        );
        assert_eq!((a, b), (Decimal::ZERO, Decimal::ZERO));
    }

    #[test]
    fn allocation_clamps_to_bounds() {
        // Heavy existing sell exposure on token A pushes the raw solution
        // past `total`; it must clamp.
        let (a, b) = AmmEngine::collateral_allocation(
            dec!(100),
            dec!(1000),
            Decimal::ZERO,
            dec!(0.3),
            dec!(0.3),
        );
        assert_eq!(a, dec!(100));
        assert_eq!(b, Decimal::ZERO);

        // And symmetrically, a negative solution clamps to zero.
        let (a, b) = AmmEngine::collateral_allocation(
            dec!(100),
            Decimal::ZERO,
            dec!(1000),
            dec!(0.3),
            dec!(0.3),
        );
        assert_eq!(a, Decimal::ZERO);
        assert_eq!(b, dec!(100));
    }
}
