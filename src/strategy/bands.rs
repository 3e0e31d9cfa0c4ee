//! Bands strategy: margin windows around the reference price with amount
//! targets.
//!
//! Each band is a price window at a fixed margin from the reference price.
//! Live orders inside a band are topped up toward `avg_amount` when they fall
//! below `min_amount` and cancelled wholesale when they exceed `max_amount`;
//! orders outside every band are cancelled.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tracing::debug;

use crate::error::PricingError;
use crate::market::Token;
use crate::orderbook::{Balances, Order, Side};
use crate::pricing::QuoteInputs;
use crate::utils::round_down;

/// One margin window with its amount targets.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Band {
    /// Inner edge of the window, as a margin from the reference price.
    pub min_margin: Decimal,
    /// Margin at which top-up orders are placed.
    pub avg_margin: Decimal,
    /// Outer edge of the window.
    pub max_margin: Decimal,
    /// Top up when the banded amount falls below this.
    pub min_amount: Decimal,
    /// Top-up target amount.
    pub avg_amount: Decimal,
    /// Cancel the band when the amount exceeds this.
    pub max_amount: Decimal,
}

impl Band {
    fn validate(&self) -> Result<(), PricingError> {
        if self.min_margin <= Decimal::ZERO
            || self.min_margin > self.avg_margin
            || self.avg_margin > self.max_margin
        {
            return Err(PricingError::InvalidConfig(format!(
                "band margins must satisfy 0 < min <= avg <= max (got {}/{}/{})",
                self.min_margin, self.avg_margin, self.max_margin
            )));
        }
        if self.min_amount <= Decimal::ZERO
            || self.min_amount > self.avg_amount
            || self.avg_amount > self.max_amount
        {
            return Err(PricingError::InvalidConfig(format!(
                "band amounts must satisfy 0 < min <= avg <= max (got {}/{}/{})",
                self.min_amount, self.avg_amount, self.max_amount
            )));
        }
        Ok(())
    }

    /// Whether a live order's price falls inside this window.
    fn contains(&self, side: Side, target: Decimal, price: Decimal) -> bool {
        let margin = match side {
            Side::Buy => target - price,
            Side::Sell => price - target,
        };
        margin >= self.min_margin && margin <= self.max_margin
    }

    /// Price at which this band places top-up orders.
    fn order_price(&self, side: Side, target: Decimal) -> Decimal {
        let raw = match side {
            Side::Buy => target - self.avg_margin,
            Side::Sell => target + self.avg_margin,
        };
        raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Bands configuration: independent windows for each side.
#[derive(Debug, Clone, Deserialize)]
pub struct BandsConfig {
    pub buy_bands: Vec<Band>,
    pub sell_bands: Vec<Band>,
}

impl BandsConfig {
    fn validate(&self) -> Result<(), PricingError> {
        for band in self.buy_bands.iter().chain(&self.sell_bands) {
            band.validate()?;
        }
        for bands in [&self.buy_bands, &self.sell_bands] {
            for (i, a) in bands.iter().enumerate() {
                for b in &bands[i + 1..] {
                    if a.min_margin <= b.max_margin && b.min_margin <= a.max_margin {
                        return Err(PricingError::InvalidConfig(format!(
                            "bands overlap: [{}, {}] and [{}, {}]",
                            a.min_margin, a.max_margin, b.min_margin, b.max_margin
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Margin-band quoting strategy.
#[derive(Debug, Clone)]
pub struct BandsStrategy {
    config: BandsConfig,
}

impl BandsStrategy {
    /// Build the strategy; inconsistent bands are fatal.
    pub fn new(config: BandsConfig) -> Result<Self, PricingError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Margin standing in for a quoting spread where one is required.
    pub fn reference_margin(&self) -> Decimal {
        self.config
            .buy_bands
            .first()
            .map(|b| b.avg_margin)
            .unwrap_or(Decimal::new(2, 2))
    }

    /// Orders to cancel and place for one tick.
    ///
    /// Buy placements share the collateral balance across both tokens;
    /// sell placements are capped at the free token inventory.
    pub fn get_orders(
        &self,
        live_orders: &[Order],
        inputs: &QuoteInputs,
        balances: &Balances,
    ) -> (Vec<Order>, Vec<Order>) {
        let mut to_cancel = Vec::new();
        let mut to_place = Vec::new();
        let mut free_collateral = balances.collateral;

        for token in [Token::A, Token::B] {
            let target = *inputs.prices.get(token);
            let mut free_inventory = balances.token(token)
                - live_orders
                    .iter()
                    .filter(|o| o.token == token && o.side == Side::Sell)
                    .map(|o| o.size)
                    .sum::<Decimal>();

            for side in [Side::Buy, Side::Sell] {
                let bands = match side {
                    Side::Buy => &self.config.buy_bands,
                    Side::Sell => &self.config.sell_bands,
                };
                let live: Vec<&Order> = live_orders
                    .iter()
                    .filter(|o| o.token == token && o.side == side)
                    .collect();

                // Orders outside every band are stale quotes.
                to_cancel.extend(
                    live.iter()
                        .filter(|o| !bands.iter().any(|b| b.contains(side, target, o.price)))
                        .map(|o| (*o).clone()),
                );

                for band in bands {
                    let in_band: Vec<&&Order> = live
                        .iter()
                        .filter(|o| band.contains(side, target, o.price))
                        .collect();
                    let mut total: Decimal = in_band.iter().map(|o| o.size).sum();

                    if total > band.max_amount {
                        debug!(%token, %side, %total, "Band overweight, cancelling");
                        to_cancel.extend(in_band.iter().map(|o| (**o).clone()));
                        if side == Side::Sell {
                            free_inventory += total;
                        }
                        total = Decimal::ZERO;
                    }

                    if total < band.min_amount {
                        let price = band.order_price(side, target);
                        if price <= Decimal::ZERO || price >= Decimal::ONE {
                            continue;
                        }
                        let mut size = round_down(band.avg_amount - total, 2);
                        match side {
                            Side::Buy => {
                                let affordable = round_down(free_collateral / price, 2);
                                size = size.min(affordable);
                                free_collateral -= size * price;
                            }
                            Side::Sell => {
                                size = size.min(round_down(free_inventory, 2));
                                free_inventory -= size;
                            }
                        }
                        if size > Decimal::ZERO {
                            to_place.push(Order::new(side, token, price, size));
                        }
                    }
                }
            }
        }

        (to_cancel, to_place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::TokenMap;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn band() -> Band {
        Band {
            min_margin: dec!(0.01),
            avg_margin: dec!(0.03),
            max_margin: dec!(0.05),
            min_amount: dec!(20),
            avg_amount: dec!(30),
            max_amount: dec!(60),
        }
    }

    fn strategy() -> BandsStrategy {
        BandsStrategy::new(BandsConfig {
            buy_bands: vec![band()],
            sell_bands: vec![band()],
        })
        .unwrap()
    }

    fn inputs() -> QuoteInputs {
        QuoteInputs {
            prices: TokenMap::new(dec!(0.50), dec!(0.50)),
            spreads: TokenMap::new(dec!(0.02), dec!(0.02)),
            sell_prices: TokenMap::new(dec!(0.52), dec!(0.52)),
        }
    }

    #[test]
    fn rejects_disordered_margins() {
        let result = BandsStrategy::new(BandsConfig {
            buy_bands: vec![Band {
                min_margin: dec!(0.05),
                avg_margin: dec!(0.03),
                ..band()
            }],
            sell_bands: vec![],
        });
        assert!(result.is_err());
    }

    #[test]
    fn rejects_overlapping_bands() {
        let result = BandsStrategy::new(BandsConfig {
            buy_bands: vec![
                band(),
                Band {
                    min_margin: dec!(0.04),
                    avg_margin: dec!(0.06),
                    max_margin: dec!(0.08),
                    ..band()
                },
            ],
            sell_bands: vec![],
        });
        assert!(result.is_err());
    }

    #[test]
    fn empty_book_places_top_ups_on_both_sides() {
        let balances = Balances {
            collateral: dec!(1000),
            token_a: dec!(100),
            token_b: dec!(100),
        };
        let (cancels, places) = strategy().get_orders(&[], &inputs(), &balances);
        assert!(cancels.is_empty());
        // One buy and one sell per token.
        assert_eq!(places.len(), 4);

        let buy = places
            .iter()
            .find(|o| o.side == Side::Buy && o.token == Token::A)
            .unwrap();
        assert_eq!(buy.price, dec!(0.47));
        assert_eq!(buy.size, dec!(30));

        let sell = places
            .iter()
            .find(|o| o.side == Side::Sell && o.token == Token::A)
            .unwrap();
        assert_eq!(sell.price, dec!(0.53));
    }

    #[test]
    fn orders_outside_all_bands_are_cancelled() {
        let live = vec![Order::new(Side::Buy, Token::A, dec!(0.30), dec!(25)).with_id("stale")];
        let balances = Balances {
            collateral: dec!(1000),
            token_a: dec!(100),
            token_b: dec!(100),
        };
        let (cancels, _) = strategy().get_orders(&live, &inputs(), &balances);
        assert_eq!(cancels.len(), 1);
        assert_eq!(cancels[0].id.as_deref(), Some("stale"));
    }

    #[test]
    fn band_within_amounts_is_left_alone() {
        let live = vec![Order::new(Side::Buy, Token::A, dec!(0.47), dec!(25)).with_id("ok")];
        let balances = Balances {
            collateral: dec!(1000),
            token_a: Decimal::ZERO,
            token_b: Decimal::ZERO,
        };
        let (cancels, places) = strategy().get_orders(&live, &inputs(), &balances);
        assert!(cancels.is_empty());
        assert!(places
            .iter()
            .all(|o| !(o.side == Side::Buy && o.token == Token::A)));
    }

    #[test]
    fn overweight_band_is_cancelled_and_requoted() {
        let live = vec![
            Order::new(Side::Buy, Token::A, dec!(0.47), dec!(40)).with_id("a"),
            Order::new(Side::Buy, Token::A, dec!(0.46), dec!(40)).with_id("b"),
        ];
        let balances = Balances {
            collateral: dec!(1000),
            token_a: Decimal::ZERO,
            token_b: Decimal::ZERO,
        };
        let (cancels, places) = strategy().get_orders(&live, &inputs(), &balances);
        assert_eq!(cancels.len(), 2);
        let requote = places
            .iter()
            .find(|o| o.side == Side::Buy && o.token == Token::A)
            .unwrap();
        assert_eq!(requote.size, dec!(30));
    }

    #[test]
    fn sell_top_up_is_capped_by_inventory() {
        let balances = Balances {
            collateral: dec!(1000),
            token_a: dec!(12.5),
            token_b: Decimal::ZERO,
        };
        let (_, places) = strategy().get_orders(&[], &inputs(), &balances);
        let sell_a = places
            .iter()
            .find(|o| o.side == Side::Sell && o.token == Token::A)
            .unwrap();
        assert_eq!(sell_a.size, dec!(12.5));
        assert!(!places
            .iter()
            .any(|o| o.side == Side::Sell && o.token == Token::B));
    }
}
