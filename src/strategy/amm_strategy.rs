//! AMM strategy: bonding-curve quotes reconciled by exact identity.

use tracing::debug;

use crate::error::PricingError;
use crate::orderbook::{Balances, Order};
use crate::pricing::{AmmConfig, AmmEngine, QuoteInputs};

use super::diff_orders;

/// Strategy wrapper around the [`AmmEngine`].
#[derive(Debug, Clone)]
pub struct AmmStrategy {
    engine: AmmEngine,
    config: AmmConfig,
}

impl AmmStrategy {
    /// Build the strategy from its pricing config.
    pub fn new(config: AmmConfig) -> Result<Self, PricingError> {
        Ok(Self {
            engine: AmmEngine::new(config)?,
            config,
        })
    }

    /// The pricing config this strategy was built from.
    pub fn config(&self) -> &AmmConfig {
        &self.config
    }

    /// Desired quotes for this tick, diffed against the live orders.
    pub fn get_orders(
        &self,
        live_orders: &[Order],
        inputs: &QuoteInputs,
        balances: &Balances,
    ) -> Result<(Vec<Order>, Vec<Order>), PricingError> {
        let expected = self.engine.expected_orders(inputs, balances)?;
        debug!(expected = expected.len(), live = live_orders.len(), "Diffing orders");
        Ok(diff_orders(live_orders, expected))
    }
}
