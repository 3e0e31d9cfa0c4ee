//! Bonding-curve pricing: per-token ladders and the two-sided engine.

pub mod amm;
pub mod engine;

pub use amm::{Amm, AmmConfig, Ladder};
pub use engine::{AmmEngine, QuoteInputs};
