//! Market identity and reference-price access.

pub mod feed;
pub mod types;

pub use feed::PriceFeed;
pub use types::{Market, Token, TokenMap};
