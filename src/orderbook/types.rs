//! Order, balance, and snapshot types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use crate::market::Token;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order.
    #[strum(serialize = "BUY", serialize = "buy")]
    Buy,
    /// Sell order.
    #[strum(serialize = "SELL", serialize = "sell")]
    Sell,
}

/// A keeper order, either desired (no id yet) or live on the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Venue-assigned order id; `None` until the order is placed.
    pub id: Option<String>,
    /// Buy or sell.
    pub side: Side,
    /// Outcome token this order trades.
    pub token: Token,
    /// Limit price.
    pub price: Decimal,
    /// Order size in tokens.
    pub size: Decimal,
}

impl Order {
    /// Create a desired order (no id).
    pub fn new(side: Side, token: Token, price: Decimal, size: Decimal) -> Self {
        Self {
            id: None,
            side,
            token,
            price,
            size,
        }
    }

    /// Attach a venue-assigned id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether two orders are the same quote: equal side, token, price, and size.
    ///
    /// Ids are ignored, so a live order matches the desired order it came from.
    pub fn matches(&self, other: &Order) -> bool {
        self.side == other.side
            && self.token == other.token
            && self.price == other.price
            && self.size == other.size
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order[{} {} {}@{}{}]",
            self.side,
            self.token,
            self.size,
            self.price,
            match &self.id {
                Some(id) => format!(" id={id}"),
                None => String::new(),
            }
        )
    }
}

/// Account balances for the market: collateral plus both outcome tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balances {
    /// Settlement asset (USDC) balance.
    pub collateral: Decimal,
    /// Token A balance.
    pub token_a: Decimal,
    /// Token B balance.
    pub token_b: Decimal,
}

impl Balances {
    /// Get the balance of an outcome token.
    pub fn token(&self, token: Token) -> Decimal {
        match token {
            Token::A => self.token_a,
            Token::B => self.token_b,
        }
    }

    /// Whether every balance is exactly zero.
    pub fn is_all_zero(&self) -> bool {
        self.collateral.is_zero() && self.token_a.is_zero() && self.token_b.is_zero()
    }
}

/// Immutable snapshot of the keeper's open orders and balances.
///
/// Replaced wholesale by the refresh worker; readers always get a consistent
/// copy.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Live orders, unique by id.
    pub orders: Vec<Order>,
    /// Balances; `None` until the first successful fetch.
    pub balances: Option<Balances>,
    /// When this snapshot was taken.
    pub taken_at: OffsetDateTime,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            balances: None,
            taken_at: OffsetDateTime::now_utc(),
        }
    }
}

impl Snapshot {
    /// Whether the snapshot can drive a reconciliation tick.
    ///
    /// Missing balances or an all-zero wallet make it unusable.
    pub fn is_usable(&self) -> bool {
        match &self.balances {
            Some(balances) => !balances.is_all_zero(),
            None => false,
        }
    }
}

/// Single price level in a competitor order book.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceLevel {
    /// Price at this level.
    pub price: Decimal,
    /// Total size resting at this price.
    pub size: Decimal,
}

impl PriceLevel {
    /// Create a new price level.
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }

    /// Notional value of the level (`price * size`).
    pub fn notional(&self) -> Decimal {
        self.price * self.size
    }
}

/// L2 competitor order book for one outcome token.
#[derive(Debug, Clone, Default)]
pub struct CompetitorBook {
    /// Bid levels sorted by price descending.
    pub bids: Vec<PriceLevel>,
    /// Ask levels sorted by price ascending.
    pub asks: Vec<PriceLevel>,
}

impl CompetitorBook {
    /// Best bid price, if any.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// Best ask price, if any.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }
}
