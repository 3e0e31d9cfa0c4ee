//! Market types for binary-outcome CLOB markets.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One of the two complementary outcome tokens of a binary market.
///
/// Prices of [`Token::A`] and [`Token::B`] always sum to 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Token {
    /// First outcome token (YES leg).
    #[strum(serialize = "A", serialize = "a", serialize = "yes", serialize = "YES")]
    #[default]
    A,
    /// Second outcome token (NO leg).
    #[strum(serialize = "B", serialize = "b", serialize = "no", serialize = "NO")]
    B,
}

/// Per-token pair of values, indexed by [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenMap<T> {
    /// Value for token A.
    pub a: T,
    /// Value for token B.
    pub b: T,
}

impl<T> TokenMap<T> {
    /// Create a pair from the two values.
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Get the value for a token.
    pub fn get(&self, token: Token) -> &T {
        match token {
            Token::A => &self.a,
            Token::B => &self.b,
        }
    }
}

/// The market being made: one condition id and its two outcome token ids.
#[derive(Debug, Clone)]
pub struct Market {
    /// Condition id identifying the market on the CLOB.
    pub condition_id: String,
    /// CLOB token id for outcome A.
    pub token_a_id: String,
    /// CLOB token id for outcome B.
    pub token_b_id: String,
}

impl Market {
    /// Create a new market descriptor.
    pub fn new(
        condition_id: impl Into<String>,
        token_a_id: impl Into<String>,
        token_b_id: impl Into<String>,
    ) -> Self {
        Self {
            condition_id: condition_id.into(),
            token_a_id: token_a_id.into(),
            token_b_id: token_b_id.into(),
        }
    }

    /// Get the CLOB token id for an outcome token.
    pub fn token_id(&self, token: Token) -> &str {
        match token {
            Token::A => &self.token_a_id,
            Token::B => &self.token_b_id,
        }
    }

    /// Resolve a CLOB token id back to an outcome token.
    pub fn token_from_id(&self, token_id: &str) -> Option<Token> {
        if token_id == self.token_a_id {
            Some(Token::A)
        } else if token_id == self.token_b_id {
            Some(Token::B)
        } else {
            None
        }
    }
}
