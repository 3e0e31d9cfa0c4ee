//! Unified error types for the keeper.

use thiserror::Error;

/// Top-level error type for the keeper.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// CLOB API error.
    #[error("clob error: {0}")]
    Clob(#[from] ClobError),

    /// Pricing model error.
    #[error("pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors talking to the CLOB venue.
#[derive(Error, Debug)]
pub enum ClobError {
    /// Initial connectivity probe failed. Fatal at startup.
    #[error("unable to connect to CLOB API at {host}: {reason}")]
    ConnectFailed {
        /// API host that was probed.
        host: String,
        /// Reason for failure.
        reason: String,
    },

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        /// Endpoint that failed.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// Response could not be parsed.
    #[error("failed to parse {endpoint} response: {reason}")]
    Parse {
        /// Endpoint whose response failed to parse.
        endpoint: String,
        /// Reason for failure.
        reason: String,
    },

    /// Venue rejected an order.
    #[error("order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason from the venue.
        reason: String,
    },

    /// Market metadata did not describe a binary market.
    #[error("market {condition_id} is not a two-token binary market")]
    NotBinary {
        /// Condition id of the malformed market.
        condition_id: String,
    },
}

/// Errors in the pricing model.
#[derive(Error, Debug)]
pub enum PricingError {
    /// Pricing configuration is inconsistent. Fatal at construction.
    #[error("invalid pricing config: {0}")]
    InvalidConfig(String),

    /// Bonding-curve math failed (non-positive price under a square root).
    #[error("pricing math error: {0}")]
    Math(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;
