//! Small shared helpers.

use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Default midpoint used when the price feed is unreachable.
pub const DEFAULT_PRICE: Decimal = dec!(0.5);

/// Round a value down (toward zero) to `dp` decimal places.
///
/// Sizes are always rounded down so the keeper never over-commits capital.
pub fn round_down(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// Add uniform jitter from `[lower, upper]` to a price, rounded down to 2 dp.
pub fn add_randomness(price: Decimal, lower: f64, upper: f64) -> Decimal {
    let jitter = rand::thread_rng().gen_range(lower..=upper);
    let jitter = Decimal::try_from(jitter).unwrap_or(Decimal::ZERO);
    round_down(price + jitter, 2)
}

/// Randomized fallback around [`DEFAULT_PRICE`] for a degraded price feed.
pub fn randomize_default_price() -> Decimal {
    add_randomness(DEFAULT_PRICE, -0.1, 0.1)
}

/// Resolve when SIGINT or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
