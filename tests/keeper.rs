//! End-to-end keeper ticks against the mock venue.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use poly_market_keeper::clob::{MockClob, OpenOrder};
use poly_market_keeper::keeper::Keeper;
use poly_market_keeper::market::{Market, PriceFeed};
use poly_market_keeper::orderbook::{CompetitorBook, OrderBookManager, PriceLevel, Side};
use poly_market_keeper::pricing::AmmConfig;
use poly_market_keeper::strategy::{AmmStrategy, Strategy};

const TOKEN_A: &str = "token-a";
const TOKEN_B: &str = "token-b";

fn test_market() -> Market {
    Market::new("0xcondition", TOKEN_A, TOKEN_B)
}

fn amm_config() -> AmmConfig {
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

struct Harness {
    mock: MockClob,
    manager: Arc<OrderBookManager<MockClob>>,
    keeper: Keeper<MockClob>,
}

fn harness() -> Harness {
    let mock = MockClob::new();
    let clob = Arc::new(mock.clone());
    let manager = Arc::new(OrderBookManager::new(
        Arc::clone(&clob),
        test_market(),
        Duration::from_secs(5),
    ));
    let feed = PriceFeed::new(clob, test_market());
    let strategy = Strategy::Amm(AmmStrategy::new(amm_config()).unwrap());
    let keeper = Keeper::new(Arc::clone(&manager), feed, strategy);
    Harness {
        mock,
        manager,
        keeper,
    }
}

#[tokio::test]
async fn funded_keeper_quotes_and_reaches_steady_state() {
    let h = harness();
    h.mock.set_collateral(dec!(1000));
    h.mock.set_midpoint(TOKEN_A, dec!(0.50));
    h.manager.refresh().await;

    let actions = h.keeper.synchronize().await;
    assert!(actions > 0);
    let placed = h.mock.placed();
    assert_eq!(placed.len(), actions);

    // Buy ladders on both tokens, no inventory so no sells.
    assert!(placed.iter().all(|o| o.side == Side::Buy));
    assert!(placed.iter().any(|o| o.token_id == TOKEN_A));
    assert!(placed.iter().any(|o| o.token_id == TOKEN_B));

    // First ladder level sits one static spread below the midpoint.
    let best_buy_a = placed
        .iter()
        .filter(|o| o.token_id == TOKEN_A)
        .map(|o| o.price)
        .max()
        .unwrap();
    assert_eq!(best_buy_a, dec!(0.48));

    // Identical inputs next tick: nothing to cancel, nothing to place.
    assert_eq!(h.keeper.synchronize().await, 0);
    assert_eq!(h.mock.placed().len(), placed.len());
    assert!(h.mock.cancelled().is_empty());
}

#[tokio::test]
async fn zero_balances_skip_and_leave_live_orders_alone() {
    let h = harness();
    h.mock.add_open_order(OpenOrder {
        id: "live-1".to_string(),
        side: Side::Buy,
        token_id: TOKEN_A.to_string(),
        price: dec!(0.40),
        size: dec!(25),
    });
    // Balances fetch succeeds but everything is zero.
    h.manager.refresh().await;

    assert_eq!(h.keeper.synchronize().await, 0);
    assert!(h.mock.cancelled().is_empty());
    assert!(h.mock.placed().is_empty());
}

#[tokio::test]
async fn price_move_cancels_and_replaces_the_ladder() {
    let h = harness();
    h.mock.set_collateral(dec!(1000));
    h.mock.set_midpoint(TOKEN_A, dec!(0.50));
    h.manager.refresh().await;

    assert!(h.keeper.synchronize().await > 0);
    let first_wave = h.mock.placed().len();

    // Midpoint moves one tick; every ladder price shifts, so the whole book
    // is cancelled and requoted.
    h.mock.set_midpoint(TOKEN_A, dec!(0.51));
    let actions = h.keeper.synchronize().await;
    assert!(actions > 0);
    assert_eq!(h.mock.cancelled().len(), first_wave);
    assert!(h.mock.placed().len() > first_wave);

    let best_buy_a = h
        .mock
        .placed()
        .iter()
        .skip(first_wave)
        .filter(|o| o.token_id == TOKEN_A)
        .map(|o| o.price)
        .max()
        .unwrap();
    assert_eq!(best_buy_a, dec!(0.49));
}

#[tokio::test]
async fn deep_competitor_book_widens_the_quoted_spread() {
    let h = harness();
    h.mock.set_collateral(dec!(1000));
    h.mock.set_midpoint(TOKEN_A, dec!(0.50));
    // 0.49 holds 98 notional, 0.46 pushes cumulative depth past the 500 cap,
    // so the derived spread is 0.50 - 0.46 = 0.04 instead of the static 0.02.
    h.mock.set_book(
        TOKEN_A,
        CompetitorBook {
            bids: vec![
                PriceLevel::new(dec!(0.49), dec!(200)),
                PriceLevel::new(dec!(0.46), dec!(1000)),
            ],
            asks: Vec::new(),
        },
    );
    h.manager.refresh().await;

    assert!(h.keeper.synchronize().await > 0);
    let best_buy_a = h
        .mock
        .placed()
        .iter()
        .filter(|o| o.token_id == TOKEN_A)
        .map(|o| o.price)
        .max()
        .unwrap();
    assert_eq!(best_buy_a, dec!(0.46));
}

#[tokio::test]
async fn inventory_is_offered_at_the_competitor_ask() {
    let h = harness();
    h.mock.set_collateral(dec!(1));
    h.mock.set_token_balance(TOKEN_A, dec!(50));
    h.mock.set_midpoint(TOKEN_A, dec!(0.50));
    h.mock.set_book(
        TOKEN_A,
        CompetitorBook {
            bids: Vec::new(),
            asks: vec![PriceLevel::new(dec!(0.53), dec!(100))],
        },
    );
    h.manager.refresh().await;

    assert!(h.keeper.synchronize().await > 0);
    let sells: Vec<_> = h
        .mock
        .placed()
        .into_iter()
        .filter(|o| o.side == Side::Sell)
        .collect();
    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].token_id, TOKEN_A);
    assert_eq!(sells[0].price, dec!(0.53));
    assert_eq!(sells[0].size, dec!(50));
}

#[tokio::test]
async fn missing_ask_sells_at_the_reference_price() {
    let h = harness();
    // Degraded feed at a near-resolved midpoint: no competitor book, so the
    // sell falls back to the reference price. It must stay inside the
    // venue's [0, 1] range or the order can never rest.
    h.mock.set_collateral(dec!(1));
    h.mock.set_token_balance(TOKEN_A, dec!(50));
    h.mock.set_midpoint(TOKEN_A, dec!(0.99));
    h.manager.refresh().await;

    assert!(h.keeper.synchronize().await > 0);
    let sells: Vec<_> = h
        .mock
        .placed()
        .into_iter()
        .filter(|o| o.side == Side::Sell)
        .collect();
    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].token_id, TOKEN_A);
    assert!(sells[0].price <= Decimal::ONE);
    assert_eq!(sells[0].price, dec!(0.99));
}

#[tokio::test]
async fn near_resolution_market_quotes_no_buys() {
    let h = harness();
    // Modest capital at an extreme midpoint: the squeezed ladder rounds
    // below min_size, so all buys are suppressed.
    h.mock.set_collateral(dec!(40));
    h.mock.set_midpoint(TOKEN_A, dec!(0.92));
    h.manager.refresh().await;

    h.keeper.synchronize().await;
    assert!(h.mock.placed().iter().all(|o| o.side == Side::Sell));
}

#[tokio::test]
async fn longshot_market_quotes_no_buys() {
    let h = harness();
    // Reference price 0.03: the longshot ladder is squeezed out of existence
    // while the favourite side could still absorb collateral, so every buy
    // is suppressed. Inventory is still offered.
    h.mock.set_collateral(dec!(500));
    h.mock.set_token_balance(TOKEN_B, dec!(50));
    h.mock.set_midpoint(TOKEN_A, dec!(0.03));
    h.manager.refresh().await;

    assert!(h.keeper.synchronize().await > 0);
    assert!(h.mock.placed().iter().all(|o| o.side == Side::Sell));
}

#[tokio::test]
async fn shutdown_pulls_all_quotes() {
    let h = harness();
    h.mock.set_collateral(dec!(1000));
    h.mock.set_midpoint(TOKEN_A, dec!(0.50));
    h.manager.refresh().await;
    assert!(h.keeper.synchronize().await > 0);

    h.keeper.shutdown().await;
    assert_eq!(h.mock.cancel_all_calls(), 1);
    assert!(h.manager.get_snapshot().orders.is_empty());
}

#[tokio::test]
async fn collateral_spend_never_exceeds_the_cap() {
    let h = harness();
    h.mock.set_collateral(dec!(100000));
    h.mock.set_midpoint(TOKEN_A, dec!(0.50));
    h.manager.refresh().await;

    h.keeper.synchronize().await;
    let spent: Decimal = h
        .mock
        .placed()
        .iter()
        .filter(|o| o.side == Side::Buy)
        .map(|o| o.price * o.size)
        .sum();
    assert!(spent <= dec!(500));
}
