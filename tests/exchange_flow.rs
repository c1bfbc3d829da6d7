//! End-to-end facade tests: deposits, placement, matching, settlement,
//! change/cancel, and the query surface.

use spotdex::custody::MockCustody;
use spotdex::errors::ExchangeError;
use spotdex::exchange::Exchange;
use spotdex::models::Side;
use spotdex::NATIVE_TICKER;

const ADMIN: u64 = 0;
const LNK: &str = "LNK";

fn setup() -> (Exchange, MockCustody) {
    let mut exchange = Exchange::new(ADMIN);
    exchange.register_asset(ADMIN, LNK, "0xlink").unwrap();
    (exchange, MockCustody::new())
}

fn fund(exchange: &mut Exchange, custody: &mut MockCustody, account: u64, ticker: &str, qty: u64) {
    custody.mint(account, ticker, qty);
    exchange.deposit(custody, account, ticker, qty).unwrap();
}

// ============================================================
// REGISTRATION & CUSTODY
// ============================================================

#[test]
fn register_asset_is_admin_only() {
    let mut exchange = Exchange::new(ADMIN);
    assert_eq!(
        exchange.register_asset(5, LNK, "0xlink"),
        Err(ExchangeError::Unauthorized)
    );
    assert!(exchange.register_asset(ADMIN, LNK, "0xlink").is_ok());
    assert_eq!(
        exchange.register_asset(ADMIN, LNK, "0xother"),
        Err(ExchangeError::AlreadyRegistered(LNK.to_string()))
    );
}

#[test]
fn deposit_unregistered_token_fails() {
    let (mut exchange, mut custody) = setup();
    custody.mint(1, "BTC", 10);
    assert_eq!(
        exchange.deposit(&mut custody, 1, "BTC", 10),
        Err(ExchangeError::AssetNotRegistered("BTC".to_string()))
    );
}

#[test]
fn deposit_requires_confirmed_inbound_transfer() {
    let (mut exchange, mut custody) = setup();
    // Nothing minted externally: custody rejects, ledger untouched
    let result = exchange.deposit(&mut custody, 1, LNK, 10);
    assert!(matches!(result, Err(ExchangeError::TransferFailed(_))));
    assert_eq!(exchange.balance(1, LNK), 0);
}

#[test]
fn withdraw_checks_raw_balance_and_releases_to_custody() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 500);

    assert_eq!(
        exchange.withdraw(&mut custody, 1, NATIVE_TICKER, 600),
        Err(ExchangeError::InsufficientBalance)
    );

    exchange.withdraw(&mut custody, 1, NATIVE_TICKER, 200).unwrap();
    assert_eq!(exchange.balance(1, NATIVE_TICKER), 300);
    assert_eq!(custody.external_balance(1, NATIVE_TICKER), 200);
}

// ============================================================
// LIMIT ORDER PLACEMENT
// ============================================================

#[test]
fn buy_limit_requires_native_cover() {
    let (mut exchange, mut custody) = setup();

    assert_eq!(
        exchange.place_limit_order(1, Side::Buy, LNK, 10, 1),
        Err(ExchangeError::InsufficientSpendableBalance)
    );

    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 10);
    assert!(exchange.place_limit_order(1, Side::Buy, LNK, 10, 1).is_ok());
}

#[test]
fn sell_limit_requires_token_cover() {
    let (mut exchange, mut custody) = setup();

    assert_eq!(
        exchange.place_limit_order(1, Side::Sell, LNK, 10, 1),
        Err(ExchangeError::InsufficientSpendableBalance)
    );

    fund(&mut exchange, &mut custody, 1, LNK, 10);
    assert!(exchange.place_limit_order(1, Side::Sell, LNK, 10, 1).is_ok());
}

#[test]
fn buy_limit_with_overflowing_cost_rejected() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 1000);

    assert_eq!(
        exchange.place_limit_order(1, Side::Buy, LNK, u64::MAX, u64::MAX),
        Err(ExchangeError::CostOverflow {
            amount: u64::MAX,
            price: u64::MAX,
        })
    );
    assert!(exchange.order_book(LNK, Side::Buy).is_empty());
}

#[test]
fn second_order_on_same_asset_rejected() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 1000);

    exchange.place_limit_order(1, Side::Buy, LNK, 2, 100).unwrap();
    assert_eq!(
        exchange.place_limit_order(1, Side::Buy, LNK, 2, 100),
        Err(ExchangeError::OrderAlreadyExists)
    );
}

#[test]
fn agreeing_limit_orders_execute() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 1500);
    fund(&mut exchange, &mut custody, 2, NATIVE_TICKER, 1000);
    fund(&mut exchange, &mut custody, 3, LNK, 5);
    fund(&mut exchange, &mut custody, 4, LNK, 10);

    exchange.place_limit_order(1, Side::Buy, LNK, 5, 300).unwrap();
    exchange.place_limit_order(2, Side::Buy, LNK, 10, 100).unwrap();
    exchange.place_limit_order(3, Side::Sell, LNK, 5, 300).unwrap();
    exchange.place_limit_order(4, Side::Sell, LNK, 10, 100).unwrap();

    // Buyers received tokens, sellers received native at resting prices
    assert_eq!(exchange.balance(1, LNK), 5);
    assert_eq!(exchange.balance(2, LNK), 10);
    assert_eq!(exchange.balance(3, NATIVE_TICKER), 5 * 300);
    assert_eq!(exchange.balance(4, NATIVE_TICKER), 10 * 100);

    // Filled orders are gone from both sides
    assert!(exchange.order_book(LNK, Side::Buy).is_empty());
    assert!(exchange.order_book(LNK, Side::Sell).is_empty());
}

#[test]
fn order_ids_are_monotonic_across_assets() {
    let (mut exchange, mut custody) = setup();
    exchange.register_asset(ADMIN, "BTC", "0xbtc").unwrap();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 10_000);

    let a = exchange.place_limit_order(1, Side::Buy, LNK, 1, 10).unwrap();
    let b = exchange.place_limit_order(1, Side::Buy, "BTC", 1, 10).unwrap();
    assert!(b.id > a.id);
}

// ============================================================
// SPENDING BALANCE
// ============================================================

#[test]
fn spending_balance_reserves_native_against_bids() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 500);

    let before = exchange.spending_balance(1, NATIVE_TICKER);
    exchange.place_limit_order(1, Side::Buy, LNK, 10, 50).unwrap();
    let after = exchange.spending_balance(1, NATIVE_TICKER);

    assert_eq!(before - 500, after);
    // Raw balance is untouched until a fill settles
    assert_eq!(exchange.balance(1, NATIVE_TICKER), 500);
}

#[test]
fn spending_balance_reserves_tokens_against_asks() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, LNK, 30);

    exchange.place_limit_order(1, Side::Sell, LNK, 30, 65).unwrap();
    assert_eq!(exchange.spending_balance(1, LNK), 0);
    assert_eq!(exchange.balance(1, LNK), 30);
}

#[test]
fn native_reservation_spans_all_assets() {
    let (mut exchange, mut custody) = setup();
    exchange.register_asset(ADMIN, "BTC", "0xbtc").unwrap();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 1000);

    exchange.place_limit_order(1, Side::Buy, LNK, 10, 50).unwrap();
    exchange.place_limit_order(1, Side::Buy, "BTC", 4, 100).unwrap();

    assert_eq!(exchange.spending_balance(1, NATIVE_TICKER), 1000 - 500 - 400);
}

#[test]
fn partially_filled_bid_reserves_only_remainder() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 1000);
    fund(&mut exchange, &mut custody, 2, LNK, 4);

    exchange.place_limit_order(1, Side::Buy, LNK, 10, 100).unwrap();
    exchange.place_market_order(2, Side::Sell, LNK, 4).unwrap();

    // 4 filled at 100 settled (debited); 6 remaining still reserved
    assert_eq!(exchange.balance(1, NATIVE_TICKER), 600);
    assert_eq!(exchange.spending_balance(1, NATIVE_TICKER), 0);
}

// ============================================================
// BOOK ORDERING
// ============================================================

#[test]
fn buy_book_sorted_descending() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 1000);
    fund(&mut exchange, &mut custody, 2, NATIVE_TICKER, 1000);
    fund(&mut exchange, &mut custody, 3, NATIVE_TICKER, 1000);

    exchange.place_limit_order(1, Side::Buy, LNK, 2, 150).unwrap();
    exchange.place_limit_order(2, Side::Buy, LNK, 3, 250).unwrap();
    exchange.place_limit_order(3, Side::Buy, LNK, 1, 200).unwrap();

    let book = exchange.order_book(LNK, Side::Buy);
    assert!(!book.is_empty());
    for pair in book.windows(2) {
        assert!(pair[0].price >= pair[1].price, "BUY book out of order");
    }
}

#[test]
fn sell_book_sorted_ascending() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, LNK, 5);
    fund(&mut exchange, &mut custody, 2, LNK, 5);

    exchange.place_limit_order(1, Side::Sell, LNK, 2, 300).unwrap();
    exchange.place_limit_order(2, Side::Sell, LNK, 3, 100).unwrap();

    let book = exchange.order_book(LNK, Side::Sell);
    assert!(!book.is_empty());
    for pair in book.windows(2) {
        assert!(pair[0].price <= pair[1].price, "SELL book out of order");
    }
}

// ============================================================
// MARKET ORDERS
// ============================================================

#[test]
fn market_sell_without_tokens_fails() {
    let (mut exchange, _custody) = setup();
    assert_eq!(
        exchange.place_market_order(1, Side::Sell, LNK, 10),
        Err(ExchangeError::InsufficientSpendableBalance)
    );
}

#[test]
fn market_order_against_empty_book_fills_zero() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 50_000);

    let filled = exchange.place_market_order(1, Side::Buy, LNK, 10).unwrap();
    assert_eq!(filled, 0);
}

#[test]
fn market_buy_fills_no_more_than_requested() {
    let (mut exchange, mut custody) = setup();
    for (seller, price) in [(1, 300), (2, 400), (3, 500)] {
        fund(&mut exchange, &mut custody, seller, LNK, 5);
        exchange.place_limit_order(seller, Side::Sell, LNK, 5, price).unwrap();
    }
    fund(&mut exchange, &mut custody, 4, NATIVE_TICKER, 50_000);

    let filled = exchange.place_market_order(4, Side::Buy, LNK, 10).unwrap();
    assert_eq!(filled, 10);

    let book = exchange.order_book(LNK, Side::Sell);
    assert_eq!(book.len(), 1, "only the 500 ask should remain");
    assert_eq!(book[0].filled, 0);
    assert_eq!(book[0].price, 500);
}

#[test]
fn market_buy_fills_until_book_empty_and_discards_remainder() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, LNK, 5);
    fund(&mut exchange, &mut custody, 2, LNK, 5);
    fund(&mut exchange, &mut custody, 3, LNK, 5);
    exchange.place_limit_order(1, Side::Sell, LNK, 5, 300).unwrap();
    exchange.place_limit_order(2, Side::Sell, LNK, 5, 400).unwrap();
    exchange.place_limit_order(3, Side::Sell, LNK, 5, 500).unwrap();

    fund(&mut exchange, &mut custody, 4, NATIVE_TICKER, 50_000);
    let before = exchange.balance(4, LNK);

    let filled = exchange.place_market_order(4, Side::Buy, LNK, 50).unwrap();

    assert_eq!(filled, 15);
    assert_eq!(exchange.balance(4, LNK), before + 15);
    assert!(exchange.order_book(LNK, Side::Sell).is_empty());
    // The unmatched 35 is discarded: nothing rests on the buy side
    assert!(exchange.order_book(LNK, Side::Buy).is_empty());
    // Buyer paid each resting price in full
    assert_eq!(
        exchange.balance(4, NATIVE_TICKER),
        50_000 - (5 * 300 + 5 * 400 + 5 * 500)
    );
}

#[test]
fn market_sell_settles_per_resting_bid_price() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 1500);
    exchange.place_limit_order(1, Side::Buy, LNK, 5, 300).unwrap();

    fund(&mut exchange, &mut custody, 2, LNK, 10);
    let filled = exchange.place_market_order(2, Side::Sell, LNK, 10).unwrap();

    assert_eq!(filled, 5);
    assert_eq!(exchange.balance(2, NATIVE_TICKER), 5 * 300);
    assert_eq!(exchange.balance(2, LNK), 5);
    assert_eq!(exchange.balance(1, LNK), 5);
}

#[test]
fn market_buy_without_native_fails_when_book_nonempty() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 2, LNK, 5);
    exchange.place_limit_order(2, Side::Sell, LNK, 5, 300).unwrap();

    assert_eq!(exchange.balance(4, NATIVE_TICKER), 0);
    assert_eq!(
        exchange.place_market_order(4, Side::Buy, LNK, 5),
        Err(ExchangeError::InsufficientSpendableBalance)
    );
}

#[test]
fn market_buy_with_funds_for_partial_fill_stops_at_affordable_qty() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, LNK, 10);
    exchange.place_limit_order(1, Side::Sell, LNK, 10, 100).unwrap();

    // Covers 7 units, not the requested 10: no upfront worst-case
    // reservation, fills are bounded per step
    fund(&mut exchange, &mut custody, 2, NATIVE_TICKER, 750);
    let filled = exchange.place_market_order(2, Side::Buy, LNK, 10).unwrap();

    assert_eq!(filled, 7);
    assert_eq!(exchange.balance(2, LNK), 7);
    assert_eq!(exchange.balance(2, NATIVE_TICKER), 50);
    assert_eq!(exchange.my_order(1, LNK).unwrap().filled, 7);
}

#[test]
fn market_buy_fills_zero_priced_ask_for_free() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, LNK, 5);
    exchange.place_limit_order(1, Side::Sell, LNK, 5, 0).unwrap();

    fund(&mut exchange, &mut custody, 2, NATIVE_TICKER, 100);
    let filled = exchange.place_market_order(2, Side::Buy, LNK, 5).unwrap();

    assert_eq!(filled, 5);
    assert_eq!(exchange.balance(2, LNK), 5);
    assert_eq!(exchange.balance(2, NATIVE_TICKER), 100);
    assert!(exchange.order_book(LNK, Side::Sell).is_empty());
}

#[test]
fn withdrawn_backing_does_not_break_settlement() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, LNK, 5);
    exchange.place_limit_order(1, Side::Sell, LNK, 5, 100).unwrap();

    // Account 2 rests an ask, then withdraws the tokens behind it
    fund(&mut exchange, &mut custody, 2, LNK, 5);
    exchange.place_limit_order(2, Side::Sell, LNK, 5, 200).unwrap();
    exchange.withdraw(&mut custody, 2, LNK, 5).unwrap();

    // The taker settles the healthy ask and skips the hollow one;
    // the call succeeds and every reported fill is reflected
    fund(&mut exchange, &mut custody, 3, NATIVE_TICKER, 50_000);
    let filled = exchange.place_market_order(3, Side::Buy, LNK, 10).unwrap();

    assert_eq!(filled, 5);
    assert_eq!(exchange.balance(3, LNK), 5);
    assert_eq!(exchange.balance(3, NATIVE_TICKER), 50_000 - 5 * 100);

    // The hollow ask is evicted, freeing account 2's order slot
    assert!(exchange.order_book(LNK, Side::Sell).is_empty());
    assert_eq!(exchange.my_order(2, LNK), Err(ExchangeError::NoActiveOrder));
}

#[test]
fn partial_fill_leaves_correct_filled_on_resting_order() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, LNK, 5);
    exchange.place_limit_order(1, Side::Sell, LNK, 5, 300).unwrap();

    fund(&mut exchange, &mut custody, 2, NATIVE_TICKER, 600);
    exchange.place_market_order(2, Side::Buy, LNK, 2).unwrap();

    let book = exchange.order_book(LNK, Side::Sell);
    assert_eq!(book.len(), 1);
    assert_eq!(book[0].filled, 2);
    assert_eq!(book[0].amount, 5);
}

// ============================================================
// CHANGE / CANCEL / QUERIES
// ============================================================

#[test]
fn change_without_active_order_fails() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 100);

    assert_eq!(
        exchange.change_limit_order(1, Side::Buy, LNK, 1, 10),
        Err(ExchangeError::NoActiveOrder)
    );
}

#[test]
fn change_updates_terms_and_resets_fill() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 40);

    exchange.place_limit_order(1, Side::Buy, LNK, 1, 10).unwrap();
    exchange.change_limit_order(1, Side::Buy, LNK, 2, 20).unwrap();

    let book = exchange.order_book(LNK, Side::Buy);
    assert_eq!(book.len(), 1);
    assert_eq!(book[0].amount, 2);
    assert_eq!(book[0].price, 20);
    assert_eq!(book[0].filled, 0);
}

#[test]
fn change_that_crosses_matches_like_a_fresh_order() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 100);
    fund(&mut exchange, &mut custody, 2, LNK, 2);

    exchange.place_limit_order(1, Side::Buy, LNK, 2, 20).unwrap();
    exchange.place_limit_order(2, Side::Sell, LNK, 2, 25).unwrap();

    // Raising the bid to 25 crosses the resting ask immediately
    let order = exchange.change_limit_order(1, Side::Buy, LNK, 2, 25).unwrap();
    assert_eq!(order.filled, 2);

    assert!(exchange.order_book(LNK, Side::Buy).is_empty());
    assert!(exchange.order_book(LNK, Side::Sell).is_empty());
    assert_eq!(exchange.balance(1, LNK), 2);
    assert_eq!(exchange.balance(2, NATIVE_TICKER), 2 * 25);
}

#[test]
fn change_validation_excludes_old_reservation() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 100);

    // Reserves the full 100
    exchange.place_limit_order(1, Side::Buy, LNK, 10, 10).unwrap();
    assert_eq!(exchange.spending_balance(1, NATIVE_TICKER), 0);

    // Still affordable once the old reservation is released
    assert!(exchange.change_limit_order(1, Side::Buy, LNK, 5, 20).is_ok());

    // But never beyond the raw balance
    assert_eq!(
        exchange.change_limit_order(1, Side::Buy, LNK, 11, 10),
        Err(ExchangeError::InsufficientSpendableBalance)
    );
}

#[test]
fn failed_change_leaves_old_order_in_place() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 100);

    let placed = exchange.place_limit_order(1, Side::Buy, LNK, 10, 10).unwrap();
    assert!(exchange.change_limit_order(1, Side::Buy, LNK, 100, 100).is_err());

    let current = exchange.my_order(1, LNK).unwrap();
    assert_eq!(current.id, placed.id);
    assert_eq!(current.amount, 10);
    assert_eq!(current.price, 10);
}

#[test]
fn cancel_without_active_order_fails() {
    let (mut exchange, _custody) = setup();
    assert_eq!(
        exchange.cancel_limit_order(1, Side::Buy, LNK),
        Err(ExchangeError::NoActiveOrder)
    );
    assert_eq!(
        exchange.cancel_limit_order(1, Side::Sell, LNK),
        Err(ExchangeError::NoActiveOrder)
    );
}

#[test]
fn cancel_clears_book_slot_and_permits_new_order() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 50);

    exchange.place_limit_order(1, Side::Buy, LNK, 5, 10).unwrap();
    assert_eq!(exchange.order_book(LNK, Side::Buy).len(), 1);

    exchange.cancel_limit_order(1, Side::Buy, LNK).unwrap();
    assert!(exchange.order_book(LNK, Side::Buy).is_empty());

    // Reservation released, no ledger mutation happened
    assert_eq!(exchange.balance(1, NATIVE_TICKER), 50);
    assert_eq!(exchange.spending_balance(1, NATIVE_TICKER), 50);
    assert!(exchange.place_limit_order(1, Side::Buy, LNK, 5, 10).is_ok());
}

#[test]
fn cancel_on_wrong_side_fails() {
    let (mut exchange, mut custody) = setup();
    fund(&mut exchange, &mut custody, 1, NATIVE_TICKER, 50);

    exchange.place_limit_order(1, Side::Buy, LNK, 5, 10).unwrap();
    assert_eq!(
        exchange.cancel_limit_order(1, Side::Sell, LNK),
        Err(ExchangeError::NoActiveOrder)
    );
    // The order is still there
    assert!(exchange.my_order(1, LNK).is_ok());
}

#[test]
fn my_order_errors_when_none_exists() {
    let (exchange, _custody) = setup();
    assert_eq!(exchange.my_order(1, LNK), Err(ExchangeError::NoActiveOrder));
}

#[test]
fn my_order_returns_the_callers_order() {
    let (mut exchange, mut custody) = setup();
    for account in 1..=4 {
        fund(&mut exchange, &mut custody, account, NATIVE_TICKER, 100);
    }
    exchange.place_limit_order(1, Side::Buy, LNK, 5, 20).unwrap();
    exchange.place_limit_order(2, Side::Buy, LNK, 10, 10).unwrap();
    exchange.place_limit_order(3, Side::Buy, LNK, 2, 50).unwrap();
    exchange.place_limit_order(4, Side::Buy, LNK, 4, 25).unwrap();

    let order = exchange.my_order(3, LNK).unwrap();
    assert_eq!((order.amount, order.price), (2, 50));
    let order = exchange.my_order(2, LNK).unwrap();
    assert_eq!((order.amount, order.price), (10, 10));
}
