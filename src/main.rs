//! spotdex demo binary
//!
//! Runs a short scripted session against a mock custody adapter:
//! register a token, fund two accounts, cross a few orders, and log the
//! resulting trades and balances.

use anyhow::Result;
use tracing::info;

use spotdex::config::AppConfig;
use spotdex::custody::MockCustody;
use spotdex::exchange::Exchange;
use spotdex::logging::init_logging;
use spotdex::models::Side;
use spotdex::NATIVE_TICKER;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn main() -> Result<()> {
    let config = AppConfig::load(&get_env()).unwrap_or_default();
    let _guard = init_logging(&config);

    let admin = config.admin_account;
    let mut exchange = Exchange::new(admin);
    let mut custody = MockCustody::new();

    exchange.register_asset(admin, "LNK", "0x514910771af9ca656af840dff83e8264ecf986ca")?;

    // Alice brings native currency, Bob brings tokens
    let (alice, bob) = (1, 2);
    custody.mint(alice, NATIVE_TICKER, 10_000);
    custody.mint(bob, "LNK", 50);
    exchange.deposit(&mut custody, alice, NATIVE_TICKER, 10_000)?;
    exchange.deposit(&mut custody, bob, "LNK", 50)?;

    // Bob asks 20 @ 300; Alice lifts 15 at the market
    exchange.place_limit_order(bob, Side::Sell, "LNK", 20, 300)?;
    let filled = exchange.place_market_order(alice, Side::Buy, "LNK", 15)?;
    info!(filled, "market buy complete");

    // Alice bids for the rest; Bob replaces his ask to cross her
    exchange.place_limit_order(alice, Side::Buy, "LNK", 5, 250)?;
    exchange.change_limit_order(bob, Side::Sell, "LNK", 5, 250)?;

    for account in [alice, bob] {
        info!(
            account,
            native = exchange.balance(account, NATIVE_TICKER),
            lnk = exchange.balance(account, "LNK"),
            spendable_native = exchange.spending_balance(account, NATIVE_TICKER),
            "final balances"
        );
    }

    // Round-trip a withdrawal through custody
    exchange.withdraw(&mut custody, bob, NATIVE_TICKER, 1_000)?;
    info!(
        external = custody.external_balance(bob, NATIVE_TICKER),
        "bob withdrew to custody"
    );

    Ok(())
}
