//! Property tests for trade planning against the SQLite ledger.
//!
//! Random buy/sell sequences are planned and committed the way the web
//! handlers do it. Afterwards the portfolio must agree with the ledger, cash
//! must never go negative, and the cash balance must equal the starting cash
//! minus buys plus sells.

mod common;

use chrono::NaiveDateTime;
use common::fresh_store;
use papertrade::domain::error::FinanceError;
use papertrade::domain::ledger::{audit, reconcile};
use papertrade::domain::portfolio::Holding;
use papertrade::domain::quote::Quote;
use papertrade::domain::trade::{TradeKind, plan_buy, plan_sell};
use papertrade::ports::account_port::AccountPort;
use papertrade::ports::ledger_port::LedgerPort;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "NFLX"];

#[derive(Debug, Clone)]
struct Order {
    kind: TradeKind,
    symbol: &'static str,
    shares: i64,
    price: Decimal,
}

fn arb_kind() -> impl Strategy<Value = TradeKind> {
    prop_oneof![Just(TradeKind::Buy), Just(TradeKind::Sell)]
}

/// Prices between $0.01 and $600.00 in whole cents.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (1i64..60_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_order() -> impl Strategy<Value = Order> {
    (arb_kind(), 0usize..SYMBOLS.len(), 1i64..40, arb_price()).prop_map(
        |(kind, idx, shares, price)| Order {
            kind,
            symbol: SYMBOLS[idx],
            shares,
            price,
        },
    )
}

fn executed_at(step: usize) -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-06-03 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
        + chrono::Duration::seconds(step as i64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn portfolio_always_matches_ledger(orders in prop::collection::vec(arb_order(), 1..40)) {
        let store = fresh_store();
        let starting = dec!(10000.00);
        let user = store.create_account("trader", "h", starting).unwrap();
        let mut expected_cash = starting;

        for (step, order) in orders.iter().enumerate() {
            let quote = Quote::new(order.symbol, format!("{} Corp", order.symbol), order.price);
            let cash = store.find_by_id(user).unwrap().unwrap().cash;
            let plan = match order.kind {
                TradeKind::Buy => plan_buy(cash, &quote, order.shares),
                TradeKind::Sell => {
                    let holding = Holding {
                        symbol: order.symbol.to_string(),
                        shares: store.shares_held(user, order.symbol).unwrap(),
                    };
                    plan_sell(cash, &holding, &quote, order.shares)
                }
            };
            let plan = match plan {
                Ok(plan) => plan,
                Err(FinanceError::InsufficientCash)
                | Err(FinanceError::InsufficientShares { .. })
                | Err(FinanceError::NoHoldings { .. }) => continue,
                Err(other) => panic!("unexpected planning error: {other}"),
            };

            match plan.kind {
                TradeKind::Buy => expected_cash -= plan.amount(),
                TradeKind::Sell => expected_cash += plan.amount(),
            }
            store.commit_trade(user, &plan, executed_at(step)).unwrap();

            let cash = store.find_by_id(user).unwrap().unwrap().cash;
            prop_assert!(cash >= Decimal::ZERO, "cash went negative: {}", cash);
        }

        let entries = store.entries(user).unwrap();
        let holdings = store.holdings(user).unwrap();
        prop_assert!(audit(&entries, &holdings).is_empty());

        let net = reconcile(&entries);
        for holding in &holdings {
            prop_assert!(holding.shares > 0);
            prop_assert_eq!(net.get(&holding.symbol).copied(), Some(holding.shares));
        }
        prop_assert_eq!(store.find_by_id(user).unwrap().unwrap().cash, expected_cash);
    }

    #[test]
    fn buy_then_full_sell_at_same_price_restores_cash(
        shares in 1i64..50,
        price in arb_price(),
    ) {
        let store = fresh_store();
        let user = store.create_account("trader", "h", dec!(100000)).unwrap();
        let quote = Quote::new("AAPL", "Apple Inc.", price);

        let buy = plan_buy(dec!(100000), &quote, shares).unwrap();
        store.commit_trade(user, &buy, executed_at(0)).unwrap();
        let holding = Holding {
            symbol: "AAPL".to_string(),
            shares,
        };
        let sell = plan_sell(buy.new_cash, &holding, &quote, shares).unwrap();
        store.commit_trade(user, &sell, executed_at(1)).unwrap();

        prop_assert_eq!(store.find_by_id(user).unwrap().unwrap().cash, dec!(100000));
        prop_assert!(store.holdings(user).unwrap().is_empty());
        prop_assert_eq!(store.entries(user).unwrap().len(), 2);
    }
}
