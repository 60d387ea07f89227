//! Cancellation restores ledger state to exactly its pre-placement values
//! for every order-backed operation kind.

mod common;

use common::*;
use odra::casper_types::U256;
use tranche_vault::VaultError;

/// Flat-market leveraged baseline: borrows 749475.15, junior assets
/// 1249125.25, NAV 1.0.
fn leveraged() -> Fixture {
    let mut f = Fixture::new();
    f.set_flat_market();
    f.usdc.mint(f.alice, usd(1_000_000));
    f.deposit_senior(f.alice, usd(1_000_000));
    f.seed_junior(f.bob, u(WAD / 10));
    f.seed_junior(f.alice, wad(499_650));
    let order = f.place_rebalance(one(), one());
    f.fill(order, one(), one());
    f
}

fn snapshot(f: &Fixture) -> (U256, U256, U256, U256) {
    (
        f.router.senior_borrows(),
        f.router.junior_total_assets(),
        f.router.junior_total_shares(),
        f.router.senior_total_shares(),
    )
}

#[test]
fn cancel_junior_deposit_returns_collateral() {
    let mut f = leveraged();
    let before = snapshot(&f);
    f.mlp.mint(f.alice, wad(100_000));
    f.place_deposit_junior(f.alice, wad(100_000));
    assert_eq!(f.mlp.balance_of(f.alice), u(0));

    f.env.set_caller(f.alice);
    f.router.cancel_pending_operation();
    assert_eq!(f.mlp.balance_of(f.alice), wad(100_000));
    assert_eq!(snapshot(&f), before);
    assert!(f.router.pending_operation_of(f.alice).is_none());
}

#[test]
fn cancel_junior_withdraw_restores_shares() {
    let mut f = leveraged();
    let before = snapshot(&f);
    f.place_withdraw_junior(f.alice, wad(499_650));
    assert_eq!(f.router.junior_balance_of(f.alice), u(0));

    f.env.set_caller(f.alice);
    f.router.cancel_pending_operation();
    assert_eq!(f.router.junior_balance_of(f.alice), wad(499_650));
    assert_eq!(snapshot(&f), before);
}

#[test]
fn cancel_senior_withdraw_leaves_ledgers_untouched() {
    let mut f = leveraged();
    let before = snapshot(&f);
    f.place_withdraw_senior(f.alice, wad(1_000_000), true);
    assert_eq!(f.router.senior_balance_of(f.alice), wad(1_000_000));

    f.env.set_caller(f.alice);
    f.router.cancel_pending_operation();
    assert_eq!(f.router.senior_balance_of(f.alice), wad(1_000_000));
    assert_eq!(snapshot(&f), before);
}

#[test]
fn cancel_rebalance_borrow_restores_debt_and_principal() {
    let mut f = Fixture::new();
    f.set_flat_market();
    f.usdc.mint(f.alice, usd(1_000_000));
    f.deposit_senior(f.alice, usd(1_000_000));
    f.seed_junior(f.alice, wad(499_650));
    f.seed_junior(f.bob, u(WAD / 10));

    f.place_rebalance(one(), one());
    assert_eq!(f.router.senior_borrows(), usd6(749_475_150_000));
    assert_eq!(
        f.lending.receipt_balance_of(f.router_address()),
        usd6(250_524_850_000)
    );
    let (_, balancing) = f.router.is_junior_balanced(one(), one());
    assert!(balancing);

    f.env.set_caller(f.keeper);
    f.router.cancel_rebalance_pending_operation();
    assert_eq!(f.router.senior_borrows(), u(0));
    assert_eq!(
        f.lending.receipt_balance_of(f.router_address()),
        usd(1_000_000)
    );
    let (balanced, balancing) = f.router.is_junior_balanced(one(), one());
    assert!(!balanced);
    assert!(!balancing);
}

#[test]
fn cancel_rebalance_sell_is_effect_free() {
    let mut f = leveraged();
    // drop the target so the engine wants to repay
    f.env.set_caller(f.admin);
    f.router.set_target_leverage(rate(2_000_000_000_000_000_000));
    let before = snapshot(&f);
    f.place_rebalance(one(), one());
    assert_eq!(snapshot(&f), before); // sell placement has no ledger effects

    f.env.set_caller(f.keeper);
    f.router.cancel_rebalance_pending_operation();
    assert_eq!(snapshot(&f), before);
}

#[test]
fn cancel_without_pending_operation_fails() {
    let mut f = Fixture::new();
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_cancel_pending_operation().unwrap_err(),
        VaultError::NoPendingOperation.into()
    );
    f.env.set_caller(f.keeper);
    assert_eq!(
        f.router.try_cancel_rebalance_pending_operation().unwrap_err(),
        VaultError::NoPendingOperation.into()
    );
}

#[test]
fn fill_arriving_after_cancel_is_ignored() {
    let mut f = Fixture::new();
    f.mlp.mint(f.alice, wad(10));
    let order = f.place_deposit_junior(f.alice, wad(10));
    f.env.set_caller(f.alice);
    f.router.cancel_pending_operation();
    assert_eq!(f.mlp.balance_of(f.alice), wad(10));

    // the market already processed the cancel; a late callback is dropped
    f.env.set_caller(f.keeper);
    f.market.push_fill(order, one(), one());
    assert_eq!(f.router.junior_balance_of(f.alice), u(0));
    assert_eq!(f.router.junior_total_assets(), u(0));
}
