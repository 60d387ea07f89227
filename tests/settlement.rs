//! End-to-end settlement scenarios: direct senior flows, order-backed
//! junior flows, the leverage round-trip, and forced repayment through a
//! senior withdrawal.

mod common;

use common::*;
use tranche_vault::state::OperationKind;
use tranche_vault::VaultError;

#[test]
fn senior_deposit_and_withdraw_are_direct() {
    let mut f = Fixture::new();
    f.usdc.mint(f.alice, usd(1_000_000));
    f.deposit_senior(f.alice, usd(1_000_000));

    assert_eq!(f.router.senior_balance_of(f.alice), wad(1_000_000));
    assert_eq!(f.router.senior_total_assets(), usd(1_000_000));
    // the full principal is parked in the lending market
    assert_eq!(
        f.lending.receipt_balance_of(f.router_address()),
        usd(1_000_000)
    );

    f.env.set_caller(f.alice);
    f.router.withdraw_senior(wad(400_000), true);
    assert_eq!(f.usdc.balance_of(f.alice), usd(400_000));
    assert_eq!(f.router.senior_balance_of(f.alice), wad(600_000));
    assert_eq!(f.router.senior_total_assets(), usd(600_000));
    assert_eq!(
        f.lending.receipt_balance_of(f.router_address()),
        usd(600_000)
    );
}

#[test]
fn senior_withdraw_beyond_balance_fails() {
    let mut f = Fixture::new();
    f.usdc.mint(f.alice, usd(100));
    f.deposit_senior(f.alice, usd(100));
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_withdraw_senior(wad(101), true).unwrap_err(),
        VaultError::ExceedsBalance.into()
    );
}

#[test]
fn junior_deposit_settles_at_fill_time_nav() {
    let mut f = Fixture::new();
    f.mlp.mint(f.bob, u(WAD / 10));
    let order = f.place_deposit_junior(f.bob, u(WAD / 10));

    // pending until the market fills
    assert_eq!(f.router.junior_balance_of(f.bob), u(0));
    let op = f.router.pending_operation_of(f.bob).unwrap();
    assert_eq!(op.kind, OperationKind::DepositJunior);
    assert_eq!(op.order_id, order);
    assert_eq!(op.state_values[0], u(WAD / 10));
    assert_eq!(f.router.pending_account_list(0, 10), vec![f.bob]);

    f.fill(order, one(), one());
    assert_eq!(f.router.junior_balance_of(f.bob), u(WAD / 10));
    assert_eq!(f.router.junior_total_assets(), u(WAD / 10));
    assert_eq!(f.router.junior_nav_per_share(one(), one()), one());
    assert!(f.router.pending_operation_of(f.bob).is_none());
    assert!(f.router.pending_account_list(0, 10).is_empty());
    // the LP is registered with the staking pool
    assert_eq!(f.staking.staked_of(f.router_address()), u(WAD / 10));
}

#[test]
fn second_intent_conflicts_until_settled() {
    let mut f = Fixture::new();
    f.mlp.mint(f.alice, wad(200));
    let order = f.place_deposit_junior(f.alice, wad(100));
    f.env.set_caller(f.alice);
    f.mlp.approve(f.router_address(), wad(100));
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_deposit_junior(wad(100)).unwrap_err(),
        VaultError::PendingOperationExists.into()
    );
    f.fill(order, one(), one());
    let order = f.place_deposit_junior(f.alice, wad(100));
    f.fill(order, one(), one());
    assert_eq!(f.router.junior_balance_of(f.alice), wad(200));
}

/// 1,000,000 senior, 0.1 + 499,650 junior, target leverage 2.5 (debt
/// multiplier 1.5), market fee 0.0007.
#[test]
fn leverage_round_trip_settles_to_expected_values() {
    let mut f = Fixture::new();
    f.usdc.mint(f.alice, usd(1_000_000));
    f.deposit_senior(f.alice, usd(1_000_000));

    f.seed_junior(f.bob, u(WAD / 10));
    assert_eq!(f.router.junior_nav_per_share(one(), one()), one());

    f.seed_junior(f.alice, wad(499_650));
    assert_eq!(f.router.junior_total_shares(), u(499_650_100_000_000_000_000_000));
    assert_eq!(f.router.junior_total_assets(), u(499_650_100_000_000_000_000_000));
    assert_eq!(f.router.junior_nav_per_share(one(), one()), one());

    // rebalance: borrow 499650.1 * 1.5 and queue the LP buy
    let (balanced, balancing) = f.router.is_junior_balanced(one(), one());
    assert!(!balanced);
    assert!(!balancing);
    let order = f.place_rebalance(one(), one());
    let (balanced, balancing) = f.router.is_junior_balanced(one(), one());
    assert!(!balanced);
    assert!(balancing);
    assert_eq!(f.router.senior_borrows(), usd6(749_475_150_000));
    assert_eq!(
        f.lending.receipt_balance_of(f.router_address()),
        usd6(250_524_850_000)
    );
    // junior untouched until the fill
    assert_eq!(f.router.junior_total_assets(), u(499_650_100_000_000_000_000_000));
    let op = f.router.pending_operation_of(f.router_address()).unwrap();
    assert_eq!(op.kind, OperationKind::Rebalance);

    f.fill(order, one(), one());
    let (balanced, balancing) = f.router.is_junior_balanced(one(), one());
    assert!(balanced);
    assert!(!balancing);
    assert_eq!(f.router.senior_borrows(), usd6(749_475_150_000));
    // 499650.1 + 749475.15 * (1 - 0.0007)
    assert_eq!(
        f.router.junior_total_assets(),
        u(1_248_600_617_395_000_000_000_000)
    );
    // (1248600.617395 - 749475.15) / 499650.1
    assert_eq!(
        f.router.junior_nav_per_share(one(), one()),
        dec(998_950_000_000_000_000)
    );

    // more junior shares than owned
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_withdraw_junior(wad(499_651)).unwrap_err(),
        VaultError::ExceedsRedeemable.into()
    );
    // more senior balance than owned
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_withdraw_senior(wad(1_000_001), true).unwrap_err(),
        VaultError::ExceedsBalance.into()
    );
}

/// Frictionless variant: leveraged withdrawals come back to round numbers.
#[test]
fn leveraged_withdrawals_repay_proportionally() {
    let mut f = Fixture::new();
    f.set_flat_market();
    f.usdc.mint(f.alice, usd(1_000_000));
    f.deposit_senior(f.alice, usd(1_000_000));
    f.seed_junior(f.bob, u(WAD / 10));
    f.seed_junior(f.alice, wad(499_650));

    let order = f.place_rebalance(one(), one());
    f.fill(order, one(), one());
    assert_eq!(f.router.senior_borrows(), usd6(749_475_150_000));
    // no fee: 499650.1 + 749475.15
    assert_eq!(
        f.router.junior_total_assets(),
        u(1_249_125_250_000_000_000_000_000)
    );
    assert_eq!(f.router.junior_nav_per_share(one(), one()), one());

    // alice exits junior: her debt slice is 749475.15 * 499650 / 499650.1
    let order = f.place_withdraw_junior(f.alice, wad(499_650));
    assert_eq!(f.router.junior_balance_of(f.alice), u(0));
    let op = f.router.pending_operation_of(f.alice).unwrap();
    assert_eq!(op.kind, OperationKind::WithdrawJunior);
    assert_eq!(op.state_values[1], usd6(749_475_000_000));

    f.fill(order, one(), one());
    assert_eq!(f.router.senior_borrows(), usd6(150_000)); // 0.15 left
    assert_eq!(f.mlp.balance_of(f.alice), wad(499_650));
    assert_eq!(f.usdc.balance_of(f.alice), u(0)); // no surplus without fees
    assert_eq!(f.router.junior_total_assets(), u(250_000_000_000_000_000)); // 0.25
    assert_eq!(f.router.junior_total_shares(), u(100_000_000_000_000_000)); // 0.1
    assert_eq!(f.router.junior_nav_per_share(one(), one()), one());

    // senior exit forces the remaining 0.15 to be repaid from junior LP
    let order = f.place_withdraw_senior(f.alice, wad(1_000_000), true);
    let op = f.router.pending_operation_of(f.alice).unwrap();
    assert_eq!(op.kind, OperationKind::WithdrawSenior);
    assert_eq!(op.state_values[1], usd6(150_000));
    // shares are not pre-burned on the senior side
    assert_eq!(f.router.senior_balance_of(f.alice), wad(1_000_000));

    f.fill(order, one(), one());
    assert_eq!(f.usdc.balance_of(f.alice), usd(1_000_000));
    assert_eq!(f.router.senior_balance_of(f.alice), u(0));
    assert_eq!(f.router.senior_total_assets(), u(0));
    assert_eq!(f.router.senior_borrows(), u(0));
    assert_eq!(f.router.junior_total_assets(), u(100_000_000_000_000_000)); // 0.1
    assert_eq!(f.router.junior_nav_per_share(one(), one()), one());
    assert_eq!(f.router.pending_refund_assets(), u(0));
}

#[test]
fn stale_fill_after_settlement_is_a_noop() {
    let mut f = Fixture::new();
    f.mlp.mint(f.alice, wad(10));
    let order = f.place_deposit_junior(f.alice, wad(10));
    f.fill(order, one(), one());
    assert_eq!(f.router.junior_balance_of(f.alice), wad(10));
    // a second callback for the same (now cleared) order must not fail
    f.env.set_caller(f.keeper);
    f.market.push_fill(order, one(), one());
    assert_eq!(f.router.junior_balance_of(f.alice), wad(10));
    assert_eq!(f.router.junior_total_assets(), wad(10));
}

#[test]
fn only_the_market_may_invoke_the_fill_callback() {
    let mut f = Fixture::new();
    f.mlp.mint(f.alice, wad(10));
    let order = f.place_deposit_junior(f.alice, wad(10));
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router
            .try_fill_liquidity_order(
                order,
                one(),
                one(),
                tranche_vault::math::Decimal::zero(),
                tranche_vault::math::Decimal::zero(),
            )
            .unwrap_err(),
        VaultError::ImproperCaller.into()
    );
    f.fill(order, one(), one());
    assert_eq!(f.router.junior_balance_of(f.alice), wad(10));
}

#[test]
fn fill_rejects_prices_outside_callback_bounds() {
    let mut f = Fixture::new();
    f.mlp.mint(f.alice, wad(10));
    let order = f.place_deposit_junior(f.alice, wad(10));
    f.env.set_caller(f.keeper);
    assert_eq!(
        f.market
            .try_fill_order(
                order,
                one(),
                dec(950_000_000_000_000_000),
                dec(960_000_000_000_000_000),
                dec(1_050_000_000_000_000_000),
            )
            .unwrap_err(),
        VaultError::PriceOutOfBounds.into()
    );
    f.fill(order, one(), one());
}
