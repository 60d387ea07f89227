//! Authorization, whitelist, timelock and capacity guards.

mod common;

use common::*;
use tranche_vault::VaultError;

#[test]
fn keeper_operations_are_role_gated() {
    let mut f = Fixture::new();
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_rebalance(one(), one()).unwrap_err(),
        VaultError::MissingRole.into()
    );
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_liquidate(one(), one()).unwrap_err(),
        VaultError::MissingRole.into()
    );
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_refund_junior().unwrap_err(),
        VaultError::MissingRole.into()
    );
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_update_rewards().unwrap_err(),
        VaultError::MissingRole.into()
    );
}

#[test]
fn config_and_admin_are_role_gated() {
    let mut f = Fixture::new();
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_set_lock_period(1).unwrap_err(),
        VaultError::MissingRole.into()
    );
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_set_whitelist(f.alice, true).unwrap_err(),
        VaultError::MissingRole.into()
    );
    // granted roles start working immediately
    f.env.set_caller(f.admin);
    f.router.grant_role(f.alice, tranche_vault::ROLE_CONFIG);
    assert!(f.router.has_role(f.alice, tranche_vault::ROLE_CONFIG));
    f.env.set_caller(f.alice);
    f.router.set_lock_period(5);
    f.env.set_caller(f.admin);
    f.router.revoke_role(f.alice, tranche_vault::ROLE_CONFIG);
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_set_lock_period(1).unwrap_err(),
        VaultError::MissingRole.into()
    );
}

#[test]
fn whitelist_gates_user_operations_when_enabled() {
    let mut f = Fixture::new();
    f.env.set_caller(f.admin);
    f.router.set_whitelist_enabled(true);

    f.usdc.mint(f.alice, usd(100));
    f.env.set_caller(f.alice);
    f.usdc.approve(f.router_address(), usd(100));
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_deposit_senior(usd(100)).unwrap_err(),
        VaultError::NotWhitelisted.into()
    );

    f.env.set_caller(f.admin);
    f.router.set_whitelist(f.alice, true);
    f.env.set_caller(f.alice);
    f.router.deposit_senior(usd(100));
    assert_eq!(f.router.senior_balance_of(f.alice), wad(100));
}

#[test]
fn timelock_blocks_hard_withdrawals_and_charges_soft_ones() {
    let mut f = Fixture::new();
    let treasury = f.env.get_account(4);
    f.env.set_caller(f.admin);
    f.router.set_lock_period(86_400_000);
    f.env.set_caller(f.admin);
    f.router.set_lock_penalty_rate(rate(50_000_000_000_000_000)); // 5%
    f.env.set_caller(f.admin);
    f.router.set_lock_penalty_recipient(treasury);

    f.usdc.mint(f.bob, usd(400));
    f.deposit_senior(f.bob, usd(200));

    // hard withdrawal inside the lock
    f.env.set_caller(f.bob);
    assert_eq!(
        f.router.try_withdraw_senior(wad(200), false).unwrap_err(),
        VaultError::Locked.into()
    );

    // after the lock, no penalty even when the caller opted in
    f.env.advance_block_time(86_400_000);
    f.env.set_caller(f.bob);
    f.router.withdraw_senior(wad(100), true);
    assert_eq!(f.usdc.balance_of(f.bob), usd(300));
    assert_eq!(f.usdc.balance_of(treasury), u(0));

    // a fresh deposit re-arms the lock; soft withdrawal pays 5%
    f.deposit_senior(f.bob, usd(100));
    f.env.set_caller(f.bob);
    assert_eq!(
        f.router.try_withdraw_senior(wad(200), false).unwrap_err(),
        VaultError::Locked.into()
    );
    f.env.set_caller(f.bob);
    f.router.withdraw_senior(wad(200), true);
    assert_eq!(f.usdc.balance_of(treasury), usd(10));
    assert_eq!(f.usdc.balance_of(f.bob), usd(390));
    assert_eq!(f.router.senior_total_shares(), u(0));
}

#[test]
fn deposit_caps_bound_both_tranches() {
    let mut f = Fixture::new();
    f.env.set_caller(f.admin);
    f.router.set_senior_deposit_cap(usd(200));
    f.env.set_caller(f.admin);
    f.router.set_junior_deposit_cap(wad(50));

    f.usdc.mint(f.alice, usd(300));
    f.deposit_senior(f.alice, usd(200));
    f.env.set_caller(f.alice);
    f.usdc.approve(f.router_address(), usd(1));
    f.env.set_caller(f.alice);
    assert_eq!(
        f.router.try_deposit_senior(usd(1)).unwrap_err(),
        VaultError::ExceedsSupplyCap.into()
    );
    // withdrawing frees capacity again
    f.env.set_caller(f.alice);
    f.router.withdraw_senior(wad(150), true);
    f.deposit_senior(f.alice, usd(100));

    f.seed_junior(f.bob, wad(50));
    f.mlp.mint(f.bob, wad(1));
    f.env.set_caller(f.bob);
    f.mlp.approve(f.router_address(), wad(1));
    f.env.set_caller(f.bob);
    assert_eq!(
        f.router.try_deposit_junior(wad(1)).unwrap_err(),
        VaultError::ExceedsSupplyCap.into()
    );
}

#[test]
fn borrow_cap_limits_rebalance_leverage() {
    let mut f = Fixture::new();
    f.set_flat_market();
    f.env.set_caller(f.admin);
    f.router.set_max_borrows(usd(100));
    f.usdc.mint(f.alice, usd(1_000));
    f.deposit_senior(f.alice, usd(1_000));
    f.seed_junior(f.bob, wad(100)); // wants to borrow 150
    f.env.set_caller(f.keeper);
    assert_eq!(
        f.router.try_rebalance(one(), one()).unwrap_err(),
        VaultError::ExceedsMaxBorrows.into()
    );
}

#[test]
fn rebalance_inside_the_deadband_is_rejected() {
    let mut f = Fixture::new();
    f.set_flat_market();
    f.usdc.mint(f.alice, usd(1_000));
    f.deposit_senior(f.alice, usd(1_000));
    f.seed_junior(f.bob, wad(100));
    let order = f.place_rebalance(one(), one());
    f.fill(order, one(), one());
    f.env.set_caller(f.keeper);
    assert_eq!(
        f.router.try_rebalance(one(), one()).unwrap_err(),
        VaultError::AlreadyBalanced.into()
    );
}
