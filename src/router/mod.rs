//! Settlement router: the single state-owning component coordinating both
//! tranche ledgers, the reward engine, and the async order lifecycle
//! against the external LP market.
//!
//! Entrypoints live in the annotated impl below and stay thin; the
//! per-concern logic sits in plain impl blocks across this directory
//! (`senior_ops`, `junior_ops`, `rebalance`, `liquidation`, `settlement`,
//! `harvest`).

mod harvest;
mod junior_ops;
mod liquidation;
mod rebalance;
mod senior_ops;
mod settlement;

pub use settlement::{lp_to_stable, stable_to_lp};

use alloc::vec::Vec;
use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::external::{LiquidityMarketContractRef, SwapPath};
use crate::math::{Decimal, Rate, TryDiv, TryMul, TrySub};
use crate::reward::RewardAccrual;
use crate::state::{JuniorLedger, OperationKind, PendingOperation, SeniorLedger};

/// May grant roles and manage the whitelist.
pub const ROLE_ADMIN: u8 = 0;
/// May change vault parameters.
pub const ROLE_CONFIG: u8 = 1;
/// May rebalance, liquidate, refund and run reward updates.
pub const ROLE_KEEPER: u8 = 2;

/// Worst-case LP market fee assumed when sizing sells: 0.093%.
pub const DEFAULT_SELL_FEE_MARGIN: u128 = 930_000_000_000_000;

/// Unwraps accounting results at the entrypoint boundary.
pub(crate) fn ok<T>(env: &odra::ContractEnv, result: Result<T, VaultError>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => env.revert(error),
    }
}

#[odra::module]
pub struct TrancheRouter {
    senior: SubModule<SeniorLedger>,
    junior: SubModule<JuniorLedger>,
    reward: SubModule<RewardAccrual>,

    admin: Var<Address>,
    roles: Mapping<(Address, u8), bool>,
    whitelist: Mapping<Address, bool>,
    whitelist_enabled: Var<bool>,

    stable_token: Var<Address>,
    lp_token: Var<Address>,
    liquidity_market: Var<Address>,
    lending_market: Var<Address>,
    staking_pool: Var<Address>,
    swap_venue: Var<Address>,
    swap_paths: Mapping<Address, SwapPath>,

    target_leverage: Var<Rate>,
    rebalance_threshold_rate: Var<Rate>,
    liquidation_leverage: Var<Rate>,
    sell_fee_margin: Var<Rate>,

    pending: Mapping<Address, Option<PendingOperation>>,
    pending_accounts: Var<Vec<Address>>,
    order_owner: Mapping<u64, Option<Address>>,
    is_liquidated: Var<bool>,
    pending_refund_assets: Var<U256>,
    state_version: Var<u8>,
}

#[odra::module]
impl TrancheRouter {
    pub fn init(&mut self, stable_token: Address, lp_token: Address, stable_decimals: u8) {
        if stable_decimals > 18 {
            self.env().revert(VaultError::InvalidConfig);
        }
        let caller = self.env().caller();
        self.admin.set(caller);
        self.roles.set(&(caller, ROLE_ADMIN), true);
        self.roles.set(&(caller, ROLE_CONFIG), true);
        self.stable_token.set(stable_token);
        self.lp_token.set(lp_token);
        self.senior.configure(stable_decimals);
        self.sell_fee_margin
            .set(Rate::from_scaled_val(DEFAULT_SELL_FEE_MARGIN));
        self.state_version.set(crate::state::STATE_VERSION);
        let now = self.env().get_block_time();
        self.reward.set_last_update_time(now);
    }

    // ------------------------------------------------------------------
    // roles and whitelist

    pub fn grant_role(&mut self, account: Address, role: u8) {
        let result = self.require_role(ROLE_ADMIN);
        ok(&self.env(), result);
        self.roles.set(&(account, role), true);
    }

    pub fn revoke_role(&mut self, account: Address, role: u8) {
        let result = self.require_role(ROLE_ADMIN);
        ok(&self.env(), result);
        self.roles.set(&(account, role), false);
    }

    pub fn has_role(&self, account: Address, role: u8) -> bool {
        self.roles.get(&(account, role)).unwrap_or(false)
    }

    pub fn set_whitelist(&mut self, account: Address, enabled: bool) {
        let result = self.require_role(ROLE_ADMIN);
        ok(&self.env(), result);
        self.whitelist.set(&account, enabled);
    }

    pub fn set_whitelist_enabled(&mut self, enabled: bool) {
        let result = self.require_role(ROLE_ADMIN);
        ok(&self.env(), result);
        self.whitelist_enabled.set(enabled);
    }

    // ------------------------------------------------------------------
    // configuration

    pub fn set_liquidity_market(&mut self, market: Address) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.liquidity_market.set(market);
    }

    pub fn set_lending_market(&mut self, market: Address) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.lending_market.set(market);
    }

    pub fn set_staking_pool(&mut self, pool: Address) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.staking_pool.set(pool);
    }

    pub fn set_swap_venue(&mut self, venue: Address) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.swap_venue.set(venue);
    }

    pub fn set_swap_path(&mut self, token: Address, path: SwapPath) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.swap_paths.set(&token, path);
    }

    pub fn set_target_leverage(&mut self, leverage: Rate) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        if leverage <= Rate::one() {
            self.env().revert(VaultError::InvalidConfig);
        }
        self.target_leverage.set(leverage);
    }

    pub fn set_rebalance_threshold_rate(&mut self, rate: Rate) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.rebalance_threshold_rate.set(rate);
    }

    pub fn set_liquidation_leverage(&mut self, leverage: Rate) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        if leverage <= Rate::one() {
            self.env().revert(VaultError::InvalidConfig);
        }
        self.liquidation_leverage.set(leverage);
    }

    pub fn set_sell_fee_margin(&mut self, margin: Rate) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        if margin >= Rate::one() {
            self.env().revert(VaultError::InvalidConfig);
        }
        self.sell_fee_margin.set(margin);
    }

    pub fn set_senior_deposit_cap(&mut self, cap: U256) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.senior.set_deposit_cap(cap);
    }

    pub fn set_junior_deposit_cap(&mut self, cap: U256) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.junior.set_deposit_cap(cap);
    }

    pub fn set_max_borrows(&mut self, cap: U256) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.senior.set_max_borrows(cap);
    }

    pub fn set_lock_period(&mut self, period: u64) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.senior.set_lock_period(period);
    }

    pub fn set_lock_penalty_rate(&mut self, rate: Rate) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.senior.set_lock_penalty_rate(rate);
    }

    pub fn set_lock_penalty_recipient(&mut self, recipient: Address) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.senior.set_lock_penalty_recipient(recipient);
    }

    pub fn set_senior_reward_rate(&mut self, rate: Rate) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        if rate > Rate::one() {
            self.env().revert(VaultError::InvalidConfig);
        }
        self.reward.set_senior_reward_rate(rate);
    }

    pub fn set_min_stable_apy(&mut self, rate: Rate) {
        let result = self.require_role(ROLE_CONFIG);
        ok(&self.env(), result);
        self.reward.set_min_stable_apy(rate);
    }

    // ------------------------------------------------------------------
    // user operations

    pub fn deposit_senior(&mut self, amount: U256) {
        let result = self.do_deposit_senior(amount);
        ok(&self.env(), result);
    }

    pub fn withdraw_senior(&mut self, shares: U256, accept_penalty: bool) {
        let result = self.do_withdraw_senior(shares, accept_penalty);
        ok(&self.env(), result);
    }

    pub fn deposit_junior(&mut self, amount: U256) {
        let result = self.do_deposit_junior(amount);
        ok(&self.env(), result);
    }

    pub fn withdraw_junior(&mut self, shares: U256) {
        let result = self.do_withdraw_junior(shares);
        ok(&self.env(), result);
    }

    pub fn cancel_pending_operation(&mut self) {
        let result = self.do_cancel_pending();
        ok(&self.env(), result);
    }

    pub fn claim_senior_rewards(&mut self) {
        let result = self.do_claim(true, false);
        ok(&self.env(), result);
    }

    pub fn claim_junior_rewards(&mut self) {
        let result = self.do_claim(false, true);
        ok(&self.env(), result);
    }

    pub fn collect_rewards(&mut self) {
        let result = self.do_claim(true, true);
        ok(&self.env(), result);
    }

    // ------------------------------------------------------------------
    // keeper operations

    pub fn rebalance(&mut self, stable_price: Decimal, lp_price: Decimal) {
        let result = self.do_rebalance(stable_price, lp_price);
        ok(&self.env(), result);
    }

    pub fn cancel_rebalance_pending_operation(&mut self) {
        let result = self.do_cancel_global();
        ok(&self.env(), result);
    }

    pub fn liquidate(&mut self, stable_price: Decimal, lp_price: Decimal) {
        let result = self.do_liquidate(stable_price, lp_price);
        ok(&self.env(), result);
    }

    pub fn refund_junior(&mut self) {
        let result = self.do_refund_junior();
        ok(&self.env(), result);
    }

    pub fn update_rewards(&mut self) {
        let keeper = self.require_role(ROLE_KEEPER);
        ok(&self.env(), keeper);
        let result = self.do_harvest();
        ok(&self.env(), result);
    }

    // ------------------------------------------------------------------
    // settlement callback (invoked by the LP market)

    pub fn fill_liquidity_order(
        &mut self,
        order_id: u64,
        stable_price: Decimal,
        lp_price: Decimal,
        bound_low: Decimal,
        bound_high: Decimal,
    ) {
        let result = self.do_fill(order_id, stable_price, lp_price, bound_low, bound_high);
        ok(&self.env(), result);
    }

    // ------------------------------------------------------------------
    // queries

    pub fn junior_nav_per_share(&self, stable_price: Decimal, lp_price: Decimal) -> Decimal {
        let result = self.nav_per_share(stable_price, lp_price);
        ok(&self.env(), result)
    }

    pub fn junior_leverage(&self, stable_price: Decimal, lp_price: Decimal) -> Decimal {
        let result = self.leverage(stable_price, lp_price);
        ok(&self.env(), result)
    }

    pub fn is_junior_balanced(&self, stable_price: Decimal, lp_price: Decimal) -> (bool, bool) {
        let balancing = match self.global_pending() {
            Some(op) => op.kind == OperationKind::Rebalance,
            None => false,
        };
        let result = self.is_balanced(stable_price, lp_price);
        (ok(&self.env(), result), balancing)
    }

    pub fn claimable_senior_rewards(&mut self, account: Address) -> U256 {
        let harvested = self.do_harvest();
        ok(&self.env(), harvested);
        let shares = self.senior.balance_of(&account);
        let result = self.reward.claimable_senior(&account, shares);
        ok(&self.env(), result)
    }

    pub fn claimable_junior_rewards(&mut self, account: Address) -> U256 {
        let harvested = self.do_harvest();
        ok(&self.env(), harvested);
        let shares = self.junior.balance_of(&account);
        let result = self.reward.claimable_junior(&account, shares);
        ok(&self.env(), result)
    }

    /// Pending operation of `account`; pass the contract's own address for
    /// the global (rebalance/liquidate/refund) slot.
    pub fn pending_operation_of(&self, account: Address) -> Option<PendingOperation> {
        self.pending.get(&account).flatten()
    }

    /// Accounts with an outstanding order-backed operation, paginated.
    pub fn pending_account_list(&self, start: u32, count: u32) -> Vec<Address> {
        let accounts = self.pending_accounts.get_or_default();
        accounts
            .into_iter()
            .skip(start as usize)
            .take(count as usize)
            .collect()
    }

    pub fn is_liquidated(&self) -> bool {
        self.is_liquidated.get_or_default()
    }

    pub fn state_version(&self) -> u8 {
        self.state_version.get_or_default()
    }

    pub fn pending_refund_assets(&self) -> U256 {
        self.pending_refund_assets.get_or_default()
    }

    pub fn senior_total_assets(&self) -> U256 {
        self.senior.total_assets()
    }

    pub fn senior_total_shares(&self) -> U256 {
        self.senior.total_shares()
    }

    pub fn senior_balance_of(&self, account: Address) -> U256 {
        self.senior.balance_of(&account)
    }

    pub fn senior_borrows(&self) -> U256 {
        self.senior.total_borrows()
    }

    pub fn junior_total_assets(&self) -> U256 {
        self.junior.total_assets()
    }

    pub fn junior_total_shares(&self) -> U256 {
        self.junior.total_shares()
    }

    pub fn junior_balance_of(&self, account: Address) -> U256 {
        self.junior.balance_of(&account)
    }
}

// ----------------------------------------------------------------------
// shared internals

impl TrancheRouter {
    fn require_role(&self, role: u8) -> Result<(), VaultError> {
        let caller = self.env().caller();
        if self.roles.get(&(caller, role)).unwrap_or(false) {
            Ok(())
        } else {
            Err(VaultError::MissingRole)
        }
    }

    fn require_whitelisted(&self) -> Result<(), VaultError> {
        if !self.whitelist_enabled.get_or_default() {
            return Ok(());
        }
        let caller = self.env().caller();
        if self.whitelist.get(&caller).unwrap_or(false) {
            Ok(())
        } else {
            Err(VaultError::NotWhitelisted)
        }
    }

    fn addr(&self, var: &Var<Address>) -> Result<Address, VaultError> {
        var.get().ok_or(VaultError::InvalidConfig)
    }

    fn market_address(&self) -> Result<Address, VaultError> {
        self.addr(&self.liquidity_market)
    }

    fn stable_address(&self) -> Result<Address, VaultError> {
        self.addr(&self.stable_token)
    }

    fn lp_address(&self) -> Result<Address, VaultError> {
        self.addr(&self.lp_token)
    }

    fn stable_decimals(&self) -> u8 {
        self.senior.asset_decimals()
    }

    /// Key of the reserved global pending slot.
    fn global_key(&self) -> Address {
        self.env().self_address()
    }

    fn global_pending(&self) -> Option<PendingOperation> {
        self.pending.get(&self.global_key()).flatten()
    }

    fn market_fee(&self) -> Result<Rate, VaultError> {
        let market = LiquidityMarketContractRef::new(self.env(), self.market_address()?);
        Ok(market.fee_rate())
    }

    /// Junior backing value and allocable debt value at a price pair.
    fn junior_values(
        &self,
        stable_price: Decimal,
        lp_price: Decimal,
    ) -> Result<(Decimal, Decimal), VaultError> {
        if stable_price.is_zero() || lp_price.is_zero() {
            return Err(VaultError::InvalidPrice);
        }
        let value = Decimal(self.junior.total_assets()).try_mul(lp_price)?;
        let debt = Decimal::from_units(self.senior.total_borrows(), self.stable_decimals())?
            .try_mul(stable_price)?;
        Ok((value, debt))
    }

    fn nav_per_share(&self, stable_price: Decimal, lp_price: Decimal) -> Result<Decimal, VaultError> {
        let shares = self.junior.total_shares();
        if shares.is_zero() {
            return Ok(Decimal::one());
        }
        let (value, debt) = self.junior_values(stable_price, lp_price)?;
        if value <= debt {
            return Ok(Decimal::zero());
        }
        value.try_sub(debt)?.try_div(Decimal(shares))
    }

    fn leverage(&self, stable_price: Decimal, lp_price: Decimal) -> Result<Decimal, VaultError> {
        let (value, debt) = self.junior_values(stable_price, lp_price)?;
        if value.is_zero() {
            return Ok(Decimal::zero());
        }
        if value <= debt {
            // underwater: report as unbounded leverage
            return Ok(Decimal(U256::from(u128::MAX)));
        }
        value.try_div(value.try_sub(debt)?)
    }

    fn is_balanced(&self, stable_price: Decimal, lp_price: Decimal) -> Result<bool, VaultError> {
        let (value, debt) = self.junior_values(stable_price, lp_price)?;
        if value.is_zero() {
            return Ok(true);
        }
        if value <= debt {
            return Ok(false);
        }
        let leverage = value.try_div(value.try_sub(debt)?)?;
        let target = Decimal::from(self.target_leverage.get_or_default());
        if target.is_zero() {
            return Err(VaultError::InvalidConfig);
        }
        let band = target.try_mul(Decimal::from(self.rebalance_threshold_rate.get_or_default()))?;
        let distance = if leverage > target {
            leverage.try_sub(target)?
        } else {
            target.try_sub(leverage)?
        };
        Ok(distance <= band)
    }
}
