//! Senior tranche operations. Deposits are direct; withdrawals are direct
//! while the vault holds enough stable, and otherwise settle through an LP
//! sell order that forces junior to repay part of its debt first.

use alloc::vec;
use core::cmp::min;
use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::external::{FungibleTokenContractRef, LendingMarketContractRef};
use crate::math::Decimal;
use crate::state::{OperationKind, PendingOperation};

use super::settlement::lp_to_stable;
use super::TrancheRouter;

impl TrancheRouter {
    pub(super) fn do_deposit_senior(&mut self, amount: U256) -> Result<(), VaultError> {
        self.require_whitelisted()?;
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount);
        }
        self.do_harvest()?;
        let caller = self.env().caller();
        let now = self.env().get_block_time();
        let old = self.senior.balance_of(&caller);
        let minted = self.senior.deposit(&caller, amount, now)?;
        self.reward.settle_senior(&caller, old, old + minted)?;

        let self_addr = self.env().self_address();
        let mut stable = FungibleTokenContractRef::new(self.env(), self.stable_address()?);
        stable.transfer_from(caller, self_addr, amount);
        self.supply_to_lending(amount)?;
        Ok(())
    }

    pub(super) fn do_withdraw_senior(
        &mut self,
        shares: U256,
        accept_penalty: bool,
    ) -> Result<(), VaultError> {
        self.require_whitelisted()?;
        if shares.is_zero() {
            return Err(VaultError::InvalidAmount);
        }
        self.do_harvest()?;
        let caller = self.env().caller();
        if shares > self.senior.balance_of(&caller) {
            return Err(VaultError::ExceedsBalance);
        }
        let amount = self.senior.shares_to_assets(shares);
        if amount <= self.senior.total_assets() {
            return self.complete_senior_withdraw(&caller, shares, accept_penalty);
        }

        // junior must unwind part of its LP backing to repay the shortfall
        self.ensure_slot_free(&caller)?;
        let now = self.env().get_block_time();
        self.senior.ensure_unlocked(&caller, now, accept_penalty)?;
        let need = amount - self.senior.total_assets();
        if need > self.senior.total_borrows() {
            return Err(VaultError::InsufficientAssets);
        }
        let sell_lp = self.size_lp_sale(need)?;
        if sell_lp.0 > self.junior.total_assets() {
            return Err(VaultError::InsufficientAssets);
        }
        let order_id = self.place_order(OperationKind::WithdrawSenior, sell_lp.0, false)?;
        let values = vec![shares, need, sell_lp.0, Self::flag_values(accept_penalty)];
        let op = self.new_pending(OperationKind::WithdrawSenior, order_id, values);
        self.set_pending(caller, op)?;
        Ok(())
    }

    /// Second half of an order-backed senior withdrawal: the sell filled,
    /// repay as much debt as the proceeds cover, route any surplus toward a
    /// junior refund, then run the direct path.
    //
    // TODO: the sell is sized from the worst-case bound, so a withdrawal
    // that consumes all debt headroom over-sells junior LP and leaves the
    // surplus on the refund path; sizing against the expected fill price
    // with a smaller haircut would be kinder to remaining junior holders.
    pub(super) fn fill_withdraw_senior(
        &mut self,
        account: &Address,
        op: &PendingOperation,
        stable_price: Decimal,
        lp_price: Decimal,
    ) -> Result<(), VaultError> {
        let shares = op.value(0);
        let sell_lp = op.value(2);
        let accept_penalty = op.value(3) == U256::one();
        let fee = self.market_fee()?;
        let proceeds = lp_to_stable(
            Decimal(sell_lp),
            stable_price,
            lp_price,
            fee,
            self.stable_decimals(),
        )?;
        let repay = min(proceeds, self.senior.total_borrows());
        self.repay_senior(repay)?;
        let excess = proceeds - repay;
        if !excess.is_zero() {
            self.pending_refund_assets
                .set(self.pending_refund_assets.get_or_default() + excess);
        }
        self.junior.debit_assets(sell_lp)?;
        self.unstake_lp(sell_lp)?;
        let mut lp = FungibleTokenContractRef::new(self.env(), self.lp_address()?);
        lp.transfer(self.market_address()?, sell_lp);

        self.complete_senior_withdraw(account, shares, accept_penalty)
    }

    /// Direct senior withdrawal: burn, pull principal out of the lending
    /// market, apply the timelock penalty if any, pay out.
    pub(super) fn complete_senior_withdraw(
        &mut self,
        account: &Address,
        shares: U256,
        accept_penalty: bool,
    ) -> Result<(), VaultError> {
        let now = self.env().get_block_time();
        let penalty_rate = self.senior.ensure_unlocked(account, now, accept_penalty)?;
        let old = self.senior.balance_of(account);
        let amount = self.senior.burn(account, shares)?;
        self.reward.settle_senior(account, old, old - shares)?;

        let held = self.senior.stable_held();
        if amount > held {
            self.pull_from_lending(amount - held)?;
        }
        if amount > self.senior.stable_held() {
            return Err(VaultError::InsufficientAssets);
        }

        let penalty = self.senior.penalty_on(amount, penalty_rate)?;
        let mut stable = FungibleTokenContractRef::new(self.env(), self.stable_address()?);
        let mut payout = amount;
        if !penalty.is_zero() {
            if let Some(recipient) = self.senior.lock_penalty_recipient() {
                stable.transfer(recipient, penalty);
                payout = amount - penalty;
            }
        }
        stable.transfer(*account, payout);
        self.senior.record_outflow(amount)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // lending-market plumbing

    /// Park directly-held stable in the lending market.
    pub(super) fn supply_to_lending(&mut self, amount: U256) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Ok(());
        }
        if let Some(pool_addr) = self.lending_market.get() {
            let stable_addr = self.stable_address()?;
            let mut stable = FungibleTokenContractRef::new(self.env(), stable_addr);
            stable.approve(pool_addr, amount);
            let mut pool = LendingMarketContractRef::new(self.env(), pool_addr);
            pool.supply(stable_addr, amount);
            self.senior.note_supplied(amount)?;
        }
        Ok(())
    }

    /// Pull up to `amount` of principal back out of the lending market.
    pub(super) fn pull_from_lending(&mut self, amount: U256) -> Result<(), VaultError> {
        let pull = min(amount, self.senior.stable_supplied());
        if pull.is_zero() {
            return Ok(());
        }
        let pool_addr = self.addr(&self.lending_market)?;
        let stable_addr = self.stable_address()?;
        let mut pool = LendingMarketContractRef::new(self.env(), pool_addr);
        pool.withdraw(stable_addr, pull, self.env().self_address());
        self.senior.note_withdrawn(pull)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // reward claims

    pub(super) fn do_claim(&mut self, senior: bool, junior: bool) -> Result<(), VaultError> {
        self.require_whitelisted()?;
        self.do_harvest()?;
        let caller = self.env().caller();
        let mut total = U256::zero();
        if senior {
            let shares = self.senior.balance_of(&caller);
            total += self.reward.take_senior(&caller, shares)?;
        }
        if junior {
            let shares = self.junior.balance_of(&caller);
            total += self.reward.take_junior(&caller, shares)?;
        }
        if !total.is_zero() {
            let mut stable = FungibleTokenContractRef::new(self.env(), self.stable_address()?);
            stable.transfer(caller, total);
        }
        Ok(())
    }
}
