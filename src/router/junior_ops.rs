//! Junior tranche operations. Both deposit and withdrawal are order-backed:
//! shares are priced at fill time, and a leveraged withdrawal first sells
//! enough LP to repay the withdrawer's slice of the senior debt.

use alloc::vec;
use core::cmp::min;
use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::external::{FungibleTokenContractRef, StakingPoolContractRef};
use crate::math::{Decimal, TryDiv, TryMul};
use crate::state::{OperationKind, PendingOperation};

use super::settlement::lp_to_stable;
use super::TrancheRouter;

impl TrancheRouter {
    pub(super) fn do_deposit_junior(&mut self, amount: U256) -> Result<(), VaultError> {
        self.require_whitelisted()?;
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount);
        }
        if !self.pending_refund_assets.get_or_default().is_zero() {
            return Err(VaultError::HasPendingRefund);
        }
        if self.is_liquidated.get_or_default() {
            return Err(VaultError::PendingOperationExists);
        }
        let caller = self.env().caller();
        self.ensure_slot_free(&caller)?;
        self.junior.ensure_cap(amount)?;
        self.do_harvest()?;

        // LP sits with the router until the order is priced
        let self_addr = self.env().self_address();
        let mut lp = FungibleTokenContractRef::new(self.env(), self.lp_address()?);
        lp.transfer_from(caller, self_addr, amount);

        let order_id = self.place_order(OperationKind::DepositJunior, amount, false)?;
        let op = self.new_pending(OperationKind::DepositJunior, order_id, vec![amount]);
        self.set_pending(caller, op)?;
        Ok(())
    }

    pub(super) fn fill_deposit_junior(
        &mut self,
        account: &Address,
        op: &PendingOperation,
        stable_price: Decimal,
        lp_price: Decimal,
    ) -> Result<(), VaultError> {
        let amount = op.value(0);
        let nav = self.nav_per_share(stable_price, lp_price)?;
        if nav.is_zero() {
            return Err(VaultError::JuniorBankrupt);
        }
        let value = Decimal(amount).try_mul(lp_price)?;
        let shares = value.try_div(nav)?.0;

        let old = self.junior.balance_of(account);
        self.reward.settle_junior(account, old, old + shares)?;
        self.junior.mint(account, shares);
        self.junior.credit_assets(amount);
        self.stake_lp(amount)?;
        Ok(())
    }

    pub(super) fn do_withdraw_junior(&mut self, shares: U256) -> Result<(), VaultError> {
        self.require_whitelisted()?;
        if shares.is_zero() {
            return Err(VaultError::InvalidAmount);
        }
        if !self.pending_refund_assets.get_or_default().is_zero() {
            return Err(VaultError::HasPendingRefund);
        }
        if self.is_liquidated.get_or_default() {
            return Err(VaultError::PendingOperationExists);
        }
        let caller = self.env().caller();
        self.ensure_slot_free(&caller)?;
        if shares > self.junior.balance_of(&caller) {
            return Err(VaultError::ExceedsRedeemable);
        }
        self.do_harvest()?;

        let total_shares = self.junior.total_shares();
        let total_assets = self.junior.total_assets();
        if total_assets.is_zero() {
            // post-shortfall shares redeem to nothing
            let old = self.junior.balance_of(&caller);
            self.reward.settle_junior(&caller, old, old - shares)?;
            self.junior.burn(&caller, shares)?;
            return Ok(());
        }

        let debt = self.senior.total_borrows();
        let repay = debt
            .checked_mul(shares)
            .ok_or(VaultError::MathOverflow)?
            / total_shares;
        let portion = total_assets
            .checked_mul(shares)
            .ok_or(VaultError::MathOverflow)?
            / total_shares;
        let (sell_lp, user_lp) = if repay.is_zero() {
            (U256::zero(), portion)
        } else {
            let sell = self.size_lp_sale(repay)?.0;
            if sell > portion {
                return Err(VaultError::InsufficientAssets);
            }
            (sell, portion - sell)
        };

        let old = self.junior.balance_of(&caller);
        self.reward.settle_junior(&caller, old, old - shares)?;
        self.junior.burn(&caller, shares)?;

        let order_id = self.place_order(OperationKind::WithdrawJunior, sell_lp, false)?;
        let values = vec![shares, repay, sell_lp, user_lp];
        let op = self.new_pending(OperationKind::WithdrawJunior, order_id, values);
        self.set_pending(caller, op)?;
        Ok(())
    }

    pub(super) fn fill_withdraw_junior(
        &mut self,
        account: &Address,
        op: &PendingOperation,
        stable_price: Decimal,
        lp_price: Decimal,
    ) -> Result<(), VaultError> {
        let repay_due = op.value(1);
        let sell_lp = op.value(2);
        let user_lp = op.value(3);

        let mut excess = U256::zero();
        if !sell_lp.is_zero() {
            let fee = self.market_fee()?;
            let proceeds = lp_to_stable(
                Decimal(sell_lp),
                stable_price,
                lp_price,
                fee,
                self.stable_decimals(),
            )?;
            let repay = min(repay_due, min(proceeds, self.senior.total_borrows()));
            self.repay_senior(repay)?;
            excess = proceeds - repay;
            self.junior.debit_assets(sell_lp)?;
            self.unstake_lp(sell_lp)?;
            let mut lp = FungibleTokenContractRef::new(self.env(), self.lp_address()?);
            lp.transfer(self.market_address()?, sell_lp);
        }
        if !user_lp.is_zero() {
            self.junior.debit_assets(user_lp)?;
            self.unstake_lp(user_lp)?;
            let mut lp = FungibleTokenContractRef::new(self.env(), self.lp_address()?);
            lp.transfer(*account, user_lp);
        }
        if !excess.is_zero() {
            let mut stable = FungibleTokenContractRef::new(self.env(), self.stable_address()?);
            stable.transfer(*account, excess);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // staking plumbing (balance registration with the external pool)

    pub(super) fn stake_lp(&mut self, amount: U256) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Ok(());
        }
        if let Some(pool) = self.staking_pool.get() {
            let mut staking = StakingPoolContractRef::new(self.env(), pool);
            staking.stake(amount);
        }
        Ok(())
    }

    pub(super) fn unstake_lp(&mut self, amount: U256) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Ok(());
        }
        if let Some(pool) = self.staking_pool.get() {
            let mut staking = StakingPoolContractRef::new(self.env(), pool);
            staking.unstake(amount);
        }
        Ok(())
    }
}
