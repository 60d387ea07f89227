//! Liquidation engine: force-unwinds all junior LP backing once leverage
//! breaches the configured ceiling, repays senior, and routes any surplus
//! back to junior through an order-backed refund.

use alloc::vec;
use core::cmp::min;
use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::external::FungibleTokenContractRef;
use crate::math::Decimal;
use crate::state::{OperationKind, PendingOperation};

use super::settlement::{lp_to_stable, stable_to_lp};
use super::{TrancheRouter, ROLE_KEEPER};

impl TrancheRouter {
    pub(super) fn do_liquidate(
        &mut self,
        stable_price: Decimal,
        lp_price: Decimal,
    ) -> Result<(), VaultError> {
        self.require_role(ROLE_KEEPER)?;
        if !self.pending_refund_assets.get_or_default().is_zero() {
            return Err(VaultError::HasPendingRefund);
        }
        let key = self.global_key();
        self.ensure_slot_free(&key)?;
        self.do_harvest()?;

        let (value, debt_value) = self.junior_values(stable_price, lp_price)?;
        if self.senior.total_borrows().is_zero() {
            return Err(VaultError::NotLiquidatable);
        }
        let ceiling = self.liquidation_leverage.get_or_default();
        if ceiling.is_zero() {
            return Err(VaultError::InvalidConfig);
        }
        let underwater = value <= debt_value;
        if !underwater {
            let leverage = self.leverage(stable_price, lp_price)?;
            if leverage < Decimal::from(ceiling) {
                return Err(VaultError::NotLiquidatable);
            }
        }

        let all_lp = self.junior.total_assets();
        if all_lp.is_zero() {
            return Err(VaultError::InsufficientAssets);
        }
        let order_id = self.place_order(OperationKind::Liquidate, all_lp, false)?;
        self.is_liquidated.set(true);
        let op = self.new_pending(OperationKind::Liquidate, order_id, vec![all_lp]);
        self.set_pending(key, op)?;
        Ok(())
    }

    pub(super) fn fill_liquidate(
        &mut self,
        op: &PendingOperation,
        stable_price: Decimal,
        lp_price: Decimal,
    ) -> Result<(), VaultError> {
        let lp_amount = op.value(0);
        let fee = self.market_fee()?;
        let proceeds = lp_to_stable(
            Decimal(lp_amount),
            stable_price,
            lp_price,
            fee,
            self.stable_decimals(),
        )?;
        let debt = self.senior.total_borrows();
        let repay = min(proceeds, debt);
        self.repay_senior(repay)?;
        let excess = proceeds - repay;

        self.junior.debit_assets(lp_amount)?;
        self.unstake_lp(lp_amount)?;
        let mut lp = FungibleTokenContractRef::new(self.env(), self.lp_address()?);
        lp.transfer(self.market_address()?, lp_amount);

        if excess.is_zero() {
            // shortfall: senior has absorbed the loss, nothing to refund
            self.is_liquidated.set(false);
        } else {
            self.pending_refund_assets
                .set(self.pending_refund_assets.get_or_default() + excess);
        }
        Ok(())
    }

    /// Buy LP with the accumulated refund pot and credit it to junior,
    /// pro-rata across remaining shareholders by leaving shares untouched.
    pub(super) fn do_refund_junior(&mut self) -> Result<(), VaultError> {
        self.require_role(ROLE_KEEPER)?;
        let key = self.global_key();
        self.ensure_slot_free(&key)?;
        let amount = self.pending_refund_assets.get_or_default();
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount);
        }
        self.do_harvest()?;
        self.pending_refund_assets.set(U256::zero());
        let mut stable = FungibleTokenContractRef::new(self.env(), self.stable_address()?);
        stable.transfer(self.market_address()?, amount);
        let order_id = self.place_order(OperationKind::DepositJunior, amount, true)?;
        let op = self.new_pending(OperationKind::DepositJunior, order_id, vec![amount]);
        self.set_pending(key, op)?;
        Ok(())
    }

    pub(super) fn fill_refund(
        &mut self,
        op: &PendingOperation,
        stable_price: Decimal,
        lp_price: Decimal,
    ) -> Result<(), VaultError> {
        let spent = op.value(0);
        let fee = self.market_fee()?;
        let lp_out = stable_to_lp(spent, stable_price, lp_price, fee, self.stable_decimals())?;
        self.junior.credit_assets(lp_out.0);
        self.stake_lp(lp_out.0)?;
        self.is_liquidated.set(false);
        Ok(())
    }
}
