//! Leverage engine: drives junior's debt toward
//! `principal * (target_leverage - 1)` through global buy/sell orders.

use alloc::vec;
use core::cmp::min;
use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::external::FungibleTokenContractRef;
use crate::math::{Decimal, Rate, TryDiv, TryMul, TrySub};
use crate::state::{OperationKind, PendingOperation};

use super::settlement::{lp_to_stable, stable_to_lp};
use super::{TrancheRouter, ROLE_KEEPER};

/// Direction tag stored in the rebalance pending state.
const DIR_BORROW: u64 = 1;
const DIR_SELL: u64 = 0;

impl TrancheRouter {
    pub(super) fn do_rebalance(
        &mut self,
        stable_price: Decimal,
        lp_price: Decimal,
    ) -> Result<(), VaultError> {
        self.require_role(ROLE_KEEPER)?;
        if !self.pending_refund_assets.get_or_default().is_zero() {
            return Err(VaultError::HasPendingRefund);
        }
        if self.is_liquidated.get_or_default() {
            return Err(VaultError::JuniorBankrupt);
        }
        let key = self.global_key();
        self.ensure_slot_free(&key)?;
        self.do_harvest()?;

        let (value, debt_value) = self.junior_values(stable_price, lp_price)?;
        if value.is_zero() {
            return Err(VaultError::AlreadyBalanced);
        }
        if value <= debt_value {
            return Err(VaultError::InsufficientAssets);
        }
        if self.is_balanced(stable_price, lp_price)? {
            return Err(VaultError::AlreadyBalanced);
        }

        let target: Rate = self.target_leverage.get_or_default();
        let principal = value.try_sub(debt_value)?;
        let borrow_factor = Decimal::from(target).try_sub(Decimal::one())?;
        let target_debt = principal
            .try_mul(borrow_factor)?
            .try_div(stable_price)?
            .to_units(self.stable_decimals())?;
        let debt = self.senior.total_borrows();

        if target_debt > debt {
            let delta = target_debt - debt;
            self.borrow_and_escrow(delta)?;
            let order_id = self.place_order(OperationKind::Rebalance, delta, true)?;
            let values = vec![U256::from(DIR_BORROW), delta];
            let op = self.new_pending(OperationKind::Rebalance, order_id, values);
            self.set_pending(key, op)?;
        } else {
            let delta = debt - target_debt;
            let sell_lp = min(self.size_lp_sale(delta)?.0, self.junior.total_assets());
            let order_id = self.place_order(OperationKind::Rebalance, sell_lp, false)?;
            let values = vec![U256::from(DIR_SELL), sell_lp, delta];
            let op = self.new_pending(OperationKind::Rebalance, order_id, values);
            self.set_pending(key, op)?;
        }
        Ok(())
    }

    pub(super) fn fill_rebalance(
        &mut self,
        op: &PendingOperation,
        stable_price: Decimal,
        lp_price: Decimal,
    ) -> Result<(), VaultError> {
        if op.value(0) == U256::from(DIR_BORROW) {
            // borrowed stable was escrowed at placement; the market has
            // delivered the LP it bought
            let spent = op.value(1);
            let fee = self.market_fee()?;
            let lp_out = stable_to_lp(spent, stable_price, lp_price, fee, self.stable_decimals())?;
            self.junior.credit_assets(lp_out.0);
            self.stake_lp(lp_out.0)?;
        } else {
            let sell_lp = op.value(1);
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
        }
        Ok(())
    }

    /// Borrow `delta` from senior and escrow it with the LP market.
    fn borrow_and_escrow(&mut self, delta: U256) -> Result<(), VaultError> {
        if delta.is_zero() {
            return Err(VaultError::InvalidAmount);
        }
        let borrower = self.env().self_address();
        self.senior.borrow(&borrower, delta)?;
        let held = self.senior.stable_held();
        if delta > held {
            self.pull_from_lending(delta - held)?;
        }
        if delta > self.senior.stable_held() {
            return Err(VaultError::InsufficientAssets);
        }
        let mut stable = FungibleTokenContractRef::new(self.env(), self.stable_address()?);
        stable.transfer(self.market_address()?, delta);
        self.senior.record_outflow(delta)?;
        Ok(())
    }
}
