//! Order lifecycle plumbing: pending-slot registry, the fill callback
//! dispatch, cancellation paths, and the price conversions shared with the
//! market-side settlement (both sides must floor identically).

use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::external::{FungibleTokenContractRef, LiquidityMarketContractRef};
use crate::math::{Decimal, Rate, TryDiv, TryMul};
use crate::state::{OperationKind, PendingOperation};

use super::TrancheRouter;

/// Stable output of selling `lp` at a fill price pair, fee deducted from
/// the output, floored to stable base units.
pub fn lp_to_stable(
    lp: Decimal,
    stable_price: Decimal,
    lp_price: Decimal,
    fee: Rate,
    stable_decimals: u8,
) -> Result<U256, VaultError> {
    lp.try_mul(lp_price)?
        .try_div(stable_price)?
        .try_mul(fee.complement()?)?
        .to_units(stable_decimals)
}

/// LP output of spending `amount` stable at a fill price pair, fee deducted
/// from the output.
pub fn stable_to_lp(
    amount: U256,
    stable_price: Decimal,
    lp_price: Decimal,
    fee: Rate,
    stable_decimals: u8,
) -> Result<Decimal, VaultError> {
    Decimal::from_units(amount, stable_decimals)?
        .try_mul(stable_price)?
        .try_div(lp_price)?
        .try_mul(fee.complement()?)
}

impl TrancheRouter {
    // ------------------------------------------------------------------
    // pending-slot registry

    pub(super) fn ensure_slot_free(&self, key: &Address) -> Result<(), VaultError> {
        if self.pending.get(key).flatten().is_some() {
            return Err(VaultError::PendingOperationExists);
        }
        Ok(())
    }

    pub(super) fn set_pending(
        &mut self,
        key: Address,
        op: PendingOperation,
    ) -> Result<(), VaultError> {
        self.ensure_slot_free(&key)?;
        self.order_owner.set(&op.order_id, Some(key));
        if key != self.global_key() {
            let mut accounts = self.pending_accounts.get_or_default();
            accounts.push(key);
            self.pending_accounts.set(accounts);
        }
        self.pending.set(&key, Some(op));
        Ok(())
    }

    pub(super) fn clear_pending(&mut self, key: &Address, order_id: u64) {
        self.pending.set(key, None);
        self.order_owner.set(&order_id, None);
        if *key != self.global_key() {
            let mut accounts = self.pending_accounts.get_or_default();
            accounts.retain(|a| a != key);
            self.pending_accounts.set(accounts);
        }
    }

    /// Place an order with the LP market.
    pub(super) fn place_order(
        &mut self,
        kind: OperationKind,
        amount: U256,
        is_buy: bool,
    ) -> Result<u64, VaultError> {
        let mut market = LiquidityMarketContractRef::new(self.env(), self.market_address()?);
        Ok(market.place_order(kind as u8, amount, is_buy))
    }

    /// Sell sizing for a repayment of `need` stable base units: assume the
    /// worst price the market may fill at plus the fee margin.
    pub(super) fn size_lp_sale(&self, need: U256) -> Result<Decimal, VaultError> {
        let market = LiquidityMarketContractRef::new(self.env(), self.market_address()?);
        let (bound_low, _) = market.price_bound();
        if bound_low.is_zero() {
            return Err(VaultError::InvalidConfig);
        }
        let margin = self.sell_fee_margin.get_or_default();
        Decimal::from_units(need, self.stable_decimals())?
            .try_div(bound_low)?
            .try_div(Decimal::from(margin.complement()?))
    }

    // ------------------------------------------------------------------
    // fill callback

    pub(super) fn do_fill(
        &mut self,
        order_id: u64,
        stable_price: Decimal,
        lp_price: Decimal,
        bound_low: Decimal,
        bound_high: Decimal,
    ) -> Result<(), VaultError> {
        let market = self.market_address()?;
        if self.env().caller() != market {
            return Err(VaultError::ImproperCaller);
        }
        if stable_price.is_zero() || lp_price.is_zero() {
            return Err(VaultError::InvalidPrice);
        }
        if (!bound_low.is_zero() || !bound_high.is_zero())
            && (lp_price < bound_low || lp_price > bound_high)
        {
            return Err(VaultError::PriceOutOfBounds);
        }
        // A fill racing a cancellation is a no-op, not an error.
        let owner = match self.order_owner.get(&order_id).flatten() {
            Some(owner) => owner,
            None => return Ok(()),
        };
        let op = match self.pending.get(&owner).flatten() {
            Some(op) => op,
            None => {
                self.order_owner.set(&order_id, None);
                return Ok(());
            }
        };
        if op.order_id != order_id {
            return Err(VaultError::OrderMismatch);
        }
        self.do_harvest()?;
        if owner == self.global_key() {
            match op.kind {
                OperationKind::Rebalance => self.fill_rebalance(&op, stable_price, lp_price)?,
                OperationKind::Liquidate => self.fill_liquidate(&op, stable_price, lp_price)?,
                OperationKind::DepositJunior => self.fill_refund(&op, stable_price, lp_price)?,
                _ => return Err(VaultError::OrderMismatch),
            }
        } else {
            match op.kind {
                OperationKind::DepositJunior => {
                    self.fill_deposit_junior(&owner, &op, stable_price, lp_price)?
                }
                OperationKind::WithdrawJunior => {
                    self.fill_withdraw_junior(&owner, &op, stable_price, lp_price)?
                }
                OperationKind::WithdrawSenior => {
                    self.fill_withdraw_senior(&owner, &op, stable_price, lp_price)?
                }
                _ => return Err(VaultError::OrderMismatch),
            }
        }
        self.clear_pending(&owner, order_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // cancellation

    /// Cancel the caller's outstanding order-backed operation, reversing
    /// any ledger effects applied at placement time.
    pub(super) fn do_cancel_pending(&mut self) -> Result<(), VaultError> {
        let caller = self.env().caller();
        let op = self
            .pending
            .get(&caller)
            .flatten()
            .ok_or(VaultError::NoPendingOperation)?;
        self.do_harvest()?;
        let mut market = LiquidityMarketContractRef::new(self.env(), self.market_address()?);
        market.cancel_order(op.order_id);
        match op.kind {
            OperationKind::DepositJunior => {
                // return the custodied LP
                let mut lp = FungibleTokenContractRef::new(self.env(), self.lp_address()?);
                lp.transfer(caller, op.value(0));
            }
            OperationKind::WithdrawJunior => {
                // shares were pre-burned at placement
                let shares = op.value(0);
                let old = self.junior.balance_of(&caller);
                self.reward.settle_junior(&caller, old, old + shares)?;
                self.junior.mint(&caller, shares);
            }
            OperationKind::WithdrawSenior => {}
            _ => return Err(VaultError::NoPendingOperation),
        }
        self.clear_pending(&caller, op.order_id);
        Ok(())
    }

    /// Keeper cancellation of the global slot.
    pub(super) fn do_cancel_global(&mut self) -> Result<(), VaultError> {
        self.require_role(super::ROLE_KEEPER)?;
        let key = self.global_key();
        let op = self
            .pending
            .get(&key)
            .flatten()
            .ok_or(VaultError::NoPendingOperation)?;
        self.do_harvest()?;
        let mut market = LiquidityMarketContractRef::new(self.env(), self.market_address()?);
        market.cancel_order(op.order_id);
        match op.kind {
            OperationKind::Rebalance => {
                if op.value(0) == U256::one() {
                    // borrow direction: the market returned the escrowed
                    // stable, undo the borrow and park it again
                    let delta = op.value(1);
                    self.senior.record_inflow(delta);
                    let borrower = self.env().self_address();
                    self.senior.repay(&borrower, delta)?;
                    self.supply_to_lending(delta)?;
                }
            }
            OperationKind::Liquidate => {
                self.is_liquidated.set(false);
            }
            OperationKind::DepositJunior => {
                // refund order: escrow returned, restore the refund pot
                let amount = op.value(0);
                self.pending_refund_assets
                    .set(self.pending_refund_assets.get_or_default() + amount);
            }
            _ => return Err(VaultError::NoPendingOperation),
        }
        self.clear_pending(&key, op.order_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // shared settlement pieces

    /// Repay senior debt with stable that just arrived at the router and
    /// park the principal back in the lending market.
    pub(super) fn repay_senior(&mut self, amount: U256) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Ok(());
        }
        let borrower = self.env().self_address();
        self.senior.repay(&borrower, amount)?;
        self.senior.record_inflow(amount);
        self.supply_to_lending(amount)?;
        Ok(())
    }

    pub(super) fn new_pending(
        &self,
        kind: OperationKind,
        order_id: u64,
        state_values: alloc::vec::Vec<U256>,
    ) -> PendingOperation {
        PendingOperation::new(kind, order_id, state_values, self.env().get_block_time())
    }

    pub(super) fn flag_values(accept_penalty: bool) -> U256 {
        if accept_penalty {
            U256::one()
        } else {
            U256::zero()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fee() -> Rate {
        Rate::from_scaled_val(700_000_000_000_000) // 0.0007
    }

    #[test]
    fn sell_conversion_applies_fee_to_output() {
        // 125.10993175 LP at lp_price 0.8 -> 100.087945 * 0.9993 stable
        let lp = Decimal::from_scaled_val(125_109_931_750_000_000_000);
        let out = lp_to_stable(lp, Decimal::one(), Decimal::from_scaled_val(800_000_000_000_000_000), fee(), 6)
            .unwrap();
        // 125.10993175 * 0.8 = 100.0879454; * 0.9993 = 100.017883...
        assert_eq!(out, U256::from(100_017_883u64));
    }

    #[test]
    fn buy_conversion_round_numbers() {
        // 749475.15 stable at parity prices buys 749475.15 * 0.9993 LP
        let out = stable_to_lp(U256::from(749_475_150_000u64), Decimal::one(), Decimal::one(), fee(), 6)
            .unwrap();
        assert_eq!(out.to_scaled_val(), 748_950_517_395_000_000_000_000u128);
    }

    #[test]
    fn conversions_use_both_prices() {
        // stable price 2.0 doubles the LP bought per stable unit
        let out = stable_to_lp(
            U256::from(1_000_000u64),
            Decimal::from(2u64),
            Decimal::one(),
            Rate::zero(),
            6,
        )
        .unwrap();
        assert_eq!(out, Decimal::from(2u64));
    }
}
