//! Senior (stable) tranche ledger.
//!
//! Shares convert 1:1 to stable value: depositing `x` base units of the
//! stable asset mints `x * 10^(18 - asset_decimals)` share units. Borrowed
//! principal is an asset-side liability tracked in `borrows`, never a share
//! price movement; `total_assets == stable_held + stable_supplied` at every
//! point between operations.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::math::{pow10, Decimal, Rate, TryMul};
use crate::state::SHARE_DECIMALS;

#[odra::module]
pub struct SeniorLedger {
    asset_decimals: Var<u8>,
    total_shares: Var<U256>,
    shares: Mapping<Address, U256>,
    total_borrows: Var<U256>,
    borrows: Mapping<Address, U256>,
    stable_held: Var<U256>,
    stable_supplied: Var<U256>,
    deposit_cap: Var<U256>,
    max_borrows: Var<U256>,
    lock_period: Var<u64>,
    lock_penalty_rate: Var<Rate>,
    lock_penalty_recipient: Var<Address>,
    last_deposit_time: Mapping<Address, u64>,
}

impl SeniorLedger {
    pub fn configure(&mut self, asset_decimals: u8) {
        self.asset_decimals.set(asset_decimals);
    }

    fn share_factor(&self) -> U256 {
        let decimals = self.asset_decimals.get_or_default();
        pow10((SHARE_DECIMALS - decimals) as u32)
    }

    // ------------------------------------------------------------------
    // views

    pub fn asset_decimals(&self) -> u8 {
        self.asset_decimals.get_or_default()
    }

    /// Stable directly held plus stable parked in the lending market.
    pub fn total_assets(&self) -> U256 {
        self.stable_held.get_or_default() + self.stable_supplied.get_or_default()
    }

    pub fn stable_held(&self) -> U256 {
        self.stable_held.get_or_default()
    }

    pub fn stable_supplied(&self) -> U256 {
        self.stable_supplied.get_or_default()
    }

    pub fn total_shares(&self) -> U256 {
        self.total_shares.get_or_default()
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.shares.get(account).unwrap_or_default()
    }

    pub fn total_borrows(&self) -> U256 {
        self.total_borrows.get_or_default()
    }

    pub fn borrows_of(&self, borrower: &Address) -> U256 {
        self.borrows.get(borrower).unwrap_or_default()
    }

    pub fn last_deposit_time_of(&self, account: &Address) -> u64 {
        self.last_deposit_time.get(account).unwrap_or_default()
    }

    pub fn lock_penalty_recipient(&self) -> Option<Address> {
        self.lock_penalty_recipient.get()
    }

    /// Convert a share amount to stable base units, floor rounding.
    pub fn shares_to_assets(&self, shares: U256) -> U256 {
        shares / self.share_factor()
    }

    // ------------------------------------------------------------------
    // configuration (router-gated)

    pub fn set_deposit_cap(&mut self, cap: U256) {
        self.deposit_cap.set(cap);
    }

    pub fn set_max_borrows(&mut self, cap: U256) {
        self.max_borrows.set(cap);
    }

    pub fn set_lock_period(&mut self, period: u64) {
        self.lock_period.set(period);
    }

    pub fn set_lock_penalty_rate(&mut self, rate: Rate) {
        self.lock_penalty_rate.set(rate);
    }

    pub fn set_lock_penalty_recipient(&mut self, recipient: Address) {
        self.lock_penalty_recipient.set(recipient);
    }

    // ------------------------------------------------------------------
    // share accounting

    /// Mint shares for a deposit of `amount` stable base units.
    pub fn deposit(&mut self, account: &Address, amount: U256, now: u64) -> Result<U256, VaultError> {
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount);
        }
        let cap = self.deposit_cap.get_or_default();
        if !cap.is_zero() {
            let booked = self.shares_to_assets(self.total_shares.get_or_default());
            if booked + amount > cap {
                return Err(VaultError::ExceedsSupplyCap);
            }
        }
        let minted = amount
            .checked_mul(self.share_factor())
            .ok_or(VaultError::MathOverflow)?;
        self.total_shares.set(self.total_shares.get_or_default() + minted);
        self.shares.set(account, self.balance_of(account) + minted);
        self.last_deposit_time.set(account, now);
        self.stable_held.set(self.stable_held.get_or_default() + amount);
        Ok(minted)
    }

    /// Burn shares; returns the stable base-unit value they redeem for.
    pub fn burn(&mut self, account: &Address, shares: U256) -> Result<U256, VaultError> {
        let balance = self.balance_of(account);
        if shares > balance {
            return Err(VaultError::ExceedsBalance);
        }
        self.shares.set(account, balance - shares);
        self.total_shares.set(
            self.total_shares
                .get_or_default()
                .checked_sub(shares)
                .ok_or(VaultError::MathOverflow)?,
        );
        Ok(self.shares_to_assets(shares))
    }

    /// Timelock gate. Returns the penalty rate to apply: zero outside the
    /// lock window, the configured rate inside it when the caller opted in.
    pub fn ensure_unlocked(
        &self,
        account: &Address,
        now: u64,
        accept_penalty: bool,
    ) -> Result<Rate, VaultError> {
        let since = self.last_deposit_time_of(account);
        let period = self.lock_period.get_or_default();
        if now >= since + period {
            return Ok(Rate::zero());
        }
        if !accept_penalty {
            return Err(VaultError::Locked);
        }
        Ok(self.lock_penalty_rate.get_or_default())
    }

    /// Penalty owed on a soft withdrawal of `amount` at `rate`.
    pub fn penalty_on(&self, amount: U256, rate: Rate) -> Result<U256, VaultError> {
        if rate.is_zero() {
            return Ok(U256::zero());
        }
        let decimals = self.asset_decimals.get_or_default();
        Decimal::from_units(amount, decimals)?
            .try_mul(rate)?
            .to_units(decimals)
    }

    // ------------------------------------------------------------------
    // debt accounting

    pub fn borrow(&mut self, borrower: &Address, amount: U256) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount);
        }
        let cap = self.max_borrows.get_or_default();
        let new_total = self.total_borrows.get_or_default() + amount;
        if !cap.is_zero() && new_total > cap {
            return Err(VaultError::ExceedsMaxBorrows);
        }
        if amount > self.total_assets() {
            return Err(VaultError::InsufficientAssets);
        }
        self.total_borrows.set(new_total);
        self.borrows.set(borrower, self.borrows_of(borrower) + amount);
        Ok(())
    }

    pub fn repay(&mut self, borrower: &Address, amount: U256) -> Result<(), VaultError> {
        let debt = self.borrows_of(borrower);
        if amount > debt {
            return Err(VaultError::MathOverflow);
        }
        self.borrows.set(borrower, debt - amount);
        self.total_borrows.set(
            self.total_borrows
                .get_or_default()
                .checked_sub(amount)
                .ok_or(VaultError::MathOverflow)?,
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // stable custody bookkeeping (mirrors actual token flows, kept by the
    // router which performs the transfers)

    pub fn record_inflow(&mut self, amount: U256) {
        self.stable_held.set(self.stable_held.get_or_default() + amount);
    }

    pub fn record_outflow(&mut self, amount: U256) -> Result<(), VaultError> {
        let held = self.stable_held.get_or_default();
        if amount > held {
            return Err(VaultError::InsufficientAssets);
        }
        self.stable_held.set(held - amount);
        Ok(())
    }

    /// Directly-held stable moved into the lending market.
    pub fn note_supplied(&mut self, amount: U256) -> Result<(), VaultError> {
        let held = self.stable_held.get_or_default();
        if amount > held {
            return Err(VaultError::InsufficientAssets);
        }
        self.stable_held.set(held - amount);
        self.stable_supplied
            .set(self.stable_supplied.get_or_default() + amount);
        Ok(())
    }

    /// Principal pulled back out of the lending market.
    pub fn note_withdrawn(&mut self, amount: U256) -> Result<(), VaultError> {
        let supplied = self.stable_supplied.get_or_default();
        if amount > supplied {
            return Err(VaultError::InsufficientAssets);
        }
        self.stable_supplied.set(supplied - amount);
        self.stable_held.set(self.stable_held.get_or_default() + amount);
        Ok(())
    }
}
