//! Junior (LP) tranche ledger.
//!
//! `total_assets` is LP-denominated and fully staked in the external
//! staking pool. NAV-per-share is never stored; the router derives it from
//! a price pair on demand.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;

#[odra::module]
pub struct JuniorLedger {
    total_shares: Var<U256>,
    shares: Mapping<Address, U256>,
    total_assets: Var<U256>,
    deposit_cap: Var<U256>,
}

impl JuniorLedger {
    pub fn total_shares(&self) -> U256 {
        self.total_shares.get_or_default()
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.shares.get(account).unwrap_or_default()
    }

    pub fn total_assets(&self) -> U256 {
        self.total_assets.get_or_default()
    }

    pub fn set_deposit_cap(&mut self, cap: U256) {
        self.deposit_cap.set(cap);
    }

    /// Cap gate, checked at intent time against the staked total.
    pub fn ensure_cap(&self, amount: U256) -> Result<(), VaultError> {
        let cap = self.deposit_cap.get_or_default();
        if !cap.is_zero() && self.total_assets.get_or_default() + amount > cap {
            return Err(VaultError::ExceedsSupplyCap);
        }
        Ok(())
    }

    pub fn mint(&mut self, account: &Address, shares: U256) {
        self.total_shares.set(self.total_shares.get_or_default() + shares);
        self.shares.set(account, self.balance_of(account) + shares);
    }

    pub fn burn(&mut self, account: &Address, shares: U256) -> Result<(), VaultError> {
        let balance = self.balance_of(account);
        if shares > balance {
            return Err(VaultError::ExceedsRedeemable);
        }
        self.shares.set(account, balance - shares);
        self.total_shares.set(
            self.total_shares
                .get_or_default()
                .checked_sub(shares)
                .ok_or(VaultError::MathOverflow)?,
        );
        Ok(())
    }

    pub fn credit_assets(&mut self, amount: U256) {
        self.total_assets.set(self.total_assets.get_or_default() + amount);
    }

    pub fn debit_assets(&mut self, amount: U256) -> Result<(), VaultError> {
        let assets = self.total_assets.get_or_default();
        if amount > assets {
            return Err(VaultError::InsufficientAssets);
        }
        self.total_assets.set(assets - amount);
        Ok(())
    }
}
