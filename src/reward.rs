//! Reward accrual engine.
//!
//! Each tranche carries a cumulative reward-per-share index that only ever
//! grows: `acc += harvested * WAD / total_shares`, floored at every harvest.
//! Per-account state is the usual debt baseline plus an `unclaimed` bucket
//! that is settled whenever the account's share balance is about to change,
//! so no reward is lost across deposits and withdrawals. All harvested
//! amounts are stable base units; the router performs the actual token
//! collection and swaps.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::math::{Rate, WAD};
use crate::state::YEAR_MS;

#[odra::module]
pub struct RewardAccrual {
    senior_acc: Var<U256>,
    junior_acc: Var<U256>,
    senior_debt: Mapping<Address, U256>,
    junior_debt: Mapping<Address, U256>,
    senior_unclaimed: Mapping<Address, U256>,
    junior_unclaimed: Mapping<Address, U256>,
    senior_reward_rate: Var<Rate>,
    min_stable_apy: Var<Rate>,
    last_update_time: Var<u64>,
}

impl RewardAccrual {
    pub fn set_senior_reward_rate(&mut self, rate: Rate) {
        self.senior_reward_rate.set(rate);
    }

    pub fn set_min_stable_apy(&mut self, rate: Rate) {
        self.min_stable_apy.set(rate);
    }

    pub fn last_update_time(&self) -> u64 {
        self.last_update_time.get_or_default()
    }

    pub fn set_last_update_time(&mut self, now: u64) {
        self.last_update_time.set(now);
    }

    pub fn senior_index(&self) -> U256 {
        self.senior_acc.get_or_default()
    }

    pub fn junior_index(&self) -> U256 {
        self.junior_acc.get_or_default()
    }

    /// Split an LP-staking harvest between the tranches.
    ///
    /// Senior takes `senior_reward_rate` of the harvest; when the lending
    /// interest earned over `dt` falls short of `min_stable_apy` on the
    /// supplied principal, the shortfall is topped up out of junior's
    /// portion (bounded by it).
    pub fn split_lp_rewards(
        &self,
        amount: U256,
        interest: U256,
        supplied: U256,
        dt_ms: u64,
    ) -> Result<(U256, U256), VaultError> {
        let rate = self.senior_reward_rate.get_or_default();
        let mut senior_cut = amount
            .checked_mul(rate.0)
            .ok_or(VaultError::MathOverflow)?
            / U256::from(WAD);
        let mut junior_cut = amount - senior_cut;

        let min_apy = self.min_stable_apy.get_or_default();
        if !min_apy.is_zero() && !supplied.is_zero() && dt_ms > 0 {
            let floor = supplied
                .checked_mul(min_apy.0)
                .ok_or(VaultError::MathOverflow)?
                .checked_mul(U256::from(dt_ms))
                .ok_or(VaultError::MathOverflow)?
                / U256::from(WAD)
                / U256::from(YEAR_MS);
            if interest < floor {
                let shortfall = floor - interest;
                let topup = core::cmp::min(junior_cut, shortfall);
                senior_cut += topup;
                junior_cut -= topup;
            }
        }
        Ok((senior_cut, junior_cut))
    }

    pub fn notify_senior(&mut self, amount: U256, total_shares: U256) -> Result<(), VaultError> {
        if amount.is_zero() || total_shares.is_zero() {
            return Ok(());
        }
        let delta = amount
            .checked_mul(U256::from(WAD))
            .ok_or(VaultError::MathOverflow)?
            / total_shares;
        self.senior_acc.set(self.senior_acc.get_or_default() + delta);
        Ok(())
    }

    pub fn notify_junior(&mut self, amount: U256, total_shares: U256) -> Result<(), VaultError> {
        if amount.is_zero() || total_shares.is_zero() {
            return Ok(());
        }
        let delta = amount
            .checked_mul(U256::from(WAD))
            .ok_or(VaultError::MathOverflow)?
            / total_shares;
        self.junior_acc.set(self.junior_acc.get_or_default() + delta);
        Ok(())
    }

    fn accrued(acc: U256, shares: U256) -> Result<U256, VaultError> {
        Ok(shares.checked_mul(acc).ok_or(VaultError::MathOverflow)? / U256::from(WAD))
    }

    /// Settle an account against the senior index around a share change
    /// from `old_shares` to `new_shares`.
    pub fn settle_senior(
        &mut self,
        account: &Address,
        old_shares: U256,
        new_shares: U256,
    ) -> Result<(), VaultError> {
        let acc = self.senior_acc.get_or_default();
        let earned = Self::accrued(acc, old_shares)?;
        let debt = self.senior_debt.get(account).unwrap_or_default();
        let pending = earned.checked_sub(debt).ok_or(VaultError::MathOverflow)?;
        if !pending.is_zero() {
            let unclaimed = self.senior_unclaimed.get(account).unwrap_or_default();
            self.senior_unclaimed.set(account, unclaimed + pending);
        }
        self.senior_debt.set(account, Self::accrued(acc, new_shares)?);
        Ok(())
    }

    pub fn settle_junior(
        &mut self,
        account: &Address,
        old_shares: U256,
        new_shares: U256,
    ) -> Result<(), VaultError> {
        let acc = self.junior_acc.get_or_default();
        let earned = Self::accrued(acc, old_shares)?;
        let debt = self.junior_debt.get(account).unwrap_or_default();
        let pending = earned.checked_sub(debt).ok_or(VaultError::MathOverflow)?;
        if !pending.is_zero() {
            let unclaimed = self.junior_unclaimed.get(account).unwrap_or_default();
            self.junior_unclaimed.set(account, unclaimed + pending);
        }
        self.junior_debt.set(account, Self::accrued(acc, new_shares)?);
        Ok(())
    }

    pub fn claimable_senior(&self, account: &Address, shares: U256) -> Result<U256, VaultError> {
        let acc = self.senior_acc.get_or_default();
        let earned = Self::accrued(acc, shares)?;
        let debt = self.senior_debt.get(account).unwrap_or_default();
        let unclaimed = self.senior_unclaimed.get(account).unwrap_or_default();
        Ok(unclaimed + earned.checked_sub(debt).ok_or(VaultError::MathOverflow)?)
    }

    pub fn claimable_junior(&self, account: &Address, shares: U256) -> Result<U256, VaultError> {
        let acc = self.junior_acc.get_or_default();
        let earned = Self::accrued(acc, shares)?;
        let debt = self.junior_debt.get(account).unwrap_or_default();
        let unclaimed = self.junior_unclaimed.get(account).unwrap_or_default();
        Ok(unclaimed + earned.checked_sub(debt).ok_or(VaultError::MathOverflow)?)
    }

    /// Drain an account's senior rewards; the caller transfers the payout.
    pub fn take_senior(&mut self, account: &Address, shares: U256) -> Result<U256, VaultError> {
        self.settle_senior(account, shares, shares)?;
        let out = self.senior_unclaimed.get(account).unwrap_or_default();
        self.senior_unclaimed.set(account, U256::zero());
        Ok(out)
    }

    pub fn take_junior(&mut self, account: &Address, shares: U256) -> Result<U256, VaultError> {
        self.settle_junior(account, shares, shares)?;
        let out = self.junior_unclaimed.get(account).unwrap_or_default();
        self.junior_unclaimed.set(account, U256::zero());
        Ok(out)
    }
}
