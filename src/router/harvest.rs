//! Yield collection. A harvest runs before every ledger-mutating operation
//! and on demand via the keeper, so reward indices are settled before any
//! share balance changes.
//!
//! Three sources, all ending up stable-denominated:
//!   1. lending interest — the receipt balance above supplied principal,
//!      withdrawn from the lending market; accrues entirely to senior;
//!   2. the lending market's secondary reward token, swapped to stable;
//!      also senior's;
//!   3. staking rewards on junior's staked LP, swapped to stable and split
//!      `senior_reward_rate` / remainder, with the `min_stable_apy` top-up
//!      applied out of junior's portion.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::external::{
    FungibleTokenContractRef, LendingMarketContractRef, StakingPoolContractRef,
    SwapVenueContractRef,
};

use super::TrancheRouter;

impl TrancheRouter {
    pub(super) fn do_harvest(&mut self) -> Result<(), VaultError> {
        let now = self.env().get_block_time();
        let self_addr = self.env().self_address();

        let mut senior_amount = U256::zero();
        let mut interest = U256::zero();

        if let Some(pool_addr) = self.lending_market.get() {
            let mut pool = LendingMarketContractRef::new(self.env(), pool_addr);
            let receipt = pool.receipt_balance_of(self_addr);
            let supplied = self.senior.stable_supplied();
            if receipt > supplied {
                interest = receipt - supplied;
                pool.withdraw(self.stable_address()?, interest, self_addr);
            }
            let reward_token = pool.reward_token();
            let claimed = pool.claim_reward(self.stable_address()?, self_addr);
            if !claimed.is_zero() {
                senior_amount += self.swap_to_stable(reward_token, claimed)?;
            }
        }
        senior_amount += interest;

        let mut lp_amount = U256::zero();
        if let Some(pool_addr) = self.staking_pool.get() {
            let mut staking = StakingPoolContractRef::new(self.env(), pool_addr);
            let rewards = staking.claim_rewards(self_addr);
            for (token, amount) in rewards {
                if amount.is_zero() {
                    continue;
                }
                lp_amount += self.swap_to_stable(token, amount)?;
            }
        }

        let dt = now.saturating_sub(self.reward.last_update_time());
        let supplied = self.senior.stable_supplied();
        let (senior_cut, junior_cut) =
            self.reward.split_lp_rewards(lp_amount, interest, supplied, dt)?;
        self.reward
            .notify_senior(senior_amount + senior_cut, self.senior.total_shares())?;
        self.reward
            .notify_junior(junior_cut, self.junior.total_shares())?;
        self.reward.set_last_update_time(now);
        Ok(())
    }

    /// Convert a harvested reward token into the stable asset through the
    /// swap venue, along the configured path.
    fn swap_to_stable(&mut self, token: Address, amount: U256) -> Result<U256, VaultError> {
        let stable = self.stable_address()?;
        if token == stable {
            return Ok(amount);
        }
        let venue_addr = self.addr(&self.swap_venue)?;
        let path = self
            .swap_paths
            .get(&token)
            .ok_or(VaultError::InvalidConfig)?;
        let mut reward = FungibleTokenContractRef::new(self.env(), token);
        reward.approve(venue_addr, amount);
        let mut venue = SwapVenueContractRef::new(self.env(), venue_addr);
        Ok(venue.swap_exact_input(path, amount, self.env().self_address()))
    }
}
