//! Mock LP staking pool. Staking registers a balance; each configured
//! reward token accrues at a fixed per-second rate per staked unit and is
//! paid from pre-minted inventory on claim.

use alloc::vec::Vec;
use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::math::WAD;

#[odra::module]
pub struct MockStakingPool {
    reward_tokens: Var<Vec<Address>>,
    // reward units (18 dec) per staked LP wad per second, WAD-scaled
    rates: Mapping<Address, U256>,
    staked: Mapping<Address, U256>,
    accrued: Mapping<(Address, Address), U256>,
    last_accrual: Mapping<Address, u64>,
}

#[odra::module]
impl MockStakingPool {
    pub fn set_reward_rate(&mut self, token: Address, rate: U256) {
        let mut tokens = self.reward_tokens.get_or_default();
        if !tokens.contains(&token) {
            tokens.push(token);
            self.reward_tokens.set(tokens);
        }
        self.rates.set(&token, rate);
    }

    pub fn stake(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.accrue(caller);
        self.staked
            .set(&caller, self.staked.get(&caller).unwrap_or_default() + amount);
    }

    pub fn unstake(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.accrue(caller);
        let staked = self.staked.get(&caller).unwrap_or_default();
        if amount > staked {
            self.env().revert(VaultError::ExceedsBalance);
        }
        self.staked.set(&caller, staked - amount);
    }

    pub fn staked_of(&self, account: Address) -> U256 {
        self.staked.get(&account).unwrap_or_default()
    }

    pub fn claim_rewards(&mut self, recipient: Address) -> Vec<(Address, U256)> {
        let caller = self.env().caller();
        self.accrue(caller);
        let mut out = Vec::new();
        for token in self.reward_tokens.get_or_default() {
            let amount = self.accrued.get(&(caller, token)).unwrap_or_default();
            if amount.is_zero() {
                continue;
            }
            self.accrued.set(&(caller, token), U256::zero());
            let mut reward = crate::external::FungibleTokenContractRef::new(self.env(), token);
            reward.transfer(recipient, amount);
            out.push((token, amount));
        }
        out
    }
}

impl MockStakingPool {
    fn accrue(&mut self, account: Address) {
        let now = self.env().get_block_time();
        let last = self.last_accrual.get(&account).unwrap_or_default();
        let staked = self.staked.get(&account).unwrap_or_default();
        if last != 0 && !staked.is_zero() {
            let dt_ms = now.saturating_sub(last);
            for token in self.reward_tokens.get_or_default() {
                let rate = self.rates.get(&token).unwrap_or_default();
                let amount =
                    staked * rate * U256::from(dt_ms) / U256::from(1000u64) / U256::from(WAD);
                if !amount.is_zero() {
                    self.accrued.set(
                        &(account, token),
                        self.accrued.get(&(account, token)).unwrap_or_default() + amount,
                    );
                }
            }
        }
        self.last_accrual.set(&account, now);
    }
}
