//! Mock lending market. The receipt balance grows linearly at the
//! configured APY on the balance at last touch; a secondary reward token
//! accrues on the receipt balance (interest included) and is paid on
//! claim. Interest is funded from pre-minted inventory.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::math::{Rate, WAD};
use crate::state::YEAR_MS;

#[odra::module]
pub struct MockLendingMarket {
    stable_token: Var<Address>,
    reward_token: Var<Address>,
    apy: Var<Rate>,
    reward_rate: Var<Rate>,
    supplied: Mapping<Address, U256>,
    reward_accrued: Mapping<Address, U256>,
    last_accrual: Mapping<Address, u64>,
}

#[odra::module]
impl MockLendingMarket {
    pub fn init(&mut self, stable_token: Address, reward_token: Address) {
        self.stable_token.set(stable_token);
        self.reward_token.set(reward_token);
    }

    pub fn set_apy(&mut self, apy: Rate) {
        self.apy.set(apy);
    }

    pub fn set_reward_rate(&mut self, rate: Rate) {
        self.reward_rate.set(rate);
    }

    pub fn supply(&mut self, asset: Address, amount: U256) {
        self.require_stable(asset);
        let caller = self.env().caller();
        self.accrue(caller);
        let mut stable = crate::external::FungibleTokenContractRef::new(self.env(), asset);
        stable.transfer_from(caller, self.env().self_address(), amount);
        self.supplied
            .set(&caller, self.supplied.get(&caller).unwrap_or_default() + amount);
    }

    pub fn withdraw(&mut self, asset: Address, amount: U256, recipient: Address) -> U256 {
        self.require_stable(asset);
        let caller = self.env().caller();
        self.accrue(caller);
        let balance = self.supplied.get(&caller).unwrap_or_default();
        if amount > balance {
            self.env().revert(VaultError::ExceedsBalance);
        }
        self.supplied.set(&caller, balance - amount);
        let mut stable = crate::external::FungibleTokenContractRef::new(self.env(), asset);
        stable.transfer(recipient, amount);
        amount
    }

    pub fn receipt_balance_of(&self, account: Address) -> U256 {
        let balance = self.supplied.get(&account).unwrap_or_default();
        balance + self.pending_interest(account, balance)
    }

    pub fn reward_token(&self) -> Address {
        match self.reward_token.get() {
            Some(address) => address,
            None => self.env().revert(VaultError::InvalidConfig),
        }
    }

    pub fn claim_reward(&mut self, asset: Address, recipient: Address) -> U256 {
        self.require_stable(asset);
        let caller = self.env().caller();
        self.accrue(caller);
        let out = self.reward_accrued.get(&caller).unwrap_or_default();
        if !out.is_zero() {
            self.reward_accrued.set(&caller, U256::zero());
            let mut reward =
                crate::external::FungibleTokenContractRef::new(self.env(), self.reward_token());
            reward.transfer(recipient, out);
        }
        out
    }
}

impl MockLendingMarket {
    fn require_stable(&self, asset: Address) {
        if self.stable_token.get() != Some(asset) {
            self.env().revert(VaultError::InvalidConfig);
        }
    }

    fn pending_interest(&self, account: Address, balance: U256) -> U256 {
        let last = self.last_accrual.get(&account).unwrap_or_default();
        if last == 0 || balance.is_zero() {
            return U256::zero();
        }
        let dt = self.env().get_block_time().saturating_sub(last);
        balance * self.apy.get_or_default().0 * U256::from(dt)
            / U256::from(WAD)
            / U256::from(YEAR_MS)
    }

    /// Linear interest on the balance since last touch, then secondary
    /// reward on the grown balance (the reward token has 18 decimals, the
    /// stable leg fewer, hence the upscale).
    fn accrue(&mut self, account: Address) {
        let now = self.env().get_block_time();
        let balance = self.supplied.get(&account).unwrap_or_default();
        let interest = self.pending_interest(account, balance);
        let grown = balance + interest;
        if !interest.is_zero() {
            self.supplied.set(&account, grown);
        }
        let last = self.last_accrual.get(&account).unwrap_or_default();
        if last != 0 && !grown.is_zero() {
            let dt = now.saturating_sub(last);
            let reward = grown * self.reward_rate.get_or_default().0 * U256::from(dt)
                / U256::from(WAD)
                / U256::from(YEAR_MS)
                * U256::from(1_000_000_000_000u64);
            if !reward.is_zero() {
                self.reward_accrued.set(
                    &account,
                    self.reward_accrued.get(&account).unwrap_or_default() + reward,
                );
            }
        }
        self.last_accrual.set(&account, now);
    }
}
