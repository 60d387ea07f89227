//! Mock swap venue with fixed prices: swaps any configured 18-decimal
//! token into the stable asset at `price` stable base units per whole
//! token. Output inventory is pre-minted in tests.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::VaultError;
use crate::external::SwapPath;
use crate::math::WAD;

#[odra::module]
pub struct MockSwapVenue {
    stable_token: Var<Address>,
    // stable base units per whole input token
    prices: Mapping<Address, U256>,
}

#[odra::module]
impl MockSwapVenue {
    pub fn init(&mut self, stable_token: Address) {
        self.stable_token.set(stable_token);
    }

    pub fn set_price(&mut self, token: Address, price: U256) {
        self.prices.set(&token, price);
    }

    pub fn swap_exact_input(
        &mut self,
        path: SwapPath,
        amount_in: U256,
        recipient: Address,
    ) -> U256 {
        let token_in = match path.tokens.first() {
            Some(token) => *token,
            None => self.env().revert(VaultError::InvalidConfig),
        };
        let stable = match self.stable_token.get() {
            Some(address) => address,
            None => self.env().revert(VaultError::InvalidConfig),
        };
        let price = match self.prices.get(&token_in) {
            Some(price) => price,
            None => self.env().revert(VaultError::InvalidConfig),
        };
        let caller = self.env().caller();
        let mut input = crate::external::FungibleTokenContractRef::new(self.env(), token_in);
        input.transfer_from(caller, self.env().self_address(), amount_in);
        let amount_out = amount_in * price / U256::from(WAD);
        let mut output = crate::external::FungibleTokenContractRef::new(self.env(), stable);
        output.transfer(recipient, amount_out);
        amount_out
    }
}
