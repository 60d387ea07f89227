//! Interfaces of the external systems the vault consumes. Only the surface
//! the router touches is declared here; the mock implementations used by
//! the test suite live in [`crate::mocks`].

use alloc::vec::Vec;
use odra::casper_types::bytesrepr::{self, FromBytes, ToBytes};
use odra::casper_types::{CLType, CLTyped, U256};
use odra::prelude::*;

use crate::math::{Decimal, Rate};

/// A swap route: token hops with a fee tier for each hop.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SwapPath {
    pub tokens: Vec<Address>,
    pub fees: Vec<u32>,
}

impl ToBytes for SwapPath {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut result = Vec::with_capacity(self.serialized_length());
        result.append(&mut self.tokens.to_bytes()?);
        result.append(&mut self.fees.to_bytes()?);
        Ok(result)
    }

    fn serialized_length(&self) -> usize {
        self.tokens.serialized_length() + self.fees.serialized_length()
    }
}

impl FromBytes for SwapPath {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (tokens, remainder) = Vec::<Address>::from_bytes(bytes)?;
        let (fees, remainder) = Vec::<u32>::from_bytes(remainder)?;
        Ok((Self { tokens, fees }, remainder))
    }
}

impl CLTyped for SwapPath {
    fn cl_type() -> CLType {
        CLType::Any
    }
}

/// Standard fungible token surface.
#[odra::external_contract]
pub trait FungibleToken {
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
    fn approve(&mut self, spender: Address, amount: U256);
    fn balance_of(&self, account: Address) -> U256;
}

/// The external LP market. Orders settle asynchronously: the market calls
/// `fill_liquidity_order` back on the router at a price fixed at fill time,
/// deducting a proportional fee from the output side.
#[odra::external_contract]
pub trait LiquidityMarket {
    fn place_order(&mut self, kind: u8, amount: U256, is_buy: bool) -> u64;
    fn cancel_order(&mut self, order_id: u64);
    fn price_bound(&self) -> (Decimal, Decimal);
    fn fee_rate(&self) -> Rate;
}

/// The external yield-bearing lending market. Interest accrues continuously
/// in the receipt balance; a secondary reward token is claimed separately.
#[odra::external_contract]
pub trait LendingMarket {
    fn supply(&mut self, asset: Address, amount: U256);
    fn withdraw(&mut self, asset: Address, amount: U256, recipient: Address) -> U256;
    fn receipt_balance_of(&self, account: Address) -> U256;
    fn reward_token(&self) -> Address;
    fn claim_reward(&mut self, asset: Address, recipient: Address) -> U256;
}

/// The LP staking source. Staking is a balance registration; reward tokens
/// are paid out on claim.
#[odra::external_contract]
pub trait StakingPool {
    fn stake(&mut self, amount: U256);
    fn unstake(&mut self, amount: U256);
    fn staked_of(&self, account: Address) -> U256;
    fn claim_rewards(&mut self, recipient: Address) -> Vec<(Address, U256)>;
}

/// The swap venue used to convert reward tokens into the stable asset.
#[odra::external_contract]
pub trait SwapVenue {
    fn swap_exact_input(&mut self, path: SwapPath, amount_in: U256, recipient: Address) -> U256;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn swap_path_round_trips() {
        let path = SwapPath {
            tokens: Vec::new(),
            fees: alloc::vec![3000, 500],
        };
        let bytes = path.to_bytes().unwrap();
        assert_eq!(bytes.len(), path.serialized_length());
        let (parsed, rest) = SwapPath::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, path);
        assert!(rest.is_empty());
    }
}
