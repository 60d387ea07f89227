//! Mock LP order book. Orders are queued by any account; a keeper fills
//! them at a chosen price pair. Fills charge a proportional fee on the
//! output side and, for orders placed by the registered router, re-enter
//! the router's settlement callback — the same conversion helpers are used
//! on both sides so amounts agree to the base unit.

use odra::casper_types::bytesrepr::{self, FromBytes, ToBytes};
use odra::casper_types::{CLType, CLTyped, U256};
use odra::prelude::*;

use crate::error::VaultError;
use crate::math::{Decimal, Rate};
use crate::router::{lp_to_stable, stable_to_lp, TrancheRouterContractRef};
use crate::state::OperationKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiquidityOrder {
    pub kind: u8,
    pub amount: U256,
    pub is_buy: bool,
    pub account: Address,
}

impl ToBytes for LiquidityOrder {
    fn to_bytes(&self) -> Result<alloc::vec::Vec<u8>, bytesrepr::Error> {
        let mut result = alloc::vec::Vec::with_capacity(self.serialized_length());
        result.append(&mut self.kind.to_bytes()?);
        result.append(&mut self.amount.to_bytes()?);
        result.append(&mut self.is_buy.to_bytes()?);
        result.append(&mut self.account.to_bytes()?);
        Ok(result)
    }

    fn serialized_length(&self) -> usize {
        self.kind.serialized_length()
            + self.amount.serialized_length()
            + self.is_buy.serialized_length()
            + self.account.serialized_length()
    }
}

impl FromBytes for LiquidityOrder {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (kind, remainder) = u8::from_bytes(bytes)?;
        let (amount, remainder) = U256::from_bytes(remainder)?;
        let (is_buy, remainder) = bool::from_bytes(remainder)?;
        let (account, remainder) = Address::from_bytes(remainder)?;
        Ok((
            Self {
                kind,
                amount,
                is_buy,
                account,
            },
            remainder,
        ))
    }
}

impl CLTyped for LiquidityOrder {
    fn cl_type() -> CLType {
        CLType::Any
    }
}

#[odra::module]
pub struct MockLiquidityMarket {
    stable_token: Var<Address>,
    lp_token: Var<Address>,
    stable_decimals: Var<u8>,
    router: Var<Address>,
    fee: Var<Rate>,
    bound_low: Var<Decimal>,
    bound_high: Var<Decimal>,
    next_order_id: Var<u64>,
    orders: Mapping<u64, Option<LiquidityOrder>>,
}

#[odra::module]
impl MockLiquidityMarket {
    pub fn init(&mut self, stable_token: Address, lp_token: Address, stable_decimals: u8) {
        self.stable_token.set(stable_token);
        self.lp_token.set(lp_token);
        self.stable_decimals.set(stable_decimals);
        self.fee.set(Rate::from_scaled_val(700_000_000_000_000)); // 0.07%
        self.next_order_id.set(1);
    }

    pub fn set_router(&mut self, router: Address) {
        self.router.set(router);
    }

    pub fn set_fee_rate(&mut self, fee: Rate) {
        self.fee.set(fee);
    }

    pub fn set_bound(&mut self, low: Decimal, high: Decimal) {
        self.bound_low.set(low);
        self.bound_high.set(high);
    }

    pub fn fee_rate(&self) -> Rate {
        self.fee.get_or_default()
    }

    pub fn price_bound(&self) -> (Decimal, Decimal) {
        (
            self.bound_low.get_or_default(),
            self.bound_high.get_or_default(),
        )
    }

    pub fn order_of(&self, order_id: u64) -> Option<LiquidityOrder> {
        self.orders.get(&order_id).flatten()
    }

    pub fn next_order_id(&self) -> u64 {
        self.next_order_id.get_or_default()
    }

    pub fn place_order(&mut self, kind: u8, amount: U256, is_buy: bool) -> u64 {
        let order_id = self.next_order_id.get_or_default();
        self.next_order_id.set(order_id + 1);
        let order = LiquidityOrder {
            kind,
            amount,
            is_buy,
            account: self.env().caller(),
        };
        self.orders.set(&order_id, Some(order));
        order_id
    }

    /// Cancel an outstanding order; buy escrow is returned to the placer.
    pub fn cancel_order(&mut self, order_id: u64) {
        let order = match self.orders.get(&order_id).flatten() {
            Some(order) => order,
            None => self.env().revert(VaultError::NoPendingOperation),
        };
        if order.account != self.env().caller() {
            self.env().revert(VaultError::ImproperCaller);
        }
        if order.is_buy {
            let mut stable =
                crate::external::FungibleTokenContractRef::new(self.env(), self.stable());
            stable.transfer(order.account, order.amount);
        }
        self.orders.set(&order_id, None);
    }

    /// Keeper fill at a chosen price pair. Prices outside the market's own
    /// configured bound are rejected; the bound arguments are forwarded to
    /// the router callback untouched.
    pub fn fill_order(
        &mut self,
        order_id: u64,
        stable_price: Decimal,
        lp_price: Decimal,
        bound_low: Decimal,
        bound_high: Decimal,
    ) {
        let order = match self.orders.get(&order_id).flatten() {
            Some(order) => order,
            None => self.env().revert(VaultError::NoPendingOperation),
        };
        let own_low = self.bound_low.get_or_default();
        let own_high = self.bound_high.get_or_default();
        if !own_low.is_zero() && (lp_price < own_low || lp_price > own_high) {
            self.env().revert(VaultError::PriceOutOfBounds);
        }

        let fee = self.fee.get_or_default();
        let decimals = self.stable_decimals.get_or_default();
        let pricing_only =
            order.kind == OperationKind::DepositJunior as u8 && !order.is_buy;
        if !pricing_only {
            if order.is_buy {
                let result = stable_to_lp(order.amount, stable_price, lp_price, fee, decimals);
                let lp_out = match result {
                    Ok(out) => out.0,
                    Err(error) => self.env().revert(error),
                };
                let mut lp =
                    crate::external::FungibleTokenContractRef::new(self.env(), self.lp());
                lp.transfer(order.account, lp_out);
            } else {
                let result = lp_to_stable(
                    Decimal(order.amount),
                    stable_price,
                    lp_price,
                    fee,
                    decimals,
                );
                let stable_out = match result {
                    Ok(out) => out,
                    Err(error) => self.env().revert(error),
                };
                let mut stable =
                    crate::external::FungibleTokenContractRef::new(self.env(), self.stable());
                stable.transfer(order.account, stable_out);
            }
        }
        self.orders.set(&order_id, None);

        if let Some(router) = self.router.get() {
            if order.account == router {
                let mut callback = TrancheRouterContractRef::new(self.env(), router);
                callback.fill_liquidity_order(
                    order_id,
                    stable_price,
                    lp_price,
                    bound_low,
                    bound_high,
                );
            }
        }
    }

    /// Replay a callback for an order this market no longer tracks. Models
    /// the fill half of a fill/cancel race reaching the router late.
    pub fn push_fill(&mut self, order_id: u64, stable_price: Decimal, lp_price: Decimal) {
        let router = match self.router.get() {
            Some(router) => router,
            None => self.env().revert(VaultError::InvalidConfig),
        };
        let mut callback = TrancheRouterContractRef::new(self.env(), router);
        callback.fill_liquidity_order(
            order_id,
            stable_price,
            lp_price,
            Decimal::zero(),
            Decimal::zero(),
        );
    }
}

impl MockLiquidityMarket {
    fn stable(&self) -> Address {
        match self.stable_token.get() {
            Some(address) => address,
            None => self.env().revert(VaultError::InvalidConfig),
        }
    }

    fn lp(&self) -> Address {
        match self.lp_token.get() {
            Some(address) => address,
            None => self.env().revert(VaultError::InvalidConfig),
        }
    }
}
