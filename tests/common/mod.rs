#![allow(dead_code)]

//! Shared host fixture: the router plus mock collaborators wired the way
//! the production deployment would be.

use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
use odra::Address;

use tranche_vault::external::SwapPath;
use tranche_vault::math::{Decimal, Rate};
use tranche_vault::mocks::lending_market::MockLendingMarketHostRef;
use tranche_vault::mocks::liquidity_market::MockLiquidityMarketHostRef;
use tranche_vault::mocks::staking_pool::MockStakingPoolHostRef;
use tranche_vault::mocks::swap_venue::MockSwapVenueHostRef;
use tranche_vault::mocks::token::MockTokenHostRef;
use tranche_vault::mocks::{
    MockLendingMarket, MockLiquidityMarket, MockStakingPool, MockSwapVenue, MockToken,
};
use tranche_vault::mocks::lending_market::MockLendingMarketInitArgs;
use tranche_vault::mocks::liquidity_market::MockLiquidityMarketInitArgs;
use tranche_vault::mocks::swap_venue::MockSwapVenueInitArgs;
use tranche_vault::mocks::token::MockTokenInitArgs;
use tranche_vault::router::{TrancheRouterHostRef, TrancheRouterInitArgs};
use tranche_vault::{TrancheRouter, ROLE_KEEPER};

pub const WAD: u128 = 1_000_000_000_000_000_000;

pub fn u(value: u128) -> U256 {
    U256::from(value)
}

/// Stable base units (6 decimals) for a whole-token amount.
pub fn usd(value: u128) -> U256 {
    U256::from(value * 1_000_000)
}

/// Micro stable units.
pub fn usd6(value: u128) -> U256 {
    U256::from(value)
}

/// Share / LP wad units for a whole-token amount.
pub fn wad(value: u128) -> U256 {
    U256::from(value) * U256::from(WAD)
}

pub fn dec(scaled: u128) -> Decimal {
    Decimal::from_scaled_val(scaled)
}

pub fn one() -> Decimal {
    Decimal::one()
}

pub fn rate(scaled: u128) -> Rate {
    Rate::from_scaled_val(scaled)
}

pub struct Fixture {
    pub env: HostEnv,
    pub admin: Address,
    pub alice: Address,
    pub bob: Address,
    pub keeper: Address,
    pub usdc: MockTokenHostRef,
    pub mlp: MockTokenHostRef,
    pub weth: MockTokenHostRef,
    pub mcb: MockTokenHostRef,
    pub arb: MockTokenHostRef,
    pub market: MockLiquidityMarketHostRef,
    pub lending: MockLendingMarketHostRef,
    pub staking: MockStakingPoolHostRef,
    pub venue: MockSwapVenueHostRef,
    pub router: TrancheRouterHostRef,
}

impl Fixture {
    pub fn new() -> Self {
        let env = odra_test::env();
        let admin = env.get_account(0);
        let alice = env.get_account(1);
        let bob = env.get_account(2);
        let keeper = env.get_account(3);

        let mut usdc = MockToken::deploy(
            &env,
            MockTokenInitArgs {
                name: "usdc".into(),
                symbol: "usdc".into(),
                decimals: 6,
            },
        );
        let mut mlp = MockToken::deploy(
            &env,
            MockTokenInitArgs {
                name: "mlp".into(),
                symbol: "mlp".into(),
                decimals: 18,
            },
        );
        let mut weth = MockToken::deploy(
            &env,
            MockTokenInitArgs {
                name: "weth".into(),
                symbol: "weth".into(),
                decimals: 18,
            },
        );
        let mut mcb = MockToken::deploy(
            &env,
            MockTokenInitArgs {
                name: "mcb".into(),
                symbol: "mcb".into(),
                decimals: 18,
            },
        );
        let mut arb = MockToken::deploy(
            &env,
            MockTokenInitArgs {
                name: "arb".into(),
                symbol: "arb".into(),
                decimals: 18,
            },
        );

        let mut market = MockLiquidityMarket::deploy(
            &env,
            MockLiquidityMarketInitArgs {
                stable_token: *usdc.address(),
                lp_token: *mlp.address(),
                stable_decimals: 6,
            },
        );
        market.set_bound(dec(900_000_000_000_000_000), dec(1_100_000_000_000_000_000));

        let lending = MockLendingMarket::deploy(
            &env,
            MockLendingMarketInitArgs {
                stable_token: *usdc.address(),
                reward_token: *arb.address(),
            },
        );
        let staking = MockStakingPool::deploy(&env, NoArgs);
        let venue = MockSwapVenue::deploy(
            &env,
            MockSwapVenueInitArgs {
                stable_token: *usdc.address(),
            },
        );

        let mut router = TrancheRouter::deploy(
            &env,
            TrancheRouterInitArgs {
                stable_token: *usdc.address(),
                lp_token: *mlp.address(),
                stable_decimals: 6,
            },
        );
        router.set_liquidity_market(*market.address());
        router.set_lending_market(*lending.address());
        router.set_staking_pool(*staking.address());
        router.set_swap_venue(*venue.address());
        router.set_target_leverage(rate(2_500_000_000_000_000_000));
        router.set_rebalance_threshold_rate(rate(50_000_000_000_000_000));
        router.set_liquidation_leverage(rate(5_000_000_000_000_000_000));
        router.set_senior_reward_rate(rate(200_000_000_000_000_000));
        router.grant_role(keeper, ROLE_KEEPER);
        market.set_router(*router.address());

        // swap routes for the reward tokens
        for token in [weth.address(), mcb.address(), arb.address()] {
            router.set_swap_path(
                *token,
                SwapPath {
                    tokens: vec![*token, *usdc.address()],
                    fees: vec![3000],
                },
            );
        }

        // deep inventories so mocks can always settle
        usdc.mint(*market.address(), usd(1_000_000_000));
        usdc.mint(*lending.address(), usd(1_000_000_000));
        usdc.mint(*venue.address(), usd(1_000_000_000));
        mlp.mint(*market.address(), wad(1_000_000_000));
        weth.mint(*staking.address(), wad(1_000_000_000));
        mcb.mint(*staking.address(), wad(1_000_000_000));
        arb.mint(*lending.address(), wad(1_000_000_000));

        Self {
            env,
            admin,
            alice,
            bob,
            keeper,
            usdc,
            mlp,
            weth,
            mcb,
            arb,
            market,
            lending,
            staking,
            venue,
            router,
        }
    }

    /// Frictionless market: no fee, no sizing margin, fills pinned at 1.0.
    pub fn set_flat_market(&mut self) {
        self.market.set_fee_rate(Rate::zero());
        self.market.set_bound(one(), one());
        self.router.set_sell_fee_margin(Rate::zero());
    }

    pub fn router_address(&self) -> Address {
        *self.router.address()
    }

    // ------------------------------------------------------------------
    // user actions

    pub fn deposit_senior(&mut self, who: Address, amount: U256) {
        self.env.set_caller(who);
        self.usdc.approve(self.router_address(), amount);
        self.env.set_caller(who);
        self.router.deposit_senior(amount);
        self.env.set_caller(self.admin);
    }

    /// Place a junior deposit; returns the order id to fill.
    pub fn place_deposit_junior(&mut self, who: Address, amount: U256) -> u64 {
        self.env.set_caller(who);
        self.mlp.approve(self.router_address(), amount);
        let order_id = self.market.next_order_id();
        self.env.set_caller(who);
        self.router.deposit_junior(amount);
        self.env.set_caller(self.admin);
        order_id
    }

    pub fn place_withdraw_junior(&mut self, who: Address, shares: U256) -> u64 {
        let order_id = self.market.next_order_id();
        self.env.set_caller(who);
        self.router.withdraw_junior(shares);
        self.env.set_caller(self.admin);
        order_id
    }

    pub fn place_withdraw_senior(&mut self, who: Address, shares: U256, soft: bool) -> u64 {
        let order_id = self.market.next_order_id();
        self.env.set_caller(who);
        self.router.withdraw_senior(shares, soft);
        self.env.set_caller(self.admin);
        order_id
    }

    pub fn place_rebalance(&mut self, stable_price: Decimal, lp_price: Decimal) -> u64 {
        let order_id = self.market.next_order_id();
        self.env.set_caller(self.keeper);
        self.router.rebalance(stable_price, lp_price);
        self.env.set_caller(self.admin);
        order_id
    }

    pub fn place_liquidate(&mut self, stable_price: Decimal, lp_price: Decimal) -> u64 {
        let order_id = self.market.next_order_id();
        self.env.set_caller(self.keeper);
        self.router.liquidate(stable_price, lp_price);
        self.env.set_caller(self.admin);
        order_id
    }

    pub fn place_refund(&mut self) -> u64 {
        let order_id = self.market.next_order_id();
        self.env.set_caller(self.keeper);
        self.router.refund_junior();
        self.env.set_caller(self.admin);
        order_id
    }

    pub fn fill(&mut self, order_id: u64, stable_price: Decimal, lp_price: Decimal) {
        self.env.set_caller(self.keeper);
        self.market.fill_order(
            order_id,
            stable_price,
            lp_price,
            Decimal::zero(),
            Decimal::zero(),
        );
        self.env.set_caller(self.admin);
    }

    /// Mint junior collateral, deposit it and settle the order at parity.
    pub fn seed_junior(&mut self, who: Address, amount: U256) {
        self.mlp.mint(who, amount);
        let order = self.place_deposit_junior(who, amount);
        self.fill(order, one(), one());
    }
}
