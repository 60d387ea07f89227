//! Deployable test doubles for the external systems the vault consumes: a
//! fee-charging order book with price bounds, a linear-APY lending market
//! with a secondary reward token, a per-second-rate staking pool, and a
//! fixed-price swap venue.

pub mod lending_market;
pub mod liquidity_market;
pub mod staking_pool;
pub mod swap_venue;
pub mod token;

pub use lending_market::MockLendingMarket;
pub use liquidity_market::MockLiquidityMarket;
pub use staking_pool::MockStakingPool;
pub use swap_venue::MockSwapVenue;
pub use token::MockToken;
