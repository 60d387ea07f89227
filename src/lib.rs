#![allow(clippy::arithmetic_side_effects)]
#![cfg_attr(not(test), no_std)]

//! A two-tranche leveraged yield vault for the casper blockchain.
//!
//! A senior tranche deposits a stable asset and earns lending-market yield
//! plus a configured cut of junior profits; a junior tranche deposits a
//! yield-bearing LP token and borrows stable leverage from senior. The
//! router coordinates both ledgers through an async settlement state
//! machine driven by an external LP order book.

extern crate alloc;

pub mod error;
pub mod external;
pub mod math;
pub mod mocks;
pub mod reward;
pub mod router;
pub mod state;

pub use error::VaultError;
pub use router::{TrancheRouter, ROLE_ADMIN, ROLE_CONFIG, ROLE_KEEPER};
