// State module root: tranche ledgers and the pending-operation registry.

pub mod junior;
pub mod pending;
pub mod senior;

pub use junior::JuniorLedger;
pub use pending::{OperationKind, PendingOperation};
pub use senior::SeniorLedger;

/// Decimals of both tranches' share tokens and of the LP leg.
pub const SHARE_DECIMALS: u8 = 18;

/// Milliseconds per year, for APY-style rates (block time is in ms).
pub const YEAR_MS: u64 = 31_536_000_000;

/// Current version of the vault state layout.
pub const STATE_VERSION: u8 = 1;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn year_in_millis() {
        assert_eq!(YEAR_MS, 365 * 24 * 60 * 60 * 1000);
    }
}
