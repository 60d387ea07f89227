use odra::prelude::*;
use core::fmt;

/// Errors raised by the vault. Discriminants are stable so off-chain
/// tooling can match on the user error code.
#[odra::odra_error]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VaultError {
    // 0: authorization
    MissingRole = 0,
    NotWhitelisted = 1,
    ImproperCaller = 2,

    // 5: capacity
    ExceedsSupplyCap = 5,
    ExceedsBalance = 6,
    ExceedsRedeemable = 7,
    InsufficientAssets = 8,
    ExceedsMaxBorrows = 9,

    // 10: state conflicts
    PendingOperationExists = 10,
    NoPendingOperation = 11,
    HasPendingRefund = 12,
    JuniorBankrupt = 13,
    AlreadyBalanced = 14,

    // 15: timelock
    Locked = 15,

    // 20: invariant guards
    NotLiquidatable = 20,
    OrderMismatch = 21,
    PriceOutOfBounds = 22,
    InvalidPrice = 23,

    // 25: input / arithmetic
    InvalidAmount = 25,
    InvalidConfig = 26,
    MathOverflow = 27,
}

impl VaultError {
    pub fn message(&self) -> &str {
        match self {
            VaultError::MissingRole => "Caller lacks the required role",
            VaultError::NotWhitelisted => "Caller is not whitelisted",
            VaultError::ImproperCaller => "Caller is not the expected collaborator",
            VaultError::ExceedsSupplyCap => "Deposit would exceed the tranche supply cap",
            VaultError::ExceedsBalance => "Withdrawal exceeds the share balance",
            VaultError::ExceedsRedeemable => "Withdrawal exceeds the redeemable shares",
            VaultError::InsufficientAssets => "Backing assets cannot cover the request",
            VaultError::ExceedsMaxBorrows => "Borrow would exceed the borrow cap",
            VaultError::PendingOperationExists => "A pending operation already exists",
            VaultError::NoPendingOperation => "No pending operation to act on",
            VaultError::HasPendingRefund => "Refund assets are awaiting distribution",
            VaultError::JuniorBankrupt => "Junior tranche has no backing left",
            VaultError::AlreadyBalanced => "Leverage is already within the threshold",
            VaultError::Locked => "Withdrawal is locked for the lock period",
            VaultError::NotLiquidatable => "Leverage is below the liquidation threshold",
            VaultError::OrderMismatch => "Fill references a mismatched order id",
            VaultError::PriceOutOfBounds => "Fill price is outside the allowed bounds",
            VaultError::InvalidPrice => "Price input is invalid",
            VaultError::InvalidAmount => "Input amount is invalid",
            VaultError::InvalidConfig => "Input config value is invalid",
            VaultError::MathOverflow => "Math operation overflow",
        }
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
