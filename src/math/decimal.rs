//! WAD-scaled decimal used for prices, NAV and token values.
//!
//! Token amounts enter as integer base units and are normalized to the
//! 18-digit scale before any arithmetic; results leave through
//! [`Decimal::to_units`] with floor rounding, which is the rounding rule
//! applied everywhere in settlement.

#![allow(clippy::assign_op_pattern)]

use {
    crate::{
        error::VaultError,
        math::common::{TryAdd, TryDiv, TryMul, TrySub, SCALE, WAD},
    },
    alloc::{string::ToString, vec},
    core::fmt,
    odra::casper_types::U256,
};

/// Large decimal values, precise to 18 digits
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct Decimal(pub U256);

impl odra::casper_types::bytesrepr::ToBytes for Decimal {
    fn to_bytes(&self) -> Result<alloc::vec::Vec<u8>, odra::casper_types::bytesrepr::Error> {
        self.0.to_bytes()
    }

    fn serialized_length(&self) -> usize {
        self.0.serialized_length()
    }
}

impl odra::casper_types::bytesrepr::FromBytes for Decimal {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), odra::casper_types::bytesrepr::Error> {
        let (value, remainder) = U256::from_bytes(bytes)?;
        Ok((Decimal(value), remainder))
    }
}

impl odra::casper_types::CLTyped for Decimal {
    fn cl_type() -> odra::casper_types::CLType {
        odra::casper_types::CLType::U256
    }
}

/// `10^exp` as a `U256`; `exp` is at most [`SCALE`] everywhere this is used.
pub fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

impl Decimal {
    /// One
    pub fn one() -> Self {
        Self(Self::wad())
    }

    /// Zero
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    fn wad() -> U256 {
        U256::from(WAD)
    }

    /// Return raw scaled value as u128 (assumes the value fits)
    #[allow(clippy::wrong_self_convention)]
    pub fn to_scaled_val(&self) -> u128 {
        self.0.as_u128()
    }

    /// Create decimal from a raw scaled value
    pub fn from_scaled_val(scaled_val: u128) -> Self {
        Self(U256::from(scaled_val))
    }

    /// Normalize an integer token amount with `decimals` base digits.
    pub fn from_units(amount: U256, decimals: u8) -> Result<Self, VaultError> {
        if decimals as usize > SCALE {
            return Err(VaultError::InvalidConfig);
        }
        let factor = pow10((SCALE - decimals as usize) as u32);
        let scaled = amount
            .checked_mul(factor)
            .ok_or(VaultError::MathOverflow)?;
        Ok(Self(scaled))
    }

    /// Denormalize to an integer token amount, floor rounding.
    pub fn to_units(&self, decimals: u8) -> Result<U256, VaultError> {
        if decimals as usize > SCALE {
            return Err(VaultError::InvalidConfig);
        }
        let factor = pow10((SCALE - decimals as usize) as u32);
        self.0.checked_div(factor).ok_or(VaultError::MathOverflow)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scaled_val = self.0.to_string();
        if scaled_val.len() <= SCALE {
            scaled_val.insert_str(0, &vec!["0"; SCALE - scaled_val.len()].join(""));
            scaled_val.insert_str(0, "0.");
        } else {
            scaled_val.insert(scaled_val.len() - SCALE, '.');
        }
        f.write_str(&scaled_val)
    }
}

impl From<u64> for Decimal {
    fn from(val: u64) -> Self {
        Self(Self::wad().checked_mul(U256::from(val)).unwrap_or(U256::zero()))
    }
}

impl From<crate::math::Rate> for Decimal {
    fn from(rate: crate::math::Rate) -> Self {
        Self(rate.0)
    }
}

impl TryDiv<crate::math::Rate> for Decimal {
    fn try_div(self, rhs: crate::math::Rate) -> Result<Self, VaultError> {
        self.try_div(Decimal::from(rhs))
    }
}

impl TryMul<crate::math::Rate> for Decimal {
    fn try_mul(self, rhs: crate::math::Rate) -> Result<Self, VaultError> {
        self.try_mul(Decimal::from(rhs))
    }
}

impl TryAdd for Decimal {
    fn try_add(self, rhs: Self) -> Result<Self, VaultError> {
        Ok(Self(self.0.checked_add(rhs.0).ok_or(VaultError::MathOverflow)?))
    }
}

impl TrySub for Decimal {
    fn try_sub(self, rhs: Self) -> Result<Self, VaultError> {
        Ok(Self(self.0.checked_sub(rhs.0).ok_or(VaultError::MathOverflow)?))
    }
}

impl TryDiv<u64> for Decimal {
    fn try_div(self, rhs: u64) -> Result<Self, VaultError> {
        Ok(Self(self.0.checked_div(U256::from(rhs)).ok_or(VaultError::MathOverflow)?))
    }
}

impl TryDiv<Decimal> for Decimal {
    fn try_div(self, rhs: Self) -> Result<Self, VaultError> {
        Ok(Self(
            self.0
                .checked_mul(Self::wad())
                .ok_or(VaultError::MathOverflow)?
                .checked_div(rhs.0)
                .ok_or(VaultError::MathOverflow)?,
        ))
    }
}

impl TryMul<u64> for Decimal {
    fn try_mul(self, rhs: u64) -> Result<Self, VaultError> {
        Ok(Self(self.0.checked_mul(U256::from(rhs)).ok_or(VaultError::MathOverflow)?))
    }
}

impl TryMul<Decimal> for Decimal {
    fn try_mul(self, rhs: Self) -> Result<Self, VaultError> {
        Ok(Self(
            self.0
                .checked_mul(rhs.0)
                .ok_or(VaultError::MathOverflow)?
                .checked_div(Self::wad())
                .ok_or(VaultError::MathOverflow)?,
        ))
    }
}
