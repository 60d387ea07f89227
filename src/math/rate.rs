//! WAD-scaled rate used for configured ratios: leverage targets, fee
//! margins, penalty and reward-split rates.

use {
    crate::{
        error::VaultError,
        math::common::{TryAdd, TryDiv, TryMul, TrySub, PERCENT_SCALER, SCALE, WAD},
    },
    alloc::{format, string::ToString},
    core::fmt,
    odra::casper_types::U256,
};

/// A ratio as a scaled value
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct Rate(pub U256);

impl odra::casper_types::bytesrepr::ToBytes for Rate {
    fn to_bytes(&self) -> Result<alloc::vec::Vec<u8>, odra::casper_types::bytesrepr::Error> {
        self.0.to_bytes()
    }

    fn serialized_length(&self) -> usize {
        self.0.serialized_length()
    }
}

impl odra::casper_types::bytesrepr::FromBytes for Rate {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), odra::casper_types::bytesrepr::Error> {
        let (value, remainder) = U256::from_bytes(bytes)?;
        Ok((Rate(value), remainder))
    }
}

impl odra::casper_types::CLTyped for Rate {
    fn cl_type() -> odra::casper_types::CLType {
        odra::casper_types::CLType::U256
    }
}

impl Rate {
    /// One (100%)
    pub fn one() -> Self {
        Self(Self::wad())
    }

    /// Zero (0%)
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    fn wad() -> U256 {
        U256::from(WAD)
    }

    /// Create rate from percent value (0-100)
    pub fn from_percent(percent: u8) -> Self {
        Self(U256::from(percent as u64 * PERCENT_SCALER))
    }

    /// Return raw scaled value as u128
    pub fn to_scaled_val(&self) -> u128 {
        self.0.as_u128()
    }

    /// Create rate from scaled value
    pub fn from_scaled_val(scaled_val: u128) -> Self {
        Self(U256::from(scaled_val))
    }

    /// `1 - self`; errors when the rate exceeds 100%.
    pub fn complement(&self) -> Result<Self, VaultError> {
        Ok(Self(
            Self::wad().checked_sub(self.0).ok_or(VaultError::MathOverflow)?,
        ))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scaled_val = self.0.to_string();
        if scaled_val.len() <= SCALE {
            let padding = "0".repeat(SCALE - scaled_val.len());
            scaled_val = format!("0.{}{}", padding, scaled_val);
        } else {
            scaled_val.insert(scaled_val.len() - SCALE, '.');
        }
        f.write_str(&scaled_val)
    }
}

impl From<u64> for Rate {
    fn from(val: u64) -> Self {
        Self(Self::wad().checked_mul(U256::from(val)).unwrap_or(U256::zero()))
    }
}

impl From<crate::math::Decimal> for Rate {
    fn from(decimal: crate::math::Decimal) -> Self {
        Self(decimal.0)
    }
}

impl TryAdd for Rate {
    fn try_add(self, rhs: Self) -> Result<Self, VaultError> {
        Ok(Self(self.0.checked_add(rhs.0).ok_or(VaultError::MathOverflow)?))
    }
}

impl TrySub for Rate {
    fn try_sub(self, rhs: Self) -> Result<Self, VaultError> {
        Ok(Self(self.0.checked_sub(rhs.0).ok_or(VaultError::MathOverflow)?))
    }
}

impl TryDiv<u64> for Rate {
    fn try_div(self, rhs: u64) -> Result<Self, VaultError> {
        Ok(Self(self.0.checked_div(U256::from(rhs)).ok_or(VaultError::MathOverflow)?))
    }
}

impl TryDiv<Rate> for Rate {
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

impl TryMul<u64> for Rate {
    fn try_mul(self, rhs: u64) -> Result<Self, VaultError> {
        Ok(Self(self.0.checked_mul(U256::from(rhs)).ok_or(VaultError::MathOverflow)?))
    }
}

impl TryMul<Rate> for Rate {
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
