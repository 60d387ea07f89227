//! Pending-operation registry types.
//!
//! One slot per account, plus one global slot keyed by the contract's own
//! address for rebalance/liquidation/refund orders. A slot is created when
//! an order is placed and destroyed atomically with the settlement (or
//! cancellation) it guards.

use alloc::vec::Vec;
use odra::casper_types::bytesrepr::{self, FromBytes, ToBytes};
use odra::casper_types::{CLType, CLTyped, U256};

/// Kind tag of a pending operation. Numbering is part of the query
/// surface, so off-chain keepers can match on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Invalid = 0,
    DepositJunior = 1,
    WithdrawJunior = 2,
    WithdrawSenior = 3,
    Rebalance = 4,
    Liquidate = 5,
}

impl OperationKind {
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => OperationKind::DepositJunior,
            2 => OperationKind::WithdrawJunior,
            3 => OperationKind::WithdrawSenior,
            4 => OperationKind::Rebalance,
            5 => OperationKind::Liquidate,
            _ => OperationKind::Invalid,
        }
    }
}

impl ToBytes for OperationKind {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        (*self as u8).to_bytes()
    }

    fn serialized_length(&self) -> usize {
        (*self as u8).serialized_length()
    }
}

impl FromBytes for OperationKind {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (raw, remainder) = u8::from_bytes(bytes)?;
        Ok((OperationKind::from_u8(raw), remainder))
    }
}

impl CLTyped for OperationKind {
    fn cl_type() -> CLType {
        CLType::U8
    }
}

/// A half-settled order-backed operation. `state_values` carries the
/// operation-specific amounts captured at placement time; their layout is
/// fixed per kind (see the router's settlement code).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub order_id: u64,
    pub state_values: Vec<U256>,
    pub placed_at: u64,
}

impl PendingOperation {
    pub fn new(kind: OperationKind, order_id: u64, state_values: Vec<U256>, placed_at: u64) -> Self {
        Self {
            kind,
            order_id,
            state_values,
            placed_at,
        }
    }

    /// State value at `index`, zero when absent.
    pub fn value(&self, index: usize) -> U256 {
        self.state_values.get(index).copied().unwrap_or_default()
    }
}

impl ToBytes for PendingOperation {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut result = Vec::with_capacity(self.serialized_length());
        result.append(&mut self.kind.to_bytes()?);
        result.append(&mut self.order_id.to_bytes()?);
        result.append(&mut self.state_values.to_bytes()?);
        result.append(&mut self.placed_at.to_bytes()?);
        Ok(result)
    }

    fn serialized_length(&self) -> usize {
        self.kind.serialized_length()
            + self.order_id.serialized_length()
            + self.state_values.serialized_length()
            + self.placed_at.serialized_length()
    }
}

impl FromBytes for PendingOperation {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (kind, remainder) = OperationKind::from_bytes(bytes)?;
        let (order_id, remainder) = u64::from_bytes(remainder)?;
        let (state_values, remainder) = Vec::<U256>::from_bytes(remainder)?;
        let (placed_at, remainder) = u64::from_bytes(remainder)?;
        Ok((
            Self {
                kind,
                order_id,
                state_values,
                placed_at,
            },
            remainder,
        ))
    }
}

impl CLTyped for PendingOperation {
    fn cl_type() -> CLType {
        CLType::Any
    }
}
