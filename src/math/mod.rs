pub mod common;
pub mod decimal;
pub mod rate;

pub use common::{TryAdd, TryDiv, TryMul, TrySub, HALF_WAD, PERCENT_SCALER, SCALE, WAD};
pub use decimal::{pow10, Decimal};
pub use rate::Rate;
