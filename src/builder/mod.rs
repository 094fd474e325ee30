//! Call assembly for both target chains.
//!
//! - [`calls`]: object-chain move calls appended to a shared accumulator
//! - [`evm`]: populated, unsigned EVM contract calls
//! - [`pool_math`]: Q64.96 sqrt price and tick math for EVM pools

pub mod calls;
pub mod evm;
pub mod pool_math;
pub mod units;

pub use calls::MoveContext;
pub use pool_math::{calculate_pool_parameters, price_from_sqrt_price, PoolParameters};
