//! Yield Farm
//!
//! MasterChef accumulator farm: LP stakers earn a fixed reward per block,
//! split between pools by allocation points and paid out of the farm's
//! pre-funded reward balance.

pub mod chef;
pub mod state;

pub use chef::{MasterChef, ACC_PRECISION};
pub use state::{FarmStatus, PoolInfo, UserInfo};
