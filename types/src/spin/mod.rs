//! Spin domain types.
//!
//! House, player, and commit-reveal state plus the fixed prize schedule used by the execution
//! layer and clients.

mod commit;
mod constants;
mod error;
mod house;
mod player;

pub use commit::*;
pub use constants::*;
pub use error::*;
pub use house::*;
pub use player::*;
