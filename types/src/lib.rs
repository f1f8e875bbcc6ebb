pub mod execution;
pub mod spin;
pub mod stats;

pub use execution::{Identity, Seed, MAX_BLOCK_TRANSACTIONS, NAMESPACE};

#[cfg(test)]
mod compat;
