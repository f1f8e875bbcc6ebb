//! Wheelhouse execution layer.
//!
//! This crate contains the deterministic transaction execution logic (`Layer`) and the
//! single-pool wheel game driven by it: treasury custody, commit-reveal and quick
//! spins, and the pause switch.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution; the block context carries the agreed timestamp.
//! - Do not use non-deterministic randomness; only derive draws from the block's beacon and parent.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Storage / recovery invariants
//! The execution pipeline assumes event logs may be committed ahead of state. Recovery logic in
//! `state_transition` must be safe to re-run and must converge to the same output.
//!
//! Value custody lives behind the [`Bank`] trait: execution accounts for the bankroll, the bank
//! holds it. The primary entrypoint is [`Layer`].
//!
//! ## Minimal execution pipeline (example)
//! ```rust,ignore
//! # #[cfg(feature = "mocks")]
//! # {
//! use wheelhouse_execution::state_transition::execute_state_transition;
//! use wheelhouse_execution::mocks::{create_context, create_network_keypair};
//!
//! # async fn example(
//! #     state: &mut /* Adb<...> */ (),
//! #     events: &mut /* keyless::Keyless<...> */ (),
//! #     owner: commonware_cryptography::ed25519::PublicKey,
//! #     bank: &mut /* impl Bank */ (),
//! # ) -> anyhow::Result<()> {
//! // 1) Load or initialize `state` and `events` storage.
//! // 2) Execute the next block (height must be exactly `state_height + 1`).
//! // For tests, derive the block context from the mocks helper (requires `mocks` feature).
//! let (network_secret, _network_public) = create_network_keypair();
//! let ctx = create_context(&network_secret, /* height */ 1, /* view */ 1);
//! let _result = execute_state_transition(
//!     state,
//!     events,
//!     owner,
//!     ctx,
//!     /* transactions */ vec![],
//!     bank,
//! )
//! .await?;
//! # Ok(())
//! # }
//! # }
//! ```

pub mod draw;
pub mod query;
pub mod state_transition;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


mod bank;

mod layer;

mod state;

pub use bank::Bank;
pub use layer::Layer;
pub use state::{nonce, Adb, PrepareError, State, Status};
pub use draw::{quick_draw, reveal_draw};
pub use query::{
    has_pending_commit, query_commit, query_house_stats, query_player_stats, QueryError,
};

#[cfg(any(test, feature = "mocks"))]
pub use bank::MockBank;
#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;
