//! Read-only queries over stored state.
//!
//! This module exposes the snapshots dashboards and reconciliation tooling consume:
//! house totals alongside the bank custody backing them, per-player records, and
//! commit-reveal details.
//!
//! ## Query Types
//!
//! - [`HouseStats`]: Bankroll, counters, and the pause flag, plus held custody
//! - [`PlayerStats`]: Cooldown anchor and lifetime spin counters for one player
//! - [`CommitDetails`]: A player's commit-reveal record and whether it resolved
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wheelhouse_execution::query::{query_commit, query_house_stats};
//!
//! // Reconcile the bankroll against custody
//! let stats = query_house_stats(&state, &bank).await?;
//! assert!(stats.held >= stats.balance);
//!
//! // Inspect a player's open commit
//! let commit = query_commit(&state, &player).await?;
//! ```

use commonware_cryptography::ed25519::PublicKey;
use wheelhouse_types::spin::CommitState;
use wheelhouse_types::stats::{CommitDetails, HouseStats, PlayerStats};

use crate::bank::Bank;
use crate::state::{load_commit, load_house, load_player, State};

/// Error during queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No commit-reveal record exists for the player.
    NoCommit,
    /// State access error.
    StateError(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCommit => write!(f, "no commit found"),
            Self::StateError(msg) => write!(f, "state error: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}

/// Query the house snapshot, pairing the persisted record with bank custody.
///
/// An unfunded house reads as all zeroes rather than an error, so reconciliation
/// tooling can poll from genesis.
pub async fn query_house_stats<S: State, B: Bank>(
    state: &S,
    bank: &B,
) -> Result<HouseStats, QueryError> {
    let house = load_house(state)
        .await
        .map_err(|e| QueryError::StateError(e.to_string()))?;
    Ok(HouseStats::from_house(&house, bank.held()))
}

/// Query a player's record.
///
/// A player with no history reads as all zeroes, matching how execution treats a
/// first-time spinner.
pub async fn query_player_stats<S: State>(
    state: &S,
    player: &PublicKey,
) -> Result<PlayerStats, QueryError> {
    let record = load_player(state, player)
        .await
        .map_err(|e| QueryError::StateError(e.to_string()))?;
    Ok(PlayerStats::from_record(player, &record))
}

/// Query a player's commit-reveal record, revealed or not.
pub async fn query_commit<S: State>(
    state: &S,
    player: &PublicKey,
) -> Result<CommitDetails, QueryError> {
    match load_commit(state, player)
        .await
        .map_err(|e| QueryError::StateError(e.to_string()))?
    {
        Some(commit_state) => Ok(CommitDetails::from_state(player, &commit_state)),
        None => Err(QueryError::NoCommit),
    }
}

/// Whether the player has an open commit awaiting its reveal.
pub async fn has_pending_commit<S: State>(
    state: &S,
    player: &PublicKey,
) -> Result<bool, QueryError> {
    Ok(matches!(
        load_commit(state, player)
            .await
            .map_err(|e| QueryError::StateError(e.to_string()))?,
        Some(CommitState::Committed(_))
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::MockBank;
    use crate::state::Memory;
    use commonware_cryptography::{ed25519::PrivateKey, Hasher, Sha256, Signer};
    use wheelhouse_types::execution::{Key, Value};
    use wheelhouse_types::spin::{House, PlayerRecord, SpinCommit, SPIN_COST, UNIT};

    fn test_player() -> PublicKey {
        PrivateKey::from_seed(7).public_key()
    }

    #[tokio::test]
    async fn test_house_stats_pair_balance_with_custody() {
        let mut state = Memory::default();
        let mut bank = MockBank::default();
        state
            .insert(
                Key::House,
                Value::House(House {
                    balance: 2 * UNIT,
                    nonce: 3,
                    paused: false,
                    total_spins: 4,
                    total_wagered: 4 * SPIN_COST,
                    total_paid_out: UNIT,
                }),
            )
            .await
            .unwrap();
        // Custody can exceed the accounted balance when value is forced in from
        // outside any instruction.
        bank.force_custody(2 * UNIT + 5);

        let stats = query_house_stats(&state, &bank).await.unwrap();
        assert_eq!(stats.balance, 2 * UNIT);
        assert_eq!(stats.held, 2 * UNIT + 5);
        assert_eq!(stats.total_spins, 4);
        assert_eq!(stats.total_wagered, 4 * SPIN_COST);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["balance"], 2 * UNIT);
        assert_eq!(json["held"], 2 * UNIT + 5);
    }

    #[tokio::test]
    async fn test_house_stats_read_zero_before_funding() {
        let state = Memory::default();
        let bank = MockBank::default();

        let stats = query_house_stats(&state, &bank).await.unwrap();
        assert_eq!(stats.balance, 0);
        assert_eq!(stats.held, 0);
        assert!(!stats.paused);
    }

    #[tokio::test]
    async fn test_player_stats_default_for_unknown_player() {
        let mut state = Memory::default();
        let player = test_player();

        let stats = query_player_stats(&state, &player).await.unwrap();
        assert_eq!(stats.player, player);
        assert_eq!(stats.spins, 0);
        assert_eq!(stats.winnings, 0);
        assert_eq!(stats.last_spin, 0);

        state
            .insert(
                Key::Player(player.clone()),
                Value::Player(PlayerRecord {
                    last_spin: 300,
                    spins: 2,
                    winnings: UNIT,
                }),
            )
            .await
            .unwrap();
        let stats = query_player_stats(&state, &player).await.unwrap();
        assert_eq!(stats.spins, 2);
        assert_eq!(stats.winnings, UNIT);
    }

    #[tokio::test]
    async fn test_commit_queries_follow_lifecycle() {
        let mut state = Memory::default();
        let player = test_player();

        assert_eq!(
            query_commit(&state, &player).await,
            Err(QueryError::NoCommit)
        );
        assert!(!has_pending_commit(&state, &player).await.unwrap());

        let commit = SpinCommit {
            commitment: Sha256::hash(b"bound"),
            height: 9,
            timestamp: 400,
            nonce: 2,
            wager: SPIN_COST,
        };
        state
            .insert(
                Key::Commit(player.clone()),
                Value::Commit(CommitState::Committed(commit.clone())),
            )
            .await
            .unwrap();
        assert!(has_pending_commit(&state, &player).await.unwrap());
        let details = query_commit(&state, &player).await.unwrap();
        assert!(!details.revealed);
        assert_eq!(details.height, 9);
        assert_eq!(details.wager, SPIN_COST);

        state
            .insert(
                Key::Commit(player.clone()),
                Value::Commit(CommitState::Revealed(commit)),
            )
            .await
            .unwrap();
        assert!(!has_pending_commit(&state, &player).await.unwrap());
        let details = query_commit(&state, &player).await.unwrap();
        assert!(details.revealed);
    }
}
