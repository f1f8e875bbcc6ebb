//! Off-chain stats snapshots.
//!
//! JSON-serializable views over house, player, and commit state, produced by the execution
//! layer's query module for dashboards and reconciliation tooling.

use crate::spin::{CommitState, House, PlayerRecord};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};
use commonware_utils::{from_hex, hex};
use serde::{Deserialize, Serialize};

// Helper to encode hex
fn hex_encode(bytes: &[u8]) -> String {
    hex(bytes)
}

// Helper to decode hex
fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    from_hex(s).ok_or_else(|| "invalid hex string".to_string())
}

mod serde_public_key_hex {
    use super::{hex_decode, hex_encode};
    use commonware_codec::ReadExt;
    use commonware_cryptography::ed25519::PublicKey;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(public_key: &PublicKey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex_encode(public_key.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PublicKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex_decode(&s).map_err(serde::de::Error::custom)?;
        let mut reader = bytes.as_slice();
        PublicKey::read(&mut reader).map_err(|_| serde::de::Error::custom("invalid public key"))
    }
}

mod serde_digest_hex {
    use super::{hex_decode, hex_encode};
    use commonware_codec::ReadExt;
    use commonware_cryptography::sha256::Digest;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex_encode(digest.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Digest, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex_decode(&s).map_err(serde::de::Error::custom)?;
        let mut reader = bytes.as_slice();
        Digest::read(&mut reader).map_err(|_| serde::de::Error::custom("invalid digest"))
    }
}

/// House snapshot: the persisted record plus the bank custody backing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseStats {
    pub balance: u64,
    pub nonce: u64,
    pub paused: bool,
    pub total_spins: u64,
    pub total_wagered: u64,
    pub total_paid_out: u64,
    /// Total value the bank holds for the ledger; at least `balance`.
    pub held: u64,
}

impl HouseStats {
    pub fn from_house(house: &House, held: u64) -> Self {
        Self {
            balance: house.balance,
            nonce: house.nonce,
            paused: house.paused,
            total_spins: house.total_spins,
            total_wagered: house.total_wagered,
            total_paid_out: house.total_paid_out,
            held,
        }
    }
}

/// Per-player snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(with = "serde_public_key_hex")]
    pub player: PublicKey,
    pub last_spin: u64,
    pub spins: u64,
    pub winnings: u64,
}

impl PlayerStats {
    pub fn from_record(player: &PublicKey, record: &PlayerRecord) -> Self {
        Self {
            player: player.clone(),
            last_spin: record.last_spin,
            spins: record.spins,
            winnings: record.winnings,
        }
    }
}

/// Snapshot of a player's commit-reveal record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetails {
    #[serde(with = "serde_public_key_hex")]
    pub player: PublicKey,
    #[serde(with = "serde_digest_hex")]
    pub commitment: Digest,
    pub height: u64,
    pub timestamp: u64,
    pub nonce: u64,
    pub wager: u64,
    pub revealed: bool,
}

impl CommitDetails {
    pub fn from_state(player: &PublicKey, state: &CommitState) -> Self {
        let commit = state.commit();
        Self {
            player: player.clone(),
            commitment: commit.commitment,
            height: commit.height,
            timestamp: commit.timestamp,
            nonce: commit.nonce,
            wager: commit.wager,
            revealed: state.is_revealed(),
        }
    }
}
