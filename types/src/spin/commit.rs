use crate::execution::NAMESPACE;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::PublicKey,
    sha256::{Digest, Sha256},
    Hasher,
};
use commonware_utils::union;

/// Domain suffix for commitment derivation.
pub const COMMIT_SUFFIX: &[u8] = b"_COMMIT";

/// One commit-reveal record.
///
/// `timestamp` and `nonce` are the commit-time inputs to the commitment
/// derivation, stored so the reveal recomputes against exactly what was
/// bound at commit time. Commits from other players in between cannot
/// invalidate an honest reveal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpinCommit {
    /// Commitment binding the player's hashed secret to commit-time state.
    pub commitment: Digest,
    /// Height the commit landed at; the reveal must wait
    /// [super::REVEAL_DELAY] blocks past it.
    pub height: u64,
    /// Commit-time timestamp.
    pub timestamp: u64,
    /// House nonce consumed by this commit.
    pub nonce: u64,
    /// Amount wagered, recorded for audit and events.
    pub wager: u64,
}

impl Write for SpinCommit {
    fn write(&self, writer: &mut impl BufMut) {
        self.commitment.write(writer);
        self.height.write(writer);
        self.timestamp.write(writer);
        self.nonce.write(writer);
        self.wager.write(writer);
    }
}

impl Read for SpinCommit {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            commitment: Digest::read(reader)?,
            height: u64::read(reader)?,
            timestamp: u64::read(reader)?,
            nonce: u64::read(reader)?,
            wager: u64::read(reader)?,
        })
    }
}

impl FixedSize for SpinCommit {
    const SIZE: usize = Digest::SIZE + u64::SIZE * 4;
}

/// Lifecycle of a player's commit-reveal spin. Absence of the record is the
/// initial state; a revealed record is inert and is replaced, not deleted,
/// by the player's next commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitState {
    /// Awaiting reveal (tag 0).
    Committed(SpinCommit),
    /// Resolved; inert until overwritten (tag 1).
    Revealed(SpinCommit),
}

impl CommitState {
    pub fn commit(&self) -> &SpinCommit {
        match self {
            Self::Committed(commit) => commit,
            Self::Revealed(commit) => commit,
        }
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed(_))
    }
}

impl Write for CommitState {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Committed(commit) => {
                0u8.write(writer);
                commit.write(writer);
            }
            Self::Revealed(commit) => {
                1u8.write(writer);
                commit.write(writer);
            }
        }
    }
}

impl Read for CommitState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let state = match u8::read(reader)? {
            0 => Self::Committed(SpinCommit::read(reader)?),
            1 => Self::Revealed(SpinCommit::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(state)
    }
}

impl EncodeSize for CommitState {
    fn encode_size(&self) -> usize {
        u8::SIZE + SpinCommit::SIZE
    }
}

/// Hash a player-chosen secret into the value supplied to
/// [crate::execution::Instruction::CommitSpin].
pub fn secret_digest(secret: &Digest) -> Digest {
    Sha256::hash(secret.as_ref())
}

/// Derive the commitment binding a hashed secret to the committing player
/// and commit-time state.
///
/// Recomputable by anyone from a SpinCommitted event and the secret
/// disclosed at reveal; this is the provable-fairness anchor.
pub fn commitment(secret_hash: &Digest, player: &PublicKey, timestamp: u64, nonce: u64) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(&union(NAMESPACE, COMMIT_SUFFIX));
    hasher.update(secret_hash.as_ref());
    hasher.update(player.as_ref());
    hasher.update(timestamp.to_be_bytes().as_ref());
    hasher.update(nonce.to_be_bytes().as_ref());
    hasher.finalize()
}
