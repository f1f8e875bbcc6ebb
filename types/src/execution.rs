use crate::spin::{CommitState, House, PlayerRecord};
use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_consensus::simplex::scheme::bls12381_threshold::Seed as CSeed;
use commonware_cryptography::{
    bls12381::primitives::variant::{MinSig, Variant},
    ed25519::{self, PublicKey},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

pub const NAMESPACE: &[u8] = b"_WHEELHOUSE";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";
/// Maximum number of transactions a single block may carry.
pub const MAX_BLOCK_TRANSACTIONS: usize = 500;

pub type Seed = CSeed<MinSig>;
pub type Identity = <MinSig as Variant>::Public;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

/// A signed request to execute one [Instruction].
///
/// `value` is the base-unit amount attached to the call. The host's bank
/// collects it into ledger custody before dispatch and refunds it whenever
/// the instruction is rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub value: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, value: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        value.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(
        private: &ed25519::PrivateKey,
        nonce: u64,
        value: u64,
        instruction: Instruction,
    ) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&nonce, &value, &instruction),
        );

        Self {
            nonce,
            value,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.nonce, &self.value, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.value.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let value = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            value,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.value.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(self.value.to_be_bytes().as_ref());
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // We don't include the signature as part of the digest (any valid
        // signature will be valid for the transaction)
        hasher.finalize()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    // Treasury instructions (tags 10-12)
    /// Owner-only deposit into the house bankroll. The amount is the
    /// transaction's attached value.
    /// Binary: [10]
    Deposit,

    /// Owner-only withdrawal from the house bankroll to the owner.
    /// Binary: [11] [amount:u64 BE]
    Withdraw { amount: u64 },

    /// Bare top-up from any caller; the attached value is folded into the
    /// bankroll so custody and the pool never drift apart.
    /// Binary: [12]
    Fund,

    // Spin instructions (tags 13-15)
    /// First half of a commit-reveal spin. `secret_hash` is the hash of a
    /// player-chosen secret; the attached value must equal the spin cost
    /// exactly.
    /// Binary: [13] [secretHash:32]
    CommitSpin { secret_hash: Digest },

    /// Second half of a commit-reveal spin, disclosing the secret committed
    /// to earlier.
    /// Binary: [14] [secret:32]
    RevealSpin { secret: Digest },

    /// Single-transaction spin drawn from same-block entropy; the attached
    /// value must equal the spin cost exactly.
    /// Binary: [15]
    QuickSpin,

    // Control instructions (tags 16-18)
    /// Owner-only; halts spin admission and arms emergency withdrawal.
    /// Binary: [16]
    Pause,

    /// Owner-only; restores spin admission.
    /// Binary: [17]
    Unpause,

    /// Owner-only and only while paused; drains the full held custody to the
    /// owner and zeroes the bankroll.
    /// Binary: [18]
    EmergencyWithdraw,
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            // Treasury instructions (tags 10-12)
            Self::Deposit => 10u8.write(writer),
            Self::Withdraw { amount } => {
                11u8.write(writer);
                amount.write(writer);
            }
            Self::Fund => 12u8.write(writer),

            // Spin instructions (tags 13-15)
            Self::CommitSpin { secret_hash } => {
                13u8.write(writer);
                secret_hash.write(writer);
            }
            Self::RevealSpin { secret } => {
                14u8.write(writer);
                secret.write(writer);
            }
            Self::QuickSpin => 15u8.write(writer),

            // Control instructions (tags 16-18)
            Self::Pause => 16u8.write(writer),
            Self::Unpause => 17u8.write(writer),
            Self::EmergencyWithdraw => 18u8.write(writer),
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            // Treasury instructions (tags 10-12)
            10 => Self::Deposit,
            11 => Self::Withdraw {
                amount: u64::read(reader)?,
            },
            12 => Self::Fund,

            // Spin instructions (tags 13-15)
            13 => Self::CommitSpin {
                secret_hash: Digest::read(reader)?,
            },
            14 => Self::RevealSpin {
                secret: Digest::read(reader)?,
            },
            15 => Self::QuickSpin,

            // Control instructions (tags 16-18)
            16 => Self::Pause,
            17 => Self::Unpause,
            18 => Self::EmergencyWithdraw,

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Deposit | Self::Fund | Self::QuickSpin => 0,
                Self::Pause | Self::Unpause | Self::EmergencyWithdraw => 0,
                Self::Withdraw { amount } => amount.encode_size(),
                Self::CommitSpin { .. } | Self::RevealSpin { .. } => Digest::SIZE,
            }
    }
}

/// Per-block execution inputs supplied by the host.
///
/// The ledger trusts the host for a monotonic height, a consensus-agreed
/// timestamp (seconds), the parent block digest, and the threshold beacon
/// for the view that produced the block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockContext {
    pub height: u64,
    pub timestamp: u64,
    pub parent: Digest,
    pub seed: Seed,
}

impl BlockContext {
    pub fn new(height: u64, timestamp: u64, parent: Digest, seed: Seed) -> Self {
        Self {
            height,
            timestamp,
            parent,
            seed,
        }
    }
}

impl Write for BlockContext {
    fn write(&self, writer: &mut impl BufMut) {
        self.height.write(writer);
        self.timestamp.write(writer);
        self.parent.write(writer);
        self.seed.write(writer);
    }
}

impl Read for BlockContext {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            height: u64::read(reader)?,
            timestamp: u64::read(reader)?,
            parent: Digest::read(reader)?,
            seed: Seed::read(reader)?,
        })
    }
}

impl EncodeSize for BlockContext {
    fn encode_size(&self) -> usize {
        self.height.encode_size()
            + self.timestamp.encode_size()
            + self.parent.encode_size()
            + self.seed.encode_size()
    }
}

/// Minimal account structure for transaction nonce tracking.
/// Used for replay protection across all instruction types.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for replay-nonce tracking (tag 0)
    Account(PublicKey),

    /// Singleton house record (tag 1)
    House,

    /// Per-player statistics and rate-limit state (tag 2)
    Player(PublicKey),

    /// Per-player commit-reveal record (tag 3)
    Commit(PublicKey),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::House => 1u8.write(writer),
            Self::Player(pk) => {
                2u8.write(writer);
                pk.write(writer);
            }
            Self::Commit(pk) => {
                3u8.write(writer);
                pk.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(PublicKey::read(reader)?),
            1 => Self::House,
            2 => Self::Player(PublicKey::read(reader)?),
            3 => Self::Commit(PublicKey::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => PublicKey::SIZE,
                Self::House => 0,
                Self::Player(_) => PublicKey::SIZE,
                Self::Commit(_) => PublicKey::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    /// Account for replay-nonce tracking (tag 0)
    Account(Account),

    /// Singleton house record (tag 1)
    House(House),

    /// Per-player statistics and rate-limit state (tag 2)
    Player(PlayerRecord),

    /// Per-player commit-reveal record (tag 3)
    Commit(CommitState),

    /// Database commit metadata (tag 4)
    Checkpoint { height: u64, start: u64 },
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::House(house) => {
                1u8.write(writer);
                house.write(writer);
            }
            Self::Player(player) => {
                2u8.write(writer);
                player.write(writer);
            }
            Self::Commit(commit) => {
                3u8.write(writer);
                commit.write(writer);
            }
            Self::Checkpoint { height, start } => {
                4u8.write(writer);
                height.write(writer);
                start.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            1 => Self::House(House::read(reader)?),
            2 => Self::Player(PlayerRecord::read(reader)?),
            3 => Self::Commit(CommitState::read(reader)?),
            4 => Self::Checkpoint {
                height: u64::read(reader)?,
                start: u64::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::House(house) => house.encode_size(),
                Self::Player(player) => player.encode_size(),
                Self::Commit(commit) => commit.encode_size(),
                Self::Checkpoint { height, start } => height.encode_size() + start.encode_size(),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Funds entered the bankroll, via an explicit deposit or a bare top-up
    /// (tag 20). `balance` is the post-deposit house balance.
    Deposited {
        from: PublicKey,
        amount: u64,
        balance: u64,
    },

    /// Funds left the bankroll to the owner, via ordinary or emergency
    /// withdrawal (tag 21). `balance` is the post-withdrawal house balance.
    Withdrawn {
        to: PublicKey,
        amount: u64,
        balance: u64,
    },

    /// A commit-reveal spin was opened (tag 22).
    SpinCommitted {
        player: PublicKey,
        commitment: Digest,
        height: u64,
        timestamp: u64,
        wager: u64,
    },

    /// A spin resolved, via reveal or quick-spin (tag 23). `prize` is the
    /// amount actually awarded: zero for a losing draw and zero for a
    /// winning draw whose payout transfer was refused (the draw itself
    /// remains verifiable).
    SpinResolved {
        player: PublicKey,
        wager: u64,
        prize: u64,
        draw: u64,
        timestamp: u64,
    },

    /// An instruction was rejected and fully reverted (tag 24).
    SpinRejected {
        player: PublicKey,
        error_code: u8,
        message: String,
    },

    /// The pause flag flipped (tag 25).
    PauseChanged { paused: bool },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Deposited {
                from,
                amount,
                balance,
            } => {
                20u8.write(writer);
                from.write(writer);
                amount.write(writer);
                balance.write(writer);
            }
            Self::Withdrawn {
                to,
                amount,
                balance,
            } => {
                21u8.write(writer);
                to.write(writer);
                amount.write(writer);
                balance.write(writer);
            }
            Self::SpinCommitted {
                player,
                commitment,
                height,
                timestamp,
                wager,
            } => {
                22u8.write(writer);
                player.write(writer);
                commitment.write(writer);
                height.write(writer);
                timestamp.write(writer);
                wager.write(writer);
            }
            Self::SpinResolved {
                player,
                wager,
                prize,
                draw,
                timestamp,
            } => {
                23u8.write(writer);
                player.write(writer);
                wager.write(writer);
                prize.write(writer);
                draw.write(writer);
                timestamp.write(writer);
            }
            Self::SpinRejected {
                player,
                error_code,
                message,
            } => {
                24u8.write(writer);
                player.write(writer);
                error_code.write(writer);
                (message.len() as u32).write(writer);
                writer.put_slice(message.as_bytes());
            }
            Self::PauseChanged { paused } => {
                25u8.write(writer);
                paused.write(writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            20 => Self::Deposited {
                from: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                balance: u64::read(reader)?,
            },
            21 => Self::Withdrawn {
                to: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                balance: u64::read(reader)?,
            },
            22 => Self::SpinCommitted {
                player: PublicKey::read(reader)?,
                commitment: Digest::read(reader)?,
                height: u64::read(reader)?,
                timestamp: u64::read(reader)?,
                wager: u64::read(reader)?,
            },
            23 => Self::SpinResolved {
                player: PublicKey::read(reader)?,
                wager: u64::read(reader)?,
                prize: u64::read(reader)?,
                draw: u64::read(reader)?,
                timestamp: u64::read(reader)?,
            },
            24 => {
                let player = PublicKey::read(reader)?;
                let error_code = u8::read(reader)?;
                let message_len = u32::read(reader)? as usize;
                const MAX_REJECTION_MESSAGE_LENGTH: usize = 256;
                if message_len > MAX_REJECTION_MESSAGE_LENGTH {
                    return Err(Error::Invalid("Event", "rejection message too long"));
                }
                if reader.remaining() < message_len {
                    return Err(Error::EndOfBuffer);
                }
                let mut message_bytes = vec![0u8; message_len];
                reader.copy_to_slice(&mut message_bytes);
                let message = String::from_utf8(message_bytes)
                    .map_err(|_| Error::Invalid("Event", "invalid UTF-8 in rejection message"))?;
                Self::SpinRejected {
                    player,
                    error_code,
                    message,
                }
            }
            25 => Self::PauseChanged {
                paused: bool::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Deposited {
                    from,
                    amount,
                    balance,
                } => from.encode_size() + amount.encode_size() + balance.encode_size(),
                Self::Withdrawn {
                    to,
                    amount,
                    balance,
                } => to.encode_size() + amount.encode_size() + balance.encode_size(),
                Self::SpinCommitted {
                    player,
                    commitment,
                    height,
                    timestamp,
                    wager,
                } => {
                    player.encode_size()
                        + commitment.encode_size()
                        + height.encode_size()
                        + timestamp.encode_size()
                        + wager.encode_size()
                }
                Self::SpinResolved {
                    player,
                    wager,
                    prize,
                    draw,
                    timestamp,
                } => {
                    player.encode_size()
                        + wager.encode_size()
                        + prize.encode_size()
                        + draw.encode_size()
                        + timestamp.encode_size()
                }
                Self::SpinRejected {
                    player,
                    error_code,
                    message,
                } => player.encode_size() + error_code.encode_size() + 4 + message.len(),
                Self::PauseChanged { paused } => paused.encode_size(),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
    Checkpoint { height: u64, start: u64 },
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
            Self::Checkpoint { height, start } => {
                2u8.write(writer);
                height.write(writer);
                start.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            2 => Ok(Self::Checkpoint {
                height: u64::read(reader)?,
                start: u64::read(reader)?,
            }),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
            Self::Checkpoint { height, start } => height.encode_size() + start.encode_size(),
        }
    }
}
