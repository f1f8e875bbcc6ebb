use super::constants::*;
use thiserror::Error as ThisError;

/// Domain rejection for a ledger instruction. Every variant carries the
/// context a caller needs to correct and resubmit; a rejected instruction
/// reverts atomically and refunds any attached value.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum SpinError {
    #[error("house bankroll too low (required={required}, available={available})")]
    BankrollShort { required: u64, available: u64 },
    #[error("wrong wager (sent={sent}, required={required})")]
    WrongWager { sent: u64, required: u64 },
    #[error("cooldown active ({remaining_secs}s remaining)")]
    Cooldown { remaining_secs: u64 },
    #[error("no commit found")]
    NoCommit,
    #[error("commit already revealed")]
    AlreadyRevealed,
    #[error("reveal too early ({blocks_remaining} blocks remaining)")]
    RevealTooEarly { blocks_remaining: u64 },
    #[error("secret does not match commitment")]
    SecretMismatch,
    #[error("transfer of {amount} refused")]
    TransferFailed { amount: u64 },
    #[error("caller is not the owner")]
    NotOwner,
    #[error("house is paused")]
    Paused,
    #[error("house is not paused")]
    NotPaused,
    #[error("amount must be nonzero")]
    ZeroAmount,
    #[error("unrevealed commit pending")]
    CommitPending,
    #[error("unexpected attached value ({sent})")]
    UnexpectedValue { sent: u64 },
}

impl SpinError {
    /// Stable code carried by SpinRejected events.
    pub fn code(&self) -> u8 {
        match self {
            Self::BankrollShort { .. } => ERROR_BANKROLL_SHORT,
            Self::WrongWager { .. } => ERROR_WRONG_WAGER,
            Self::Cooldown { .. } => ERROR_COOLDOWN,
            Self::NoCommit => ERROR_NO_COMMIT,
            Self::AlreadyRevealed => ERROR_ALREADY_REVEALED,
            Self::RevealTooEarly { .. } => ERROR_REVEAL_TOO_EARLY,
            Self::SecretMismatch => ERROR_SECRET_MISMATCH,
            Self::TransferFailed { .. } => ERROR_TRANSFER_FAILED,
            Self::NotOwner => ERROR_NOT_OWNER,
            Self::Paused => ERROR_PAUSED,
            Self::NotPaused => ERROR_NOT_PAUSED,
            Self::ZeroAmount => ERROR_ZERO_AMOUNT,
            Self::CommitPending => ERROR_COMMIT_PENDING,
            Self::UnexpectedValue { .. } => ERROR_UNEXPECTED_VALUE,
        }
    }
}
