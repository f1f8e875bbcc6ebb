/// Base units per display unit.
pub const UNIT: u64 = 1_000_000_000;

/// Exact cost of one spin, in base units (0.1 unit). Over- and underpayment
/// are both refused.
pub const SPIN_COST: u64 = 100_000_000;

/// Prize per tier, in base units: 0, then half, 2x, 5x, 10x, and 20x the
/// spin cost.
pub const PRIZES: [u64; 6] = [
    0,
    50_000_000,
    200_000_000,
    500_000_000,
    1_000_000_000,
    2_000_000_000,
];

/// Largest single-spin payout. Admission requires the bankroll to cover it.
pub const MAX_PRIZE: u64 = PRIZES[5];

/// Cumulative draw cutoffs for tiers 0-4; draws at or past the last cutoff
/// land in tier 5. Tier frequencies: 60%, 30%, 5%, 3%, 1.5%, 0.5%.
pub const PRIZE_CUTOFFS: [u64; 5] = [600, 900, 950, 980, 995];

/// Draws are uniform over `0..DRAW_SPAN`.
pub const DRAW_SPAN: u64 = 1000;

/// Minimum seconds between successive spins per player, measured from the
/// start of the previous spin.
pub const COOLDOWN_SECS: u64 = 60;

/// Blocks a commit must age before its reveal is accepted.
pub const REVEAL_DELAY: u64 = 2;

/// Error codes for SpinRejected events
pub const ERROR_BANKROLL_SHORT: u8 = 1;
pub const ERROR_WRONG_WAGER: u8 = 2;
pub const ERROR_COOLDOWN: u8 = 3;
pub const ERROR_NO_COMMIT: u8 = 4;
pub const ERROR_ALREADY_REVEALED: u8 = 5;
pub const ERROR_REVEAL_TOO_EARLY: u8 = 6;
pub const ERROR_SECRET_MISMATCH: u8 = 7;
pub const ERROR_TRANSFER_FAILED: u8 = 8;
pub const ERROR_NOT_OWNER: u8 = 9;
pub const ERROR_PAUSED: u8 = 10;
pub const ERROR_NOT_PAUSED: u8 = 11;
pub const ERROR_ZERO_AMOUNT: u8 = 12;
pub const ERROR_COMMIT_PENDING: u8 = 13;
pub const ERROR_UNEXPECTED_VALUE: u8 = 14;

/// Map a uniform draw in `0..DRAW_SPAN` to its prize tier (0-5).
pub fn tier_for_draw(draw: u64) -> usize {
    PRIZE_CUTOFFS
        .iter()
        .position(|cutoff| draw < *cutoff)
        .unwrap_or(PRIZES.len() - 1)
}

/// Prize paid for a draw, in base units.
pub fn prize_for_draw(draw: u64) -> u64 {
    PRIZES[tier_for_draw(draw)]
}
