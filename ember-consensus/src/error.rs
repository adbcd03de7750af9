//! Error types for parameter loading, retargeting and proof-of-work checks.

use thiserror::Error;

use crate::compact::CompactTarget;

/// A parameter set that violates a consensus invariant.
///
/// These are fatal: they are reported while the parameters are built, before
/// any header is looked at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("emission speed factor {0} does not fit a 64-bit shift")]
    SpeedFactorTooLarge(u32),

    #[error("tail reward {tail_reward} shifted by {speed_factor} overflows 64 bits")]
    TailShiftOverflow { tail_reward: u64, speed_factor: u32 },

    #[error(
        "tail reward {tail_reward} << {speed_factor} must stay below the money supply cap {money_supply_cap}"
    )]
    TailExceedsSupply {
        tail_reward: u64,
        speed_factor: u32,
        money_supply_cap: u64,
    },

    #[error("tail reward must be non-zero")]
    ZeroTailReward,

    #[error("target spacing must be positive, got {0}")]
    NonPositiveSpacing(i64),

    #[error("target timespan {timespan} is shorter than the target spacing {spacing}")]
    TimespanShorterThanSpacing { timespan: i64, spacing: i64 },

    #[error("difficulty window {0} is outside 1..={max}", max = crate::params::MAX_DIFFICULTY_WINDOW)]
    InvalidWindow(u64),

    #[error("proof-of-work limit must be non-zero")]
    ZeroPowLimit,

    #[error("approximation ceiling must be non-zero")]
    ZeroApproxCeiling,
}

/// Reasons the retarget engine cannot produce a target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DifficultyError {
    /// The tip's `bits` decode as negative or overflowing.
    #[error("tip at height {height} carries invalid compact target {bits}")]
    InvalidTipBits { height: u64, bits: CompactTarget },

    /// The header snapshot ends before the window the algorithm needs.
    #[error("ancestor {steps} blocks behind height {height} is not available")]
    MissingAncestor { height: u64, steps: u64 },
}

/// Why a proof-of-work check rejected a header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    #[error("compact target {0} is negative")]
    NegativeTarget(CompactTarget),

    #[error("compact target {0} overflows 256 bits")]
    OverflowingTarget(CompactTarget),

    #[error("compact target {0} is zero")]
    ZeroTarget(CompactTarget),

    #[error("compact target {0} is easier than the proof-of-work limit")]
    AboveLimit(CompactTarget),

    #[error("hash does not meet target {0}")]
    InsufficientWork(CompactTarget),
}

/// Failure to read a hash from its hex form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected 32 bytes, found {0}")]
    InvalidLength(usize),
}
