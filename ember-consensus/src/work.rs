//! Work and difficulty derived from compact targets.

use crate::compact::CompactTarget;
use crate::params::ConsensusParameters;
use crate::U256;

/// Expected number of hashes to find a block at `bits`: `2^256 / (target + 1)`.
///
/// Returns zero for targets that are negative, overflowing or zero. The
/// heaviest chain is the one with the largest sum of these.
pub fn block_work(bits: CompactTarget) -> U256 {
    let target = match bits.decode().valid() {
        Some(target) if !target.is_zero() => target,
        _ => return U256::zero(),
    };

    // 2^256 does not fit, but 2^256 / (t + 1) == (!t / (t + 1)) + 1.
    (!target / (target + U256::one())) + U256::one()
}

/// How many times harder `bits` is than the network's limit, for display.
pub fn difficulty(bits: CompactTarget, params: &ConsensusParameters) -> f64 {
    match bits.decode().valid() {
        Some(target) if !target.is_zero() => to_f64(params.pow_limit()) / to_f64(target),
        _ => 0.0,
    }
}

fn to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, word| acc * 18_446_744_073_709_551_616.0 + *word as f64)
}
