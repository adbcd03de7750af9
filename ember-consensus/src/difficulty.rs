//! Difficulty retargeting.
//!
//! Networks with the fast 10-second spacing run a linearly weighted moving
//! average (LWMA) over the last `difficulty_window` solvetimes. Any other
//! spacing falls back to the legacy fixed-interval retarget. Both read the
//! chain only through [`HeaderView`] and keep no state between calls.

use log::{debug, trace, warn};

use crate::chain::HeaderView;
use crate::compact::CompactTarget;
use crate::error::DifficultyError;
use crate::params::{ConsensusParameters, RetargetAlgorithm};
use crate::{narrow, widen, U256, U512};

/// Compact target required for the block after `tip`.
///
/// `candidate_time` is the timestamp of that new block; only the legacy
/// minimum-difficulty rule looks at it.
pub fn next_work_required<H: HeaderView>(
    tip: H,
    candidate_time: i64,
    params: &ConsensusParameters,
) -> Result<CompactTarget, DifficultyError> {
    if params.no_retargeting() {
        debug!(
            "Retargeting disabled, height {} gets the limit {}",
            tip.height() + 1,
            params.pow_limit_compact()
        );
        return Ok(params.pow_limit_compact());
    }

    match params.retarget_algorithm() {
        RetargetAlgorithm::Weighted => weighted_next_work(tip, params),
        RetargetAlgorithm::Legacy => legacy_next_work(tip, candidate_time, params),
    }
}

fn tip_target<H: HeaderView>(tip: &H) -> Result<U256, DifficultyError> {
    tip.bits().decode().valid().ok_or_else(|| {
        warn!(
            "Tip {} carries unusable bits {}",
            tip.height(),
            tip.bits()
        );
        DifficultyError::InvalidTipBits {
            height: tip.height(),
            bits: tip.bits(),
        }
    })
}

fn clamp_to_limit(target: U512, params: &ConsensusParameters) -> U256 {
    narrow(target)
        .filter(|target| *target <= params.pow_limit())
        .unwrap_or_else(|| params.pow_limit())
}

fn u512_from_u128(value: u128) -> U512 {
    (U512::from((value >> 64) as u64) << 64u32) | U512::from(value as u64)
}

fn weighted_next_work<H: HeaderView>(
    tip: H,
    params: &ConsensusParameters,
) -> Result<CompactTarget, DifficultyError> {
    let window = params.difficulty_window();
    let spacing = params.target_spacing();

    if tip.height() < window {
        return Ok(params.pow_limit_compact());
    }

    let previous_target = tip_target(&tip)?;

    let mut sum_weighted_solvetimes: u128 = 0;
    let mut sum_weights: u128 = 0;

    // Newest pair first, so weights count down from `window` to 1.
    let mut later = tip;
    for weight in (1..=window).rev() {
        let earlier = later
            .previous()
            .ok_or(DifficultyError::MissingAncestor {
                height: tip.height(),
                steps: window - weight + 1,
            })?;

        // Out-of-order timestamps count as the minimum solvetime.
        let solvetime = later.time().saturating_sub(earlier.time()).max(1) as u128;
        sum_weighted_solvetimes += solvetime * weight as u128;
        sum_weights += weight as u128;

        later = earlier;
    }

    trace!(
        "LWMA window at height {}: weighted solvetimes {}, weights {}",
        tip.height(),
        sum_weighted_solvetimes,
        sum_weights
    );

    // sum_weights * T is the normalising constant k = N(N+1)T/2.
    let k = sum_weights * spacing as u128;
    let next_target = widen(previous_target) * u512_from_u128(sum_weighted_solvetimes)
        / u512_from_u128(k);
    let next_bits = CompactTarget::encode(clamp_to_limit(next_target, params));

    debug!(
        "LWMA retarget for height {}: {} -> {}",
        tip.height() + 1,
        tip.bits(),
        next_bits
    );
    Ok(next_bits)
}

fn legacy_next_work<H: HeaderView>(
    tip: H,
    candidate_time: i64,
    params: &ConsensusParameters,
) -> Result<CompactTarget, DifficultyError> {
    let interval = params.difficulty_adjustment_interval() as u64;
    let limit_bits = params.pow_limit_compact();

    if (tip.height() + 1) % interval != 0 {
        if !params.allow_min_difficulty_blocks() {
            return Ok(tip.bits());
        }

        // A block arriving more than two spacings late may be mined at the limit.
        if candidate_time > tip.time().saturating_add(params.target_spacing() * 2) {
            return Ok(limit_bits);
        }

        // Otherwise inherit the last difficulty not set by that exception.
        let mut header = tip;
        while header.height() % interval != 0 && header.bits() == limit_bits {
            match header.previous() {
                Some(previous) => header = previous,
                None => break,
            }
        }
        return Ok(header.bits());
    }

    // The first retarget after genesis only has interval - 1 blocks behind it.
    let blocks_to_go_back = if tip.height() + 1 == interval {
        interval - 1
    } else {
        interval
    };

    let first = tip
        .ancestor(blocks_to_go_back)
        .ok_or(DifficultyError::MissingAncestor {
            height: tip.height(),
            steps: blocks_to_go_back,
        })?;

    calculate_next_work_required(tip, first.time(), params)
}

/// Legacy retarget from the window starting at `first_block_time`.
///
/// The elapsed time is clamped to a quarter and four times the target
/// timespan, so one retarget moves the target by at most 4x.
pub fn calculate_next_work_required<H: HeaderView>(
    tip: H,
    first_block_time: i64,
    params: &ConsensusParameters,
) -> Result<CompactTarget, DifficultyError> {
    if params.no_retargeting() {
        return Ok(tip.bits());
    }

    let timespan = params.target_timespan();
    let actual_timespan = tip
        .time()
        .saturating_sub(first_block_time)
        .clamp(timespan / 4, timespan.saturating_mul(4));

    let old_target = tip_target(&tip)?;
    let pow_limit = params.pow_limit();

    // A target within one bit of the limit is halved before scaling and
    // doubled afterwards, dropping its lowest bit.
    let shift = old_target.bits() > pow_limit.bits() - 1;
    let scaled = if shift { old_target >> 1u32 } else { old_target };

    let mut new_target =
        widen(scaled) * U512::from(actual_timespan as u64) / U512::from(timespan as u64);
    if shift {
        new_target = new_target << 1u32;
    }

    let new_bits = CompactTarget::encode(clamp_to_limit(new_target, params));
    debug!(
        "Legacy retarget at height {}: elapsed {}s of {}s, {} -> {}",
        tip.height() + 1,
        actual_timespan,
        timespan,
        tip.bits(),
        new_bits
    );
    Ok(new_bits)
}
