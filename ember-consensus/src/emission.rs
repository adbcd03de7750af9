//! Smooth emission with a perpetual tail.
//!
//! The reward for the next block depends only on how much has already been
//! generated: `(cap - generated) >> speed_factor`, never less than the tail
//! reward. Once the generated amount reaches [`tail_emission_threshold`] every
//! block pays exactly the tail reward, forever.
//!
//! Cumulative supply at a height comes in two flavours. The exact one replays
//! the recursion block by block and is the ground truth. The approximate one is
//! a closed-form curve fit for display and estimation; it must not feed any
//! block acceptance decision.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::params::ConsensusParameters;

/// Highest height [`cumulative_emission`] answers with the exact recursion.
pub const EXACT_TIER_MAX_HEIGHT: i64 = 1000;

/// Rate constant of the saturation curve used by the approximation.
const APPROX_SATURATION_RATE: f64 = 4.0;

/// Past `APPROX_DEEP_TAIL_FACTOR * tail_start` the approximation is linear.
const APPROX_DEEP_TAIL_FACTOR: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionPoint {
    /// Atomic units generated before this block.
    pub already_generated: u64,
    /// Reward paid by this block.
    pub reward: u64,
}

/// Generated supply at which the tail reward takes over.
pub fn tail_emission_threshold(params: &ConsensusParameters) -> u64 {
    // Cannot underflow: ConsensusParameters::new rejects
    // tail_reward << speed_factor >= money_supply_cap.
    params.money_supply_cap() - (params.tail_reward() << params.emission_speed_factor())
}

pub fn reward_for_already_generated(already_generated: u64, params: &ConsensusParameters) -> u64 {
    if already_generated >= tail_emission_threshold(params) {
        return params.tail_reward();
    }

    let base_reward =
        (params.money_supply_cap() - already_generated) >> params.emission_speed_factor();
    base_reward.max(params.tail_reward())
}

/// Total atomic units emitted by blocks `1..=height`.
///
/// Heights up to [`EXACT_TIER_MAX_HEIGHT`] are exact; above that the result
/// comes from [`approximate_cumulative_emission`].
pub fn cumulative_emission(height: i64, params: &ConsensusParameters) -> u64 {
    if height <= EXACT_TIER_MAX_HEIGHT {
        exact_cumulative_emission(height, params)
    } else {
        approximate_cumulative_emission(height, params)
    }
}

/// Replays the reward recursion for every block up to `height`. O(height).
pub fn exact_cumulative_emission(height: i64, params: &ConsensusParameters) -> u64 {
    if height <= 0 {
        return 0;
    }

    EmissionSchedule::new(params)
        .take(height as usize)
        .last()
        .map(|point| point.already_generated.saturating_add(point.reward))
        .unwrap_or(0)
}

/// Closed-form estimate of cumulative emission.
///
/// Models the main emission as `threshold * (1 - e^(-4 * h / tail_start))`
/// and the tail as linear. Error against the exact recursion is unbounded at
/// medium heights.
pub fn approximate_cumulative_emission(height: i64, params: &ConsensusParameters) -> u64 {
    if height <= 0 {
        return 0;
    }

    let height = height as u64;
    let threshold = tail_emission_threshold(params);
    let tail_start = approx_tail_start(params);

    if height > APPROX_DEEP_TAIL_FACTOR.saturating_mul(tail_start) {
        let tail_blocks = height - tail_start;
        return threshold.saturating_add(tail_blocks.saturating_mul(params.tail_reward()));
    }

    let ratio = height as f64 / tail_start as f64;
    let progress = 1.0 - (-APPROX_SATURATION_RATE * ratio).exp();
    let estimate = (threshold as f64 * progress).floor();

    trace!(
        "Approximate emission at height {}: ratio {:.6}, progress {:.6}",
        height,
        ratio,
        progress
    );

    // `as` saturates for floats, and the estimate is capped at the threshold.
    (estimate as u64).min(threshold)
}

/// Height at which the approximation considers the main emission finished.
fn approx_tail_start(params: &ConsensusParameters) -> u64 {
    // Non-zero: validation keeps tail_reward << speed_factor below the cap.
    let first_reward = params.money_supply_cap() >> params.emission_speed_factor();
    (tail_emission_threshold(params) / first_reward)
        .min(params.approx_tail_start_ceiling())
        .max(1)
}

/// Number of blocks the main emission takes to reach the tail threshold.
pub fn blocks_until_tail(params: &ConsensusParameters) -> u64 {
    let threshold = tail_emission_threshold(params);
    EmissionSchedule::new(params)
        .take_while(|point| point.already_generated < threshold)
        .count() as u64
}

/// Iterator over the exact schedule, one [`EmissionPoint`] per block.
///
/// The first item is block 1 (nothing generated yet). Callers that persist
/// cumulative totals can pick up where they left off with
/// [`EmissionSchedule::resume`].
#[derive(Debug, Clone)]
pub struct EmissionSchedule<'a> {
    params: &'a ConsensusParameters,
    already_generated: u64,
}

impl<'a> EmissionSchedule<'a> {
    pub fn new(params: &'a ConsensusParameters) -> Self {
        Self::resume(params, 0)
    }

    pub fn resume(params: &'a ConsensusParameters, already_generated: u64) -> Self {
        EmissionSchedule {
            params,
            already_generated,
        }
    }

    pub fn already_generated(&self) -> u64 {
        self.already_generated
    }
}

impl Iterator for EmissionSchedule<'_> {
    type Item = EmissionPoint;

    fn next(&mut self) -> Option<EmissionPoint> {
        let reward = reward_for_already_generated(self.already_generated, self.params);
        let point = EmissionPoint {
            already_generated: self.already_generated,
            reward,
        };
        // Tail emission is unbounded; stop rather than wrap at u64::MAX.
        self.already_generated = self.already_generated.checked_add(reward)?;
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParameterSet, MAIN_MONEY_SUPPLY_CAP, MAIN_TAIL_REWARD};

    fn main_params() -> ConsensusParameters {
        ConsensusParameters::main()
    }

    #[test]
    fn test_tail_threshold_for_main_constants() {
        let params = main_params();
        assert_eq!(params.money_supply_cap(), MAIN_MONEY_SUPPLY_CAP);
        assert_eq!(tail_emission_threshold(&params), 920_000_000_000_000);
    }

    #[test]
    fn test_reward_is_flat_from_threshold_on() {
        let params = main_params();
        let threshold = tail_emission_threshold(&params);
        assert_eq!(reward_for_already_generated(threshold, &params), 2_500_000);
        assert_eq!(
            reward_for_already_generated(threshold + 1_000_000_000_000, &params),
            2_500_000
        );
        assert_eq!(
            reward_for_already_generated(u64::MAX, &params),
            MAIN_TAIL_REWARD
        );
    }

    #[test]
    fn test_reward_never_below_tail_before_threshold() {
        let params = main_params();
        let threshold = tail_emission_threshold(&params);
        for already_generated in [
            0,
            1,
            threshold / 2,
            threshold - 10_000,
            threshold - 1,
        ] {
            assert!(
                reward_for_already_generated(already_generated, &params) >= params.tail_reward()
            );
        }
    }

    #[test]
    fn test_first_rewards() {
        let params = main_params();
        assert_eq!(reward_for_already_generated(0, &params), 879_880_371);
        assert_eq!(exact_cumulative_emission(1, &params), 879_880_371);
        assert_eq!(exact_cumulative_emission(2, &params), 1_759_759_902);
        assert_eq!(exact_cumulative_emission(1000, &params), 879_461_363_455);
    }

    #[test]
    fn test_rewards_decrease_monotonically() {
        let params = main_params();
        let mut previous = u64::MAX;
        for point in EmissionSchedule::new(&params).take(5_000) {
            assert!(point.reward <= previous);
            previous = point.reward;
        }
    }

    #[test]
    fn test_exact_tier_matches_recursion() {
        let params = main_params();
        let mut previous = 0u64;
        for height in 1..=EXACT_TIER_MAX_HEIGHT {
            let total = cumulative_emission(height, &params);
            assert_eq!(
                total,
                previous + reward_for_already_generated(previous, &params),
                "height {}",
                height
            );
            previous = total;
        }
    }

    #[test]
    fn test_non_positive_heights_emit_nothing() {
        let params = main_params();
        assert_eq!(cumulative_emission(0, &params), 0);
        assert_eq!(cumulative_emission(-5, &params), 0);
        assert_eq!(approximate_cumulative_emission(0, &params), 0);
    }

    #[test]
    fn test_cumulative_emission_is_non_decreasing() {
        let params = main_params();
        let tail_start = approx_tail_start(&params);
        let heights = [
            1,
            500,
            999,
            1000,
            1001,
            10_000,
            100_000,
            tail_start as i64,
            (3 * tail_start) as i64,
            (3 * tail_start + 1) as i64,
            50_000_000,
        ];
        let mut previous = 0;
        for height in heights {
            let total = cumulative_emission(height, &params);
            assert!(total >= previous, "height {}", height);
            previous = total;
        }
    }

    #[test]
    fn test_approximation_saturates_then_goes_linear() {
        let params = main_params();
        let threshold = tail_emission_threshold(&params);
        let tail_start = approx_tail_start(&params);
        assert_eq!(tail_start, 1_045_596);

        let near_end = approximate_cumulative_emission((3 * tail_start) as i64, &params);
        assert!(near_end <= threshold);
        assert!(near_end > threshold - threshold / 1_000);

        let deep = (3 * tail_start + 10) as i64;
        assert_eq!(
            approximate_cumulative_emission(deep, &params),
            threshold + (deep as u64 - tail_start) * params.tail_reward()
        );
    }

    #[test]
    fn test_ceiling_caps_tail_start() {
        let params = ConsensusParameters::new(ParameterSet {
            approx_tail_start_ceiling: 5_000,
            ..ParameterSet::main()
        })
        .unwrap();
        assert_eq!(approx_tail_start(&params), 5_000);
        assert_eq!(
            approximate_cumulative_emission(15_001, &params),
            tail_emission_threshold(&params) + 10_001 * params.tail_reward()
        );
    }

    #[test]
    fn test_blocks_until_tail_main() {
        assert_eq!(blocks_until_tail(&main_params()), 6_148_318);
    }

    #[test]
    fn test_resume_continues_schedule() {
        let params = ConsensusParameters::regression();
        let mut schedule = EmissionSchedule::new(&params);
        let first: Vec<_> = schedule.by_ref().take(10).collect();
        let generated = schedule.already_generated();
        assert_eq!(generated, exact_cumulative_emission(10, &params));

        let next = EmissionSchedule::resume(&params, generated).next().unwrap();
        assert_eq!(next, schedule.next().unwrap());
        assert!(next.reward <= first[9].reward);
    }
}
