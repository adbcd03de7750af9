//! Per-network consensus parameters.
//!
//! A [`ConsensusParameters`] can only be obtained through
//! [`ConsensusParameters::new`] (or one of the presets built on it), which
//! checks every invariant up front. Code holding one never has to re-check the
//! emission constants mid-validation.

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::compact::CompactTarget;
use crate::error::ParamsError;
use crate::U256;

/// Block spacing, in seconds, of networks retargeted by the weighted algorithm.
pub const FAST_TARGET_SPACING: i64 = 10;

/// Upper bound on the weighted window so the solvetime sums stay exact.
pub const MAX_DIFFICULTY_WINDOW: u64 = 10_000;

// 0x00000fff...ff
pub const MAIN_POW_LIMIT: U256 = U256([
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0x0000_0FFF_FFFF_FFFF,
]);

// 0x7fffff...ff
pub const REGRESSION_POW_LIMIT: U256 = U256([
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

pub const MAIN_MONEY_SUPPLY_CAP: u64 = 922_621_440_000_000;
pub const MAIN_TAIL_REWARD: u64 = 2_500_000;
pub const EMISSION_SPEED_FACTOR: u32 = 20;

/// Regression networks run the same curve at 1/1000 of the scale.
pub const REGRESSION_SCALE: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Main,
    Test,
    #[serde(alias = "regtest")]
    Regression,
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            NetworkMode::Main => "main",
            NetworkMode::Test => "test",
            NetworkMode::Regression => "regression",
        };
        f.write_str(name)
    }
}

impl FromStr for NetworkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(NetworkMode::Main),
            "test" | "testnet" => Ok(NetworkMode::Test),
            "regression" | "regtest" => Ok(NetworkMode::Regression),
            other => Err(format!("Unknown network mode '{}'", other)),
        }
    }
}

/// Which retarget algorithm a network runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetAlgorithm {
    /// Linearly weighted moving average over the last `difficulty_window` blocks.
    Weighted,
    /// Fixed-interval retarget kept for chains with other spacings.
    Legacy,
}

/// Unchecked parameter values. Turn into [`ConsensusParameters`] with
/// [`ConsensusParameters::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSet {
    pub network_mode: NetworkMode,
    pub pow_limit: U256,
    pub target_spacing: i64,
    pub target_timespan: i64,
    pub difficulty_window: u64,
    pub no_retargeting: bool,
    pub allow_min_difficulty_blocks: bool,
    pub money_supply_cap: u64,
    pub tail_reward: u64,
    pub emission_speed_factor: u32,
    /// Ceiling applied to the estimated tail start height of the
    /// cumulative-emission approximation.
    pub approx_tail_start_ceiling: u64,
}

impl ParameterSet {
    pub fn main() -> Self {
        ParameterSet {
            network_mode: NetworkMode::Main,
            pow_limit: MAIN_POW_LIMIT,
            target_spacing: FAST_TARGET_SPACING,
            target_timespan: 90 * FAST_TARGET_SPACING,
            difficulty_window: 90,
            no_retargeting: false,
            allow_min_difficulty_blocks: false,
            money_supply_cap: MAIN_MONEY_SUPPLY_CAP,
            tail_reward: MAIN_TAIL_REWARD,
            emission_speed_factor: EMISSION_SPEED_FACTOR,
            approx_tail_start_ceiling: 2_000_000,
        }
    }

    pub fn test() -> Self {
        ParameterSet {
            network_mode: NetworkMode::Test,
            allow_min_difficulty_blocks: true,
            ..Self::main()
        }
    }

    pub fn regression() -> Self {
        ParameterSet {
            network_mode: NetworkMode::Regression,
            pow_limit: REGRESSION_POW_LIMIT,
            no_retargeting: true,
            allow_min_difficulty_blocks: true,
            money_supply_cap: MAIN_MONEY_SUPPLY_CAP / REGRESSION_SCALE,
            tail_reward: MAIN_TAIL_REWARD / REGRESSION_SCALE,
            approx_tail_start_ceiling: 100_000,
            ..Self::main()
        }
    }

    pub fn for_network(mode: NetworkMode) -> Self {
        match mode {
            NetworkMode::Main => Self::main(),
            NetworkMode::Test => Self::test(),
            NetworkMode::Regression => Self::regression(),
        }
    }

    fn validate(&self) -> Result<(), ParamsError> {
        if self.emission_speed_factor >= u64::BITS {
            return Err(ParamsError::SpeedFactorTooLarge(self.emission_speed_factor));
        }
        if self.tail_reward == 0 {
            return Err(ParamsError::ZeroTailReward);
        }
        if self.tail_reward.leading_zeros() < self.emission_speed_factor {
            return Err(ParamsError::TailShiftOverflow {
                tail_reward: self.tail_reward,
                speed_factor: self.emission_speed_factor,
            });
        }
        if self.tail_reward << self.emission_speed_factor >= self.money_supply_cap {
            return Err(ParamsError::TailExceedsSupply {
                tail_reward: self.tail_reward,
                speed_factor: self.emission_speed_factor,
                money_supply_cap: self.money_supply_cap,
            });
        }
        if self.target_spacing <= 0 {
            return Err(ParamsError::NonPositiveSpacing(self.target_spacing));
        }
        if self.target_timespan < self.target_spacing {
            return Err(ParamsError::TimespanShorterThanSpacing {
                timespan: self.target_timespan,
                spacing: self.target_spacing,
            });
        }
        if self.difficulty_window == 0 || self.difficulty_window > MAX_DIFFICULTY_WINDOW {
            return Err(ParamsError::InvalidWindow(self.difficulty_window));
        }
        if self.pow_limit.is_zero() {
            return Err(ParamsError::ZeroPowLimit);
        }
        if self.approx_tail_start_ceiling == 0 {
            return Err(ParamsError::ZeroApproxCeiling);
        }
        Ok(())
    }
}

/// Validated, immutable consensus parameters for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusParameters {
    set: ParameterSet,
    pow_limit_compact: CompactTarget,
}

impl ConsensusParameters {
    pub fn new(set: ParameterSet) -> Result<Self, ParamsError> {
        set.validate()?;
        let pow_limit_compact = CompactTarget::encode(set.pow_limit);
        debug!(
            "Consensus parameters for {} accepted: spacing {}s, window {}, pow limit {}",
            set.network_mode, set.target_spacing, set.difficulty_window, pow_limit_compact
        );
        Ok(ConsensusParameters {
            set,
            pow_limit_compact,
        })
    }

    pub fn main() -> Self {
        Self::preset(ParameterSet::main())
    }

    pub fn test() -> Self {
        Self::preset(ParameterSet::test())
    }

    pub fn regression() -> Self {
        Self::preset(ParameterSet::regression())
    }

    pub fn for_network(mode: NetworkMode) -> Self {
        Self::preset(ParameterSet::for_network(mode))
    }

    // Presets are constants checked by the tests below.
    fn preset(set: ParameterSet) -> Self {
        let pow_limit_compact = CompactTarget::encode(set.pow_limit);
        ConsensusParameters {
            set,
            pow_limit_compact,
        }
    }

    pub fn parameter_set(&self) -> &ParameterSet {
        &self.set
    }

    pub fn network_mode(&self) -> NetworkMode {
        self.set.network_mode
    }

    pub fn pow_limit(&self) -> U256 {
        self.set.pow_limit
    }

    /// `pow_limit` in canonical compact form.
    pub fn pow_limit_compact(&self) -> CompactTarget {
        self.pow_limit_compact
    }

    pub fn target_spacing(&self) -> i64 {
        self.set.target_spacing
    }

    pub fn target_timespan(&self) -> i64 {
        self.set.target_timespan
    }

    pub fn difficulty_window(&self) -> u64 {
        self.set.difficulty_window
    }

    /// Blocks between legacy retargets.
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.set.target_timespan / self.set.target_spacing
    }

    pub fn no_retargeting(&self) -> bool {
        self.set.no_retargeting
    }

    pub fn allow_min_difficulty_blocks(&self) -> bool {
        self.set.allow_min_difficulty_blocks
    }

    pub fn money_supply_cap(&self) -> u64 {
        self.set.money_supply_cap
    }

    pub fn tail_reward(&self) -> u64 {
        self.set.tail_reward
    }

    pub fn emission_speed_factor(&self) -> u32 {
        self.set.emission_speed_factor
    }

    pub fn approx_tail_start_ceiling(&self) -> u64 {
        self.set.approx_tail_start_ceiling
    }

    pub fn retarget_algorithm(&self) -> RetargetAlgorithm {
        if self.set.target_spacing == FAST_TARGET_SPACING {
            RetargetAlgorithm::Weighted
        } else {
            RetargetAlgorithm::Legacy
        }
    }
}

impl TryFrom<ParameterSet> for ConsensusParameters {
    type Error = ParamsError;

    fn try_from(set: ParameterSet) -> Result<Self, Self::Error> {
        ConsensusParameters::new(set)
    }
}
