//! TOML parameter files.
//!
//! A file names a network and may override any preset value:
//!
//! ```toml
//! network = "test"
//! target_spacing = 10
//! pow_limit = "00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
//! ```
//!
//! Omitted keys keep the preset for that network. The result goes through
//! [`ConsensusParameters::new`], so a file with inconsistent emission
//! constants is refused at load time.

use std::fs::File;
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::hash::Hash;
use crate::params::{ConsensusParameters, NetworkMode, ParameterSet};

pub trait Saveable
where
    Self: Sized,
{
    fn load<I: Read>(reader: I) -> IoResult<Self>;
    fn save<O: Write>(&self, writer: O) -> IoResult<()>;
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        let file = File::create(&path)?;
        self.save(file)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let file = File::open(&path)?;
        Self::load(file)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ParamsFile {
    #[serde(default = "default_network")]
    pub network: NetworkMode,

    /// Big-endian hex, as printed by [`Hash`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pow_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_spacing: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_timespan: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_window: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_retargeting: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_min_difficulty_blocks: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money_supply_cap: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_reward: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emission_speed_factor: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approx_tail_start_ceiling: Option<u64>,
}

fn default_network() -> NetworkMode {
    NetworkMode::Main
}

impl Default for ParamsFile {
    fn default() -> Self {
        ParamsFile::for_network(default_network())
    }
}

impl ParamsFile {
    /// A file that selects `network` and overrides nothing.
    pub fn for_network(network: NetworkMode) -> Self {
        ParamsFile {
            network,
            pow_limit: None,
            target_spacing: None,
            target_timespan: None,
            difficulty_window: None,
            no_retargeting: None,
            allow_min_difficulty_blocks: None,
            money_supply_cap: None,
            tail_reward: None,
            emission_speed_factor: None,
            approx_tail_start_ceiling: None,
        }
    }

    /// A file spelling out every value of `params`.
    pub fn from_parameters(params: &ConsensusParameters) -> Self {
        let set = params.parameter_set();
        ParamsFile {
            network: set.network_mode,
            pow_limit: Some(Hash::from(set.pow_limit).to_string()),
            target_spacing: Some(set.target_spacing),
            target_timespan: Some(set.target_timespan),
            difficulty_window: Some(set.difficulty_window),
            no_retargeting: Some(set.no_retargeting),
            allow_min_difficulty_blocks: Some(set.allow_min_difficulty_blocks),
            money_supply_cap: Some(set.money_supply_cap),
            tail_reward: Some(set.tail_reward),
            emission_speed_factor: Some(set.emission_speed_factor),
            approx_tail_start_ceiling: Some(set.approx_tail_start_ceiling),
        }
    }

    /// Apply the overrides to the network preset, without validating.
    pub fn to_parameter_set(&self) -> Result<ParameterSet> {
        let mut set = ParameterSet::for_network(self.network);

        if let Some(pow_limit) = &self.pow_limit {
            let hash = Hash::try_from(pow_limit.as_str())
                .map_err(|e| anyhow!("Invalid pow_limit '{}': {}", pow_limit, e))?;
            set.pow_limit = hash.as_u256();
        }
        if let Some(v) = self.target_spacing {
            set.target_spacing = v;
        }
        if let Some(v) = self.target_timespan {
            set.target_timespan = v;
        }
        if let Some(v) = self.difficulty_window {
            set.difficulty_window = v;
        }
        if let Some(v) = self.no_retargeting {
            set.no_retargeting = v;
        }
        if let Some(v) = self.allow_min_difficulty_blocks {
            set.allow_min_difficulty_blocks = v;
        }
        if let Some(v) = self.money_supply_cap {
            set.money_supply_cap = v;
        }
        if let Some(v) = self.tail_reward {
            set.tail_reward = v;
        }
        if let Some(v) = self.emission_speed_factor {
            set.emission_speed_factor = v;
        }
        if let Some(v) = self.approx_tail_start_ceiling {
            set.approx_tail_start_ceiling = v;
        }

        Ok(set)
    }

    pub fn into_parameters(self) -> Result<ConsensusParameters> {
        let set = self.to_parameter_set()?;
        ConsensusParameters::new(set).with_context(|| {
            format!(
                "Consensus parameters for network '{}' are inconsistent",
                self.network
            )
        })
    }
}

impl Saveable for ParamsFile {
    fn load<I: Read>(mut reader: I) -> IoResult<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        toml::from_str(&text).map_err(|e| {
            IoError::new(
                IoErrorKind::InvalidData,
                format!("Failed to deserialize parameter file: {}", e),
            )
        })
    }

    fn save<O: Write>(&self, mut writer: O) -> IoResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| {
            IoError::new(
                IoErrorKind::InvalidData,
                format!("Failed to serialize parameter file: {}", e),
            )
        })?;
        writer.write_all(text.as_bytes())
    }
}

/// Read a parameter file and build validated parameters from it.
pub fn load_parameters<P: AsRef<Path>>(path: P) -> Result<ConsensusParameters> {
    let path = path.as_ref();
    let file = ParamsFile::load_from_file(path)
        .with_context(|| format!("Failed to read parameter file {}", path.display()))?;
    let params = file.into_parameters()?;
    info!(
        "Loaded {} consensus parameters from {}",
        params.network_mode(),
        path.display()
    );
    Ok(params)
}
