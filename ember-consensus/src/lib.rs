//! Consensus arithmetic for the Ember proof-of-work ledger.
//!
//! Everything in here is a pure function of explicit inputs: the emission
//! schedule, the difficulty retarget engine, the compact target codec and the
//! proof-of-work check. Networking, storage and block validation live
//! elsewhere and hand this crate a [`ConsensusParameters`] and a read-only view
//! of the header chain.

pub mod chain;
pub mod compact;
pub mod config;
pub mod difficulty;
pub mod emission;
pub mod error;
pub mod hash;
pub mod params;
pub mod pow;
pub mod work;

use serde::{Deserialize, Serialize};
use uint::construct_uint;

construct_uint! {
   #[derive(Serialize, Deserialize)]
   pub struct U256(4);
}

construct_uint! {
   /// Scratch width for retarget products that can exceed 256 bits.
   pub struct U512(8);
}

pub use chain::{BlockHeader, HeaderChain, HeaderRef, HeaderView};
pub use compact::{CompactTarget, DecodedTarget};
pub use difficulty::{calculate_next_work_required, next_work_required};
pub use emission::{
    approximate_cumulative_emission, cumulative_emission, exact_cumulative_emission,
    reward_for_already_generated, tail_emission_threshold, EmissionPoint, EmissionSchedule,
};
pub use error::{DifficultyError, HashParseError, ParamsError, PowError};
pub use hash::Hash;
pub use params::{ConsensusParameters, NetworkMode, ParameterSet, RetargetAlgorithm};
pub use pow::{check_proof_of_work, check_proof_of_work_detailed};
pub use work::{block_work, difficulty};

/// Atomic units per whole coin.
pub const COIN: u64 = 100_000_000;

pub(crate) fn widen(value: U256) -> U512 {
    U512::from_big_endian(&value.to_big_endian())
}

/// Returns `None` when `value` needs more than 256 bits.
pub(crate) fn narrow(value: U512) -> Option<U256> {
    if value.bits() > 256 {
        return None;
    }
    let bytes = value.to_big_endian();
    Some(U256::from_big_endian(&bytes[32..]))
}
