//! Proof-of-work check.
//!
//! A header's hash, read as a 256-bit number, must not exceed the target its
//! `bits` encode. The target itself must be a legitimate one: not negative,
//! not overflowing, not zero, and no easier than the network's limit.

use log::trace;

use crate::compact::CompactTarget;
use crate::error::PowError;
use crate::hash::Hash;
use crate::params::ConsensusParameters;

/// `true` if `hash` satisfies `bits` and `bits` is a valid target for `params`.
///
/// Absence of work is a plain `false`, never an error.
pub fn check_proof_of_work(hash: Hash, bits: CompactTarget, params: &ConsensusParameters) -> bool {
    check_proof_of_work_detailed(hash, bits, params).is_ok()
}

/// Same rules as [`check_proof_of_work`], reporting which one failed.
pub fn check_proof_of_work_detailed(
    hash: Hash,
    bits: CompactTarget,
    params: &ConsensusParameters,
) -> Result<(), PowError> {
    let decoded = bits.decode();

    if decoded.negative {
        return Err(PowError::NegativeTarget(bits));
    }
    if decoded.overflow {
        return Err(PowError::OverflowingTarget(bits));
    }
    if decoded.value.is_zero() {
        return Err(PowError::ZeroTarget(bits));
    }
    if decoded.value > params.pow_limit() {
        return Err(PowError::AboveLimit(bits));
    }

    if !hash.meets_target(decoded.value) {
        trace!("Hash {} does not meet target {}", hash, bits);
        return Err(PowError::InsufficientWork(bits));
    }

    Ok(())
}
