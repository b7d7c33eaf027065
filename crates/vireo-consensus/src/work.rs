// Consensus-critical. Changes require protocol review + tests.
//! Chain-work accounting for tip selection.
//!
//! Each accepted header contributes work derived from its compact
//! target; the node tracks the running sum per tip and prefers the
//! heaviest chain, breaking exact ties toward the lower block hash so
//! every node picks the same winner.

use crate::difficulty::bits_to_target;
use crate::error::ConsensusError;
use num_bigint::BigUint;
use num_traits::One;
use vireo_core::Hash32;

/// Work contributed by one block accepted at compact target `bits`.
///
/// Defined as `floor(2^256 / (target + 1))`, the expected number of
/// kernel evaluations needed to meet the target.
pub fn block_work(bits: u32) -> Result<BigUint, ConsensusError> {
    let target = bits_to_target(bits)?;
    Ok((BigUint::one() << 256u32) / (target + BigUint::one()))
}

/// Running chain work after appending a block at `bits` to a parent
/// carrying `parent_work`.
pub fn cumulative_work(parent_work: &BigUint, bits: u32) -> Result<BigUint, ConsensusError> {
    Ok(parent_work + block_work(bits)?)
}

/// Whether the tip `(candidate_work, candidate_hash)` beats the current
/// best. Strictly heavier chains win; exact ties go to the lower hash.
pub fn tip_improves(
    candidate_work: &BigUint,
    candidate_hash: &Hash32,
    best_work: &BigUint,
    best_hash: &Hash32,
) -> bool {
    if candidate_work != best_work {
        candidate_work > best_work
    } else {
        candidate_hash.as_bytes() < best_hash.as_bytes()
    }
}
