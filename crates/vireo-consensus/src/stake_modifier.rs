// Consensus-critical. Changes require protocol review + tests.
//! Stake-modifier chain validation.
//!
//! Every non-genesis block commits to
//! `compute_stake_modifier(prev_modifier, minter_key)`; genesis carries
//! the zero sentinel. This is a purely structural check and by far the
//! cheapest stage of proof-of-stake validation, so the orchestrator runs
//! it before kernel evaluation and signature recovery.

use crate::chain::BlockIndex;
use crate::error::ConsensusError;
use vireo_core::{compute_stake_modifier, extract_minter_key, BlockHeader, Hash32};

/// Check that a header's stake modifier chains correctly off `prev`.
///
/// Genesis headers (zero `prev`) must carry the zero modifier and `prev`
/// is ignored. For everything else the minter key is recovered from the
/// header and the expected modifier recomputed.
pub fn check_stake_modifier(prev: &BlockIndex, header: &BlockHeader) -> Result<(), ConsensusError> {
    if header.prev == Hash32::zero() {
        if header.stake_modifier == Hash32::zero() {
            return Ok(());
        }
        return Err(ConsensusError::GenesisInvariant(
            "genesis header carries a stake modifier",
        ));
    }

    let minter = extract_minter_key(header).map_err(|_| ConsensusError::MinterKeyExtraction)?;

    if header.stake_modifier != compute_stake_modifier(&prev.stake_modifier, &minter) {
        return Err(ConsensusError::StakeModifierMismatch);
    }
    Ok(())
}
