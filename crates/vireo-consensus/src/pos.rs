// Consensus-critical. Changes require protocol review + tests.
//! Proof-of-stake validation pipeline.
//!
//! Two granularities share one pipeline:
//!
//! - [`check_proof_of_stake`] validates a header against its immediate
//!   predecessor: stake-modifier chaining first (cheapest), then the
//!   header-only stages.
//! - [`check_proof_of_stake_header_only`] re-checks a header statelessly:
//!   kernel evaluation first (cheaper than signature recovery), then the
//!   signature itself.
//!
//! Both are pure functions of their inputs; neither the chain index nor
//! the masternode view is mutated.

use crate::chain::BlockIndex;
use crate::error::ConsensusError;
use crate::kernel::{KernelHashOracle, MasternodeView};
use crate::params::PosParams;
use crate::signature::check_header_signature;
use crate::stake_modifier::check_stake_modifier;
use vireo_core::BlockHeader;

/// Stateless proof-of-stake re-check of a single header.
///
/// Rejects with [`ConsensusError::KernelHashRejected`] before touching
/// signature recovery when the oracle reports the staking condition
/// unmet.
pub fn check_proof_of_stake_header_only(
    header: &BlockHeader,
    params: &PosParams,
    view: &dyn MasternodeView,
    oracle: &dyn KernelHashOracle,
) -> Result<(), ConsensusError> {
    // Kernel evaluation is cheaper than signature recovery, so run it first.
    let kernel = oracle.check(&header.stake_modifier, header.bits, header.time, params, view);
    if !kernel.hash_ok {
        return Err(ConsensusError::KernelHashRejected);
    }

    // TODO: match the recovered minter key against the operator
    // registered in `view` for the claimed stake.
    check_header_signature(header)
}

/// Full proof-of-stake validation of a header extending `prev`.
///
/// The structural stake-modifier check runs first and short-circuits the
/// costlier kernel and signature stages.
pub fn check_proof_of_stake(
    header: &BlockHeader,
    prev: &BlockIndex,
    params: &PosParams,
    view: &dyn MasternodeView,
    oracle: &dyn KernelHashOracle,
) -> Result<(), ConsensusError> {
    check_stake_modifier(prev, header)?;
    check_proof_of_stake_header_only(header, params, view, oracle)
}
