// Consensus-critical. Changes require protocol review + tests.
//! Header signature verification.
//!
//! Block hashes are signed with the minter's key; the header carries a
//! compact recoverable signature over its signing hash. Verification
//! means a public key recovers from the signature. It does NOT yet
//! check that the recovered key belongs to the operator registered for
//! the stake the block claims; that identity check is a known extension
//! point tracked at the orchestrator, and adding it changes consensus.

use crate::error::ConsensusError;
use vireo_core::{header_signing_hash, recover_compact, BlockHeader};

/// Verify the recoverable signature carried by a header.
///
/// The genesis header must carry no signature at all; everything else
/// must recover a key from the compact signature over
/// [`header_signing_hash`].
pub fn check_header_signature(header: &BlockHeader) -> Result<(), ConsensusError> {
    if header.sig.is_empty() {
        if header.height == 0 {
            return Ok(());
        }
        return Err(ConsensusError::MissingSignature);
    }
    if header.height == 0 {
        return Err(ConsensusError::GenesisInvariant(
            "genesis header carries a signature",
        ));
    }

    let digest = header_signing_hash(header).map_err(|_| ConsensusError::MalformedSignature)?;
    recover_compact(&digest, &header.sig)
        .map(|_| ())
        .map_err(|_| ConsensusError::MalformedSignature)
}
