//! Consensus error types.

use thiserror::Error;

/// Errors returned by consensus validation and difficulty conversion code.
///
/// Every reject is local, deterministic, and side-effect-free; callers
/// decide consequences (discarding a header, penalizing a peer).
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Invalid compact target encoding in `bits`.
    #[error("invalid compact target bits")]
    InvalidBits,

    /// Target decoded to zero or otherwise unusable.
    #[error("invalid difficulty target")]
    InvalidTarget,

    /// A genesis-only field was populated (or missing) at the wrong height.
    #[error("genesis invariant violated: {0}")]
    GenesisInvariant(&'static str),

    /// The minter key could not be recovered from the header.
    #[error("cannot extract minter key")]
    MinterKeyExtraction,

    /// The header's stake modifier disagrees with the chained value.
    #[error("stake modifier mismatch")]
    StakeModifierMismatch,

    /// A non-genesis header carried an empty signature.
    #[error("header signature is empty")]
    MissingSignature,

    /// Signature bytes did not recover a public key.
    #[error("malformed header signature")]
    MalformedSignature,

    /// The kernel-hash oracle reported the staking condition unmet.
    #[error("kernel hash rejected")]
    KernelHashRejected,
}
