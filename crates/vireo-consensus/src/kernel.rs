//! Staking-kernel and masternode-view collaborator contracts.
//!
//! The kernel hash itself is computed outside this crate; validation
//! only consumes the boolean outcome. Both collaborators are borrowed
//! read-only for the duration of a check. Lifecycle stays with the
//! caller; there is no process-wide view handle.

use crate::params::PosParams;
use vireo_core::{Hash32, KeyId, MasternodeId};

/// Outcome of one kernel-hash evaluation.
///
/// Only `hash_ok` feeds the consensus decision; the hash itself is
/// surfaced for diagnostics.
#[derive(Clone, Debug)]
pub struct KernelCheck {
    /// Whether the kernel hash satisfied the staking target.
    pub hash_ok: bool,
    /// The evaluated kernel hash, when the oracle computed one.
    pub kernel_hash: Option<Hash32>,
}

/// Read-only lookup into the masternode registry.
///
/// Implementations must be safe to consult concurrently while headers
/// are being validated; validation never mutates the view.
pub trait MasternodeView {
    /// Masternode registered for an operator key, if any.
    fn masternode_by_operator(&self, operator: &KeyId) -> Option<MasternodeId>;
}

/// Opaque proof-of-stake kernel evaluation.
///
/// Implementations decide whether `(stake_modifier, bits, time)`
/// satisfies the staking condition for the given network, consulting
/// the masternode view as needed.
pub trait KernelHashOracle {
    /// Evaluate the kernel for one candidate header.
    fn check(
        &self,
        stake_modifier: &Hash32,
        bits: u32,
        time: u64,
        params: &PosParams,
        view: &dyn MasternodeView,
    ) -> KernelCheck;
}
