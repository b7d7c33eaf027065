//! Devnet kernel oracle.
//!
//! Production staking rules (coin age, masternode weighting, slashing
//! windows) are evaluated by an external staking engine. This oracle
//! wires the core kernel-hash plumbing against the header's own compact
//! target so a devnet node and the tests can exercise the full
//! validation pipeline.

use vireo_consensus::{bits_to_target, hash_meets_target, KernelCheck, KernelHashOracle, MasternodeView, PosParams};
use vireo_core::{kernel_hash, Hash32};

/// Kernel oracle comparing the wired kernel hash against `target(bits)`.
pub struct DevKernelOracle;

impl KernelHashOracle for DevKernelOracle {
    fn check(
        &self,
        stake_modifier: &Hash32,
        bits: u32,
        time: u64,
        _params: &PosParams,
        _view: &dyn MasternodeView,
    ) -> KernelCheck {
        let Ok(target) = bits_to_target(bits) else {
            return KernelCheck { hash_ok: false, kernel_hash: None };
        };
        let hash = kernel_hash(stake_modifier, time);
        KernelCheck {
            hash_ok: hash_meets_target(hash.as_bytes(), &target),
            kernel_hash: Some(hash),
        }
    }
}
