//! Masternode registry.
//!
//! Registration and expiry are driven by transaction processing, which
//! lives outside this workspace; validation only ever performs read-only
//! operator lookups through the [`MasternodeView`] trait.

use hashbrown::HashMap;
use vireo_consensus::MasternodeView;
use vireo_core::{KeyId, MasternodeId};

/// In-memory operator→masternode map.
#[derive(Clone, Debug, Default)]
pub struct MasternodeRegistry {
    by_operator: HashMap<KeyId, MasternodeId>,
}

impl MasternodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-point) an operator key.
    ///
    /// Returns the masternode previously registered for the operator.
    pub fn register(&mut self, operator: KeyId, id: MasternodeId) -> Option<MasternodeId> {
        self.by_operator.insert(operator, id)
    }

    /// Drop an operator's registration.
    pub fn deregister(&mut self, operator: &KeyId) -> Option<MasternodeId> {
        self.by_operator.remove(operator)
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.by_operator.len()
    }

    /// Whether no operator is registered.
    pub fn is_empty(&self) -> bool {
        self.by_operator.is_empty()
    }
}

impl MasternodeView for MasternodeRegistry {
    fn masternode_by_operator(&self, operator: &KeyId) -> Option<MasternodeId> {
        self.by_operator.get(operator).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_core::{Hash32, KEY_ID_LEN};

    fn operator(byte: u8) -> KeyId {
        KeyId([byte; KEY_ID_LEN])
    }

    #[test]
    fn lookup_follows_registration() {
        let mut registry = MasternodeRegistry::new();
        let id = Hash32([7u8; 32]);

        assert!(registry.masternode_by_operator(&operator(1)).is_none());

        registry.register(operator(1), id);
        assert_eq!(registry.masternode_by_operator(&operator(1)), Some(id));
        assert!(registry.masternode_by_operator(&operator(2)).is_none());

        registry.deregister(&operator(1));
        assert!(registry.masternode_by_operator(&operator(1)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn reregistration_repoints_the_operator() {
        let mut registry = MasternodeRegistry::new();
        let old = Hash32([1u8; 32]);
        let new = Hash32([2u8; 32]);

        assert_eq!(registry.register(operator(1), old), None);
        assert_eq!(registry.register(operator(1), new), Some(old));
        assert_eq!(registry.masternode_by_operator(&operator(1)), Some(new));
        assert_eq!(registry.len(), 1);
    }
}
