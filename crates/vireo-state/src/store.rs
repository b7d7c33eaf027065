//! Balance storage backings.
//!
//! The ledger talks to storage through the [`BalanceStore`] capability
//! trait; the backing (transient overlay vs. persistent tree) is picked
//! at construction. Keys iterate in byte order under both backings so a
//! full scan visits owners deterministically.

use crate::error::StateError;
use borsh::{BorshDeserialize, BorshSerialize};
use std::collections::BTreeMap;
use std::path::Path;
use vireo_core::{Amount, KeyId, TokenId, KEY_ID_LEN};

const TREE_BALANCES: &str = "balances";
const BALANCE_KEY_LEN: usize = KEY_ID_LEN + 4;

/// Storage key of one (owner, token) balance cell.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, BorshSerialize, BorshDeserialize)]
pub struct BalanceKey {
    /// Owner the balance belongs to.
    pub owner: KeyId,
    /// Token the balance is denominated in.
    pub token: TokenId,
}

impl BalanceKey {
    /// Byte encoding used by persistent backings: owner bytes followed
    /// by the big-endian token id, so byte order equals key order.
    fn encode(&self) -> [u8; BALANCE_KEY_LEN] {
        let mut out = [0u8; BALANCE_KEY_LEN];
        out[..KEY_ID_LEN].copy_from_slice(self.owner.as_bytes());
        out[KEY_ID_LEN..].copy_from_slice(&self.token.0.to_be_bytes());
        out
    }

    fn decode(bytes: &[u8]) -> Result<Self, StateError> {
        if bytes.len() != BALANCE_KEY_LEN {
            return Err(StateError::Storage("balance key has unexpected length".into()));
        }
        let mut owner = [0u8; KEY_ID_LEN];
        owner.copy_from_slice(&bytes[..KEY_ID_LEN]);
        let mut token = [0u8; 4];
        token.copy_from_slice(&bytes[KEY_ID_LEN..]);
        Ok(Self {
            owner: KeyId(owner),
            token: TokenId(u32::from_be_bytes(token)),
        })
    }
}

/// Capability interface every balance backing provides.
///
/// `for_each` visits keys in ascending byte order and stops early when
/// the callback returns `false`.
pub trait BalanceStore {
    /// Read one balance cell.
    fn get(&self, key: &BalanceKey) -> Result<Option<Amount>, StateError>;
    /// Write one balance cell.
    fn set(&mut self, key: BalanceKey, amount: Amount) -> Result<(), StateError>;
    /// Remove one balance cell.
    fn erase(&mut self, key: &BalanceKey) -> Result<(), StateError>;
    /// Visit every balance cell in key order.
    fn for_each(&self, f: &mut dyn FnMut(&BalanceKey, Amount) -> bool) -> Result<(), StateError>;
}

/// Transient in-memory overlay backing.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    map: BTreeMap<BalanceKey, Amount>,
}

impl MemoryStore {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalanceStore for MemoryStore {
    fn get(&self, key: &BalanceKey) -> Result<Option<Amount>, StateError> {
        Ok(self.map.get(key).copied())
    }

    fn set(&mut self, key: BalanceKey, amount: Amount) -> Result<(), StateError> {
        self.map.insert(key, amount);
        Ok(())
    }

    fn erase(&mut self, key: &BalanceKey) -> Result<(), StateError> {
        self.map.remove(key);
        Ok(())
    }

    fn for_each(&self, f: &mut dyn FnMut(&BalanceKey, Amount) -> bool) -> Result<(), StateError> {
        for (key, amount) in &self.map {
            if !f(key, *amount) {
                break;
            }
        }
        Ok(())
    }
}

/// Persistent sled-backed balance store.
pub struct SledStore {
    _db: sled::Db,
    balances: sled::Tree,
}

impl SledStore {
    /// Open (or create) the balance database at `path`.
    pub fn open(path: &Path) -> Result<Self, StateError> {
        let db = sled::open(path).map_err(|e| StateError::Storage(e.to_string()))?;
        let balances = db
            .open_tree(TREE_BALANCES)
            .map_err(|e| StateError::Storage(e.to_string()))?;
        Ok(Self { _db: db, balances })
    }
}

impl BalanceStore for SledStore {
    fn get(&self, key: &BalanceKey) -> Result<Option<Amount>, StateError> {
        match self.balances.get(key.encode()).map_err(|e| StateError::Storage(e.to_string()))? {
            Some(bytes) => {
                let amount = Amount::try_from_slice(&bytes)
                    .map_err(|e| StateError::Storage(e.to_string()))?;
                Ok(Some(amount))
            }
            None => Ok(None),
        }
    }

    fn set(&mut self, key: BalanceKey, amount: Amount) -> Result<(), StateError> {
        let bytes = borsh::to_vec(&amount).map_err(|e| StateError::Storage(e.to_string()))?;
        self.balances
            .insert(key.encode(), bytes)
            .map_err(|e| StateError::Storage(e.to_string()))?;
        Ok(())
    }

    fn erase(&mut self, key: &BalanceKey) -> Result<(), StateError> {
        self.balances
            .remove(key.encode())
            .map_err(|e| StateError::Storage(e.to_string()))?;
        Ok(())
    }

    fn for_each(&self, f: &mut dyn FnMut(&BalanceKey, Amount) -> bool) -> Result<(), StateError> {
        for item in self.balances.iter() {
            let (k, v) = item.map_err(|e| StateError::Storage(e.to_string()))?;
            let key = BalanceKey::decode(&k)?;
            let amount =
                Amount::try_from_slice(&v).map_err(|e| StateError::Storage(e.to_string()))?;
            if !f(&key, amount) {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key(owner_byte: u8, token: u32) -> BalanceKey {
        BalanceKey { owner: KeyId([owner_byte; KEY_ID_LEN]), token: TokenId(token) }
    }

    fn exercise(store: &mut dyn BalanceStore) {
        let k = key(1, 0);
        assert!(store.get(&k).unwrap().is_none());

        store.set(k, Amount::from_atoms(42)).unwrap();
        assert_eq!(store.get(&k).unwrap(), Some(Amount::from_atoms(42)));

        store.set(key(1, 7), Amount::from_atoms(1)).unwrap();
        store.set(key(0, 3), Amount::from_atoms(2)).unwrap();

        // Iteration is ordered: owner first, then token.
        let mut seen = Vec::new();
        store
            .for_each(&mut |key, amount| {
                seen.push((*key, amount));
                true
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                (key(0, 3), Amount::from_atoms(2)),
                (key(1, 0), Amount::from_atoms(42)),
                (key(1, 7), Amount::from_atoms(1)),
            ]
        );

        // Early stop after the first visit.
        let mut visits = 0;
        store
            .for_each(&mut |_, _| {
                visits += 1;
                false
            })
            .unwrap();
        assert_eq!(visits, 1);

        store.erase(&k).unwrap();
        assert!(store.get(&k).unwrap().is_none());
    }

    #[test]
    fn memory_store_contract() {
        exercise(&mut MemoryStore::new());
    }

    #[test]
    fn sled_store_contract() {
        let dir = tempdir().unwrap();
        exercise(&mut SledStore::open(&dir.path().join("balances")).unwrap());
    }

    #[test]
    fn sled_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("balances");
        {
            let mut store = SledStore::open(&path).unwrap();
            store.set(key(9, 1), Amount::from_atoms(100)).unwrap();
        }
        let store = SledStore::open(&path).unwrap();
        assert_eq!(store.get(&key(9, 1)).unwrap(), Some(Amount::from_atoms(100)));
    }

    #[test]
    fn balance_key_encoding_roundtrip() {
        let k = key(0xaa, 0x0102_0304);
        assert_eq!(BalanceKey::decode(&k.encode()).unwrap(), k);
        assert!(BalanceKey::decode(&[0u8; 3]).is_err());
    }
}
