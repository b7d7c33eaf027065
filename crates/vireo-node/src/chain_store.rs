use std::collections::HashMap;
use std::path::Path;

use borsh::{to_vec, BorshDeserialize, BorshSerialize};
use num_bigint::BigUint;
use sled::transaction::{TransactionResult, Transactional};
use sled::Error as SledError;
use vireo_consensus::{
    check_proof_of_stake, check_proof_of_stake_header_only, cumulative_work,
    get_next_work_required, tip_improves, ChainIndex, Handle, KernelHashOracle, MasternodeView,
    PosParams,
};
use vireo_core::{block_header_hash, BlockHeader, Hash32};

// Consensus-critical validation is delegated to vireo-consensus; this module
// only handles storage, index rebuild, and tip selection.

const TREE_HEADERS: &str = "headers";
const TREE_INDEX: &str = "index";
const TREE_META: &str = "meta";
const KEY_BEST: &[u8] = b"best";

#[derive(Clone, BorshSerialize, BorshDeserialize)]
pub struct IndexRecord {
    pub height: u64,
    pub time: u64,
    pub bits: u32,
    pub stake_modifier: Hash32,
    pub prev: Hash32,
    pub cumulative_work: Vec<u8>, // BigUint BE bytes
}

pub struct ChainDb {
    _db: sled::Db,
    headers: sled::Tree,
    index: sled::Tree,
    meta: sled::Tree,
}

impl ChainDb {
    pub fn open(path: &Path) -> Result<Self, String> {
        let db = sled::open(path).map_err(|e| e.to_string())?;
        let headers = db.open_tree(TREE_HEADERS).map_err(|e| e.to_string())?;
        let index = db.open_tree(TREE_INDEX).map_err(|e| e.to_string())?;
        let meta = db.open_tree(TREE_META).map_err(|e| e.to_string())?;
        Ok(Self { _db: db, headers, index, meta })
    }

    pub fn get_header(&self, hash: &Hash32) -> Result<Option<BlockHeader>, String> {
        if let Some(bytes) = self.headers.get(hash.as_bytes()).map_err(|e| e.to_string())? {
            let header = BlockHeader::try_from_slice(&bytes).map_err(|e| e.to_string())?;
            Ok(Some(header))
        } else {
            Ok(None)
        }
    }

    pub fn best_tip(&self) -> Result<Option<Hash32>, String> {
        if let Some(bytes) = self.meta.get(KEY_BEST).map_err(|e| e.to_string())? {
            if bytes.len() != 32 {
                return Err("corrupt best-tip record".into());
            }
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&bytes);
            Ok(Some(Hash32(arr)))
        } else {
            Ok(None)
        }
    }

    pub fn upsert_header(
        &self,
        hash: Hash32,
        header: &BlockHeader,
        record: &IndexRecord,
        best: Option<Hash32>,
    ) -> Result<(), String> {
        let header_bytes = to_vec(header).map_err(|e| e.to_string())?;
        let record_bytes = to_vec(record).map_err(|e| e.to_string())?;
        let best_bytes = best.map(|h| h.as_bytes().to_vec());

        let res: TransactionResult<(), SledError> =
            (&self.headers, &self.index, &self.meta).transaction(|(headers, index, meta)| {
                headers.insert(hash.as_bytes(), header_bytes.clone())?;
                index.insert(hash.as_bytes(), record_bytes.clone())?;
                if let Some(b) = &best_bytes {
                    meta.insert(KEY_BEST, b.clone())?;
                }
                Ok(())
            });

        res.map_err(|e| e.to_string())
    }

    pub fn all_records(&self) -> Result<Vec<(Hash32, IndexRecord)>, String> {
        let mut out = Vec::new();
        for item in self.index.iter() {
            let (k, v) = item.map_err(|e| e.to_string())?;
            if k.len() != 32 {
                return Err("corrupt index key".into());
            }
            let record = IndexRecord::try_from_slice(&v).map_err(|e| e.to_string())?;
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&k);
            out.push((Hash32(hash), record));
        }
        Ok(out)
    }
}

/// Header store plus the in-memory arena rebuilt from it at startup.
pub struct ChainStore {
    db: ChainDb,
    chain: ChainIndex,
    handles: HashMap<Hash32, Handle>,
    work: HashMap<Hash32, BigUint>,
    best: Hash32,
}

impl ChainStore {
    pub fn load_or_init(path: &Path, genesis: BlockHeader) -> Result<Self, String> {
        if genesis.height != 0
            || genesis.prev != Hash32::zero()
            || genesis.stake_modifier != Hash32::zero()
            || !genesis.sig.is_empty()
        {
            return Err("malformed genesis header".into());
        }

        let db = ChainDb::open(path)?;
        let genesis_hash = block_header_hash(&genesis).map_err(|e| e.to_string())?;

        if db.all_records()?.is_empty() {
            let work = cumulative_work(&BigUint::default(), genesis.bits)
                .map_err(|e| e.to_string())?;
            let record = IndexRecord {
                height: 0,
                time: genesis.time,
                bits: genesis.bits,
                stake_modifier: genesis.stake_modifier,
                prev: genesis.prev,
                cumulative_work: work.to_bytes_be(),
            };
            db.upsert_header(genesis_hash, &genesis, &record, Some(genesis_hash))?;
        }

        // Rebuild the arena in height order so every parent links first.
        let mut records = db.all_records()?;
        records.sort_by_key(|(_, r)| r.height);

        let mut chain = ChainIndex::new();
        let mut handles: HashMap<Hash32, Handle> = HashMap::new();
        let mut work: HashMap<Hash32, BigUint> = HashMap::new();
        let mut best: Option<(Hash32, BigUint)> = None;

        for (hash, record) in records {
            let prev_handle = if record.height == 0 {
                if hash != genesis_hash {
                    return Err("genesis hash mismatch".into());
                }
                None
            } else {
                Some(*handles.get(&record.prev).ok_or("header store missing parent")?)
            };

            let handle = chain.push(
                prev_handle,
                hash,
                record.time,
                record.bits,
                record.stake_modifier,
            );
            let cum = BigUint::from_bytes_be(&record.cumulative_work);

            let improves = match &best {
                Some((best_hash, best_work)) => tip_improves(&cum, &hash, best_work, best_hash),
                None => true,
            };
            if improves {
                best = Some((hash, cum.clone()));
            }

            handles.insert(hash, handle);
            work.insert(hash, cum);
        }

        let (best, _) = best.ok_or("no tip found after load")?;

        // The meta marker is a hint; the scan above is authoritative and
        // recovers even when the marker is missing or stale.
        match db.best_tip()? {
            Some(stored) if stored != best => {
                log::warn!("stored best-tip marker {stored} superseded by {best}");
            }
            None => log::warn!("best-tip marker missing, recovered {best} from index"),
            _ => {}
        }

        Ok(Self { db, chain, handles, work, best })
    }

    pub fn best_hash(&self) -> Hash32 {
        self.best
    }

    pub fn best_index(&self) -> &vireo_consensus::BlockIndex {
        self.chain.get(self.handles[&self.best])
    }

    #[allow(dead_code)]
    pub fn header(&self, hash: &Hash32) -> Result<Option<BlockHeader>, String> {
        self.db.get_header(hash)
    }

    #[allow(dead_code)]
    pub fn contains(&self, hash: &Hash32) -> bool {
        self.handles.contains_key(hash)
    }

    /// Validate a candidate header against the chain and link it.
    ///
    /// Stages: parent lookup, height continuity, expected difficulty
    /// (`get_next_work_required`), then the full proof-of-stake pipeline.
    /// Consequences of a reject (peer penalties etc.) are the caller's
    /// business; the store just reports it.
    pub fn accept_header(
        &mut self,
        header: &BlockHeader,
        params: &PosParams,
        view: &dyn MasternodeView,
        oracle: &dyn KernelHashOracle,
    ) -> Result<(), String> {
        header.validate_sanity().map_err(|e| e.to_string())?;

        let hash = block_header_hash(header).map_err(|e| e.to_string())?;
        if self.handles.contains_key(&hash) {
            return Err("duplicate header".into());
        }
        let prev_handle = *self
            .handles
            .get(&header.prev)
            .ok_or("unknown previous header")?;

        let prev_height = self.chain.get(prev_handle).height;
        if header.height != prev_height + 1 {
            log::warn!("rejecting {hash}: height {} does not extend {prev_height}", header.height);
            return Err("discontinuous height".into());
        }

        let expected = get_next_work_required(&self.chain, prev_handle, header, params)
            .map_err(|e| e.to_string())?;
        if header.bits != expected {
            log::warn!(
                "rejecting {hash}: incorrect difficulty {:#010x}, expected {expected:#010x}",
                header.bits
            );
            return Err("incorrect difficulty".into());
        }

        if let Err(e) = check_proof_of_stake(header, self.chain.get(prev_handle), params, view, oracle)
        {
            log::warn!("rejecting {hash}: {e}");
            return Err(e.to_string());
        }

        let parent_work = self.work.get(&header.prev).ok_or("missing parent work")?;
        let cum = cumulative_work(parent_work, header.bits).map_err(|e| e.to_string())?;

        let record = IndexRecord {
            height: header.height,
            time: header.time,
            bits: header.bits,
            stake_modifier: header.stake_modifier,
            prev: header.prev,
            cumulative_work: cum.to_bytes_be(),
        };

        let improves = tip_improves(&cum, &hash, &self.work[&self.best], &self.best);
        self.db
            .upsert_header(hash, header, &record, improves.then_some(hash))?;

        let handle = self.chain.push(
            Some(prev_handle),
            hash,
            header.time,
            header.bits,
            header.stake_modifier,
        );
        self.handles.insert(hash, handle);
        self.work.insert(hash, cum);

        if improves {
            self.best = hash;
            log::info!("new best tip {hash} at height {}", header.height);
        } else {
            log::debug!("accepted side header {hash} at height {}", header.height);
        }
        Ok(())
    }

    /// Re-run the stateless proof-of-stake check over every stored
    /// non-genesis header. Returns the number of headers revalidated.
    pub fn revalidate_headers(
        &self,
        params: &PosParams,
        view: &dyn MasternodeView,
        oracle: &dyn KernelHashOracle,
    ) -> Result<u64, String> {
        let mut records = self.db.all_records()?;
        records.sort_by_key(|(_, r)| r.height);

        let mut checked = 0;
        for (hash, record) in records {
            if record.height == 0 {
                continue;
            }
            let header = self
                .db
                .get_header(&hash)?
                .ok_or("header missing for index record")?;
            check_proof_of_stake_header_only(&header, params, view, oracle)
                .map_err(|e| format!("header {hash} failed recheck: {e}"))?;
            checked += 1;
        }
        Ok(checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel_oracle::DevKernelOracle;
    use tempfile::tempdir;
    use vireo_core::{
        compute_stake_modifier, header_signing_hash, key_id, sign_compact, KeyId, MasternodeId,
        PublicKey, SecretKey, GENESIS_BITS, GENESIS_TIMESTAMP, PROTOCOL_VERSION, SECP256K1,
    };

    struct EmptyView;

    impl MasternodeView for EmptyView {
        fn masternode_by_operator(&self, _operator: &KeyId) -> Option<MasternodeId> {
            None
        }
    }

    fn secret(last_byte: u8) -> SecretKey {
        let mut bytes = [0u8; 32];
        bytes[31] = last_byte;
        SecretKey::from_slice(&bytes).expect("secret key")
    }

    fn genesis() -> BlockHeader {
        BlockHeader {
            version: PROTOCOL_VERSION,
            prev: Hash32::zero(),
            height: 0,
            time: GENESIS_TIMESTAMP,
            bits: GENESIS_BITS,
            tx_merkle_root: Hash32::zero(),
            stake_modifier: Hash32::zero(),
            sig: vec![],
        }
    }

    /// Mint a child header, grinding the timestamp until the devnet
    /// kernel accepts it, then signing.
    fn mint_child(prev: &BlockHeader, sk: &SecretKey) -> BlockHeader {
        let params = PosParams::regtest();
        let minter = key_id(&PublicKey::from_secret_key(SECP256K1, sk));
        let modifier = compute_stake_modifier(&prev.stake_modifier, &minter);

        let mut time = prev.time + 1;
        for _ in 0..10_000 {
            let check =
                DevKernelOracle.check(&modifier, GENESIS_BITS, time, &params, &EmptyView);
            if check.hash_ok {
                let mut header = BlockHeader {
                    version: PROTOCOL_VERSION,
                    prev: block_header_hash(prev).expect("hash"),
                    height: prev.height + 1,
                    time,
                    bits: GENESIS_BITS,
                    tx_merkle_root: Hash32::zero(),
                    stake_modifier: modifier,
                    sig: vec![],
                };
                let digest = header_signing_hash(&header).expect("digest");
                header.sig = sign_compact(&digest, sk).expect("sign");
                return header;
            }
            time += 1;
        }
        panic!("failed to find a staking timestamp");
    }

    #[test]
    fn accepts_minted_chain_and_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let params = PosParams::regtest();
        let genesis = genesis();

        {
            let mut store = ChainStore::load_or_init(&path, genesis.clone()).unwrap();
            let mut tip = genesis.clone();
            for i in 1..=5u8 {
                let child = mint_child(&tip, &secret(i));
                store.accept_header(&child, &params, &EmptyView, &DevKernelOracle).unwrap();
                tip = child;
            }
            assert_eq!(store.best_index().height, 5);
            assert_eq!(store.revalidate_headers(&params, &EmptyView, &DevKernelOracle).unwrap(), 5);
        }

        let store = ChainStore::load_or_init(&path, genesis).unwrap();
        assert_eq!(store.best_index().height, 5);

        let tip_hash = store.best_hash();
        assert!(store.contains(&tip_hash));
        let tip_header = store.header(&tip_hash).unwrap().unwrap();
        assert_eq!(tip_header.height, 5);
    }

    #[test]
    fn rejects_incorrect_difficulty() {
        let dir = tempdir().unwrap();
        let params = PosParams::regtest();
        let genesis = genesis();
        let mut store = ChainStore::load_or_init(&dir.path().join("db"), genesis.clone()).unwrap();

        // Regtest freezes difficulty, so anything but the genesis bits is wrong.
        let mut child = mint_child(&genesis, &secret(1));
        child.bits = 0x1f7f_ffff;
        let digest = header_signing_hash(&child).unwrap();
        child.sig = sign_compact(&digest, &secret(1)).unwrap();

        let err = store
            .accept_header(&child, &params, &EmptyView, &DevKernelOracle)
            .unwrap_err();
        assert_eq!(err, "incorrect difficulty");
    }

    #[test]
    fn rejects_tampered_stake_modifier() {
        let dir = tempdir().unwrap();
        let params = PosParams::regtest();
        let genesis = genesis();
        let mut store = ChainStore::load_or_init(&dir.path().join("db"), genesis.clone()).unwrap();

        let mut child = mint_child(&genesis, &secret(1));
        child.stake_modifier = Hash32([0xee; 32]);
        let digest = header_signing_hash(&child).unwrap();
        child.sig = sign_compact(&digest, &secret(1)).unwrap();

        let err = store
            .accept_header(&child, &params, &EmptyView, &DevKernelOracle)
            .unwrap_err();
        assert_eq!(err, "stake modifier mismatch");
        assert_eq!(store.best_index().height, 0);
    }

    #[test]
    fn rejects_duplicates_and_orphans() {
        let dir = tempdir().unwrap();
        let params = PosParams::regtest();
        let genesis = genesis();
        let mut store = ChainStore::load_or_init(&dir.path().join("db"), genesis.clone()).unwrap();

        let child = mint_child(&genesis, &secret(1));
        store.accept_header(&child, &params, &EmptyView, &DevKernelOracle).unwrap();
        assert_eq!(
            store.accept_header(&child, &params, &EmptyView, &DevKernelOracle).unwrap_err(),
            "duplicate header"
        );

        // A grandchild of an unknown parent is an orphan.
        let orphan = {
            let mut fake_parent = child.clone();
            fake_parent.prev = Hash32([0x77; 32]);
            let digest = header_signing_hash(&fake_parent).unwrap();
            fake_parent.sig = sign_compact(&digest, &secret(2)).unwrap();
            fake_parent
        };
        assert_eq!(
            store.accept_header(&orphan, &params, &EmptyView, &DevKernelOracle).unwrap_err(),
            "unknown previous header"
        );
    }
}
