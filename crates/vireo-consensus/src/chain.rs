// Consensus-critical. Changes require protocol review + tests.
//! Arena-backed chain index.
//!
//! Accepted headers are summarized into [`BlockIndex`] entries owned by a
//! [`ChainIndex`] arena and addressed by integer [`Handle`]s. The arena is
//! append-only: entries are never mutated after linking, so the whole
//! index can be shared read-only across concurrent validators. Forks are
//! just entries sharing a `prev` handle.
//!
//! Each entry carries a skip pointer to a strategically chosen lower
//! height, keeping [`ChainIndex::ancestor`] sub-linear instead of walking
//! parent links one by one.

use vireo_core::Hash32;

/// Index of an entry inside a [`ChainIndex`] arena.
///
/// Handles are only meaningful for the arena that issued them.
pub type Handle = usize;

/// An accepted block's consensus summary, linked into the chain.
#[derive(Clone, Debug)]
pub struct BlockIndex {
    /// Hash of the block's header.
    pub hash: Hash32,
    /// Height of the block.
    pub height: u64,
    /// Block timestamp (Unix seconds).
    pub time: u64,
    /// Compact difficulty target the block was accepted at.
    pub bits: u32,
    /// Stake modifier carried by the block.
    pub stake_modifier: Hash32,
    prev: Option<Handle>,
    skip: Option<Handle>,
}

impl BlockIndex {
    /// Handle of the parent entry, `None` for genesis.
    pub fn prev(&self) -> Option<Handle> {
        self.prev
    }
}

/// Append-only arena of [`BlockIndex`] entries.
#[derive(Clone, Debug, Default)]
pub struct ChainIndex {
    entries: Vec<BlockIndex>,
}

// Turn off the lowest set bit of n.
fn invert_lowest_one(n: u64) -> u64 {
    n & n.wrapping_sub(1)
}

// Height the skip pointer of an entry at `height` should jump to.
fn skip_height(height: u64) -> u64 {
    if height < 2 {
        return 0;
    }
    // Alternate heights slightly so that ancestor walks can descend
    // through both the skip and the parent link.
    if height & 1 == 1 {
        invert_lowest_one(invert_lowest_one(height - 1)) + 1
    } else {
        invert_lowest_one(height)
    }
}

impl ChainIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Number of entries in the arena (across all forks).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the arena holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the entry behind a handle.
    ///
    /// Panics if the handle was not issued by this arena.
    pub fn get(&self, handle: Handle) -> &BlockIndex {
        &self.entries[handle]
    }

    /// Link a new entry under `prev` (`None` for genesis) and return its handle.
    ///
    /// Height is derived from the parent; the skip pointer is resolved
    /// immediately since all ancestors are already linked.
    pub fn push(
        &mut self,
        prev: Option<Handle>,
        hash: Hash32,
        time: u64,
        bits: u32,
        stake_modifier: Hash32,
    ) -> Handle {
        let height = match prev {
            Some(p) => self.entries[p].height + 1,
            None => 0,
        };
        let skip = prev.and_then(|p| self.ancestor(p, skip_height(height)));

        self.entries.push(BlockIndex {
            hash,
            height,
            time,
            bits,
            stake_modifier,
            prev,
            skip,
        });
        self.entries.len() - 1
    }

    /// Handle of the ancestor of `from` at exactly `height`.
    ///
    /// Returns `None` when `height` is above the entry itself or the
    /// lineage is incomplete. Descends through skip pointers whenever
    /// they do not overshoot the requested height.
    pub fn ancestor(&self, from: Handle, height: u64) -> Option<Handle> {
        if height > self.entries[from].height {
            return None;
        }
        let mut cur = from;
        while self.entries[cur].height > height {
            let entry = &self.entries[cur];
            cur = match (entry.skip, entry.prev) {
                (Some(s), _) if self.entries[s].height >= height => s,
                (_, Some(p)) => p,
                _ => return None,
            };
        }
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_for(i: u64) -> Hash32 {
        let mut b = [0u8; 32];
        b[..8].copy_from_slice(&i.to_le_bytes());
        Hash32(b)
    }

    fn linear_chain(len: u64) -> (ChainIndex, Vec<Handle>) {
        let mut chain = ChainIndex::new();
        let mut handles = Vec::new();
        let mut prev = None;
        for h in 0..len {
            let handle = chain.push(prev, hash_for(h), 1000 + h, 0x207f_ffff, hash_for(h ^ 0xff));
            handles.push(handle);
            prev = Some(handle);
        }
        (chain, handles)
    }

    #[test]
    fn heights_follow_parent_links() {
        let (chain, handles) = linear_chain(10);
        for (i, &h) in handles.iter().enumerate() {
            assert_eq!(chain.get(h).height, i as u64);
        }
        assert_eq!(chain.get(handles[0]).prev(), None);
        assert_eq!(chain.get(handles[5]).prev(), Some(handles[4]));
    }

    #[test]
    fn ancestor_matches_linear_walk() {
        let (chain, handles) = linear_chain(257);
        let tip = handles[256];

        for target in [0u64, 1, 2, 63, 64, 100, 127, 128, 200, 255, 256] {
            let found = chain.ancestor(tip, target).unwrap();
            assert_eq!(chain.get(found).height, target);
            assert_eq!(found, handles[target as usize]);
        }
    }

    #[test]
    fn ancestor_above_height_is_none() {
        let (chain, handles) = linear_chain(5);
        assert!(chain.ancestor(handles[2], 3).is_none());
        assert_eq!(chain.ancestor(handles[2], 2), Some(handles[2]));
    }

    #[test]
    fn forks_share_ancestry() {
        let (mut chain, handles) = linear_chain(5);

        // Fork off height 2 with an alternative entry at height 3.
        let alt = chain.push(Some(handles[2]), hash_for(1000), 9999, 0x207f_ffff, hash_for(7));
        assert_eq!(chain.get(alt).height, 3);
        assert_eq!(chain.ancestor(alt, 1), Some(handles[1]));
        assert_eq!(chain.ancestor(handles[4], 1), Some(handles[1]));
    }
}
