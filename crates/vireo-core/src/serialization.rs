// Consensus-critical. Changes require protocol review + tests.
//! Canonical serialization helpers.
//!
//! Rule: all consensus-critical objects are encoded with Borsh.
//! Do not use JSON or non-canonical formats for hashing/signing/consensus.

use crate::constants::*;
use crate::types::{BlockHeader, CoreError, Hash32};
use borsh::{to_vec, BorshSerialize};

/// Encode a value with canonical Borsh encoding.
pub fn to_bytes<T: BorshSerialize>(v: &T) -> Result<Vec<u8>, CoreError> {
    to_vec(v).map_err(|_| CoreError::InvalidValue("borsh serialization failed"))
}

/// Hash bytes with blake3 and return 32 bytes.
pub fn hash32(domain_sep: &[u8], bytes: &[u8]) -> Hash32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain_sep);
    hasher.update(bytes);
    let out = hasher.finalize();
    let mut arr = [0u8; HASH32_LEN];
    arr.copy_from_slice(out.as_bytes());
    Hash32(arr)
}

/// Canonical block header hash = BLAKE3(DS_BLOCK_HEADER || borsh(header)).
pub fn block_header_hash(h: &BlockHeader) -> Result<Hash32, CoreError> {
    let bytes = to_bytes(h)?;
    Ok(hash32(DS_BLOCK_HEADER, &bytes))
}

/// Canonical signing image of a header: every field except `sig`.
fn header_signing_bytes(h: &BlockHeader) -> Result<Vec<u8>, CoreError> {
    fn write_fields(h: &BlockHeader, out: &mut Vec<u8>) -> std::io::Result<()> {
        h.version.serialize(out)?;
        h.prev.serialize(out)?;
        h.height.serialize(out)?;
        h.time.serialize(out)?;
        h.bits.serialize(out)?;
        h.tx_merkle_root.serialize(out)?;
        h.stake_modifier.serialize(out)?;
        Ok(())
    }

    let mut out = Vec::with_capacity(128);
    write_fields(h, &mut out)
        .map_err(|_| CoreError::InvalidValue("borsh serialization failed"))?;
    Ok(out)
}

/// Digest a minter signs over: BLAKE3(DS_HEADER_SIGN || signing image).
///
/// Excluding `sig` keeps the digest stable across signing, so the header
/// can carry its own signature.
pub fn header_signing_hash(h: &BlockHeader) -> Result<Hash32, CoreError> {
    let bytes = header_signing_bytes(h)?;
    Ok(hash32(DS_HEADER_SIGN, &bytes))
}
