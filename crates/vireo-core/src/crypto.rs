// Consensus-critical. Changes require protocol review + tests.
//! Crypto wrapper interfaces.
//!
//! Important: this crate intentionally does NOT implement novel
//! cryptography. It wraps secp256k1 recoverable signatures in the legacy
//! 65-byte compact encoding and wires the domain-separated derivations
//! (key ids, stake-modifier chaining, kernel preimage) used by higher
//! layers. The staking kernel's full evaluation lives behind an oracle
//! trait in the consensus crate.

use crate::constants::*;
use crate::serialization::{hash32, header_signing_hash};
use crate::types::{BlockHeader, CoreError, Hash32, KeyId};

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::Message;

pub use secp256k1::{PublicKey, SecretKey, SECP256K1};

fn key_id_from_serialization(ser: &[u8]) -> KeyId {
    let h = hash32(DS_KEY_ID, ser);
    let mut out = [0u8; KEY_ID_LEN];
    out.copy_from_slice(&h.as_bytes()[..KEY_ID_LEN]);
    KeyId(out)
}

/// Derive the key identifier for a public key.
///
/// `key_id = BLAKE3(DS_KEY_ID || compressed pubkey)[..20]`
pub fn key_id(pubkey: &PublicKey) -> KeyId {
    key_id_from_serialization(&pubkey.serialize())
}

/// Recover the public key from a compact recoverable signature.
///
/// Layout is the legacy one: `sig[0] = 27 + recovery_id (+4 if the key
/// is compressed)`, followed by the 64-byte (r, s) pair.
pub fn recover_compact(digest: &Hash32, sig: &[u8]) -> Result<PublicKey, CoreError> {
    if sig.len() != COMPACT_SIG_LEN {
        return Err(CoreError::SignatureRecovery("unexpected signature length"));
    }
    let header = sig[0];
    if !(27..=34).contains(&header) {
        return Err(CoreError::SignatureRecovery("invalid recovery header byte"));
    }
    let rec_id = RecoveryId::from_i32(((header - 27) & 0x03) as i32)
        .map_err(|_| CoreError::SignatureRecovery("invalid recovery id"))?;
    let rsig = RecoverableSignature::from_compact(&sig[1..], rec_id)
        .map_err(|_| CoreError::SignatureRecovery("malformed signature body"))?;
    let msg = Message::from_digest_slice(digest.as_bytes())
        .map_err(|_| CoreError::SignatureRecovery("invalid digest"))?;
    SECP256K1
        .recover_ecdsa(&msg, &rsig)
        .map_err(|_| CoreError::SignatureRecovery("no key recovered"))
}

/// Produce a compact recoverable signature over a digest.
///
/// Minters always sign with compressed keys, so the recovery header is
/// `31 + recovery_id`.
pub fn sign_compact(digest: &Hash32, secret: &SecretKey) -> Result<Vec<u8>, CoreError> {
    let msg = Message::from_digest_slice(digest.as_bytes())
        .map_err(|_| CoreError::SignatureRecovery("invalid digest"))?;
    let sig = SECP256K1.sign_ecdsa_recoverable(&msg, secret);
    let (rec_id, body) = sig.serialize_compact();

    let mut out = vec![0u8; COMPACT_SIG_LEN];
    out[0] = 27 + rec_id.to_i32() as u8 + 4;
    out[1..].copy_from_slice(&body);
    Ok(out)
}

/// Recover the minter key identifier carried by a header's signature.
///
/// Fails on an empty or malformed signature. The recovery header's
/// compression marker selects which serialization of the recovered key
/// the identifier is derived from, so the identity follows the form the
/// signer committed to.
pub fn extract_minter_key(header: &BlockHeader) -> Result<KeyId, CoreError> {
    if header.sig.len() != COMPACT_SIG_LEN {
        return Err(CoreError::SignatureRecovery("unexpected signature length"));
    }
    let digest = header_signing_hash(header)?;
    let pubkey = recover_compact(&digest, &header.sig)?;

    let compressed = (header.sig[0].wrapping_sub(27)) & 0x04 != 0;
    Ok(if compressed {
        key_id_from_serialization(&pubkey.serialize())
    } else {
        key_id_from_serialization(&pubkey.serialize_uncompressed())
    })
}

/// Chain the stake modifier forward by one block.
///
/// `modifier(h) = BLAKE3(DS_STAKE_MODIFIER || modifier(h-1) || minter_key(h))`
///
/// Order-sensitive and collision-resistant; every non-genesis block must
/// carry exactly this value.
pub fn compute_stake_modifier(prev_modifier: &Hash32, minter: &KeyId) -> Hash32 {
    let mut input = [0u8; HASH32_LEN + KEY_ID_LEN];
    input[..HASH32_LEN].copy_from_slice(prev_modifier.as_bytes());
    input[HASH32_LEN..].copy_from_slice(minter.as_bytes());
    hash32(DS_STAKE_MODIFIER, &input)
}

/// Kernel-hash preimage wiring: `BLAKE3(DS_KERNEL || modifier || time)`.
///
/// This is plumbing for oracle implementations and tooling; whether the
/// value satisfies the staking condition is decided by the consensus
/// layer's kernel oracle, not here.
pub fn kernel_hash(stake_modifier: &Hash32, time: u64) -> Hash32 {
    let mut input = [0u8; HASH32_LEN + 8];
    input[..HASH32_LEN].copy_from_slice(stake_modifier.as_bytes());
    input[HASH32_LEN..].copy_from_slice(&time.to_le_bytes());
    hash32(DS_KERNEL, &input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GENESIS_BITS, PROTOCOL_VERSION};

    fn secret(last_byte: u8) -> SecretKey {
        let mut bytes = [0u8; 32];
        bytes[31] = last_byte;
        SecretKey::from_slice(&bytes).expect("secret key")
    }

    fn signed_header(sk: &SecretKey) -> BlockHeader {
        let mut header = BlockHeader {
            version: PROTOCOL_VERSION,
            prev: Hash32([1u8; 32]),
            height: 1,
            time: 1_700_000_000,
            bits: GENESIS_BITS,
            tx_merkle_root: Hash32::zero(),
            stake_modifier: Hash32([2u8; 32]),
            sig: vec![],
        };
        let digest = header_signing_hash(&header).expect("digest");
        header.sig = sign_compact(&digest, sk).expect("sign");
        header
    }

    #[test]
    fn sign_then_recover_roundtrip() {
        let sk = secret(7);
        let expected = PublicKey::from_secret_key(SECP256K1, &sk);
        let digest = Hash32([0x42; 32]);

        let sig = sign_compact(&digest, &sk).unwrap();
        let recovered = recover_compact(&digest, &sig).unwrap();
        assert_eq!(recovered, expected);
    }

    #[test]
    fn recover_rejects_bad_lengths_and_headers() {
        let digest = Hash32([0x42; 32]);
        assert!(recover_compact(&digest, &[]).is_err());
        assert!(recover_compact(&digest, &[0u8; 64]).is_err());

        let sig = sign_compact(&digest, &secret(7)).unwrap();
        let mut bad = sig.clone();
        bad[0] = 0; // recovery header out of range
        assert!(recover_compact(&digest, &bad).is_err());
    }

    #[test]
    fn extract_minter_key_matches_signer() {
        let sk = secret(9);
        let header = signed_header(&sk);
        let expected = key_id(&PublicKey::from_secret_key(SECP256K1, &sk));
        assert_eq!(extract_minter_key(&header).unwrap(), expected);
    }

    #[test]
    fn extract_minter_key_fails_on_empty_sig() {
        let sk = secret(9);
        let mut header = signed_header(&sk);
        header.sig.clear();
        assert!(extract_minter_key(&header).is_err());
    }

    #[test]
    fn stake_modifier_is_order_sensitive() {
        let a = Hash32([1u8; 32]);
        let k1 = KeyId([1u8; 20]);
        let k2 = KeyId([2u8; 20]);

        assert_ne!(
            compute_stake_modifier(&a, &k1),
            compute_stake_modifier(&a, &k2)
        );

        // Chaining in a different order gives a different end state.
        let ab = compute_stake_modifier(&compute_stake_modifier(&a, &k1), &k2);
        let ba = compute_stake_modifier(&compute_stake_modifier(&a, &k2), &k1);
        assert_ne!(ab, ba);
    }

    #[test]
    fn kernel_hash_depends_on_both_inputs() {
        let m = Hash32([4u8; 32]);
        assert_ne!(kernel_hash(&m, 1), kernel_hash(&m, 2));
        assert_ne!(kernel_hash(&m, 1), kernel_hash(&Hash32([5u8; 32]), 1));
    }
}
