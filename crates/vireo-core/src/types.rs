// Consensus-critical. Changes require protocol review + tests.
//! Canonical protocol types for Vireo v0.
//!
//! This module defines all consensus-visible data structures and primitive
//! value types used across the protocol. All types here must remain
//! backward-compatible once released.

use crate::constants::*;
use borsh::{BorshDeserialize, BorshSerialize};
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors related to parsing, validation, or construction of core protocol types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Hex string had an unexpected byte length.
    #[error("invalid hex length: expected {expected} bytes, got {got} bytes")]
    InvalidHexLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes provided.
        got: usize,
    },

    /// Hex decoding failed.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Arithmetic overflow or underflow occurred.
    #[error("amount overflow or underflow")]
    AmountOverflow,

    /// A value violated protocol constraints.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),

    /// Signature bytes could not be decoded or no key could be recovered.
    #[error("signature recovery failed: {0}")]
    SignatureRecovery(&'static str),
}

/// Fixed-size 32-byte hash used throughout the protocol.
///
/// The all-zero value doubles as the legacy "null" sentinel carried by
/// genesis headers in `prev` and `stake_modifier`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hash32(pub [u8; HASH32_LEN]);

impl Hash32 {
    /// Returns an all-zero hash.
    pub const fn zero() -> Self {
        Self([0u8; HASH32_LEN])
    }

    /// Returns the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; HASH32_LEN] {
        &self.0
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; HASH32_LEN]> for Hash32 {
    fn from(value: [u8; HASH32_LEN]) -> Self {
        Self(value)
    }
}

impl From<Hash32> for [u8; HASH32_LEN] {
    fn from(value: Hash32) -> Self {
        value.0
    }
}

impl FromStr for Hash32 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != HASH32_LEN {
            return Err(CoreError::InvalidHexLength {
                expected: HASH32_LEN,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH32_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

/// Block hash type.
pub type BlockHash = Hash32;

/// Masternode identifier type.
pub type MasternodeId = Hash32;

/// Identifier of the key that minted (signed) a block.
///
/// Derived from the minter's public key; see [`crate::crypto::key_id`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyId(pub [u8; KEY_ID_LEN]);

impl KeyId {
    /// Returns an all-zero key identifier.
    pub const fn zero() -> Self {
        Self([0u8; KEY_ID_LEN])
    }

    /// Returns the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; KEY_ID_LEN] {
        &self.0
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", hex::encode(self.0))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for KeyId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != KEY_ID_LEN {
            return Err(CoreError::InvalidHexLength {
                expected: KEY_ID_LEN,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_ID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

/// Amount expressed in the smallest unit ("atoms").
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Amount(pub u64);

impl Amount {
    /// Returns a zero amount.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Constructs an amount from atoms.
    pub const fn from_atoms(atoms: u64) -> Self {
        Self(atoms)
    }

    /// Returns the underlying atom value.
    pub const fn atoms(self) -> u64 {
        self.0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Amount) -> Result<Self, CoreError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(CoreError::AmountOverflow)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Amount) -> Result<Self, CoreError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(CoreError::AmountOverflow)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({} atoms)", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} atoms", self.0)
    }
}

/// Identifier of a token tracked by the accounts ledger.
///
/// Token `0` is the native chain token.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TokenId(pub u32);

impl TokenId {
    /// The native chain token.
    pub const NATIVE: TokenId = TokenId(0);
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An amount of a specific token.
#[derive(Clone, Copy, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TokenAmount {
    /// The token the amount is denominated in.
    pub token: TokenId,
    /// The amount in atoms of that token.
    pub amount: Amount,
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.token)
    }
}

/// Block header containing consensus-critical metadata.
///
/// `prev` and `stake_modifier` are the zero hash only at genesis; `sig`
/// is empty only at genesis. Those invariants are enforced by the
/// consensus layer, not here.
#[derive(Clone, PartialEq, Eq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockHeader {
    /// Protocol version.
    pub version: u16,
    /// Hash of the previous block (zero at genesis).
    pub prev: BlockHash,
    /// Height of this block in the chain.
    pub height: u64,
    /// Block timestamp (Unix seconds).
    pub time: u64,
    /// Compact difficulty target.
    pub bits: u32,
    /// Merkle root of transaction identifiers.
    pub tx_merkle_root: Hash32,
    /// Chained stake modifier (zero at genesis).
    pub stake_modifier: Hash32,
    /// Compact recoverable signature by the minter (empty at genesis).
    pub sig: Vec<u8>,
}

impl BlockHeader {
    /// Performs basic structural validation.
    ///
    /// Consensus rules (genesis invariants, signature recovery, stake
    /// modifier chaining) live in the consensus crate.
    pub fn validate_sanity(&self) -> Result<(), CoreError> {
        if self.version != PROTOCOL_VERSION {
            return Err(CoreError::InvalidValue("unsupported header version"));
        }
        if !self.sig.is_empty() && self.sig.len() != COMPACT_SIG_LEN {
            return Err(CoreError::InvalidValue("signature has unexpected length"));
        }
        Ok(())
    }
}
