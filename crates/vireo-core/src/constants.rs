//! Protocol-wide constants for Vireo v0.

/// Protocol semantic version (v0).
pub const PROTOCOL_VERSION: u16 = 0;

/// Human-readable chain identifier.
pub const CHAIN_ID: &str = "vireo-v0";

/// Length in bytes of a 32-byte hash.
pub const HASH32_LEN: usize = 32;

/// Length in bytes of a minter key identifier.
pub const KEY_ID_LEN: usize = 20;

/// Length in bytes of a compact recoverable signature.
///
/// One recovery header byte followed by the 64-byte (r, s) pair.
pub const COMPACT_SIG_LEN: usize = 65;

/// Domain separator used when hashing block headers.
///
/// Prevents cross-domain hash collisions.
pub const DS_BLOCK_HEADER: &[u8] = b"VIREO::BLOCK_HEADER::V0";

/// Domain separator used when hashing a header for signing.
///
/// The signing image excludes the signature field itself.
pub const DS_HEADER_SIGN: &[u8] = b"VIREO::HEADER_SIGN::V0";

/// Domain separator used when deriving minter key identifiers.
pub const DS_KEY_ID: &[u8] = b"VIREO::KEY_ID::V0";

/// Domain separator used when chaining stake modifiers.
pub const DS_STAKE_MODIFIER: &[u8] = b"VIREO::STAKE_MODIFIER::V0";

/// Domain separator used by the kernel-hash wiring.
pub const DS_KERNEL: &[u8] = b"VIREO::KERNEL::V0";

/// Timestamp of the genesis header (Unix seconds).
pub const GENESIS_TIMESTAMP: u64 = 1_718_000_000;

/// Compact difficulty target carried by the genesis header.
pub const GENESIS_BITS: u32 = 0x207f_ffff;
