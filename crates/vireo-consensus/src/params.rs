//! Proof-of-stake consensus parameters.

use num_bigint::BigUint;

/// Easiest allowed target on mainnet (compact `0x1e0fffff`).
const DIFF_LIMIT_MAIN: [u8; 32] = [
    0x00, 0x00, 0x0f, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00,
];

/// Easiest allowed target on testnet/regtest (compact `0x207fffff`).
const DIFF_LIMIT_TEST: [u8; 32] = [
    0x7f, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00,
];

/// Immutable proof-of-stake configuration for one network.
///
/// Lifecycle is owned by the caller; validation code only ever borrows
/// these parameters.
#[derive(Clone, Debug)]
pub struct PosParams {
    /// Total time window of one retarget interval, in seconds.
    pub target_timespan: u64,
    /// Target time between blocks, in seconds. Must be non-zero.
    pub target_spacing: u64,
    /// Easiest allowed target (minimum difficulty).
    pub diff_limit: BigUint,
    /// Freeze difficulty entirely (regtest mode).
    pub no_retargeting: bool,
    /// Allow minimum-difficulty blocks after a timestamp gap (testnet mode).
    pub allow_min_difficulty_blocks: bool,
}

impl PosParams {
    /// Mainnet parameters: 30-second spacing, 5-minute retarget window.
    pub fn mainnet() -> Self {
        Self {
            target_timespan: 5 * 60,
            target_spacing: 30,
            diff_limit: BigUint::from_bytes_be(&DIFF_LIMIT_MAIN),
            no_retargeting: false,
            allow_min_difficulty_blocks: false,
        }
    }

    /// Testnet parameters: mainnet schedule with the min-difficulty escape.
    pub fn testnet() -> Self {
        Self {
            diff_limit: BigUint::from_bytes_be(&DIFF_LIMIT_TEST),
            allow_min_difficulty_blocks: true,
            ..Self::mainnet()
        }
    }

    /// Regtest parameters: difficulty frozen, everything easy.
    pub fn regtest() -> Self {
        Self {
            diff_limit: BigUint::from_bytes_be(&DIFF_LIMIT_TEST),
            no_retargeting: true,
            allow_min_difficulty_blocks: true,
            ..Self::mainnet()
        }
    }

    /// Number of blocks between difficulty retargets.
    pub fn difficulty_adjustment_interval(&self) -> u64 {
        self.target_timespan / self.target_spacing
    }
}
