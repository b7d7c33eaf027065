// Consensus-critical. Changes require protocol review + tests.
//! Difficulty target utilities and interval retargeting.
//!
//! Vireo uses a Bitcoin-style "compact" encoding in `BlockHeader.bits`.
//! This encodes a 256-bit target as: `bits = (exponent << 24) | mantissa`
//! where mantissa is 3 bytes. The target is interpreted as:
//!
//! - exponent = (bits >> 24) as u8
//! - mantissa = bits & 0x007fffff (we reject sign bit)
//!
//! Then: target = mantissa * 2^(8*(exponent-3))
//!
//! Conversions are strict and float-free. Retargeting recomputes the
//! target once per adjustment interval from the observed timespan,
//! clamped to a quarter/quadruple of the configured window and never
//! easier than `diff_limit`.

use crate::chain::{BlockIndex, ChainIndex, Handle};
use crate::error::ConsensusError;
use crate::params::PosParams;
use num_bigint::BigUint;
use num_traits::Zero;
use vireo_core::BlockHeader;

/// Decode compact `bits` to a full target (`BigUint`).
///
/// Rejects encodings that are negative, overflow-prone, or represent zero.
pub fn bits_to_target(bits: u32) -> Result<BigUint, ConsensusError> {
    let exponent = ((bits >> 24) & 0xff) as u8;
    let mantissa = bits & 0x00ff_ffff;

    // Reject negative targets (sign bit set in mantissa).
    if (bits & 0x0080_0000) != 0 {
        return Err(ConsensusError::InvalidBits);
    }

    if mantissa == 0 {
        return Err(ConsensusError::InvalidTarget);
    }

    let mant = BigUint::from(mantissa as u64);

    // Compute: mantissa * 2^(8*(exponent-3))
    let target = if exponent <= 3 {
        let shift = 8u32 * (3u32 - exponent as u32);
        mant >> shift
    } else {
        let shift = 8u32 * (exponent as u32 - 3u32);
        mant << shift
    };

    if target.is_zero() {
        return Err(ConsensusError::InvalidTarget);
    }

    Ok(target)
}

/// Encode a target (`BigUint`) into compact `bits`.
///
/// The encoding is normalized so that decode(encode(t)) is stable for
/// every canonically encoded chain value.
pub fn target_to_bits(target: &BigUint) -> Result<u32, ConsensusError> {
    if target.is_zero() {
        return Err(ConsensusError::InvalidTarget);
    }

    // Big-endian bytes without leading zeros.
    let mut bytes = target.to_bytes_be();
    // exponent is number of bytes.
    let mut exponent = bytes.len() as u32;

    let mut mantissa: u32;

    if bytes.len() >= 3 {
        mantissa = ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32);
    } else {
        // Pad to 3 bytes.
        while bytes.len() < 3 {
            bytes.push(0);
        }
        mantissa = ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32);
    }

    // If mantissa's highest bit is set, shift it right by 8 and increase exponent.
    if (mantissa & 0x0080_0000) != 0 {
        mantissa >>= 8;
        exponent = exponent.checked_add(1).ok_or(ConsensusError::InvalidBits)?;
    }

    // Compose bits (no sign bit, mantissa is 23 bits).
    mantissa &= 0x00ff_ffff;
    if mantissa == 0 {
        return Err(ConsensusError::InvalidBits);
    }

    if exponent > 255 {
        return Err(ConsensusError::InvalidBits);
    }

    Ok((exponent << 24) | mantissa)
}

/// Compare a 32-byte hash value (big-endian) with a target.
/// Returns `true` if `hash <= target`.
pub fn hash_meets_target(hash_be: &[u8; 32], target: &BigUint) -> bool {
    let h = BigUint::from_bytes_be(hash_be);
    h <= *target
}

/// Recompute the compact target from one observed retarget window.
///
/// `first_block_time` is the timestamp of the first block of the window;
/// `prev` closes it. The observed timespan is clamped into
/// `[target_timespan/4, target_timespan*4]` before scaling, and the
/// result never exceeds `diff_limit`. Decode failure of `prev.bits`
/// means the chain itself is corrupt; it cannot happen for values this
/// module encoded.
pub fn calculate_next_work_required(
    prev: &BlockIndex,
    first_block_time: u64,
    params: &PosParams,
) -> Result<u32, ConsensusError> {
    if params.no_retargeting {
        return Ok(prev.bits);
    }

    // Limit adjustment step.
    let timespan = params.target_timespan as i64;
    let actual = (prev.time as i64 - first_block_time as i64).clamp(timespan / 4, timespan * 4);

    // Retarget with 256-bit arithmetic; `actual` is positive after the clamp.
    let mut new_target = bits_to_target(prev.bits)? * (actual as u64) / params.target_timespan;

    if new_target > params.diff_limit {
        new_target = params.diff_limit.clone();
    }

    target_to_bits(&new_target)
}

/// Compact target a header extending `prev` must carry.
///
/// Off-boundary heights inherit `prev.bits`, except in
/// min-difficulty mode where a large timestamp gap drops to the network
/// minimum and subsequent blocks walk back to the last real difficulty.
/// On a boundary the window is re-measured from the ancestor
/// `interval - 1` blocks back.
///
/// # Panics
///
/// Panics if the retarget ancestor is missing from the index. The arena
/// links every accepted header to its full lineage, so a miss is a
/// chain-integrity bug, not a validation outcome.
pub fn get_next_work_required(
    chain: &ChainIndex,
    prev: Handle,
    header: &BlockHeader,
    params: &PosParams,
) -> Result<u32, ConsensusError> {
    let prev_entry = chain.get(prev);
    let interval = params.difficulty_adjustment_interval();

    // Only change once per difficulty adjustment interval.
    if (prev_entry.height + 1) % interval != 0 {
        if params.allow_min_difficulty_blocks {
            let limit_bits = target_to_bits(&params.diff_limit)?;

            // If the candidate's timestamp is more than twice the target
            // spacing after its parent, a minimum-difficulty block is allowed.
            if header.time > prev_entry.time + params.target_spacing * 2 {
                return Ok(limit_bits);
            }

            // Otherwise return the last difficulty that was not a
            // special minimum-difficulty block.
            let mut cur = prev;
            loop {
                let entry = chain.get(cur);
                match entry.prev() {
                    Some(p) if entry.height % interval != 0 && entry.bits == limit_bits => cur = p,
                    _ => break,
                }
            }
            return Ok(chain.get(cur).bits);
        }
        return Ok(prev_entry.bits);
    }

    // Walk back one full interval to the first block of the window.
    let first_height = prev_entry.height + 1 - interval;
    let Some(first) = chain.ancestor(prev, first_height) else {
        panic!("chain index is missing the retarget ancestor at height {first_height}");
    };

    calculate_next_work_required(prev_entry, chain.get(first).time, params)
}
