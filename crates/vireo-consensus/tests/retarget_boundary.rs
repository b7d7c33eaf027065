use num_bigint::BigUint;
use vireo_consensus::{
    bits_to_target, get_next_work_required, target_to_bits, ChainIndex, Handle, PosParams,
};
use vireo_core::{BlockHeader, Hash32, PROTOCOL_VERSION};

const BITS: u32 = 0x1e0f_ffff;

fn params(diff_limit: BigUint) -> PosParams {
    PosParams {
        target_timespan: 2400,
        target_spacing: 600,
        diff_limit,
        no_retargeting: false,
        allow_min_difficulty_blocks: false,
    }
}

fn hash_for(i: u64) -> Hash32 {
    let mut b = [0u8; 32];
    b[..8].copy_from_slice(&i.to_le_bytes());
    Hash32(b)
}

fn chain_with_times(times: &[u64]) -> (ChainIndex, Vec<Handle>) {
    let mut chain = ChainIndex::new();
    let mut handles = Vec::new();
    let mut prev = None;
    for (i, &time) in times.iter().enumerate() {
        let h = chain.push(prev, hash_for(i as u64), time, BITS, Hash32::zero());
        handles.push(h);
        prev = Some(h);
    }
    (chain, handles)
}

fn candidate(time: u64) -> BlockHeader {
    BlockHeader {
        version: PROTOCOL_VERSION,
        prev: hash_for(7),
        height: 8,
        time,
        bits: 0,
        tx_merkle_root: Hash32::zero(),
        stake_modifier: Hash32::zero(),
        sig: vec![],
    }
}

#[test]
fn on_schedule_window_keeps_bits_unchanged() {
    // Interval 4 (2400 / 600). Height 7 closes a window whose first
    // block sits at height 4; with the observed timespan equal to the
    // configured one the ratio is exactly 1 and no clamp triggers.
    let t0 = 10_000u64;
    let times = [
        1_000, 1_600, 2_200, 2_800, // heights 0..3
        t0,
        t0 + 800,
        t0 + 1_600,
        t0 + 2_400, // heights 4..7
    ];
    let (chain, handles) = chain_with_times(&times);
    let easy_limit = bits_to_target(0x2000_ffff).unwrap();

    let next = get_next_work_required(&chain, handles[7], &candidate(t0 + 3_000), &params(easy_limit))
        .unwrap();
    assert_eq!(next, BITS);
}

#[test]
fn slow_window_clamps_to_difficulty_limit() {
    // The window ran 4x over schedule, which would quadruple the target,
    // but the configured limit sits below that: the retarget must stop
    // at the limit, not at target * 4.
    let t0 = 10_000u64;
    let times = [
        1_000, 1_600, 2_200, 2_800,
        t0,
        t0 + 3_200,
        t0 + 6_400,
        t0 + 9_600, // 4 * 2400 over the window
    ];
    let (chain, handles) = chain_with_times(&times);

    let limit = bits_to_target(BITS).unwrap() * 2u64;
    let next = get_next_work_required(&chain, handles[7], &candidate(t0 + 10_000), &params(limit.clone()))
        .unwrap();
    assert_eq!(next, target_to_bits(&limit).unwrap());

    // With the limit out of reach the same window quadruples the target.
    let roomy = bits_to_target(0x2000_ffff).unwrap();
    let next = get_next_work_required(&chain, handles[7], &candidate(t0 + 10_000), &params(roomy))
        .unwrap();
    let quadrupled = bits_to_target(BITS).unwrap() * 4u64;
    assert_eq!(next, target_to_bits(&quadrupled).unwrap());
}

#[test]
fn mid_interval_heights_never_retarget() {
    let times: Vec<u64> = (0..7).map(|i| 1_000 + 600 * i).collect();
    let (chain, handles) = chain_with_times(&times);
    let easy_limit = bits_to_target(0x2000_ffff).unwrap();
    let p = params(easy_limit);

    // Heights 4, 5, 6 as parents are all mid-interval for interval 4.
    for &prev in &handles[4..7] {
        let far_future = candidate(u64::MAX);
        assert_eq!(get_next_work_required(&chain, prev, &far_future, &p).unwrap(), BITS);
    }
}
