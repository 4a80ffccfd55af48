use anchor_lang::prelude::*;

use crate::state::*;

fn empty_facility() -> LockFacility {
    LockFacility {
        share_mint: Pubkey::new_unique(),
        share_escrow: Pubkey::new_unique(),
        reward_vault: Pubkey::new_unique(),
        total_locked_shares: 0,
        total_weighted_shares: 0,
        acc_reward_per_weighted_share: 0,
        undistributed_fees: 0,
        minimum_lock: LockFacility::DEFAULT_MINIMUM_LOCK,
        position_count: 0,
        bump: 254,
    }
}

fn open_position(facility: &mut LockFacility, shares: u64, tier: LockTier, now: i64) -> LockPosition {
    let weighted = LockFacility::weighted_shares(shares, tier.weight_bps()).unwrap();
    facility.total_locked_shares += shares;
    facility.total_weighted_shares += weighted;
    let position = LockPosition {
        id: facility.position_count,
        owner: Pubkey::new_unique(),
        shares,
        tier,
        weight_bps: tier.weight_bps(),
        locked_at: now,
        unlocks_at: now + tier.duration_secs(),
        reward_debt: facility.debt_for(weighted),
        bump: 255,
    };
    if facility.undistributed_fees > 0 {
        facility.advance_accumulator(0).unwrap();
    }
    facility.position_count += 1;
    position
}

// ============== TIERS ==============

#[test]
fn test_tier_weights_and_durations() {
    assert_eq!(LockTier::Days30.weight_bps(), 11_000);
    assert_eq!(LockTier::Days60.weight_bps(), 12_500);
    assert_eq!(LockTier::Days90.weight_bps(), 15_000);
    assert_eq!(LockTier::Days30.duration_secs(), 2_592_000);
    assert_eq!(LockTier::Days90.duration_secs(), 7_776_000);
}

#[test]
fn test_weighted_shares() {
    assert_eq!(
        LockFacility::weighted_shares(1_000, 11_000).unwrap(),
        1_100
    );
    assert_eq!(
        LockFacility::weighted_shares(1_000, 15_000).unwrap(),
        1_500
    );
    // Truncation on odd amounts.
    assert_eq!(LockFacility::weighted_shares(3, 12_500).unwrap(), 3);
}

// ============== ACCUMULATOR ==============

#[test]
fn test_notify_fees_rejects_zero() {
    let mut facility = empty_facility();
    assert!(facility.notify_fees(0).is_err());
}

#[test]
fn test_fees_with_no_lockers_accumulate() {
    let mut facility = empty_facility();
    facility.notify_fees(5_000_000).unwrap();
    facility.notify_fees(2_000_000).unwrap();
    assert_eq!(facility.undistributed_fees, 7_000_000);
    assert_eq!(facility.acc_reward_per_weighted_share, 0);
}

#[test]
fn test_first_locker_absorbs_backlog() {
    let mut facility = empty_facility();
    facility.notify_fees(7_000_000).unwrap();

    let position = open_position(&mut facility, 10_000_000, LockTier::Days30, 0);
    assert_eq!(facility.undistributed_fees, 0);

    let weighted = position.weighted().unwrap();
    let pending = facility.pending_delta(weighted, position.reward_debt);
    // The whole backlog lands on the only position, within rounding.
    assert!(7_000_000 - pending <= 1, "pending {}", pending);
}

#[test]
fn test_accumulator_monotone() {
    let mut facility = empty_facility();
    let _ = open_position(&mut facility, 10_000_000, LockTier::Days30, 0);
    let mut last = facility.acc_reward_per_weighted_share;
    for amount in [1u64, 1_000, 1_000_000, 260_000_000, 7] {
        facility.notify_fees(amount).unwrap();
        assert!(facility.acc_reward_per_weighted_share >= last);
        last = facility.acc_reward_per_weighted_share;
    }
}

#[test]
fn test_settle_is_idempotent_per_delta() {
    let mut facility = empty_facility();
    let mut position = open_position(&mut facility, 10_000_000, LockTier::Days30, 0);
    facility.notify_fees(100_000_000).unwrap();

    let weighted = position.weighted().unwrap();
    let first = facility.pending_delta(weighted, position.reward_debt);
    position.reward_debt = facility.debt_for(weighted);
    let second = facility.pending_delta(weighted, position.reward_debt);

    assert!(first > 0);
    assert_eq!(second, 0);
}

/// Weighted fee distribution: A at 30d (1.1x) and B at 90d (1.5x) split
/// 260 tokens 110/150.
#[test]
fn test_weighted_distribution_two_lockers() {
    let mut facility = empty_facility();
    let a = open_position(&mut facility, 1_000, LockTier::Days30, 0);
    let b = open_position(&mut facility, 1_000, LockTier::Days90, 0);
    assert_eq!(facility.total_weighted_shares, 2_600);

    facility.notify_fees(260_000_000).unwrap();

    let a_pending = facility.pending_delta(a.weighted().unwrap(), a.reward_debt);
    let b_pending = facility.pending_delta(b.weighted().unwrap(), b.reward_debt);
    assert!(110_000_000 - a_pending <= 1, "A pending {}", a_pending);
    assert!(150_000_000 - b_pending <= 1, "B pending {}", b_pending);
}

#[test]
fn test_late_locker_earns_nothing_retroactively() {
    let mut facility = empty_facility();
    let _early = open_position(&mut facility, 1_000, LockTier::Days30, 0);
    facility.notify_fees(50_000_000).unwrap();

    let late = open_position(&mut facility, 1_000, LockTier::Days30, 0);
    let pending = facility.pending_delta(late.weighted().unwrap(), late.reward_debt);
    assert_eq!(pending, 0);
}

// ============== EARLY WITHDRAW PENALTY ==============

#[test]
fn test_early_penalty_scales_with_remaining() {
    let now = 1_700_000_000;
    let mut facility = empty_facility();
    let mut position = open_position(&mut facility, 10_000_000_000, LockTier::Days30, 0);
    position.locked_at = now;
    position.unlocks_at = now + LockTier::Days30.duration_secs();

    // Day 15 of 30: half the base penalty.
    let halfway = now + 15 * 86_400;
    assert_eq!(position.early_penalty_bps(halfway, 1_000), 500);

    // Immediately after locking: the full base.
    assert_eq!(position.early_penalty_bps(now, 1_000), 1_000);

    // One second before maturity: rounds down to zero.
    assert_eq!(position.early_penalty_bps(position.unlocks_at - 1, 1_000), 0);
}

#[test]
fn test_early_withdraw_day15_returns_and_surplus() {
    let now = 0;
    let mut facility = empty_facility();
    let position = open_position(&mut facility, 10_000_000_000, LockTier::Days30, now);

    let at = now + 15 * 86_400;
    let penalty_bps = position.early_penalty_bps(at, 1_000);
    assert_eq!(penalty_bps, 500);

    let returned =
        ((position.shares as u128) * (10_000 - penalty_bps as u128) / 10_000) as u64;
    assert_eq!(returned, 9_500_000_000);

    // Totals drop by the full position; the 500 token difference stays in
    // escrow as sweepable surplus.
    facility.total_locked_shares -= position.shares;
    facility.total_weighted_shares -= position.weighted().unwrap();
    assert_eq!(facility.total_locked_shares, 0);
    let escrow_balance = position.shares - returned;
    assert_eq!(escrow_balance, 500_000_000);
    assert!(escrow_balance > facility.total_locked_shares);
}

// ============== PRECISION ==============

#[test]
fn test_reward_precision_within_one_unit() {
    let mut facility = empty_facility();
    let positions: Vec<LockPosition> = (0..7)
        .map(|i| {
            open_position(
                &mut facility,
                1_000_000 + i * 333_333,
                LockTier::Days60,
                0,
            )
        })
        .collect();

    let notified = 999_999_999u64;
    facility.notify_fees(notified).unwrap();

    let paid: u64 = positions
        .iter()
        .map(|p| facility.pending_delta(p.weighted().unwrap(), p.reward_debt))
        .sum();
    // Truncation loses at most one unit per position.
    assert!(paid <= notified);
    assert!(notified - paid <= positions.len() as u64);
}
