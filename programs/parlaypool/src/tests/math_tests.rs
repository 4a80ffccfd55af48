use crate::math::*;
use proptest::prelude::*;

// ============== MULTIPLIER ==============

#[test]
fn test_multiplier_two_legs() {
    // 50% then 25%: 2x then 4x.
    let m = compute_multiplier(&[500_000, 250_000]).unwrap();
    assert_eq!(m, 8_000_000);
}

#[test]
fn test_multiplier_single_leg() {
    assert_eq!(compute_multiplier(&[500_000]).unwrap(), 2_000_000);
    assert_eq!(compute_multiplier(&[999_999]).unwrap(), 1_000_001);
    assert_eq!(compute_multiplier(&[1]).unwrap(), 1_000_000_000_000);
}

#[test]
fn test_multiplier_truncates_left_to_right() {
    // 1e6 * 1e6 / 333_333 = 3_000_003 (trunc), then * 1e6 / 333_333 = 9_000_018 (trunc)
    let m = compute_multiplier(&[333_333, 333_333]).unwrap();
    assert_eq!(m, 9_000_018);
    let step1 = 1_000_000u128 * 1_000_000 / 333_333;
    let step2 = step1 * 1_000_000 / 333_333;
    assert_eq!(m, step2);
}

#[test]
fn test_multiplier_rejects_degenerate() {
    assert!(compute_multiplier(&[]).is_err());
    assert!(compute_multiplier(&[0]).is_err());
    assert!(compute_multiplier(&[1_000_000]).is_err());
    assert!(compute_multiplier(&[500_000, 0]).is_err());
}

#[test]
fn test_multiplier_five_extreme_legs_fits() {
    // Worst admissible case: five legs at p = 1.
    let m = compute_multiplier(&[1, 1, 1, 1, 1]).unwrap();
    assert_eq!(m, 10u128.pow(36));
}

// ============== EDGE AND PAYOUT ==============

#[test]
fn test_edge_defaults() {
    assert_eq!(compute_edge_bps(2, 100, 50).unwrap(), 200);
    assert_eq!(compute_edge_bps(3, 100, 50).unwrap(), 250);
    assert_eq!(compute_edge_bps(5, 100, 50).unwrap(), 350);
}

#[test]
fn test_edge_rejects_full_take() {
    assert!(compute_edge_bps(5, 9_000, 250).is_err());
}

#[test]
fn test_apply_edge() {
    assert_eq!(apply_edge(8_000_000, 200).unwrap(), 7_840_000);
    assert_eq!(apply_edge(1_000_000, 0).unwrap(), 1_000_000);
}

#[test]
fn test_compute_payout() {
    assert_eq!(compute_payout(50_000_000, 7_840_000).unwrap(), 392_000_000);
    assert_eq!(compute_payout(0, 7_840_000).unwrap(), 0);
}

#[test]
fn test_quote_ticket_two_leg_example() {
    let q = quote_ticket(&[500_000, 250_000], 50_000_000, 100, 50).unwrap();
    assert_eq!(q.edge_bps, 200);
    assert_eq!(q.fee_paid, 1_000_000);
    assert_eq!(q.effective_stake, 49_000_000);
    assert_eq!(q.fair_multiplier_ppm, 8_000_000);
    assert_eq!(q.net_multiplier_ppm, 7_840_000);
    assert_eq!(q.potential_payout, 392_000_000);
}

#[test]
fn test_quote_ticket_leg_count_bounds() {
    assert!(quote_ticket(&[500_000], 10_000_000, 100, 50).is_err());
    assert!(quote_ticket(&[500_000; 6], 10_000_000, 100, 50).is_err());
}

// ============== FEE SPLIT ==============

#[test]
fn test_split_fee_default() {
    let (lockers, safety, surplus) = split_fee(1_000_000, 9_000, 500).unwrap();
    assert_eq!(lockers, 900_000);
    assert_eq!(safety, 50_000);
    assert_eq!(surplus, 50_000);
}

#[test]
fn test_split_fee_dust_goes_to_surplus() {
    // 999 * 9000 / 10000 = 899 (trunc), 999 * 500 / 10000 = 49 (trunc)
    let (lockers, safety, surplus) = split_fee(999, 9_000, 500).unwrap();
    assert_eq!(lockers, 899);
    assert_eq!(safety, 49);
    assert_eq!(surplus, 51);
    assert_eq!(lockers + safety + surplus, 999);
}

#[test]
fn test_split_fee_rejects_overcommit() {
    assert!(split_fee(1_000, 9_000, 1_001).is_err());
}

// ============== PROGRESSIVE ==============

#[test]
fn test_progressive_caps_at_potential() {
    // Won multiplier alone would pay 49 * 8 = 392, capped at 100.
    let q =
        compute_progressive_payout(49_000_000, &[500_000, 250_000], 100_000_000, 0).unwrap();
    assert_eq!(q.partial_payout, 100_000_000);
    assert_eq!(q.claimable, 100_000_000);
}

#[test]
fn test_progressive_nets_out_claimed() {
    let q = compute_progressive_payout(10_000_000, &[500_000], 100_000_000, 15_000_000).unwrap();
    assert_eq!(q.partial_payout, 20_000_000);
    assert_eq!(q.claimable, 5_000_000);

    // Already claimed above the partial: nothing further, no underflow.
    let q = compute_progressive_payout(10_000_000, &[500_000], 100_000_000, 25_000_000).unwrap();
    assert_eq!(q.claimable, 0);
}

#[test]
fn test_progressive_rejects_empty_won_set() {
    assert!(compute_progressive_payout(10_000_000, &[], 100_000_000, 0).is_err());
}

// ============== CASHOUT ==============

#[test]
fn test_cashout_halfway_example() {
    // Two-leg EarlyCashout: first won (p = 0.5), second unresolved.
    let q = compute_cashout_value(9_800_000, &[500_000], 1, 2, 392_000_000, 300).unwrap();
    assert_eq!(q.fair_value, 19_600_000);
    assert_eq!(q.penalty_bps, 150);
    assert_eq!(q.cashout_value, 19_306_000);
}

#[test]
fn test_cashout_penalty_truncates() {
    // 300 * 2 / 3 = 200
    let q = compute_cashout_value(10_000_000, &[500_000], 2, 3, u64::MAX, 300).unwrap();
    assert_eq!(q.penalty_bps, 200);
    // 300 * 1 / 3 = 100
    let q = compute_cashout_value(10_000_000, &[500_000], 1, 3, u64::MAX, 300).unwrap();
    assert_eq!(q.penalty_bps, 100);
}

#[test]
fn test_cashout_caps_at_potential() {
    let q = compute_cashout_value(100_000_000, &[10_000], 1, 2, 50_000_000, 300).unwrap();
    assert_eq!(q.cashout_value, 50_000_000);
}

#[test]
fn test_cashout_rejects_bad_inputs() {
    assert!(compute_cashout_value(1_000, &[], 1, 2, 1_000, 300).is_err());
    assert!(compute_cashout_value(1_000, &[500_000], 1, 0, 1_000, 300).is_err());
    assert!(compute_cashout_value(1_000, &[500_000], 3, 2, 1_000, 300).is_err());
    assert!(compute_cashout_value(1_000, &[500_000], 1, 2, 1_000, 10_001).is_err());
}

// ============== BOUNDARY CLAMP ==============

#[test]
fn test_probability_clamp() {
    assert_eq!(clamp_probability_ppm(0), 1);
    assert_eq!(clamp_probability_ppm(1), 1);
    assert_eq!(clamp_probability_ppm(999_999), 999_999);
    assert_eq!(clamp_probability_ppm(1_000_000), 999_999);
    assert_eq!(clamp_probability_ppm(u64::MAX), 999_999);
}

// ============== PROPERTIES ==============

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// The iterative reference loop is the canonical rounding; the library
    /// must match it to the bit for every admissible probability vector.
    #[test]
    fn prop_multiplier_matches_iterative_reference(
        probs in prop::collection::vec(1u32..=999_999, 1..=5)
    ) {
        let mut expected: u128 = 1_000_000;
        for p in &probs {
            expected = expected * 1_000_000 / (*p as u128);
        }
        prop_assert_eq!(compute_multiplier(&probs).unwrap(), expected);
    }

    /// Fee conservation: the three BPS-truncated slices always sum back to
    /// the collected fee, with the surplus absorbing the dust.
    #[test]
    fn prop_fee_split_conserves(fee in 0u64..=u64::MAX / 2) {
        let (lockers, safety, surplus) = split_fee(fee, 9_000, 500).unwrap();
        prop_assert_eq!(lockers + safety + surplus, fee);
        prop_assert!(lockers <= fee);
        prop_assert!(safety <= fee);
    }

    /// Cashout never exceeds the reserved potential payout and the penalty
    /// never exceeds its base.
    #[test]
    fn prop_cashout_bounded(
        effective_stake in 0u64..=1_000_000_000_000,
        won in prop::collection::vec(1u32..=999_999, 1..=4),
        unresolved in 1u8..=4,
        potential in 0u64..=1_000_000_000_000_000,
        base_penalty in 0u16..=10_000,
    ) {
        prop_assume!(won.len() + unresolved as usize <= 5);
        let total = won.len() as u8 + unresolved;
        let q = compute_cashout_value(
            effective_stake, &won, unresolved, total, potential, base_penalty,
        ).unwrap();
        prop_assert!(q.cashout_value <= potential);
        prop_assert!(q.penalty_bps <= base_penalty);
    }

    /// Adding a won leg never decreases the progressive payout.
    #[test]
    fn prop_progressive_monotone(
        effective_stake in 0u64..=1_000_000_000_000,
        won in prop::collection::vec(1u32..=999_999, 1..=3),
        extra in 1u32..=999_999,
        potential in 0u64..=1_000_000_000_000_000,
        claimed in 0u64..=1_000_000_000_000,
    ) {
        let before = compute_progressive_payout(effective_stake, &won, potential, claimed)
            .unwrap();
        let mut extended = won.clone();
        extended.push(extra);
        let after = compute_progressive_payout(effective_stake, &extended, potential, claimed)
            .unwrap();
        prop_assert!(after.partial_payout >= before.partial_payout);
        prop_assert!(after.claimable >= before.claimable);
    }

    /// Quote internals stay consistent for admissible tickets.
    #[test]
    fn prop_quote_consistency(
        probs in prop::collection::vec(100u32..=999_999, 2..=5),
        stake in 1_000_000u64..=1_000_000_000_000,
    ) {
        let q = quote_ticket(&probs, stake, 100, 50).unwrap();
        prop_assert_eq!(q.fee_paid + q.effective_stake, stake);
        prop_assert!(q.net_multiplier_ppm <= q.fair_multiplier_ppm);
        let (lockers, safety, surplus) = split_fee(q.fee_paid, 9_000, 500).unwrap();
        prop_assert_eq!(lockers + safety + surplus, q.fee_paid);
    }
}
