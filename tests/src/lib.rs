//! Off-chain realization of the parlay math and its parity harness.
//!
//! Quote and risk services price tickets off-chain before submitting them;
//! the two realizations must agree to the bit on every admissible input.
//! The reference below is written independently of `parlaypool::math` (fold
//! instead of loop, explicit remainder handling) and the fuzz corpus pins
//! the pair together.

use parlaypool::math;

pub const PPM: u128 = 1_000_000;
pub const BPS: u128 = 10_000;

/// Reference combined multiplier: left-to-right fold with truncating
/// division, the canonical rounding.
pub fn reference_multiplier(probs_ppm: &[u32]) -> Option<u128> {
    if probs_ppm.is_empty() {
        return None;
    }
    probs_ppm.iter().try_fold(PPM, |m, &p| {
        if p == 0 || p as u128 >= PPM {
            None
        } else {
            Some(m.checked_mul(PPM)? / p as u128)
        }
    })
}

pub fn reference_payout(stake: u64, net_mult_ppm: u128) -> Option<u64> {
    let v = (stake as u128).checked_mul(net_mult_ppm)? / PPM;
    u64::try_from(v).ok()
}

pub struct ReferenceCashout {
    pub cashout_value: u64,
    pub penalty_bps: u16,
}

pub fn reference_cashout(
    effective_stake: u64,
    won_probs_ppm: &[u32],
    unresolved_count: u8,
    total_legs: u8,
    potential_payout: u64,
    base_penalty_bps: u16,
) -> Option<ReferenceCashout> {
    if total_legs == 0 || unresolved_count > total_legs || base_penalty_bps as u128 > BPS {
        return None;
    }
    let mult = reference_multiplier(won_probs_ppm)?;
    let fair = match (effective_stake as u128).checked_mul(mult) {
        Some(prod) => prod / PPM,
        None => u128::from(u64::MAX),
    };
    let fair = fair.min(u64::MAX as u128);
    let penalty_bps = (base_penalty_bps as u32 * unresolved_count as u32 / total_legs as u32) as u16;
    let discounted = fair * (BPS - penalty_bps as u128) / BPS;
    let cashout_value = discounted.min(potential_payout as u128) as u64;
    Some(ReferenceCashout {
        cashout_value,
        penalty_bps,
    })
}

#[cfg(test)]
mod parity {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn multiplier_agrees_on_known_corpus() {
        let corpus: &[&[u32]] = &[
            &[500_000, 250_000],
            &[500_000, 500_000, 500_000],
            &[333_333, 333_333],
            &[1, 999_999],
            &[999_999, 999_999, 999_999, 999_999, 999_999],
            &[1, 1, 1, 1, 1],
            &[750_000],
        ];
        for probs in corpus {
            assert_eq!(
                math::compute_multiplier(probs).unwrap(),
                reference_multiplier(probs).unwrap(),
                "corpus entry {:?}",
                probs
            );
        }
    }

    #[test]
    fn rejections_agree() {
        for probs in [&[][..], &[0][..], &[1_000_000][..], &[500_000, 0][..]] {
            assert!(math::compute_multiplier(probs).is_err());
            assert!(reference_multiplier(probs).is_none());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1024))]

        /// Property: the two multiplier realizations are bit-identical over
        /// the full admissible domain.
        #[test]
        fn prop_multiplier_parity(probs in prop::collection::vec(1u32..=999_999, 1..=5)) {
            prop_assert_eq!(
                math::compute_multiplier(&probs).unwrap(),
                reference_multiplier(&probs).unwrap()
            );
        }

        #[test]
        fn prop_payout_parity(
            stake in 0u64..=1_000_000_000_000,
            probs in prop::collection::vec(1_000u32..=999_999, 1..=5),
        ) {
            let mult = reference_multiplier(&probs).unwrap();
            prop_assert_eq!(
                math::compute_payout(stake, mult).ok(),
                reference_payout(stake, mult)
            );
        }

        #[test]
        fn prop_cashout_parity(
            effective_stake in 0u64..=1_000_000_000_000,
            won in prop::collection::vec(1u32..=999_999, 1..=4),
            unresolved in 1u8..=4,
            potential in 0u64..=1_000_000_000_000_000,
            base_penalty in 0u16..=10_000,
        ) {
            prop_assume!(won.len() + unresolved as usize <= 5);
            let total = won.len() as u8 + unresolved;
            let ours = math::compute_cashout_value(
                effective_stake, &won, unresolved, total, potential, base_penalty,
            ).unwrap();
            let theirs = reference_cashout(
                effective_stake, &won, unresolved, total, potential, base_penalty,
            ).unwrap();
            prop_assert_eq!(ours.cashout_value, theirs.cashout_value);
            prop_assert_eq!(ours.penalty_bps, theirs.penalty_bps);
        }
    }
}

#[cfg(test)]
mod surface {
    use parlaypool::errors::{FailureKind, ParlayError};
    use parlaypool::math;
    use parlaypool::state::{GlobalConfig, LockFacility, LockTier};

    #[test]
    fn quote_example_from_client_side() {
        // The number a UI shows for a 2-leg half/quarter parlay at 50 tokens.
        let q = math::quote_ticket(&[500_000, 250_000], 50_000_000, 100, 50).unwrap();
        assert_eq!(q.potential_payout, 392_000_000);
        assert_eq!(q.fee_paid, 1_000_000);
    }

    #[test]
    fn documented_defaults_are_stable() {
        assert_eq!(GlobalConfig::DEFAULT_BASE_FEE_BPS, 100);
        assert_eq!(GlobalConfig::DEFAULT_PER_LEG_FEE_BPS, 50);
        assert_eq!(GlobalConfig::DEFAULT_MAX_PAYOUT_FRACTION_BPS, 500);
        assert_eq!(GlobalConfig::DEFAULT_UTILIZATION_CAP_BPS, 8_000);
        assert_eq!(GlobalConfig::DEFAULT_CASHOUT_BASE_PENALTY_BPS, 300);
        assert_eq!(GlobalConfig::DEFAULT_UNLOCK_BASE_PENALTY_BPS, 1_000);
        assert_eq!(GlobalConfig::DEFAULT_FEE_TO_LOCKERS_BPS, 9_000);
        assert_eq!(GlobalConfig::DEFAULT_FEE_TO_SAFETY_BPS, 500);
        assert_eq!(GlobalConfig::DEFAULT_YIELD_BUFFER_BPS, 2_500);
        assert_eq!(LockFacility::DEFAULT_MINIMUM_LOCK, 1_000_000);
    }

    #[test]
    fn tier_table_is_stable() {
        assert_eq!(LockTier::Days30.weight_bps(), 11_000);
        assert_eq!(LockTier::Days60.weight_bps(), 12_500);
        assert_eq!(LockTier::Days90.weight_bps(), 15_000);
    }

    #[test]
    fn failure_kinds_cover_client_display() {
        // One representative per category the UI switches on.
        assert_eq!(ParlayError::DuplicateLeg.kind(), FailureKind::InvalidArgument);
        assert_eq!(
            ParlayError::TicketTooLarge.kind(),
            FailureKind::PolicyViolation
        );
        assert_eq!(ParlayError::NotTicketOwner.kind(), FailureKind::Unauthorized);
        assert_eq!(ParlayError::OutcomeNotFinal.kind(), FailureKind::NotReady);
        assert_eq!(
            ParlayError::AlreadyResolved.kind(),
            FailureKind::AlreadyResolved
        );
        assert_eq!(
            ParlayError::InsufficientLiquidity.kind(),
            FailureKind::InsufficientLiquidity
        );
        assert_eq!(ParlayError::SlippageExceeded.kind(), FailureKind::Slippage);
        assert_eq!(
            ParlayError::SafetyVaultNotConfigured.kind(),
            FailureKind::NotConfigured
        );
    }
}
