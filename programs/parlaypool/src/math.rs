// programs/parlaypool/src/math.rs
//
// Pure integer parlay math. Everything in here is deterministic fixed-point
// arithmetic with truncating division applied left-to-right; the off-chain
// quoting path links against this exact module, so any change here changes
// the canonical rounding for both realizations.
use anchor_lang::prelude::*;
use anchor_lang::error::Error as AnchorError;

use crate::errors::ParlayError;

/// Fixed-point scale for probabilities and multipliers.
pub const PPM: u128 = 1_000_000;
/// Fixed-point scale for fees, penalties and caps.
pub const BPS: u128 = 10_000;

pub const MIN_LEGS: usize = 2;
pub const MAX_LEGS: usize = 5;

#[inline(always)]
fn overflow_err() -> AnchorError {
    ParlayError::MathOverflow.into()
}

/// Combined multiplier over a set of leg probabilities, in PPM.
///
/// Iterative `m = m * PPM / p`, left-to-right. A fair coin-flip leg
/// (p = 500_000) doubles the multiplier. Probabilities of 0 or PPM are
/// rejected; they would price a degenerate parlay.
pub fn compute_multiplier(probs_ppm: &[u32]) -> Result<u128> {
    require!(!probs_ppm.is_empty(), ParlayError::NoLegs);
    let mut m: u128 = PPM;
    for &p in probs_ppm {
        require!(
            p >= 1 && (p as u128) < PPM,
            ParlayError::InvalidProbability
        );
        m = m
            .checked_mul(PPM)
            .ok_or_else(overflow_err)?
            .checked_div(p as u128)
            .ok_or_else(overflow_err)?;
    }
    Ok(m)
}

/// House edge in BPS for a ticket with `num_legs` legs.
pub fn compute_edge_bps(num_legs: u8, base_bps: u16, per_leg_bps: u16) -> Result<u16> {
    let edge = (base_bps as u32)
        .checked_add((per_leg_bps as u32).checked_mul(num_legs as u32).ok_or_else(overflow_err)?)
        .ok_or_else(overflow_err)?;
    // An edge of 100% or more would zero out the effective stake.
    require!((edge as u128) < BPS, ParlayError::InvalidFeeConfig);
    Ok(edge as u16)
}

/// Net multiplier after the house edge: `fair * (BPS - edge) / BPS`.
pub fn apply_edge(fair_mult_ppm: u128, edge_bps: u16) -> Result<u128> {
    require!((edge_bps as u128) <= BPS, ParlayError::InvalidFeeConfig);
    fair_mult_ppm
        .checked_mul(BPS - edge_bps as u128)
        .ok_or_else(overflow_err)?
        .checked_div(BPS)
        .ok_or_else(overflow_err)
}

/// Payout for `stake` at `net_mult_ppm`: `stake * net_mult / PPM`.
pub fn compute_payout(stake: u64, net_mult_ppm: u128) -> Result<u64> {
    let v = (stake as u128)
        .checked_mul(net_mult_ppm)
        .ok_or_else(overflow_err)?
        .checked_div(PPM)
        .ok_or_else(overflow_err)?;
    u64::try_from(v).map_err(|_| overflow_err())
}

/// Payout capped at `cap`. A product too large for u128 is by definition
/// above the cap, so the cap is returned instead of an overflow error; this
/// keeps the progressive/cashout paths total for every admissible input.
fn compute_payout_capped(stake: u64, mult_ppm: u128, cap: u64) -> u64 {
    match (stake as u128).checked_mul(mult_ppm) {
        Some(prod) => {
            let v = prod / PPM;
            if v > cap as u128 { cap } else { v as u64 }
        }
        None => cap,
    }
}

/// Uncapped payout, saturating at u64::MAX. Only used for the informational
/// fair value of a cashout quote; the transferable value is always capped.
fn compute_payout_saturating(stake: u64, mult_ppm: u128) -> u64 {
    match (stake as u128).checked_mul(mult_ppm) {
        Some(prod) => {
            let v = prod / PPM;
            if v > u64::MAX as u128 { u64::MAX } else { v as u64 }
        }
        None => u64::MAX,
    }
}

/// Deterministic split of a collected fee. Lockers and safety shares are
/// BPS-truncated; the pool surplus takes the remainder so the three parts
/// always sum to `fee_paid` exactly.
pub fn split_fee(fee_paid: u64, to_lockers_bps: u16, to_safety_bps: u16) -> Result<(u64, u64, u64)> {
    require!(
        (to_lockers_bps as u128) + (to_safety_bps as u128) <= BPS,
        ParlayError::InvalidFeeConfig
    );
    let lockers = ((fee_paid as u128) * to_lockers_bps as u128 / BPS) as u64;
    let safety = ((fee_paid as u128) * to_safety_bps as u128 / BPS) as u64;
    let surplus = fee_paid - lockers - safety;
    Ok((lockers, safety, surplus))
}

/// Full price quote for a parlay ticket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TicketQuote {
    pub edge_bps: u16,
    pub fee_paid: u64,
    pub effective_stake: u64,
    pub fair_multiplier_ppm: u128,
    pub net_multiplier_ppm: u128,
    pub potential_payout: u64,
}

/// Quote a ticket: edge, fee, effective stake, multipliers and payout.
///
/// The payout is quoted on the gross stake; the effective stake (net of the
/// fee) is what funds progressive and cashout accounting later.
pub fn quote_ticket(
    probs_ppm: &[u32],
    stake: u64,
    base_fee_bps: u16,
    per_leg_fee_bps: u16,
) -> Result<TicketQuote> {
    require!(
        probs_ppm.len() >= MIN_LEGS && probs_ppm.len() <= MAX_LEGS,
        ParlayError::InvalidLegCount
    );
    let edge_bps = compute_edge_bps(probs_ppm.len() as u8, base_fee_bps, per_leg_fee_bps)?;
    let fee_paid = ((stake as u128) * edge_bps as u128 / BPS) as u64;
    let effective_stake = stake.checked_sub(fee_paid).ok_or_else(overflow_err)?;
    let fair_multiplier_ppm = compute_multiplier(probs_ppm)?;
    let net_multiplier_ppm = apply_edge(fair_multiplier_ppm, edge_bps)?;
    let potential_payout = compute_payout(stake, net_multiplier_ppm)?;
    Ok(TicketQuote {
        edge_bps,
        fee_paid,
        effective_stake,
        fair_multiplier_ppm,
        net_multiplier_ppm,
        potential_payout,
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressiveQuote {
    pub partial_payout: u64,
    pub claimable: u64,
}

/// Partial payout proportional to already-won legs.
///
/// The multiplier is taken over the won subset only, the result is capped at
/// the ticket's potential payout, and the claimable delta nets out what was
/// already paid.
pub fn compute_progressive_payout(
    effective_stake: u64,
    won_probs_ppm: &[u32],
    potential_payout: u64,
    already_claimed: u64,
) -> Result<ProgressiveQuote> {
    require!(!won_probs_ppm.is_empty(), ParlayError::NoWonLegs);
    let mult = compute_multiplier(won_probs_ppm)?;
    let partial_payout = compute_payout_capped(effective_stake, mult, potential_payout);
    let claimable = partial_payout.saturating_sub(already_claimed);
    Ok(ProgressiveQuote {
        partial_payout,
        claimable,
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CashoutQuote {
    pub cashout_value: u64,
    pub penalty_bps: u16,
    pub fair_value: u64,
}

/// Fair-value early exit, discounted by a penalty scaled with the share of
/// legs still unresolved.
///
/// The fair value is the EV given the won legs alone; unresolved legs are
/// priced through the penalty, never by further multiplication.
pub fn compute_cashout_value(
    effective_stake: u64,
    won_probs_ppm: &[u32],
    unresolved_count: u8,
    total_legs: u8,
    potential_payout: u64,
    base_penalty_bps: u16,
) -> Result<CashoutQuote> {
    require!(!won_probs_ppm.is_empty(), ParlayError::NoWonLegs);
    require!(total_legs > 0, ParlayError::InvalidLegCount);
    require!(
        unresolved_count <= total_legs,
        ParlayError::InvalidLegCount
    );
    require!((base_penalty_bps as u128) <= BPS, ParlayError::InvalidFeeConfig);

    let mult = compute_multiplier(won_probs_ppm)?;
    let fair_value = compute_payout_saturating(effective_stake, mult);

    let penalty_bps =
        ((base_penalty_bps as u32) * (unresolved_count as u32) / (total_legs as u32)) as u16;

    let discounted = (fair_value as u128)
        .checked_mul(BPS - penalty_bps as u128)
        .ok_or_else(overflow_err)?
        / BPS;
    let cashout_value = if discounted > potential_payout as u128 {
        potential_payout
    } else {
        discounted as u64
    };

    Ok(CashoutQuote {
        cashout_value,
        penalty_bps,
        fair_value,
    })
}

/// Clamp a raw PPM probability to the legal open interval `[1, PPM - 1]`.
/// Used at input boundaries after rounding; the registry still rejects the
/// endpoints outright.
pub fn clamp_probability_ppm(raw_ppm: u64) -> u32 {
    if raw_ppm < 1 {
        1
    } else if raw_ppm as u128 > PPM - 1 {
        (PPM - 1) as u32
    } else {
        raw_ppm as u32
    }
}
