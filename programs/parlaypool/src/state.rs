// programs/parlaypool/src/state.rs
use anchor_lang::prelude::*;
use anchor_lang::error::Error as AnchorError;

use crate::errors::ParlayError;
use crate::math::{self, BPS, PPM};

/// Precision multiplier for the lock reward accumulator (1e12).
pub const REWARD_SCALE: u128 = 1_000_000_000_000;

/// Stored length of a leg's question text.
pub const QUESTION_LEN: usize = 128;

// ---------- Enums ----------

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq)]
pub enum TicketStatus {
    Active,
    Won,
    Lost,
    Voided,
    Claimed,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq)]
pub enum PayoutMode {
    Classic,
    Progressive,
    EarlyCashout,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq)]
pub enum SettlementMode {
    Fast,
    Optimistic,
}

/// Oracle-level resolution of a leg's binary question.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq)]
pub enum LegResult {
    Pending,
    Yes,
    No,
    Void,
}

/// Outcome of one leg as seen from a particular ticket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LegOutcome {
    Unresolved,
    Won,
    Lost,
    Voided,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq)]
pub enum ProposalState {
    None,
    Proposed,
    Challenged,
    Finalized,
    Resolved,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq)]
pub enum LockTier {
    Days30,
    Days60,
    Days90,
}

impl LockTier {
    pub fn weight_bps(&self) -> u16 {
        match self {
            LockTier::Days30 => 11_000,
            LockTier::Days60 => 12_500,
            LockTier::Days90 => 15_000,
        }
    }

    pub fn duration_secs(&self) -> i64 {
        match self {
            LockTier::Days30 => 30 * 86_400,
            LockTier::Days60 => 60 * 86_400,
            LockTier::Days90 => 90 * 86_400,
        }
    }
}

/// Chosen-outcome sentinels accepted on a ticket.
pub const OUTCOME_YES: u8 = 0;
pub const OUTCOME_NO: u8 = 1;

/// Map an oracle result and a ticket's chosen side to the ticket-level
/// outcome of that leg.
pub fn leg_outcome(result: LegResult, chosen: u8) -> LegOutcome {
    match result {
        LegResult::Pending => LegOutcome::Unresolved,
        LegResult::Void => LegOutcome::Voided,
        LegResult::Yes => {
            if chosen == OUTCOME_YES {
                LegOutcome::Won
            } else {
                LegOutcome::Lost
            }
        }
        LegResult::No => {
            if chosen == OUTCOME_NO {
                LegOutcome::Won
            } else {
                LegOutcome::Lost
            }
        }
    }
}

// ---------- Accounts ----------

#[account]
pub struct GlobalConfig {
    pub operator: Pubkey,                 // 32
    pub stable_mint: Pubkey,              // 32
    pub safety_vault: Pubkey,             // 32
    pub lock_facility: Pubkey,            // 32
    pub yield_adapter: Option<Pubkey>,    // 1(tag) + 32 = 33
    pub base_fee_bps: u16,                // 2
    pub per_leg_fee_bps: u16,             // 2
    pub max_payout_fraction_bps: u16,     // 2
    pub utilization_cap_bps: u16,         // 2
    pub cashout_base_penalty_bps: u16,    // 2
    pub unlock_base_penalty_bps: u16,     // 2
    pub fee_to_lockers_bps: u16,          // 2
    pub fee_to_safety_bps: u16,           // 2
    pub yield_buffer_bps: u16,            // 2
    pub min_stake: u64,                   // 8
    pub max_stake: u64,                   // 8
    pub oracle_bond: u64,                 // 8
    pub oracle_liveness_secs: i64,        // 8
    pub bootstrap_ends_at: i64,           // 8
    pub bump: u8,                         // 1
}

impl GlobalConfig {
    // Sum(fields) = 220 → +8 discriminator = 228
    pub const SIZE: usize = 8 + 220;

    pub const DEFAULT_BASE_FEE_BPS: u16 = 100;
    pub const DEFAULT_PER_LEG_FEE_BPS: u16 = 50;
    pub const DEFAULT_MAX_PAYOUT_FRACTION_BPS: u16 = 500;
    pub const DEFAULT_UTILIZATION_CAP_BPS: u16 = 8_000;
    pub const DEFAULT_CASHOUT_BASE_PENALTY_BPS: u16 = 300;
    pub const DEFAULT_UNLOCK_BASE_PENALTY_BPS: u16 = 1_000;
    pub const DEFAULT_FEE_TO_LOCKERS_BPS: u16 = 9_000;
    pub const DEFAULT_FEE_TO_SAFETY_BPS: u16 = 500;
    pub const DEFAULT_YIELD_BUFFER_BPS: u16 = 2_500;
    pub const DEFAULT_MIN_STAKE: u64 = 1_000_000; // 1 token w/ 6 decimals
    pub const DEFAULT_MAX_STAKE: u64 = 1_000_000_000_000; // 1M tokens

    pub fn settlement_mode_at(&self, now: i64) -> SettlementMode {
        if now < self.bootstrap_ends_at {
            SettlementMode::Fast
        } else {
            SettlementMode::Optimistic
        }
    }

    pub fn require_wired(&self) -> Result<()> {
        require!(
            self.lock_facility != Pubkey::default(),
            ParlayError::LockFacilityNotConfigured
        );
        require!(
            self.safety_vault != Pubkey::default(),
            ParlayError::SafetyVaultNotConfigured
        );
        Ok(())
    }
}

#[account]
pub struct Pool {
    pub stable_mint: Pubkey,    // 32
    pub vault: Pubkey,          // 32
    pub share_mint: Pubkey,     // 32
    pub total_assets: u64,      // 8
    pub total_shares: u64,      // 8
    pub total_reserved: u64,    // 8
    pub bump: u8,               // 1
}

impl Pool {
    // Sum(fields) = 121 → +8 discriminator = 129
    pub const SIZE: usize = 8 + 121;

    pub fn free_liquidity(&self) -> u64 {
        self.total_assets.saturating_sub(self.total_reserved)
    }

    /// Shares minted for a deposit at the current share price.
    /// The first depositor mints 1:1.
    pub fn shares_for_deposit(&self, assets: u64) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(assets);
        }
        let shares = (assets as u128)
            .checked_mul(self.total_shares as u128)
            .ok_or_else(overflow_err)?
            .checked_div(self.total_assets as u128)
            .ok_or_else(overflow_err)?;
        u64::try_from(shares).map_err(|_| overflow_err())
    }

    /// Pro-rata asset value of `shares`.
    pub fn assets_for_shares(&self, shares: u64) -> Result<u64> {
        let assets = (shares as u128)
            .checked_mul(self.total_assets as u128)
            .ok_or_else(overflow_err)?
            .checked_div(self.total_shares as u128)
            .ok_or_else(overflow_err)?;
        u64::try_from(assets).map_err(|_| overflow_err())
    }

    /// Largest payout a single ticket may reserve right now.
    pub fn max_ticket_payout(&self, max_payout_fraction_bps: u16) -> u64 {
        ((self.total_assets as u128) * max_payout_fraction_bps as u128 / BPS) as u64
    }

    /// Per-ticket cap and utilization cap, both against current assets.
    pub fn check_reservation_caps(
        &self,
        amount: u64,
        max_payout_fraction_bps: u16,
        utilization_cap_bps: u16,
    ) -> Result<()> {
        require!(
            amount <= self.max_ticket_payout(max_payout_fraction_bps),
            ParlayError::TicketTooLarge
        );
        let reserved_after = (self.total_reserved as u128)
            .checked_add(amount as u128)
            .ok_or_else(overflow_err)?;
        let cap = (self.total_assets as u128) * utilization_cap_bps as u128 / BPS;
        require!(reserved_after <= cap, ParlayError::UtilizationCapExceeded);
        Ok(())
    }

    pub fn reserve(&mut self, amount: u64) -> Result<()> {
        self.total_reserved = self
            .total_reserved
            .checked_add(amount)
            .ok_or_else(overflow_err)?;
        require!(
            self.total_reserved <= self.total_assets,
            ParlayError::InsufficientLiquidity
        );
        Ok(())
    }

    pub fn release(&mut self, amount: u64) {
        self.total_reserved = self.total_reserved.saturating_sub(amount);
    }

    /// Accounting for a reserved payout leaving the pool.
    pub fn pay_reserved(&mut self, amount: u64) -> Result<()> {
        self.total_reserved = self
            .total_reserved
            .checked_sub(amount)
            .ok_or_else(overflow_err)?;
        self.total_assets = self
            .total_assets
            .checked_sub(amount)
            .ok_or_else(overflow_err)?;
        Ok(())
    }

    /// Accounting for an unreserved transfer out (void refunds, routed fees).
    pub fn pay_unreserved(&mut self, amount: u64) -> Result<()> {
        require!(
            amount <= self.free_liquidity(),
            ParlayError::InsufficientLiquidity
        );
        self.total_assets -= amount;
        Ok(())
    }
}

#[account]
pub struct Engine {
    pub ticket_count: u64,  // 8
    pub bump: u8,           // 1
}

impl Engine {
    // Sum(fields) = 9 → +8 discriminator = 17
    pub const SIZE: usize = 8 + 9;
}

#[account]
pub struct Registry {
    pub leg_count: u64,     // 8
    pub bond_vault: Pubkey, // 32
    pub bump: u8,           // 1
}

impl Registry {
    // Sum(fields) = 41 → +8 discriminator = 49
    pub const SIZE: usize = 8 + 41;
}

#[account]
pub struct Leg {
    pub id: u64,                        // 8
    pub question: [u8; QUESTION_LEN],   // 128
    pub source_ref: [u8; 32],           // 32
    pub cutoff_time: i64,               // 8
    pub earliest_resolve_time: i64,     // 8
    pub probability_ppm: u32,           // 4
    pub active: bool,                   // 1
    pub created_at: i64,                // 8
    // Fast (admin) resolution channel
    pub fast_result: LegResult,         // 1
    pub fast_digest: [u8; 32],          // 32
    pub fast_resolved_at: i64,          // 8
    // Optimistic resolution channel
    pub opt_state: ProposalState,       // 1
    pub opt_result: LegResult,          // 1
    pub opt_digest: [u8; 32],           // 32
    pub opt_proposer: Pubkey,           // 32
    pub opt_challenger: Pubkey,         // 32
    pub opt_bond: u64,                  // 8
    pub opt_liveness: i64,              // 8
    pub opt_proposed_at: i64,           // 8
    pub bump: u8,                       // 1
}

impl Leg {
    // Sum(fields) = 361 → +8 discriminator = 369
    pub const SIZE: usize = 8 + 361;

    pub fn is_open_for_betting(&self, now: i64) -> bool {
        self.active && now < self.cutoff_time
    }

    /// Uniform oracle read: the engine sees only the result and digest for
    /// the ticket's frozen settlement mode, never which variant produced it.
    pub fn result_for(&self, mode: SettlementMode) -> (LegResult, [u8; 32]) {
        match mode {
            SettlementMode::Fast => (self.fast_result, self.fast_digest),
            SettlementMode::Optimistic => match self.opt_state {
                ProposalState::Finalized | ProposalState::Resolved => {
                    (self.opt_result, self.opt_digest)
                }
                _ => (LegResult::Pending, [0u8; 32]),
            },
        }
    }

    pub fn can_resolve(&self, mode: SettlementMode) -> bool {
        self.result_for(mode).0 != LegResult::Pending
    }

    /// Liveness deadline of the open proposal (snapshot, not global clock).
    pub fn proposal_deadline(&self) -> i64 {
        self.opt_proposed_at.saturating_add(self.opt_liveness)
    }
}

/// Terminal decision for a ticket once every leg has a final outcome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SettlementVerdict {
    Won { adjusted_payout: u64 },
    Lost,
    Voided,
}

#[account]
pub struct Ticket {
    pub id: u64,                        // 8
    pub owner: Pubkey,                  // 32
    pub stake: u64,                     // 8
    pub effective_stake: u64,           // 8
    pub fee_paid: u64,                  // 8
    pub leg_count: u8,                  // 1
    pub leg_ids: [u64; 5],              // 40
    pub chosen: [u8; 5],                // 5
    pub probs_ppm: [u32; 5],            // 20
    pub quoted_multiplier_ppm: u128,    // 16
    pub edge_bps: u16,                  // 2
    pub cashout_base_penalty_bps: u16,  // 2
    pub potential_payout: u64,          // 8
    pub settlement_mode: SettlementMode,// 1
    pub payout_mode: PayoutMode,        // 1
    pub status: TicketStatus,           // 1
    pub claimed_amount: u64,            // 8
    pub created_at: i64,                // 8
    pub bump: u8,                       // 1
}

impl Ticket {
    // Sum(fields) = 178 → +8 discriminator = 186
    pub const SIZE: usize = 8 + 178;

    /// Snapshot probabilities of the live legs, in ticket order.
    pub fn probs(&self) -> &[u32] {
        &self.probs_ppm[..self.leg_count as usize]
    }

    /// Snapshot probabilities of legs whose outcome satisfies `keep`.
    pub fn probs_where(&self, outcomes: &[LegOutcome], keep: LegOutcome) -> Vec<u32> {
        self.probs()
            .iter()
            .zip(outcomes.iter())
            .filter(|(_, o)| **o == keep)
            .map(|(p, _)| *p)
            .collect()
    }

    /// Terminal decision once every leg is final.
    ///
    /// Voided legs drop out; fewer than two survivors voids the ticket.
    /// With survivors the payout is recomputed over them at the snapshot
    /// probabilities and the frozen edge, never above the original quote.
    pub fn decide_settlement(&self, outcomes: &[LegOutcome]) -> Result<SettlementVerdict> {
        require!(
            outcomes.len() == self.leg_count as usize,
            ParlayError::OutcomeCountMismatch
        );
        require!(
            !outcomes.iter().any(|o| *o == LegOutcome::Unresolved),
            ParlayError::OutcomeNotFinal
        );

        let surviving: Vec<LegOutcome> = outcomes
            .iter()
            .copied()
            .filter(|o| *o != LegOutcome::Voided)
            .collect();
        if surviving.len() < math::MIN_LEGS {
            return Ok(SettlementVerdict::Voided);
        }
        if surviving.iter().any(|o| *o == LegOutcome::Lost) {
            return Ok(SettlementVerdict::Lost);
        }

        // All survivors won.
        if surviving.len() == self.leg_count as usize {
            return Ok(SettlementVerdict::Won {
                adjusted_payout: self.potential_payout,
            });
        }
        let surv_probs = self.probs_where(outcomes, LegOutcome::Won);
        let mult = math::compute_multiplier(&surv_probs)?;
        let net = math::apply_edge(mult, self.edge_bps)?;
        let recomputed = math::compute_payout(self.stake, net)?;
        let adjusted = recomputed.min(self.potential_payout);
        Ok(SettlementVerdict::Won {
            adjusted_payout: adjusted,
        })
    }

    pub fn require_owner(&self, key: &Pubkey) -> Result<()> {
        require!(self.owner == *key, ParlayError::NotTicketOwner);
        Ok(())
    }

    pub fn require_status(&self, status: TicketStatus) -> Result<()> {
        require!(self.status == status, ParlayError::WrongTicketStatus);
        Ok(())
    }
}

#[account]
pub struct LockFacility {
    pub share_mint: Pubkey,                     // 32
    pub share_escrow: Pubkey,                   // 32
    pub reward_vault: Pubkey,                   // 32
    pub total_locked_shares: u64,               // 8
    pub total_weighted_shares: u64,             // 8
    pub acc_reward_per_weighted_share: u128,    // 16
    pub undistributed_fees: u64,                // 8
    pub minimum_lock: u64,                      // 8
    pub position_count: u64,                    // 8
    pub bump: u8,                               // 1
}

impl LockFacility {
    // Sum(fields) = 153 → +8 discriminator = 161
    pub const SIZE: usize = 8 + 153;

    pub const DEFAULT_MINIMUM_LOCK: u64 = 1_000_000; // 1 share unit w/ 6 decimals

    pub fn weighted_shares(shares: u64, weight_bps: u16) -> Result<u64> {
        let w = (shares as u128)
            .checked_mul(weight_bps as u128)
            .ok_or_else(overflow_err)?
            / BPS;
        u64::try_from(w).map_err(|_| overflow_err())
    }

    /// Fee event from the pool. With no weighted shares the amount joins
    /// the undistributed backlog; otherwise the accumulator advances by
    /// `(amount + backlog) * SCALE / weighted` and the backlog is flushed.
    pub fn notify_fees(&mut self, amount: u64) -> Result<()> {
        require!(amount > 0, ParlayError::ZeroAmount);
        if self.total_weighted_shares == 0 {
            self.undistributed_fees = self
                .undistributed_fees
                .checked_add(amount)
                .ok_or_else(overflow_err)?;
            return Ok(());
        }
        self.advance_accumulator(amount)
    }

    /// Fold the pending backlog plus `amount` into the accumulator.
    /// Caller guarantees `total_weighted_shares > 0`.
    pub fn advance_accumulator(&mut self, amount: u64) -> Result<()> {
        let distributable = (amount as u128)
            .checked_add(self.undistributed_fees as u128)
            .ok_or_else(overflow_err)?;
        let increment = distributable
            .checked_mul(REWARD_SCALE)
            .ok_or_else(overflow_err)?
            / self.total_weighted_shares as u128;
        self.acc_reward_per_weighted_share = self
            .acc_reward_per_weighted_share
            .checked_add(increment)
            .ok_or_else(overflow_err)?;
        self.undistributed_fees = 0;
        Ok(())
    }

    pub fn debt_for(&self, weighted: u64) -> u128 {
        (weighted as u128) * self.acc_reward_per_weighted_share / REWARD_SCALE
    }

    /// Reward earned by `weighted` shares since `debt` was written.
    pub fn pending_delta(&self, weighted: u64, debt: u128) -> u64 {
        let accumulated = (weighted as u128) * self.acc_reward_per_weighted_share / REWARD_SCALE;
        accumulated.saturating_sub(debt) as u64
    }
}

#[account]
pub struct LockPosition {
    pub id: u64,            // 8
    pub owner: Pubkey,      // 32
    pub shares: u64,        // 8
    pub tier: LockTier,     // 1
    pub weight_bps: u16,    // 2
    pub locked_at: i64,     // 8
    pub unlocks_at: i64,    // 8
    pub reward_debt: u128,  // 16
    pub bump: u8,           // 1
}

impl LockPosition {
    // Sum(fields) = 84 → +8 discriminator = 92
    pub const SIZE: usize = 8 + 84;

    pub fn weighted(&self) -> Result<u64> {
        LockFacility::weighted_shares(self.shares, self.weight_bps)
    }

    /// Early-withdraw penalty scaled by remaining lock time, truncating.
    pub fn early_penalty_bps(&self, now: i64, base_penalty_bps: u16) -> u16 {
        let remaining = self.unlocks_at.saturating_sub(now).max(0) as u128;
        let total = self.tier.duration_secs().max(1) as u128;
        ((base_penalty_bps as u128) * remaining / total) as u16
    }
}

#[account]
pub struct LockerAccount {
    pub owner: Pubkey,  // 32
    pub pending: u64,   // 8
    pub bump: u8,       // 1
}

impl LockerAccount {
    // Sum(fields) = 41 → +8 discriminator = 49
    pub const SIZE: usize = 8 + 41;
}

// ---------- Error helpers ----------

#[inline(always)]
fn overflow_err() -> AnchorError {
    ParlayError::MathOverflow.into()
}

/// Validate a parlay request against the registry invariants the engine
/// relies on: leg count, outcome sentinels, duplicates.
pub fn validate_parlay_shape(leg_ids: &[u64], chosen: &[u8]) -> Result<()> {
    require!(
        leg_ids.len() >= math::MIN_LEGS && leg_ids.len() <= math::MAX_LEGS,
        ParlayError::InvalidLegCount
    );
    require!(
        chosen.len() == leg_ids.len(),
        ParlayError::OutcomeCountMismatch
    );
    for c in chosen {
        require!(
            *c == OUTCOME_YES || *c == OUTCOME_NO,
            ParlayError::InvalidOutcomeSentinel
        );
    }
    for (i, id) in leg_ids.iter().enumerate() {
        require!(
            !leg_ids[..i].contains(id),
            ParlayError::DuplicateLeg
        );
    }
    Ok(())
}

/// Probability sanity shared by registry creation and math boundaries.
pub fn validate_probability_ppm(p: u32) -> Result<()> {
    require!(p >= 1 && (p as u128) < PPM, ParlayError::InvalidProbability);
    Ok(())
}
