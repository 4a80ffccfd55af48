use anchor_lang::prelude::*;

use crate::state::{LegResult, PayoutMode, TicketStatus};

/// Why a payout left the pool for a ticket owner.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq)]
pub enum ClaimReason {
    Win,
    Refund,
    Progressive,
}

#[event]
pub struct TicketBought {
    pub ticket_id: u64,
    pub owner: Pubkey,
    pub stake: u64,
    pub potential_payout: u64,
    pub fee_paid: u64,
    pub payout_mode: PayoutMode,
}

#[event]
pub struct TicketSettled {
    pub ticket_id: u64,
    pub terminal_status: TicketStatus,
    pub adjusted_payout: u64,
}

#[event]
pub struct PayoutClaimed {
    pub ticket_id: u64,
    pub owner: Pubkey,
    pub amount: u64,
    pub reason: ClaimReason,
}

#[event]
pub struct CashedOut {
    pub ticket_id: u64,
    pub owner: Pubkey,
    pub cashout_value: u64,
    pub penalty_bps: u16,
}

#[event]
pub struct FeesRouted {
    pub ticket_id: u64,
    pub to_lockers: u64,
    pub to_safety: u64,
    pub to_pool_surplus: u64,
}

#[event]
pub struct Deposited {
    pub owner: Pubkey,
    pub shares: u64,
    pub assets: u64,
}

#[event]
pub struct Withdrawn {
    pub owner: Pubkey,
    pub shares: u64,
    pub assets: u64,
}

#[event]
pub struct Locked {
    pub position_id: u64,
    pub owner: Pubkey,
    pub shares: u64,
    pub weight_bps: u16,
    pub unlocks_at: i64,
}

#[event]
pub struct Unlocked {
    pub position_id: u64,
    pub owner: Pubkey,
    pub shares: u64,
}

#[event]
pub struct EarlyWithdrawn {
    pub position_id: u64,
    pub owner: Pubkey,
    pub shares_returned: u64,
    pub penalty_bps: u16,
}

#[event]
pub struct RewardsSettled {
    pub position_id: u64,
    pub owner: Pubkey,
    pub delta: u64,
}

#[event]
pub struct FeesClaimed {
    pub owner: Pubkey,
    pub amount: u64,
}

#[event]
pub struct PenaltySharesSwept {
    pub to: Pubkey,
    pub shares: u64,
}

#[event]
pub struct LegCreated {
    pub leg_id: u64,
    pub probability_ppm: u32,
    pub cutoff_time: i64,
}

#[event]
pub struct LegDeactivated {
    pub leg_id: u64,
}

#[event]
pub struct LegResolved {
    pub leg_id: u64,
    pub result: LegResult,
    pub digest: [u8; 32],
}

#[event]
pub struct OutcomeProposed {
    pub leg_id: u64,
    pub proposer: Pubkey,
    pub result: LegResult,
    pub bond: u64,
    pub liveness_secs: i64,
}

#[event]
pub struct OutcomeChallenged {
    pub leg_id: u64,
    pub challenger: Pubkey,
    pub bond: u64,
}

#[event]
pub struct OutcomeFinalized {
    pub leg_id: u64,
    pub result: LegResult,
}

#[event]
pub struct DisputeResolved {
    pub leg_id: u64,
    pub result: LegResult,
    pub proposer_correct: bool,
    pub bonds_paid: u64,
}
