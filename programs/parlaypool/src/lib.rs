use anchor_lang::prelude::*;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

pub mod errors;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;

#[cfg(test)]
mod tests;

use state::{LegResult, LockTier, PayoutMode};
pub use instructions::*;

#[program]
pub mod parlaypool {
    use super::*;

    // ----- Bootstrap and configuration -----

    pub fn initialize(ctx: Context<Initialize>, params: InitializeParams) -> Result<()> {
        instructions::initialize(ctx, params)
    }

    pub fn initialize_lock_facility(
        ctx: Context<InitializeLockFacility>,
        minimum_lock: Option<u64>,
    ) -> Result<()> {
        instructions::initialize_lock_facility(ctx, minimum_lock)
    }

    pub fn set_safety_vault(ctx: Context<SetSafetyVault>) -> Result<()> {
        instructions::set_safety_vault(ctx)
    }

    pub fn set_yield_adapter(ctx: Context<UpdateConfig>, adapter: Pubkey) -> Result<()> {
        instructions::set_yield_adapter(ctx, adapter)
    }

    pub fn update_engine_params(
        ctx: Context<UpdateConfig>,
        params: EngineParamsUpdate,
    ) -> Result<()> {
        instructions::update_engine_params(ctx, params)
    }

    pub fn set_oracle_params(
        ctx: Context<SetOracleParams>,
        bond: Option<u64>,
        liveness_secs: Option<i64>,
    ) -> Result<()> {
        instructions::set_oracle_params(ctx, bond, liveness_secs)
    }

    // ----- Pool -----

    /// Deposit stable assets, minting pool shares at the current price.
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        instructions::deposit(ctx, amount)
    }

    /// Burn pool shares for a pro-rata slice of unreserved assets.
    pub fn withdraw(ctx: Context<Withdraw>, shares: u64) -> Result<()> {
        instructions::withdraw(ctx, shares)
    }

    // ----- Leg registry -----

    pub fn create_leg(ctx: Context<CreateLeg>, params: CreateLegParams) -> Result<()> {
        instructions::create_leg(ctx, params)
    }

    pub fn deactivate_leg(ctx: Context<DeactivateLeg>) -> Result<()> {
        instructions::deactivate_leg(ctx)
    }

    // ----- Oracle -----

    /// Fast path: the operator reports a leg's outcome once.
    pub fn resolve_leg(
        ctx: Context<ResolveLeg>,
        result: LegResult,
        digest: [u8; 32],
    ) -> Result<()> {
        instructions::resolve_leg(ctx, result, digest)
    }

    /// Optimistic path: escrow a bond and propose an outcome.
    pub fn propose_outcome(
        ctx: Context<ProposeOutcome>,
        result: LegResult,
        digest: [u8; 32],
    ) -> Result<()> {
        instructions::propose_outcome(ctx, result, digest)
    }

    pub fn challenge_outcome(ctx: Context<ChallengeOutcome>) -> Result<()> {
        instructions::challenge_outcome(ctx)
    }

    pub fn finalize_outcome(ctx: Context<FinalizeOutcome>) -> Result<()> {
        instructions::finalize_outcome(ctx)
    }

    pub fn resolve_dispute(
        ctx: Context<ResolveDispute>,
        result: LegResult,
        digest: [u8; 32],
        proposer_correct: bool,
    ) -> Result<()> {
        instructions::resolve_dispute(ctx, result, digest, proposer_correct)
    }

    // ----- Betting engine -----

    /// Buy a classic parlay ticket over 2..=5 legs.
    ///
    /// Leg accounts are passed as remaining accounts in `leg_ids` order.
    pub fn buy_ticket<'info>(
        ctx: Context<'_, '_, 'info, 'info, BuyTicket<'info>>,
        leg_ids: Vec<u64>,
        chosen: Vec<u8>,
        stake: u64,
    ) -> Result<()> {
        instructions::buy_ticket(ctx, leg_ids, chosen, stake, PayoutMode::Classic)
    }

    /// Buy a ticket with an explicit payout mode (classic, progressive or
    /// early-cashout), chosen once at buy time.
    pub fn buy_ticket_with_mode<'info>(
        ctx: Context<'_, '_, 'info, 'info, BuyTicket<'info>>,
        leg_ids: Vec<u64>,
        chosen: Vec<u8>,
        stake: u64,
        payout_mode: PayoutMode,
    ) -> Result<()> {
        instructions::buy_ticket(ctx, leg_ids, chosen, stake, payout_mode)
    }

    /// Permissionless settlement once every leg is final.
    pub fn settle_ticket<'info>(
        ctx: Context<'_, '_, 'info, 'info, SettleTicket<'info>>,
    ) -> Result<()> {
        instructions::settle_ticket(ctx)
    }

    pub fn claim_progressive<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimProgressive<'info>>,
    ) -> Result<()> {
        instructions::claim_progressive(ctx)
    }

    pub fn cashout_early<'info>(
        ctx: Context<'_, '_, 'info, 'info, CashoutEarly<'info>>,
        min_out: u64,
    ) -> Result<()> {
        instructions::cashout_early(ctx, min_out)
    }

    pub fn claim_payout(ctx: Context<ClaimPayout>) -> Result<()> {
        instructions::claim_payout(ctx)
    }

    // ----- Lock facility -----

    pub fn lock_shares(ctx: Context<LockShares>, amount: u64, tier: LockTier) -> Result<()> {
        instructions::lock_shares(ctx, amount, tier)
    }

    pub fn unlock_position(ctx: Context<UnlockPosition>) -> Result<()> {
        instructions::unlock_position(ctx)
    }

    pub fn early_withdraw(ctx: Context<UnlockPosition>) -> Result<()> {
        instructions::early_withdraw(ctx)
    }

    pub fn settle_rewards(ctx: Context<SettleRewards>) -> Result<()> {
        instructions::settle_rewards(ctx)
    }

    pub fn claim_fees(ctx: Context<ClaimFees>) -> Result<()> {
        instructions::claim_fees(ctx)
    }

    pub fn sweep_penalty_shares(ctx: Context<SweepPenaltyShares>) -> Result<()> {
        instructions::sweep_penalty_shares(ctx)
    }
}
