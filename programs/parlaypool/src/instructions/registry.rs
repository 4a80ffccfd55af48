use anchor_lang::prelude::*;

use crate::errors::ParlayError;
use crate::events::*;
use crate::state::*;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct CreateLegParams {
    pub question: String,
    pub source_ref: [u8; 32],
    pub cutoff_time: i64,
    pub earliest_resolve_time: i64,
    pub probability_ppm: u32,
}

#[derive(Accounts)]
pub struct CreateLeg<'info> {
    #[account(seeds = [b"config"], bump = config.bump)]
    pub config: Account<'info, GlobalConfig>,

    #[account(
        mut,
        seeds = [b"registry"],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        init,
        payer = operator,
        space = Leg::SIZE,
        seeds = [b"leg", registry.leg_count.to_le_bytes().as_ref()],
        bump
    )]
    pub leg: Account<'info, Leg>,

    #[account(
        mut,
        constraint = operator.key() == config.operator @ ParlayError::Unauthorized
    )]
    pub operator: Signer<'info>,
    pub system_program: Program<'info, System>,
}

pub fn create_leg(ctx: Context<CreateLeg>, params: CreateLegParams) -> Result<()> {
    let clock = Clock::get()?;
    validate_probability_ppm(params.probability_ppm)?;
    require!(
        params.question.len() <= QUESTION_LEN,
        ParlayError::QuestionTooLong
    );
    require!(
        params.cutoff_time > clock.unix_timestamp,
        ParlayError::InvalidLegTiming
    );
    require!(
        params.earliest_resolve_time >= params.cutoff_time,
        ParlayError::InvalidLegTiming
    );

    let registry = &mut ctx.accounts.registry;
    let leg = &mut ctx.accounts.leg;
    leg.id = registry.leg_count;
    leg.question = [0u8; QUESTION_LEN];
    leg.question[..params.question.len()].copy_from_slice(params.question.as_bytes());
    leg.source_ref = params.source_ref;
    leg.cutoff_time = params.cutoff_time;
    leg.earliest_resolve_time = params.earliest_resolve_time;
    leg.probability_ppm = params.probability_ppm;
    leg.active = true;
    leg.created_at = clock.unix_timestamp;
    leg.fast_result = LegResult::Pending;
    leg.fast_digest = [0u8; 32];
    leg.fast_resolved_at = 0;
    leg.opt_state = ProposalState::None;
    leg.opt_result = LegResult::Pending;
    leg.opt_digest = [0u8; 32];
    leg.opt_proposer = Pubkey::default();
    leg.opt_challenger = Pubkey::default();
    leg.opt_bond = 0;
    leg.opt_liveness = 0;
    leg.opt_proposed_at = 0;
    leg.bump = ctx.bumps.leg;

    registry.leg_count = registry
        .leg_count
        .checked_add(1)
        .ok_or(ParlayError::MathOverflow)?;

    emit!(LegCreated {
        leg_id: leg.id,
        probability_ppm: leg.probability_ppm,
        cutoff_time: leg.cutoff_time,
    });
    msg!(
        "Leg {} created, p = {} ppm, cutoff {}",
        leg.id,
        leg.probability_ppm,
        leg.cutoff_time
    );
    Ok(())
}

#[derive(Accounts)]
pub struct DeactivateLeg<'info> {
    #[account(seeds = [b"config"], bump = config.bump)]
    pub config: Account<'info, GlobalConfig>,

    #[account(
        mut,
        seeds = [b"leg", leg.id.to_le_bytes().as_ref()],
        bump = leg.bump
    )]
    pub leg: Account<'info, Leg>,

    #[account(constraint = operator.key() == config.operator @ ParlayError::Unauthorized)]
    pub operator: Signer<'info>,
}

/// Legs are never destroyed; deactivation only stops new tickets from
/// referencing them. Live tickets keep their snapshot pricing.
pub fn deactivate_leg(ctx: Context<DeactivateLeg>) -> Result<()> {
    let leg = &mut ctx.accounts.leg;
    require!(leg.active, ParlayError::LegInactive);
    leg.active = false;

    emit!(LegDeactivated { leg_id: leg.id });
    msg!("Leg {} deactivated", leg.id);
    Ok(())
}
