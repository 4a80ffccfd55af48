use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::errors::ParlayError;
use crate::events::*;
use crate::state::*;

// ===== FAST (ADMIN) RESOLUTION =====

#[derive(Accounts)]
pub struct ResolveLeg<'info> {
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

pub fn resolve_leg(ctx: Context<ResolveLeg>, result: LegResult, digest: [u8; 32]) -> Result<()> {
    let clock = Clock::get()?;
    let leg = &mut ctx.accounts.leg;

    require!(result != LegResult::Pending, ParlayError::InvalidOutcome);
    require!(
        leg.fast_result == LegResult::Pending,
        ParlayError::AlreadyResolved
    );
    require!(
        clock.unix_timestamp >= leg.earliest_resolve_time,
        ParlayError::ResolveTooEarly
    );

    leg.fast_result = result;
    leg.fast_digest = digest;
    leg.fast_resolved_at = clock.unix_timestamp;

    emit!(LegResolved {
        leg_id: leg.id,
        result,
        digest,
    });
    msg!("Leg {} resolved: {:?}", leg.id, result);
    Ok(())
}

// ===== OPTIMISTIC RESOLUTION =====

#[derive(Accounts)]
pub struct ProposeOutcome<'info> {
    #[account(seeds = [b"config"], bump = config.bump)]
    pub config: Account<'info, GlobalConfig>,

    #[account(seeds = [b"registry"], bump = registry.bump)]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [b"leg", leg.id.to_le_bytes().as_ref()],
        bump = leg.bump
    )]
    pub leg: Account<'info, Leg>,

    #[account(mut, constraint = bond_vault.key() == registry.bond_vault @ ParlayError::NotConfigured)]
    pub bond_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = proposer_token.owner == proposer.key() @ ParlayError::Unauthorized,
        constraint = proposer_token.mint == config.stable_mint @ ParlayError::NotConfigured
    )]
    pub proposer_token: Account<'info, TokenAccount>,

    pub proposer: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

/// Anyone may propose an outcome by escrowing the bond. Bond and liveness
/// are snapshotted into the proposal so later parameter updates cannot
/// retroactively alter open proposals.
pub fn propose_outcome(
    ctx: Context<ProposeOutcome>,
    result: LegResult,
    digest: [u8; 32],
) -> Result<()> {
    let clock = Clock::get()?;
    let config = &ctx.accounts.config;
    let leg = &mut ctx.accounts.leg;

    require!(result != LegResult::Pending, ParlayError::InvalidOutcome);
    require!(
        leg.opt_state == ProposalState::None,
        ParlayError::AlreadyProposed
    );
    require!(
        clock.unix_timestamp >= leg.earliest_resolve_time,
        ParlayError::ResolveTooEarly
    );

    leg.opt_state = ProposalState::Proposed;
    leg.opt_result = result;
    leg.opt_digest = digest;
    leg.opt_proposer = ctx.accounts.proposer.key();
    leg.opt_challenger = Pubkey::default();
    leg.opt_bond = config.oracle_bond;
    leg.opt_liveness = config.oracle_liveness_secs;
    leg.opt_proposed_at = clock.unix_timestamp;

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.proposer_token.to_account_info(),
                to: ctx.accounts.bond_vault.to_account_info(),
                authority: ctx.accounts.proposer.to_account_info(),
            },
        ),
        leg.opt_bond,
    )?;

    emit!(OutcomeProposed {
        leg_id: leg.id,
        proposer: leg.opt_proposer,
        result,
        bond: leg.opt_bond,
        liveness_secs: leg.opt_liveness,
    });
    msg!(
        "Leg {} outcome proposed: {:?}, liveness {}s",
        leg.id,
        result,
        leg.opt_liveness
    );
    Ok(())
}

#[derive(Accounts)]
pub struct ChallengeOutcome<'info> {
    #[account(seeds = [b"registry"], bump = registry.bump)]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [b"leg", leg.id.to_le_bytes().as_ref()],
        bump = leg.bump
    )]
    pub leg: Account<'info, Leg>,

    #[account(mut, constraint = bond_vault.key() == registry.bond_vault @ ParlayError::NotConfigured)]
    pub bond_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = challenger_token.owner == challenger.key() @ ParlayError::Unauthorized
    )]
    pub challenger_token: Account<'info, TokenAccount>,

    pub challenger: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

/// A matching bond (equal to the proposal snapshot) from a non-proposer
/// escalates the proposal to a dispute.
pub fn challenge_outcome(ctx: Context<ChallengeOutcome>) -> Result<()> {
    let clock = Clock::get()?;
    let leg = &mut ctx.accounts.leg;

    require!(
        leg.opt_state == ProposalState::Proposed,
        ParlayError::ProposalNotOpen
    );
    require!(
        ctx.accounts.challenger.key() != leg.opt_proposer,
        ParlayError::ChallengerIsProposer
    );
    require!(
        clock.unix_timestamp < leg.proposal_deadline(),
        ParlayError::ChallengeWindowClosed
    );

    leg.opt_state = ProposalState::Challenged;
    leg.opt_challenger = ctx.accounts.challenger.key();

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.challenger_token.to_account_info(),
                to: ctx.accounts.bond_vault.to_account_info(),
                authority: ctx.accounts.challenger.to_account_info(),
            },
        ),
        leg.opt_bond,
    )?;

    emit!(OutcomeChallenged {
        leg_id: leg.id,
        challenger: leg.opt_challenger,
        bond: leg.opt_bond,
    });
    msg!("Leg {} challenged", leg.id);
    Ok(())
}

#[derive(Accounts)]
pub struct FinalizeOutcome<'info> {
    #[account(seeds = [b"registry"], bump = registry.bump)]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [b"leg", leg.id.to_le_bytes().as_ref()],
        bump = leg.bump
    )]
    pub leg: Account<'info, Leg>,

    #[account(mut, constraint = bond_vault.key() == registry.bond_vault @ ParlayError::NotConfigured)]
    pub bond_vault: Account<'info, TokenAccount>,

    /// Receives the returned bond; must belong to the proposer.
    #[account(
        mut,
        constraint = proposer_token.owner == leg.opt_proposer @ ParlayError::Unauthorized
    )]
    pub proposer_token: Account<'info, TokenAccount>,

    pub caller: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

/// Permissionless. After the snapshotted liveness window, an unchallenged
/// proposal becomes final and the bond is returned.
pub fn finalize_outcome(ctx: Context<FinalizeOutcome>) -> Result<()> {
    let clock = Clock::get()?;
    let leg = &mut ctx.accounts.leg;

    require!(
        leg.opt_state != ProposalState::Finalized && leg.opt_state != ProposalState::Resolved,
        ParlayError::AlreadyFinalized
    );
    require!(
        leg.opt_state == ProposalState::Proposed,
        ParlayError::ProposalNotOpen
    );
    require!(
        clock.unix_timestamp >= leg.proposal_deadline(),
        ParlayError::LivenessNotElapsed
    );

    leg.opt_state = ProposalState::Finalized;

    let registry_bump = ctx.accounts.registry.bump;
    let registry_seeds: &[&[u8]] = &[b"registry", &[registry_bump]];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.bond_vault.to_account_info(),
                to: ctx.accounts.proposer_token.to_account_info(),
                authority: ctx.accounts.registry.to_account_info(),
            },
            &[registry_seeds],
        ),
        leg.opt_bond,
    )?;

    emit!(OutcomeFinalized {
        leg_id: leg.id,
        result: leg.opt_result,
    });
    msg!("Leg {} finalized: {:?}", leg.id, leg.opt_result);
    Ok(())
}

#[derive(Accounts)]
#[instruction(result: LegResult, digest: [u8; 32], proposer_correct: bool)]
pub struct ResolveDispute<'info> {
    #[account(seeds = [b"config"], bump = config.bump)]
    pub config: Account<'info, GlobalConfig>,

    #[account(seeds = [b"registry"], bump = registry.bump)]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [b"leg", leg.id.to_le_bytes().as_ref()],
        bump = leg.bump
    )]
    pub leg: Account<'info, Leg>,

    #[account(mut, constraint = bond_vault.key() == registry.bond_vault @ ParlayError::NotConfigured)]
    pub bond_vault: Account<'info, TokenAccount>,

    /// Both escrowed bonds go to the winning side of the dispute.
    #[account(
        mut,
        constraint = winner_token.owner == (if proposer_correct { leg.opt_proposer } else { leg.opt_challenger }) @ ParlayError::Unauthorized
    )]
    pub winner_token: Account<'info, TokenAccount>,

    #[account(constraint = operator.key() == config.operator @ ParlayError::Unauthorized)]
    pub operator: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

pub fn resolve_dispute(
    ctx: Context<ResolveDispute>,
    result: LegResult,
    digest: [u8; 32],
    proposer_correct: bool,
) -> Result<()> {
    let leg = &mut ctx.accounts.leg;

    require!(result != LegResult::Pending, ParlayError::InvalidOutcome);
    require!(
        leg.opt_state == ProposalState::Challenged,
        ParlayError::ProposalNotOpen
    );

    leg.opt_state = ProposalState::Resolved;
    leg.opt_result = result;
    leg.opt_digest = digest;

    let bonds_paid = leg
        .opt_bond
        .checked_mul(2)
        .ok_or(ParlayError::MathOverflow)?;

    let registry_bump = ctx.accounts.registry.bump;
    let registry_seeds: &[&[u8]] = &[b"registry", &[registry_bump]];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.bond_vault.to_account_info(),
                to: ctx.accounts.winner_token.to_account_info(),
                authority: ctx.accounts.registry.to_account_info(),
            },
            &[registry_seeds],
        ),
        bonds_paid,
    )?;

    emit!(DisputeResolved {
        leg_id: leg.id,
        result,
        proposer_correct,
        bonds_paid,
    });
    msg!(
        "Leg {} dispute resolved: {:?}, proposer_correct = {}",
        leg.id,
        result,
        proposer_correct
    );
    Ok(())
}

#[derive(Accounts)]
pub struct SetOracleParams<'info> {
    #[account(
        mut,
        seeds = [b"config"],
        bump = config.bump
    )]
    pub config: Account<'info, GlobalConfig>,

    #[account(constraint = operator.key() == config.operator @ ParlayError::Unauthorized)]
    pub operator: Signer<'info>,
}

/// Global bond/liveness for future proposals. Open proposals carry their
/// own snapshots and are unaffected.
pub fn set_oracle_params(
    ctx: Context<SetOracleParams>,
    bond: Option<u64>,
    liveness_secs: Option<i64>,
) -> Result<()> {
    let config = &mut ctx.accounts.config;
    if let Some(v) = bond {
        require!(v > 0, ParlayError::ZeroAmount);
        config.oracle_bond = v;
    }
    if let Some(v) = liveness_secs {
        require!(v > 0, ParlayError::InvalidLegTiming);
        config.oracle_liveness_secs = v;
    }
    Ok(())
}
