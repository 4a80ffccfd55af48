use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::errors::ParlayError;
use crate::events::*;
use crate::math::BPS;
use crate::state::*;

// ===== LOCK =====

#[derive(Accounts)]
pub struct LockShares<'info> {
    #[account(
        mut,
        seeds = [b"lock_facility"],
        bump = lock_facility.bump
    )]
    pub lock_facility: Account<'info, LockFacility>,

    #[account(mut, constraint = share_escrow.key() == lock_facility.share_escrow @ ParlayError::NotConfigured)]
    pub share_escrow: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = locker_shares.owner == locker.key() @ ParlayError::Unauthorized,
        constraint = locker_shares.mint == lock_facility.share_mint @ ParlayError::NotConfigured
    )]
    pub locker_shares: Account<'info, TokenAccount>,

    #[account(
        init,
        payer = locker,
        space = LockPosition::SIZE,
        seeds = [b"lock_position", lock_facility.position_count.to_le_bytes().as_ref()],
        bump
    )]
    pub position: Account<'info, LockPosition>,

    #[account(
        init_if_needed,
        payer = locker,
        space = LockerAccount::SIZE,
        seeds = [b"locker", locker.key().as_ref()],
        bump
    )]
    pub locker_account: Account<'info, LockerAccount>,

    #[account(mut)]
    pub locker: Signer<'info>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn lock_shares(ctx: Context<LockShares>, amount: u64, tier: LockTier) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;
    let facility = &mut ctx.accounts.lock_facility;

    require!(
        amount >= facility.minimum_lock,
        ParlayError::LockBelowMinimum
    );

    let weight_bps = tier.weight_bps();
    let weighted = LockFacility::weighted_shares(amount, weight_bps)?;

    facility.total_locked_shares = facility
        .total_locked_shares
        .checked_add(amount)
        .ok_or(ParlayError::MathOverflow)?;
    facility.total_weighted_shares = facility
        .total_weighted_shares
        .checked_add(weighted)
        .ok_or(ParlayError::MathOverflow)?;

    let position = &mut ctx.accounts.position;
    position.id = facility.position_count;
    position.owner = ctx.accounts.locker.key();
    position.shares = amount;
    position.tier = tier;
    position.weight_bps = weight_bps;
    position.locked_at = now;
    position.unlocks_at = now
        .checked_add(tier.duration_secs())
        .ok_or(ParlayError::MathOverflow)?;
    // Debt is written against the pre-flush accumulator so a backlog of
    // undistributed fees lands on this position.
    position.reward_debt = facility.debt_for(weighted);
    position.bump = ctx.bumps.position;

    if facility.undistributed_fees > 0 {
        facility.advance_accumulator(0)?;
    }

    facility.position_count = facility
        .position_count
        .checked_add(1)
        .ok_or(ParlayError::MathOverflow)?;

    let locker_account = &mut ctx.accounts.locker_account;
    if locker_account.owner == Pubkey::default() {
        locker_account.owner = ctx.accounts.locker.key();
        locker_account.pending = 0;
        locker_account.bump = ctx.bumps.locker_account;
    }

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.locker_shares.to_account_info(),
                to: ctx.accounts.share_escrow.to_account_info(),
                authority: ctx.accounts.locker.to_account_info(),
            },
        ),
        amount,
    )?;

    emit!(Locked {
        position_id: ctx.accounts.position.id,
        owner: ctx.accounts.position.owner,
        shares: amount,
        weight_bps,
        unlocks_at: ctx.accounts.position.unlocks_at,
    });
    msg!(
        "Position {} locked {} shares at {:?} ({} bps)",
        ctx.accounts.position.id,
        amount,
        tier,
        weight_bps
    );
    Ok(())
}

// ===== UNLOCK / EARLY WITHDRAW =====

#[derive(Accounts)]
pub struct UnlockPosition<'info> {
    #[account(seeds = [b"config"], bump = config.bump)]
    pub config: Account<'info, GlobalConfig>,

    #[account(
        mut,
        seeds = [b"lock_facility"],
        bump = lock_facility.bump
    )]
    pub lock_facility: Account<'info, LockFacility>,

    #[account(mut, constraint = share_escrow.key() == lock_facility.share_escrow @ ParlayError::NotConfigured)]
    pub share_escrow: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = owner_shares.owner == owner.key() @ ParlayError::Unauthorized,
        constraint = owner_shares.mint == lock_facility.share_mint @ ParlayError::NotConfigured
    )]
    pub owner_shares: Account<'info, TokenAccount>,

    #[account(
        mut,
        close = owner,
        seeds = [b"lock_position", position.id.to_le_bytes().as_ref()],
        bump = position.bump,
        constraint = position.owner == owner.key() @ ParlayError::NotPositionOwner
    )]
    pub position: Account<'info, LockPosition>,

    #[account(
        mut,
        seeds = [b"locker", owner.key().as_ref()],
        bump = locker_account.bump
    )]
    pub locker_account: Account<'info, LockerAccount>,

    #[account(mut)]
    pub owner: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

/// Settle a position's pending rewards into its owner's account and update
/// the facility totals for its removal. Returns the settled delta.
fn settle_and_remove(
    facility: &mut LockFacility,
    position: &LockPosition,
    locker_account: &mut LockerAccount,
) -> Result<u64> {
    let weighted = position.weighted()?;
    let delta = facility.pending_delta(weighted, position.reward_debt);
    locker_account.pending = locker_account
        .pending
        .checked_add(delta)
        .ok_or(ParlayError::MathOverflow)?;
    facility.total_locked_shares = facility
        .total_locked_shares
        .checked_sub(position.shares)
        .ok_or(ParlayError::MathOverflow)?;
    facility.total_weighted_shares = facility
        .total_weighted_shares
        .checked_sub(weighted)
        .ok_or(ParlayError::MathOverflow)?;
    Ok(delta)
}

pub fn unlock_position(ctx: Context<UnlockPosition>) -> Result<()> {
    let clock = Clock::get()?;
    let position = &ctx.accounts.position;
    require!(
        clock.unix_timestamp >= position.unlocks_at,
        ParlayError::LockNotMatured
    );

    let facility = &mut ctx.accounts.lock_facility;
    let delta = settle_and_remove(facility, position, &mut ctx.accounts.locker_account)?;
    let shares = position.shares;

    let facility_bump = facility.bump;
    let facility_seeds: &[&[u8]] = &[b"lock_facility", &[facility_bump]];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.share_escrow.to_account_info(),
                to: ctx.accounts.owner_shares.to_account_info(),
                authority: ctx.accounts.lock_facility.to_account_info(),
            },
            &[facility_seeds],
        ),
        shares,
    )?;

    emit!(RewardsSettled {
        position_id: ctx.accounts.position.id,
        owner: ctx.accounts.owner.key(),
        delta,
    });
    emit!(Unlocked {
        position_id: ctx.accounts.position.id,
        owner: ctx.accounts.owner.key(),
        shares,
    });
    msg!("Position {} unlocked {} shares", ctx.accounts.position.id, shares);
    Ok(())
}

/// Exit before maturity at a penalty scaled by the remaining lock time.
/// The penalty shares stay in escrow as sweepable surplus.
pub fn early_withdraw(ctx: Context<UnlockPosition>) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;
    let position = &ctx.accounts.position;
    require!(now < position.unlocks_at, ParlayError::LockMatured);

    let penalty_bps = position.early_penalty_bps(now, ctx.accounts.config.unlock_base_penalty_bps);
    let returned = ((position.shares as u128) * (BPS - penalty_bps as u128) / BPS) as u64;

    let facility = &mut ctx.accounts.lock_facility;
    let delta = settle_and_remove(facility, position, &mut ctx.accounts.locker_account)?;

    let facility_bump = facility.bump;
    let facility_seeds: &[&[u8]] = &[b"lock_facility", &[facility_bump]];
    if returned > 0 {
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.share_escrow.to_account_info(),
                    to: ctx.accounts.owner_shares.to_account_info(),
                    authority: ctx.accounts.lock_facility.to_account_info(),
                },
                &[facility_seeds],
            ),
            returned,
        )?;
    }

    emit!(RewardsSettled {
        position_id: ctx.accounts.position.id,
        owner: ctx.accounts.owner.key(),
        delta,
    });
    emit!(EarlyWithdrawn {
        position_id: ctx.accounts.position.id,
        owner: ctx.accounts.owner.key(),
        shares_returned: returned,
        penalty_bps,
    });
    msg!(
        "Position {} early withdraw: {} of {} shares ({} bps penalty)",
        ctx.accounts.position.id,
        returned,
        ctx.accounts.position.shares,
        penalty_bps
    );
    Ok(())
}

// ===== REWARD SETTLEMENT / CLAIM =====

#[derive(Accounts)]
pub struct SettleRewards<'info> {
    #[account(
        seeds = [b"lock_facility"],
        bump = lock_facility.bump
    )]
    pub lock_facility: Account<'info, LockFacility>,

    #[account(
        mut,
        seeds = [b"lock_position", position.id.to_le_bytes().as_ref()],
        bump = position.bump
    )]
    pub position: Account<'info, LockPosition>,

    #[account(
        mut,
        seeds = [b"locker", position.owner.as_ref()],
        bump = locker_account.bump
    )]
    pub locker_account: Account<'info, LockerAccount>,
}

/// Permissionless and idempotent per accumulator delta: a second call with
/// no new fees settles zero.
pub fn settle_rewards(ctx: Context<SettleRewards>) -> Result<()> {
    let facility = &ctx.accounts.lock_facility;
    let position = &mut ctx.accounts.position;

    let weighted = position.weighted()?;
    let delta = facility.pending_delta(weighted, position.reward_debt);
    position.reward_debt = facility.debt_for(weighted);

    let locker_account = &mut ctx.accounts.locker_account;
    locker_account.pending = locker_account
        .pending
        .checked_add(delta)
        .ok_or(ParlayError::MathOverflow)?;

    emit!(RewardsSettled {
        position_id: position.id,
        owner: position.owner,
        delta,
    });
    msg!("Position {} settled {} pending", position.id, delta);
    Ok(())
}

#[derive(Accounts)]
pub struct ClaimFees<'info> {
    #[account(
        seeds = [b"lock_facility"],
        bump = lock_facility.bump
    )]
    pub lock_facility: Account<'info, LockFacility>,

    #[account(mut, constraint = reward_vault.key() == lock_facility.reward_vault @ ParlayError::NotConfigured)]
    pub reward_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [b"locker", claimer.key().as_ref()],
        bump = locker_account.bump
    )]
    pub locker_account: Account<'info, LockerAccount>,

    #[account(
        mut,
        constraint = claimer_token.owner == claimer.key() @ ParlayError::Unauthorized,
        constraint = claimer_token.mint == reward_vault.mint @ ParlayError::NotConfigured
    )]
    pub claimer_token: Account<'info, TokenAccount>,

    pub claimer: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

pub fn claim_fees(ctx: Context<ClaimFees>) -> Result<()> {
    let locker_account = &mut ctx.accounts.locker_account;
    let amount = locker_account.pending;
    require!(amount > 0, ParlayError::NothingToClaim);
    locker_account.pending = 0;

    let facility_bump = ctx.accounts.lock_facility.bump;
    let facility_seeds: &[&[u8]] = &[b"lock_facility", &[facility_bump]];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.reward_vault.to_account_info(),
                to: ctx.accounts.claimer_token.to_account_info(),
                authority: ctx.accounts.lock_facility.to_account_info(),
            },
            &[facility_seeds],
        ),
        amount,
    )?;

    emit!(FeesClaimed {
        owner: ctx.accounts.claimer.key(),
        amount,
    });
    msg!("Claimed {} in fees", amount);
    Ok(())
}

// ===== SWEEP =====

#[derive(Accounts)]
pub struct SweepPenaltyShares<'info> {
    #[account(seeds = [b"config"], bump = config.bump)]
    pub config: Account<'info, GlobalConfig>,

    #[account(
        seeds = [b"lock_facility"],
        bump = lock_facility.bump
    )]
    pub lock_facility: Account<'info, LockFacility>,

    #[account(mut, constraint = share_escrow.key() == lock_facility.share_escrow @ ParlayError::NotConfigured)]
    pub share_escrow: Account<'info, TokenAccount>,

    #[account(mut, constraint = to_shares.mint == lock_facility.share_mint @ ParlayError::NotConfigured)]
    pub to_shares: Account<'info, TokenAccount>,

    #[account(constraint = operator.key() == config.operator @ ParlayError::Unauthorized)]
    pub operator: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

/// Escrowed shares above the sum of live positions are forfeited penalty
/// shares; the operator may move them out.
pub fn sweep_penalty_shares(ctx: Context<SweepPenaltyShares>) -> Result<()> {
    let facility = &ctx.accounts.lock_facility;
    let surplus = ctx
        .accounts
        .share_escrow
        .amount
        .saturating_sub(facility.total_locked_shares);
    require!(surplus > 0, ParlayError::NoSweepableSurplus);

    let facility_bump = facility.bump;
    let facility_seeds: &[&[u8]] = &[b"lock_facility", &[facility_bump]];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.share_escrow.to_account_info(),
                to: ctx.accounts.to_shares.to_account_info(),
                authority: ctx.accounts.lock_facility.to_account_info(),
            },
            &[facility_seeds],
        ),
        surplus,
    )?;

    emit!(PenaltySharesSwept {
        to: ctx.accounts.to_shares.owner,
        shares: surplus,
    });
    msg!("Swept {} penalty shares", surplus);
    Ok(())
}
