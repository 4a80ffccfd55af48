use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::errors::ParlayError;
use crate::events::*;
use crate::math;
use crate::state::*;

/// Deserialize the ticket's legs from remaining accounts, in ticket order.
/// Ownership and discriminator are checked by `Account::try_from`; the id
/// check pins each account to the leg the ticket actually references.
fn load_ticket_legs<'info>(
    leg_ids: &[u64],
    accounts: &'info [AccountInfo<'info>],
) -> Result<Vec<Account<'info, Leg>>> {
    require!(accounts.len() == leg_ids.len(), ParlayError::LegMismatch);
    let mut legs = Vec::with_capacity(leg_ids.len());
    for (expected_id, ai) in leg_ids.iter().zip(accounts.iter()) {
        let leg: Account<'info, Leg> = Account::try_from(ai)?;
        require!(leg.id == *expected_id, ParlayError::LegMismatch);
        legs.push(leg);
    }
    Ok(legs)
}

/// Per-ticket view of each leg under the ticket's frozen settlement mode.
fn ticket_outcomes(ticket: &Ticket, legs: &[Account<Leg>]) -> Vec<LegOutcome> {
    legs.iter()
        .enumerate()
        .map(|(i, leg)| leg_outcome(leg.result_for(ticket.settlement_mode).0, ticket.chosen[i]))
        .collect()
}

// ===== BUY TICKET =====

#[derive(Accounts)]
pub struct BuyTicket<'info> {
    #[account(seeds = [b"config"], bump = config.bump)]
    pub config: Account<'info, GlobalConfig>,

    #[account(
        mut,
        seeds = [b"engine"],
        bump = engine.bump
    )]
    pub engine: Account<'info, Engine>,

    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(mut, constraint = pool_vault.key() == pool.vault @ ParlayError::NotConfigured)]
    pub pool_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [b"lock_facility"],
        bump = lock_facility.bump,
        constraint = lock_facility.key() == config.lock_facility @ ParlayError::LockFacilityNotConfigured
    )]
    pub lock_facility: Account<'info, LockFacility>,

    #[account(mut, constraint = reward_vault.key() == lock_facility.reward_vault @ ParlayError::NotConfigured)]
    pub reward_vault: Account<'info, TokenAccount>,

    #[account(mut, constraint = safety_vault.key() == config.safety_vault @ ParlayError::SafetyVaultNotConfigured)]
    pub safety_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = buyer_token.owner == buyer.key() @ ParlayError::Unauthorized,
        constraint = buyer_token.mint == pool.stable_mint @ ParlayError::NotConfigured
    )]
    pub buyer_token: Account<'info, TokenAccount>,

    #[account(
        init,
        payer = buyer,
        space = Ticket::SIZE,
        seeds = [b"ticket", engine.ticket_count.to_le_bytes().as_ref()],
        bump
    )]
    pub ticket: Account<'info, Ticket>,

    #[account(mut)]
    pub buyer: Signer<'info>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn buy_ticket<'info>(
    ctx: Context<'_, '_, 'info, 'info, BuyTicket<'info>>,
    leg_ids: Vec<u64>,
    chosen: Vec<u8>,
    stake: u64,
    payout_mode: PayoutMode,
) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;
    let config = &ctx.accounts.config;

    config.require_wired()?;
    validate_parlay_shape(&leg_ids, &chosen)?;
    require!(stake >= config.min_stake, ParlayError::StakeTooSmall);
    require!(stake <= config.max_stake, ParlayError::StakeTooLarge);

    // Registry validation + probability snapshot.
    let legs = load_ticket_legs(&leg_ids, ctx.remaining_accounts)?;
    let mut probs: Vec<u32> = Vec::with_capacity(legs.len());
    for leg in &legs {
        require!(leg.active, ParlayError::LegInactive);
        require!(now < leg.cutoff_time, ParlayError::BettingClosed);
        probs.push(leg.probability_ppm);
    }

    let quote = math::quote_ticket(&probs, stake, config.base_fee_bps, config.per_leg_fee_bps)?;

    // Caps are evaluated against the pool as it stands before the stake
    // lands; LP withdrawals after buy are bounded by the solvency gate.
    let pool = &mut ctx.accounts.pool;
    pool.check_reservation_caps(
        quote.potential_payout,
        config.max_payout_fraction_bps,
        config.utilization_cap_bps,
    )?;

    let (to_lockers, to_safety, to_pool_surplus) = math::split_fee(
        quote.fee_paid,
        config.fee_to_lockers_bps,
        config.fee_to_safety_bps,
    )?;

    pool.total_assets = pool
        .total_assets
        .checked_add(stake)
        .ok_or(ParlayError::MathOverflow)?;
    pool.reserve(quote.potential_payout)?;
    // Routed fees leave the pool and must fit in free liquidity.
    pool.pay_unreserved(
        to_lockers
            .checked_add(to_safety)
            .ok_or(ParlayError::MathOverflow)?,
    )?;
    if to_lockers > 0 {
        ctx.accounts.lock_facility.notify_fees(to_lockers)?;
    }

    let engine = &mut ctx.accounts.engine;
    let ticket = &mut ctx.accounts.ticket;
    ticket.id = engine.ticket_count;
    ticket.owner = ctx.accounts.buyer.key();
    ticket.stake = stake;
    ticket.effective_stake = quote.effective_stake;
    ticket.fee_paid = quote.fee_paid;
    ticket.leg_count = leg_ids.len() as u8;
    ticket.leg_ids = [0u64; 5];
    ticket.leg_ids[..leg_ids.len()].copy_from_slice(&leg_ids);
    ticket.chosen = [0u8; 5];
    ticket.chosen[..chosen.len()].copy_from_slice(&chosen);
    ticket.probs_ppm = [0u32; 5];
    ticket.probs_ppm[..probs.len()].copy_from_slice(&probs);
    ticket.quoted_multiplier_ppm = quote.net_multiplier_ppm;
    ticket.edge_bps = quote.edge_bps;
    ticket.cashout_base_penalty_bps = config.cashout_base_penalty_bps;
    ticket.potential_payout = quote.potential_payout;
    ticket.settlement_mode = config.settlement_mode_at(now);
    ticket.payout_mode = payout_mode;
    ticket.status = TicketStatus::Active;
    ticket.claimed_amount = 0;
    ticket.created_at = now;
    ticket.bump = ctx.bumps.ticket;
    engine.ticket_count = engine
        .ticket_count
        .checked_add(1)
        .ok_or(ParlayError::MathOverflow)?;

    // Stake in, then the fee slices out, pool PDA signing.
    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.buyer_token.to_account_info(),
                to: ctx.accounts.pool_vault.to_account_info(),
                authority: ctx.accounts.buyer.to_account_info(),
            },
        ),
        stake,
    )?;

    let pool_bump = ctx.accounts.pool.bump;
    let pool_seeds: &[&[u8]] = &[b"pool", &[pool_bump]];
    if to_lockers > 0 {
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.pool_vault.to_account_info(),
                    to: ctx.accounts.reward_vault.to_account_info(),
                    authority: ctx.accounts.pool.to_account_info(),
                },
                &[pool_seeds],
            ),
            to_lockers,
        )?;
    }
    if to_safety > 0 {
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.pool_vault.to_account_info(),
                    to: ctx.accounts.safety_vault.to_account_info(),
                    authority: ctx.accounts.pool.to_account_info(),
                },
                &[pool_seeds],
            ),
            to_safety,
        )?;
    }

    let ticket = &ctx.accounts.ticket;
    emit!(TicketBought {
        ticket_id: ticket.id,
        owner: ticket.owner,
        stake,
        potential_payout: ticket.potential_payout,
        fee_paid: ticket.fee_paid,
        payout_mode,
    });
    emit!(FeesRouted {
        ticket_id: ticket.id,
        to_lockers,
        to_safety,
        to_pool_surplus,
    });
    msg!(
        "Ticket {} bought: stake {}, x{} ppm, payout {}, mode {:?}",
        ticket.id,
        stake,
        ticket.quoted_multiplier_ppm,
        ticket.potential_payout,
        payout_mode
    );
    Ok(())
}

// ===== SETTLE TICKET (PERMISSIONLESS) =====

#[derive(Accounts)]
pub struct SettleTicket<'info> {
    #[account(
        mut,
        seeds = [b"ticket", ticket.id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Account<'info, Ticket>,

    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    pub caller: Signer<'info>,
}

pub fn settle_ticket<'info>(ctx: Context<'_, '_, 'info, 'info, SettleTicket<'info>>) -> Result<()> {
    let ticket = &mut ctx.accounts.ticket;
    require!(
        ticket.status == TicketStatus::Active,
        ParlayError::AlreadyResolved
    );

    let legs = load_ticket_legs(
        &ticket.leg_ids[..ticket.leg_count as usize],
        ctx.remaining_accounts,
    )?;
    let outcomes = ticket_outcomes(ticket, &legs);
    let verdict = ticket.decide_settlement(&outcomes)?;

    let pool = &mut ctx.accounts.pool;
    let adjusted_payout = match verdict {
        SettlementVerdict::Won { adjusted_payout } => {
            // Keep enough reserved to cover the still-payable remainder.
            let keep = adjusted_payout.max(ticket.claimed_amount);
            pool.release(ticket.potential_payout.saturating_sub(keep));
            ticket.potential_payout = adjusted_payout;
            ticket.status = TicketStatus::Won;
            adjusted_payout
        }
        SettlementVerdict::Lost => {
            pool.release(
                ticket
                    .potential_payout
                    .saturating_sub(ticket.claimed_amount),
            );
            ticket.status = TicketStatus::Lost;
            0
        }
        SettlementVerdict::Voided => {
            pool.release(
                ticket
                    .potential_payout
                    .saturating_sub(ticket.claimed_amount),
            );
            ticket.status = TicketStatus::Voided;
            0
        }
    };

    emit!(TicketSettled {
        ticket_id: ticket.id,
        terminal_status: ticket.status,
        adjusted_payout,
    });
    msg!(
        "Ticket {} settled: {:?}, payout {}",
        ticket.id,
        ticket.status,
        adjusted_payout
    );
    Ok(())
}

// ===== PROGRESSIVE CLAIM =====

#[derive(Accounts)]
pub struct ClaimProgressive<'info> {
    #[account(
        mut,
        seeds = [b"ticket", ticket.id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Account<'info, Ticket>,

    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(mut, constraint = pool_vault.key() == pool.vault @ ParlayError::NotConfigured)]
    pub pool_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = owner_token.owner == owner.key() @ ParlayError::Unauthorized,
        constraint = owner_token.mint == pool.stable_mint @ ParlayError::NotConfigured
    )]
    pub owner_token: Account<'info, TokenAccount>,

    pub owner: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

/// Partial payout over already-won legs. The reservation stays in place;
/// later legs can still lift the payable amount up to the full quote.
pub fn claim_progressive<'info>(
    ctx: Context<'_, '_, 'info, 'info, ClaimProgressive<'info>>,
) -> Result<()> {
    let ticket = &mut ctx.accounts.ticket;
    ticket.require_owner(&ctx.accounts.owner.key())?;
    require!(
        ticket.payout_mode == PayoutMode::Progressive,
        ParlayError::WrongPayoutMode
    );
    ticket.require_status(TicketStatus::Active)?;

    let legs = load_ticket_legs(
        &ticket.leg_ids[..ticket.leg_count as usize],
        ctx.remaining_accounts,
    )?;
    let outcomes = ticket_outcomes(ticket, &legs);
    let won_probs = ticket.probs_where(&outcomes, LegOutcome::Won);
    require!(!won_probs.is_empty(), ParlayError::NoWonLegs);

    let quote = math::compute_progressive_payout(
        ticket.effective_stake,
        &won_probs,
        ticket.potential_payout,
        ticket.claimed_amount,
    )?;
    require!(quote.claimable > 0, ParlayError::NothingToClaim);

    ticket.claimed_amount = ticket
        .claimed_amount
        .checked_add(quote.claimable)
        .ok_or(ParlayError::MathOverflow)?;
    let pool = &mut ctx.accounts.pool;
    pool.pay_reserved(quote.claimable)?;

    let pool_bump = pool.bump;
    let pool_seeds: &[&[u8]] = &[b"pool", &[pool_bump]];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.pool_vault.to_account_info(),
                to: ctx.accounts.owner_token.to_account_info(),
                authority: ctx.accounts.pool.to_account_info(),
            },
            &[pool_seeds],
        ),
        quote.claimable,
    )?;

    emit!(PayoutClaimed {
        ticket_id: ctx.accounts.ticket.id,
        owner: ctx.accounts.owner.key(),
        amount: quote.claimable,
        reason: ClaimReason::Progressive,
    });
    msg!(
        "Ticket {} progressive claim: {} (total {})",
        ctx.accounts.ticket.id,
        quote.claimable,
        ctx.accounts.ticket.claimed_amount
    );
    Ok(())
}

// ===== EARLY CASHOUT =====

#[derive(Accounts)]
pub struct CashoutEarly<'info> {
    #[account(
        mut,
        seeds = [b"ticket", ticket.id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Account<'info, Ticket>,

    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(mut, constraint = pool_vault.key() == pool.vault @ ParlayError::NotConfigured)]
    pub pool_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = owner_token.owner == owner.key() @ ParlayError::Unauthorized,
        constraint = owner_token.mint == pool.stable_mint @ ParlayError::NotConfigured
    )]
    pub owner_token: Account<'info, TokenAccount>,

    pub owner: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

/// Voluntary exit at fair value minus the unresolved-ratio penalty.
/// Closes the ticket and releases the whole remaining reservation.
pub fn cashout_early<'info>(
    ctx: Context<'_, '_, 'info, 'info, CashoutEarly<'info>>,
    min_out: u64,
) -> Result<()> {
    let ticket = &mut ctx.accounts.ticket;
    ticket.require_owner(&ctx.accounts.owner.key())?;
    require!(
        ticket.payout_mode == PayoutMode::EarlyCashout,
        ParlayError::WrongPayoutMode
    );
    ticket.require_status(TicketStatus::Active)?;

    let legs = load_ticket_legs(
        &ticket.leg_ids[..ticket.leg_count as usize],
        ctx.remaining_accounts,
    )?;
    let outcomes = ticket_outcomes(ticket, &legs);
    require!(
        !outcomes.iter().any(|o| *o == LegOutcome::Lost),
        ParlayError::LegAlreadyLost
    );
    let unresolved = outcomes
        .iter()
        .filter(|o| **o == LegOutcome::Unresolved)
        .count();
    require!(unresolved > 0, ParlayError::NothingUnresolved);
    let won_probs = ticket.probs_where(&outcomes, LegOutcome::Won);
    require!(!won_probs.is_empty(), ParlayError::NoWonLegs);

    let quote = math::compute_cashout_value(
        ticket.effective_stake,
        &won_probs,
        unresolved as u8,
        ticket.leg_count,
        ticket.potential_payout,
        ticket.cashout_base_penalty_bps,
    )?;
    require!(quote.cashout_value >= min_out, ParlayError::SlippageExceeded);

    // Saturating: progressive-style prior claims can only reduce the
    // transfer, never go negative.
    let pay = quote.cashout_value.saturating_sub(ticket.claimed_amount);
    let release = ticket
        .potential_payout
        .saturating_sub(quote.cashout_value.max(ticket.claimed_amount));

    ticket.status = TicketStatus::Claimed;
    ticket.claimed_amount = ticket
        .claimed_amount
        .checked_add(pay)
        .ok_or(ParlayError::MathOverflow)?;
    let pool = &mut ctx.accounts.pool;
    pool.pay_reserved(pay)?;
    pool.release(release);

    if pay > 0 {
        let pool_bump = pool.bump;
        let pool_seeds: &[&[u8]] = &[b"pool", &[pool_bump]];
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.pool_vault.to_account_info(),
                    to: ctx.accounts.owner_token.to_account_info(),
                    authority: ctx.accounts.pool.to_account_info(),
                },
                &[pool_seeds],
            ),
            pay,
        )?;
    }

    emit!(CashedOut {
        ticket_id: ctx.accounts.ticket.id,
        owner: ctx.accounts.owner.key(),
        cashout_value: quote.cashout_value,
        penalty_bps: quote.penalty_bps,
    });
    msg!(
        "Ticket {} cashed out: {} (penalty {} bps, fair {})",
        ctx.accounts.ticket.id,
        quote.cashout_value,
        quote.penalty_bps,
        quote.fair_value
    );
    Ok(())
}

// ===== CLAIM PAYOUT =====

#[derive(Accounts)]
pub struct ClaimPayout<'info> {
    #[account(
        mut,
        seeds = [b"ticket", ticket.id.to_le_bytes().as_ref()],
        bump = ticket.bump
    )]
    pub ticket: Account<'info, Ticket>,

    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(mut, constraint = pool_vault.key() == pool.vault @ ParlayError::NotConfigured)]
    pub pool_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = owner_token.owner == owner.key() @ ParlayError::Unauthorized,
        constraint = owner_token.mint == pool.stable_mint @ ParlayError::NotConfigured
    )]
    pub owner_token: Account<'info, TokenAccount>,

    pub owner: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

pub fn claim_payout(ctx: Context<ClaimPayout>) -> Result<()> {
    let ticket = &mut ctx.accounts.ticket;
    ticket.require_owner(&ctx.accounts.owner.key())?;

    let pool = &mut ctx.accounts.pool;
    let (amount, reason) = match ticket.status {
        TicketStatus::Won => {
            let pay = ticket
                .potential_payout
                .saturating_sub(ticket.claimed_amount);
            ticket.status = TicketStatus::Claimed;
            ticket.claimed_amount = ticket
                .claimed_amount
                .checked_add(pay)
                .ok_or(ParlayError::MathOverflow)?;
            if pay > 0 {
                pool.pay_reserved(pay)?;
            }
            (pay, ClaimReason::Win)
        }
        TicketStatus::Voided => {
            // Full stake back; the reservation was released at settlement.
            let refund = ticket.stake;
            ticket.status = TicketStatus::Claimed;
            pool.pay_unreserved(refund)?;
            (refund, ClaimReason::Refund)
        }
        TicketStatus::Claimed => return Err(ParlayError::AlreadyClaimed.into()),
        TicketStatus::Lost => return Err(ParlayError::NothingToClaim.into()),
        TicketStatus::Active => return Err(ParlayError::WrongTicketStatus.into()),
    };

    if amount > 0 {
        let pool_bump = pool.bump;
        let pool_seeds: &[&[u8]] = &[b"pool", &[pool_bump]];
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.pool_vault.to_account_info(),
                    to: ctx.accounts.owner_token.to_account_info(),
                    authority: ctx.accounts.pool.to_account_info(),
                },
                &[pool_seeds],
            ),
            amount,
        )?;
    }

    emit!(PayoutClaimed {
        ticket_id: ctx.accounts.ticket.id,
        owner: ctx.accounts.owner.key(),
        amount,
        reason,
    });
    msg!(
        "Ticket {} claimed {} ({:?})",
        ctx.accounts.ticket.id,
        amount,
        reason
    );
    Ok(())
}
