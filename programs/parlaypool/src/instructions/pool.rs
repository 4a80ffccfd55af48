use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, Mint, MintTo, Token, TokenAccount, Transfer};

use crate::errors::ParlayError;
use crate::events::*;
use crate::state::*;

// ===== DEPOSIT =====

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(mut, constraint = pool_vault.key() == pool.vault @ ParlayError::NotConfigured)]
    pub pool_vault: Account<'info, TokenAccount>,

    #[account(mut, constraint = share_mint.key() == pool.share_mint @ ParlayError::NotConfigured)]
    pub share_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = depositor_token.owner == depositor.key() @ ParlayError::Unauthorized,
        constraint = depositor_token.mint == pool.stable_mint @ ParlayError::NotConfigured
    )]
    pub depositor_token: Account<'info, TokenAccount>,

    /// Share account credited with the minted shares; its owner is the
    /// beneficiary and need not be the depositor.
    #[account(mut, constraint = beneficiary_shares.mint == pool.share_mint @ ParlayError::NotConfigured)]
    pub beneficiary_shares: Account<'info, TokenAccount>,

    pub depositor: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    require!(amount > 0, ParlayError::ZeroAmount);

    let pool = &mut ctx.accounts.pool;
    let shares = pool.shares_for_deposit(amount)?;
    require!(shares > 0, ParlayError::ZeroAmount);

    pool.total_assets = pool
        .total_assets
        .checked_add(amount)
        .ok_or(ParlayError::MathOverflow)?;
    pool.total_shares = pool
        .total_shares
        .checked_add(shares)
        .ok_or(ParlayError::MathOverflow)?;

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.depositor_token.to_account_info(),
                to: ctx.accounts.pool_vault.to_account_info(),
                authority: ctx.accounts.depositor.to_account_info(),
            },
        ),
        amount,
    )?;

    let pool_bump = ctx.accounts.pool.bump;
    let pool_seeds: &[&[u8]] = &[b"pool", &[pool_bump]];
    token::mint_to(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            MintTo {
                mint: ctx.accounts.share_mint.to_account_info(),
                to: ctx.accounts.beneficiary_shares.to_account_info(),
                authority: ctx.accounts.pool.to_account_info(),
            },
            &[pool_seeds],
        ),
        shares,
    )?;

    emit!(Deposited {
        owner: ctx.accounts.beneficiary_shares.owner,
        shares,
        assets: amount,
    });
    msg!("Deposited {} for {} shares", amount, shares);
    Ok(())
}

// ===== WITHDRAW =====

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(
        mut,
        seeds = [b"pool"],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(mut, constraint = pool_vault.key() == pool.vault @ ParlayError::NotConfigured)]
    pub pool_vault: Account<'info, TokenAccount>,

    #[account(mut, constraint = share_mint.key() == pool.share_mint @ ParlayError::NotConfigured)]
    pub share_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = withdrawer_shares.owner == withdrawer.key() @ ParlayError::Unauthorized,
        constraint = withdrawer_shares.mint == pool.share_mint @ ParlayError::NotConfigured
    )]
    pub withdrawer_shares: Account<'info, TokenAccount>,

    /// Asset account paid out to; its owner is the beneficiary.
    #[account(mut, constraint = recipient_token.mint == pool.stable_mint @ ParlayError::NotConfigured)]
    pub recipient_token: Account<'info, TokenAccount>,

    pub withdrawer: Signer<'info>,
    pub token_program: Program<'info, Token>,
}

pub fn withdraw(ctx: Context<Withdraw>, shares: u64) -> Result<()> {
    require!(shares > 0, ParlayError::ZeroAmount);

    let pool = &mut ctx.accounts.pool;
    let assets = pool.assets_for_shares(shares)?;
    require!(assets > 0, ParlayError::ZeroAmount);

    // Reserved payouts may never be withdrawn by LPs.
    require!(
        pool.total_assets.saturating_sub(assets) >= pool.total_reserved,
        ParlayError::InsufficientLiquidity
    );

    pool.total_assets -= assets;
    pool.total_shares = pool
        .total_shares
        .checked_sub(shares)
        .ok_or(ParlayError::MathOverflow)?;

    token::burn(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Burn {
                mint: ctx.accounts.share_mint.to_account_info(),
                from: ctx.accounts.withdrawer_shares.to_account_info(),
                authority: ctx.accounts.withdrawer.to_account_info(),
            },
        ),
        shares,
    )?;

    let pool_bump = ctx.accounts.pool.bump;
    let pool_seeds: &[&[u8]] = &[b"pool", &[pool_bump]];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.pool_vault.to_account_info(),
                to: ctx.accounts.recipient_token.to_account_info(),
                authority: ctx.accounts.pool.to_account_info(),
            },
            &[pool_seeds],
        ),
        assets,
    )?;

    emit!(Withdrawn {
        owner: ctx.accounts.withdrawer.key(),
        shares,
        assets,
    });
    msg!("Withdrew {} shares for {}", shares, assets);
    Ok(())
}
