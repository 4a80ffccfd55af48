use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::errors::ParlayError;
use crate::math;
use crate::state::*;

// ===== BOOTSTRAP: CONFIG + POOL + ENGINE + REGISTRY =====

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct InitializeParams {
    pub bootstrap_ends_at: i64,
    pub oracle_bond: u64,
    pub oracle_liveness_secs: i64,
    pub min_stake: Option<u64>,
    pub max_stake: Option<u64>,
}

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = operator,
        space = GlobalConfig::SIZE,
        seeds = [b"config"],
        bump
    )]
    pub config: Account<'info, GlobalConfig>,

    #[account(
        init,
        payer = operator,
        space = Pool::SIZE,
        seeds = [b"pool"],
        bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        init,
        payer = operator,
        space = Engine::SIZE,
        seeds = [b"engine"],
        bump
    )]
    pub engine: Account<'info, Engine>,

    #[account(
        init,
        payer = operator,
        space = Registry::SIZE,
        seeds = [b"registry"],
        bump
    )]
    pub registry: Account<'info, Registry>,

    pub stable_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = operator,
        token::mint = stable_mint,
        token::authority = pool,
        seeds = [b"pool_vault"],
        bump
    )]
    pub pool_vault: Account<'info, TokenAccount>,

    #[account(
        init,
        payer = operator,
        mint::decimals = stable_mint.decimals,
        mint::authority = pool,
        seeds = [b"share_mint"],
        bump
    )]
    pub share_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = operator,
        token::mint = stable_mint,
        token::authority = registry,
        seeds = [b"bond_vault"],
        bump
    )]
    pub bond_vault: Account<'info, TokenAccount>,

    /// Safety buffer that receives its slice of every routed fee.
    #[account(constraint = safety_vault.mint == stable_mint.key() @ ParlayError::SafetyVaultNotConfigured)]
    pub safety_vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub operator: Signer<'info>,
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn initialize(ctx: Context<Initialize>, params: InitializeParams) -> Result<()> {
    require!(
        params.oracle_bond > 0 && params.oracle_liveness_secs > 0,
        ParlayError::InvalidFeeConfig
    );

    let config = &mut ctx.accounts.config;
    config.operator = ctx.accounts.operator.key();
    config.stable_mint = ctx.accounts.stable_mint.key();
    config.safety_vault = ctx.accounts.safety_vault.key();
    config.lock_facility = Pubkey::default(); // wired by initialize_lock_facility
    config.yield_adapter = None;
    config.base_fee_bps = GlobalConfig::DEFAULT_BASE_FEE_BPS;
    config.per_leg_fee_bps = GlobalConfig::DEFAULT_PER_LEG_FEE_BPS;
    config.max_payout_fraction_bps = GlobalConfig::DEFAULT_MAX_PAYOUT_FRACTION_BPS;
    config.utilization_cap_bps = GlobalConfig::DEFAULT_UTILIZATION_CAP_BPS;
    config.cashout_base_penalty_bps = GlobalConfig::DEFAULT_CASHOUT_BASE_PENALTY_BPS;
    config.unlock_base_penalty_bps = GlobalConfig::DEFAULT_UNLOCK_BASE_PENALTY_BPS;
    config.fee_to_lockers_bps = GlobalConfig::DEFAULT_FEE_TO_LOCKERS_BPS;
    config.fee_to_safety_bps = GlobalConfig::DEFAULT_FEE_TO_SAFETY_BPS;
    config.yield_buffer_bps = GlobalConfig::DEFAULT_YIELD_BUFFER_BPS;
    config.min_stake = params.min_stake.unwrap_or(GlobalConfig::DEFAULT_MIN_STAKE);
    config.max_stake = params.max_stake.unwrap_or(GlobalConfig::DEFAULT_MAX_STAKE);
    config.oracle_bond = params.oracle_bond;
    config.oracle_liveness_secs = params.oracle_liveness_secs;
    config.bootstrap_ends_at = params.bootstrap_ends_at;
    config.bump = ctx.bumps.config;
    require!(config.min_stake <= config.max_stake, ParlayError::InvalidFeeConfig);

    let pool = &mut ctx.accounts.pool;
    pool.stable_mint = ctx.accounts.stable_mint.key();
    pool.vault = ctx.accounts.pool_vault.key();
    pool.share_mint = ctx.accounts.share_mint.key();
    pool.total_assets = 0;
    pool.total_shares = 0;
    pool.total_reserved = 0;
    pool.bump = ctx.bumps.pool;

    let engine = &mut ctx.accounts.engine;
    engine.ticket_count = 0;
    engine.bump = ctx.bumps.engine;

    let registry = &mut ctx.accounts.registry;
    registry.leg_count = 0;
    registry.bond_vault = ctx.accounts.bond_vault.key();
    registry.bump = ctx.bumps.registry;

    msg!(
        "Protocol initialized; bootstrap ends at {}",
        params.bootstrap_ends_at
    );
    Ok(())
}

// ===== BOOTSTRAP: LOCK FACILITY =====

#[derive(Accounts)]
pub struct InitializeLockFacility<'info> {
    #[account(
        mut,
        seeds = [b"config"],
        bump = config.bump
    )]
    pub config: Account<'info, GlobalConfig>,

    #[account(seeds = [b"pool"], bump = pool.bump)]
    pub pool: Account<'info, Pool>,

    #[account(
        init,
        payer = operator,
        space = LockFacility::SIZE,
        seeds = [b"lock_facility"],
        bump
    )]
    pub lock_facility: Account<'info, LockFacility>,

    #[account(constraint = share_mint.key() == pool.share_mint @ ParlayError::NotConfigured)]
    pub share_mint: Account<'info, Mint>,

    #[account(constraint = stable_mint.key() == config.stable_mint @ ParlayError::NotConfigured)]
    pub stable_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = operator,
        token::mint = share_mint,
        token::authority = lock_facility,
        seeds = [b"share_escrow"],
        bump
    )]
    pub share_escrow: Account<'info, TokenAccount>,

    #[account(
        init,
        payer = operator,
        token::mint = stable_mint,
        token::authority = lock_facility,
        seeds = [b"reward_vault"],
        bump
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = operator.key() == config.operator @ ParlayError::Unauthorized
    )]
    pub operator: Signer<'info>,
    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn initialize_lock_facility(
    ctx: Context<InitializeLockFacility>,
    minimum_lock: Option<u64>,
) -> Result<()> {
    let facility = &mut ctx.accounts.lock_facility;
    facility.share_mint = ctx.accounts.share_mint.key();
    facility.share_escrow = ctx.accounts.share_escrow.key();
    facility.reward_vault = ctx.accounts.reward_vault.key();
    facility.total_locked_shares = 0;
    facility.total_weighted_shares = 0;
    facility.acc_reward_per_weighted_share = 0;
    facility.undistributed_fees = 0;
    facility.minimum_lock = minimum_lock.unwrap_or(LockFacility::DEFAULT_MINIMUM_LOCK);
    facility.position_count = 0;
    facility.bump = ctx.bumps.lock_facility;

    ctx.accounts.config.lock_facility = facility.key();

    msg!("Lock facility wired: {}", facility.key());
    Ok(())
}

// ===== OPERATOR SETTERS =====

#[derive(Accounts)]
pub struct SetSafetyVault<'info> {
    #[account(
        mut,
        seeds = [b"config"],
        bump = config.bump
    )]
    pub config: Account<'info, GlobalConfig>,

    #[account(constraint = safety_vault.mint == config.stable_mint @ ParlayError::SafetyVaultNotConfigured)]
    pub safety_vault: Account<'info, TokenAccount>,

    #[account(constraint = operator.key() == config.operator @ ParlayError::Unauthorized)]
    pub operator: Signer<'info>,
}

pub fn set_safety_vault(ctx: Context<SetSafetyVault>) -> Result<()> {
    ctx.accounts.config.safety_vault = ctx.accounts.safety_vault.key();
    msg!("Safety vault set: {}", ctx.accounts.safety_vault.key());
    Ok(())
}

#[derive(Accounts)]
pub struct UpdateConfig<'info> {
    #[account(
        mut,
        seeds = [b"config"],
        bump = config.bump
    )]
    pub config: Account<'info, GlobalConfig>,

    #[account(constraint = operator.key() == config.operator @ ParlayError::Unauthorized)]
    pub operator: Signer<'info>,
}

pub fn set_yield_adapter(ctx: Context<UpdateConfig>, adapter: Pubkey) -> Result<()> {
    require!(adapter != Pubkey::default(), ParlayError::NotConfigured);
    ctx.accounts.config.yield_adapter = Some(adapter);
    msg!("Yield adapter set: {}", adapter);
    Ok(())
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct EngineParamsUpdate {
    pub base_fee_bps: Option<u16>,
    pub per_leg_fee_bps: Option<u16>,
    pub cashout_base_penalty_bps: Option<u16>,
    pub bootstrap_ends_at: Option<i64>,
    pub min_stake: Option<u64>,
    pub max_stake: Option<u64>,
}

/// Fee/penalty knobs for new tickets. Live tickets carry their own frozen
/// copies and are unaffected.
pub fn update_engine_params(ctx: Context<UpdateConfig>, params: EngineParamsUpdate) -> Result<()> {
    let config = &mut ctx.accounts.config;
    if let Some(v) = params.base_fee_bps {
        config.base_fee_bps = v;
    }
    if let Some(v) = params.per_leg_fee_bps {
        config.per_leg_fee_bps = v;
    }
    if let Some(v) = params.cashout_base_penalty_bps {
        require!((v as u64) <= math::BPS as u64, ParlayError::InvalidFeeConfig);
        config.cashout_base_penalty_bps = v;
    }
    if let Some(v) = params.bootstrap_ends_at {
        config.bootstrap_ends_at = v;
    }
    if let Some(v) = params.min_stake {
        config.min_stake = v;
    }
    if let Some(v) = params.max_stake {
        config.max_stake = v;
    }
    // The full five-leg edge must stay below 100%.
    math::compute_edge_bps(
        math::MAX_LEGS as u8,
        config.base_fee_bps,
        config.per_leg_fee_bps,
    )?;
    require!(config.min_stake <= config.max_stake, ParlayError::InvalidFeeConfig);
    Ok(())
}
