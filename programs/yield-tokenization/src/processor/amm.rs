use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    pubkey::Pubkey,
};

use crate::{
    account_validation::{
        create_program_account, load, store, transfer_tokens, transfer_tokens_signed,
        validate_key, validate_pda, validate_signer, validate_token_account,
    },
    error::YieldError,
    pda::{seeds, LiquidityPositionPDA, PoolPDA, PositionPDA, VaultAuthorityPDA},
    processor::{
        current_timestamp,
        ledger::{load_owned_position, load_position},
    },
    state::{HolderPosition, LiquidityPosition, Maturity, Pool, PoolAsset},
};

/// Move `amount` of a ledger leg between two positions; token legs are a no-op
fn move_claims(
    maturity: &Maturity,
    from: &mut HolderPosition,
    to: &mut HolderPosition,
    asset: &PoolAsset,
    amount: u64,
) -> Result<(), YieldError> {
    let (pt_amount, yt_amount) = asset.ledger_amounts(amount);
    if pt_amount == 0 && yt_amount == 0 {
        return Ok(());
    }
    maturity.transfer(from, to, pt_amount, yt_amount)
}

/// Token amount of a (leg A, leg B) pair that moves through the vault
fn token_amount(pool: &Pool, amount_a: u64, amount_b: u64) -> u64 {
    if pool.asset_a.mint().is_some() {
        amount_a
    } else if pool.asset_b.mint().is_some() {
        amount_b
    } else {
        0
    }
}

fn validate_pool_vault_authority(
    vault_authority_info: &AccountInfo,
    program_id: &Pubkey,
    pool_info: &AccountInfo,
) -> ProgramResult {
    let (vault_authority, _) = VaultAuthorityPDA::derive(program_id, pool_info.key);
    validate_pda(vault_authority_info, &vault_authority)
}

pub fn process_initialize_pool(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    asset_a: PoolAsset,
    asset_b: PoolAsset,
    fee_bps: u16,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let payer_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let pool_position_info = next_account_info(account_info_iter)?;
    let vault_authority_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate_signer(payer_info)?;

    let mut maturity: Maturity = load(maturity_info, program_id)?;
    let now = current_timestamp()?;
    if maturity.is_expired(now) {
        return Err(YieldError::MaturityExpired.into());
    }

    let (pool_key, bump) = PoolPDA::derive(program_id, maturity_info.key, &asset_a, &asset_b);
    validate_pda(pool_info, &pool_key)?;

    let (vault_authority, vault_authority_bump) = VaultAuthorityPDA::derive(program_id, &pool_key);
    validate_pda(vault_authority_info, &vault_authority)?;

    let (position_key, position_bump) = PositionPDA::derive(program_id, maturity_info.key, &pool_key);
    validate_pda(pool_position_info, &position_key)?;

    let mut vault = Pubkey::default();
    for leg in [asset_a, asset_b] {
        if let Some(mint) = leg.mint() {
            let vault_info = next_account_info(account_info_iter)?;
            validate_token_account(vault_info, &mint, &vault_authority)?;
            vault = *vault_info.key;
        }
    }

    let pool = Pool::new(
        *maturity_info.key,
        maturity.expiry,
        asset_a,
        asset_b,
        position_key,
        vault,
        vault_authority_bump,
        fee_bps,
        bump,
    )?;
    let pool_position = HolderPosition::new(*maturity_info.key, pool_key, maturity.yield_index, position_bump);
    maturity.register_position()?;

    store(&maturity, maturity_info)?;

    let [first_leg_seed, second_leg_seed] = PoolPDA::leg_seeds(&asset_a, &asset_b);
    create_program_account(
        payer_info,
        pool_info,
        system_program,
        program_id,
        &[
            seeds::POOL,
            maturity_info.key.as_ref(),
            &first_leg_seed,
            &second_leg_seed,
            &[bump],
        ],
        &pool,
    )?;
    create_program_account(
        payer_info,
        pool_position_info,
        system_program,
        program_id,
        &[
            seeds::POSITION,
            maturity_info.key.as_ref(),
            pool_key.as_ref(),
            &[position_bump],
        ],
        &pool_position,
    )?;

    msg!(
        "Pool initialized: {:?} / {:?}, fee {} bps",
        asset_a,
        asset_b,
        fee_bps
    );
    Ok(())
}

pub fn process_add_liquidity(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    max_amount_a: u64,
    max_amount_b: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let provider_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let lp_info = next_account_info(account_info_iter)?;
    let provider_position_info = next_account_info(account_info_iter)?;
    let pool_position_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate_signer(provider_info)?;

    let mut pool: Pool = load(pool_info, program_id)?;
    validate_key(maturity_info, &pool.maturity)?;
    validate_key(pool_position_info, &pool.position)?;
    let maturity: Maturity = load(maturity_info, program_id)?;
    let mut provider_position =
        load_owned_position(provider_position_info, program_id, maturity_info.key, provider_info)?;
    let mut pool_position = load_position(pool_position_info, program_id, maturity_info.key)?;

    let now = current_timestamp()?;
    let deposit = pool.add_liquidity(max_amount_a, max_amount_b, now)?;

    move_claims(&maturity, &mut provider_position, &mut pool_position, &pool.asset_a, deposit.amount_a)?;
    move_claims(&maturity, &mut provider_position, &mut pool_position, &pool.asset_b, deposit.amount_b)?;

    store(&pool, pool_info)?;
    store(&provider_position, provider_position_info)?;
    store(&pool_position, pool_position_info)?;

    if lp_info.data_is_empty() {
        let (lp_key, lp_bump) = LiquidityPositionPDA::derive(program_id, pool_info.key, provider_info.key);
        validate_pda(lp_info, &lp_key)?;

        let mut lp = LiquidityPosition::new(*pool_info.key, *provider_info.key, lp_bump);
        lp.credit(deposit.shares)?;
        create_program_account(
            provider_info,
            lp_info,
            system_program,
            program_id,
            &[
                seeds::LIQUIDITY_POSITION,
                pool_info.key.as_ref(),
                provider_info.key.as_ref(),
                &[lp_bump],
            ],
            &lp,
        )?;
    } else {
        let mut lp: LiquidityPosition = load(lp_info, program_id)?;
        if lp.pool != *pool_info.key || lp.owner != *provider_info.key {
            return Err(YieldError::Unauthorized.into());
        }
        lp.credit(deposit.shares)?;
        store(&lp, lp_info)?;
    }

    let token_in = token_amount(&pool, deposit.amount_a, deposit.amount_b);
    if pool.token_leg().is_some() {
        let provider_token_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        validate_key(vault_info, &pool.vault)?;

        transfer_tokens(token_program, provider_token_info, vault_info, provider_info, token_in)?;
    }

    msg!(
        "Liquidity added: {} / {} for {} shares (total {})",
        deposit.amount_a,
        deposit.amount_b,
        deposit.shares,
        pool.total_shares
    );
    Ok(())
}

pub fn process_remove_liquidity(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    shares: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let provider_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let lp_info = next_account_info(account_info_iter)?;
    let provider_position_info = next_account_info(account_info_iter)?;
    let pool_position_info = next_account_info(account_info_iter)?;

    validate_signer(provider_info)?;

    let mut pool: Pool = load(pool_info, program_id)?;
    validate_key(maturity_info, &pool.maturity)?;
    validate_key(pool_position_info, &pool.position)?;
    let maturity: Maturity = load(maturity_info, program_id)?;
    let mut lp: LiquidityPosition = load(lp_info, program_id)?;
    if lp.pool != *pool_info.key || lp.owner != *provider_info.key {
        return Err(YieldError::Unauthorized.into());
    }
    let mut provider_position =
        load_owned_position(provider_position_info, program_id, maturity_info.key, provider_info)?;
    let mut pool_position = load_position(pool_position_info, program_id, maturity_info.key)?;

    lp.debit(shares)?;
    let withdrawal = pool.remove_liquidity(shares)?;

    move_claims(&maturity, &mut pool_position, &mut provider_position, &pool.asset_a, withdrawal.amount_a)?;
    move_claims(&maturity, &mut pool_position, &mut provider_position, &pool.asset_b, withdrawal.amount_b)?;

    store(&pool, pool_info)?;
    store(&lp, lp_info)?;
    store(&provider_position, provider_position_info)?;
    store(&pool_position, pool_position_info)?;

    let token_out = token_amount(&pool, withdrawal.amount_a, withdrawal.amount_b);
    if pool.token_leg().is_some() && token_out > 0 {
        let provider_token_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;
        let vault_authority_info = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        validate_key(vault_info, &pool.vault)?;
        validate_pool_vault_authority(vault_authority_info, program_id, pool_info)?;

        transfer_tokens_signed(
            token_program,
            vault_info,
            provider_token_info,
            vault_authority_info,
            token_out,
            &VaultAuthorityPDA::signer_seeds(pool_info.key, &[pool.vault_authority_bump]),
        )?;
    }

    msg!(
        "Liquidity removed: {} shares for {} / {}",
        shares,
        withdrawal.amount_a,
        withdrawal.amount_b
    );
    Ok(())
}

pub fn process_swap(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount_in: u64,
    min_amount_out: u64,
    token_in_is_a: bool,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let trader_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let trader_position_info = next_account_info(account_info_iter)?;
    let pool_position_info = next_account_info(account_info_iter)?;

    validate_signer(trader_info)?;

    let mut pool: Pool = load(pool_info, program_id)?;
    validate_key(maturity_info, &pool.maturity)?;
    validate_key(pool_position_info, &pool.position)?;
    let maturity: Maturity = load(maturity_info, program_id)?;
    let mut trader_position =
        load_owned_position(trader_position_info, program_id, maturity_info.key, trader_info)?;
    let mut pool_position = load_position(pool_position_info, program_id, maturity_info.key)?;

    let (asset_in, asset_out) = if token_in_is_a {
        (pool.asset_a, pool.asset_b)
    } else {
        (pool.asset_b, pool.asset_a)
    };

    let now = current_timestamp()?;
    let result = pool.swap(amount_in, min_amount_out, token_in_is_a, now)?;

    move_claims(&maturity, &mut trader_position, &mut pool_position, &asset_in, result.amount_in)?;
    move_claims(&maturity, &mut pool_position, &mut trader_position, &asset_out, result.amount_out)?;

    store(&pool, pool_info)?;
    store(&trader_position, trader_position_info)?;
    store(&pool_position, pool_position_info)?;

    if pool.token_leg().is_some() {
        let trader_token_info = next_account_info(account_info_iter)?;
        let vault_info = next_account_info(account_info_iter)?;
        let vault_authority_info = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        validate_key(vault_info, &pool.vault)?;

        if asset_in.mint().is_some() {
            transfer_tokens(token_program, trader_token_info, vault_info, trader_info, result.amount_in)?;
        } else {
            validate_pool_vault_authority(vault_authority_info, program_id, pool_info)?;
            transfer_tokens_signed(
                token_program,
                vault_info,
                trader_token_info,
                vault_authority_info,
                result.amount_out,
                &VaultAuthorityPDA::signer_seeds(pool_info.key, &[pool.vault_authority_bump]),
            )?;
        }
    }

    msg!(
        "Swapped {} {:?} for {} {:?}; reserves {} / {}",
        result.amount_in,
        asset_in,
        result.amount_out,
        asset_out,
        result.reserve_a,
        result.reserve_b
    );
    Ok(())
}
