use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    account_validation::{create_program_account, load, store, validate_pda, validate_signer},
    constants::{DEFAULT_HEARTBEAT_SECONDS, DEFAULT_MAX_DEVIATION_BPS, DEFAULT_MIN_UPDATE_INTERVAL},
    error::YieldError,
    pda::{seeds, OraclePDA, PriceFeedPDA},
    processor::current_timestamp,
    state::{OracleConfig, PriceFeed, PriceUpdateOutcome},
};

pub fn process_initialize_oracle(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    heartbeat_seconds: Option<i64>,
    max_deviation_bps: Option<u16>,
    min_update_interval: Option<i64>,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    let oracle_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate_signer(authority_info)?;

    let (oracle_key, bump) = OraclePDA::derive(program_id, authority_info.key);
    validate_pda(oracle_info, &oracle_key)?;

    let config = OracleConfig::new(
        *authority_info.key,
        heartbeat_seconds.unwrap_or(DEFAULT_HEARTBEAT_SECONDS),
        max_deviation_bps.unwrap_or(DEFAULT_MAX_DEVIATION_BPS),
        min_update_interval.unwrap_or(DEFAULT_MIN_UPDATE_INTERVAL),
        bump,
    );
    config.validate()?;

    create_program_account(
        authority_info,
        oracle_info,
        system_program,
        program_id,
        &[seeds::ORACLE, authority_info.key.as_ref(), &[bump]],
        &config,
    )?;

    msg!(
        "Oracle initialized: heartbeat {}s, max deviation {} bps, min interval {}s",
        config.heartbeat_seconds,
        config.max_deviation_bps,
        config.min_update_interval
    );

    Ok(())
}

/// Load the oracle config for an authority-signed admin change, apply
/// `update` and persist
fn update_config<F>(program_id: &Pubkey, accounts: &[AccountInfo], update: F) -> ProgramResult
where
    F: FnOnce(&mut OracleConfig, &Pubkey) -> Result<(), YieldError>,
{
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    let oracle_info = next_account_info(account_info_iter)?;

    validate_signer(authority_info)?;

    let mut config: OracleConfig = load(oracle_info, program_id)?;
    update(&mut config, authority_info.key)?;
    store(&config, oracle_info)
}

pub fn process_update_oracle_config(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    heartbeat_seconds: Option<i64>,
    max_deviation_bps: Option<u16>,
    min_update_interval: Option<i64>,
) -> ProgramResult {
    update_config(program_id, accounts, |config, caller| {
        config.update_parameters(caller, heartbeat_seconds, max_deviation_bps, min_update_interval)
    })?;
    msg!("Oracle parameters updated");
    Ok(())
}

pub fn process_add_updater(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    updater: Pubkey,
) -> ProgramResult {
    update_config(program_id, accounts, |config, caller| {
        config.add_updater(caller, updater)
    })?;
    msg!("Updater added: {}", updater);
    Ok(())
}

pub fn process_remove_updater(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    updater: Pubkey,
) -> ProgramResult {
    update_config(program_id, accounts, |config, caller| {
        config.remove_updater(caller, &updater)
    })?;
    msg!("Updater removed: {}", updater);
    Ok(())
}

pub fn process_set_paused(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    paused: bool,
) -> ProgramResult {
    update_config(program_id, accounts, |config, caller| {
        config.set_paused(caller, paused)
    })?;
    msg!("Oracle paused: {}", paused);
    Ok(())
}

pub fn process_reset_circuit_breaker(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    update_config(program_id, accounts, |config, caller| {
        config.reset_circuit_breaker(caller)
    })?;
    msg!("Circuit breaker reset");
    Ok(())
}

pub fn process_initialize_price_feed(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    asset: Pubkey,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    let oracle_info = next_account_info(account_info_iter)?;
    let feed_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate_signer(authority_info)?;

    let config: OracleConfig = load(oracle_info, program_id)?;
    if config.authority != *authority_info.key {
        return Err(YieldError::Unauthorized.into());
    }

    let (feed_key, bump) = PriceFeedPDA::derive(program_id, oracle_info.key, &asset);
    validate_pda(feed_info, &feed_key)?;

    let feed = PriceFeed::new(*oracle_info.key, asset, bump);
    create_program_account(
        authority_info,
        feed_info,
        system_program,
        program_id,
        &[seeds::PRICE_FEED, oracle_info.key.as_ref(), asset.as_ref(), &[bump]],
        &feed,
    )?;

    msg!("Price feed initialized for asset {}", asset);
    Ok(())
}

fn load_feed(
    feed_info: &AccountInfo,
    oracle_info: &AccountInfo,
    program_id: &Pubkey,
) -> Result<PriceFeed, ProgramError> {
    let feed: PriceFeed = load(feed_info, program_id)?;
    if feed.oracle != *oracle_info.key {
        return Err(YieldError::InvalidAccountData.into());
    }
    Ok(feed)
}

pub fn process_set_threshold(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    threshold: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    let oracle_info = next_account_info(account_info_iter)?;
    let feed_info = next_account_info(account_info_iter)?;

    validate_signer(authority_info)?;

    let config: OracleConfig = load(oracle_info, program_id)?;
    let mut feed = load_feed(feed_info, oracle_info, program_id)?;

    config.set_threshold(authority_info.key, &mut feed, threshold)?;
    store(&feed, feed_info)?;

    msg!("Threshold for {} set to {}", feed.asset, threshold);
    Ok(())
}

pub fn process_update_price(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    price: u64,
    confidence_bps: u16,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let updater_info = next_account_info(account_info_iter)?;
    let oracle_info = next_account_info(account_info_iter)?;
    let feed_info = next_account_info(account_info_iter)?;

    validate_signer(updater_info)?;

    let mut config: OracleConfig = load(oracle_info, program_id)?;
    let mut feed = load_feed(feed_info, oracle_info, program_id)?;

    let now = current_timestamp()?;

    match config.update_price(&mut feed, updater_info.key, price, confidence_bps, now)? {
        PriceUpdateOutcome::Applied => {
            store(&feed, feed_info)?;
            msg!(
                "Price updated: {} = {} ({} bps confidence)",
                feed.asset,
                price,
                confidence_bps
            );
        }
        PriceUpdateOutcome::CircuitBreakerTripped {
            previous_price,
            submitted_price,
            deviation_bps,
        } => {
            store(&config, oracle_info)?;
            msg!(
                "Circuit breaker tripped on {}: {} -> {} ({} bps); update rejected",
                feed.asset,
                previous_price,
                submitted_price,
                deviation_bps
            );
        }
    }

    Ok(())
}
