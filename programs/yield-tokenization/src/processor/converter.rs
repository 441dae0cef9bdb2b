use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    pubkey::Pubkey,
};

use crate::{
    account_validation::{create_program_account, load, store, validate_key, validate_pda, validate_signer},
    engine::{ConversionContext, ConversionEngine, ConversionOutcome},
    error::YieldError,
    pda::{seeds, ConverterPDA, RulePDA},
    processor::{
        current_timestamp,
        ledger::{load_maturity, load_position},
    },
    state::{ConversionRule, ConverterConfig, Ledger, OracleConfig, Pool, PriceFeed, RuleTerms},
};

pub fn process_initialize_converter(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    default_conversion_bps: Option<u16>,
    default_min_confidence_bps: Option<u16>,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    let oracle_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let converter_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate_signer(authority_info)?;

    let _oracle: OracleConfig = load(oracle_info, program_id)?;
    let ledger: Ledger = load(ledger_info, program_id)?;
    ledger.ensure_authority(authority_info.key)?;

    let (converter_key, bump) = ConverterPDA::derive(program_id, oracle_info.key, ledger_info.key);
    validate_pda(converter_info, &converter_key)?;

    let config = ConverterConfig::new(
        *authority_info.key,
        *oracle_info.key,
        *ledger_info.key,
        default_conversion_bps,
        default_min_confidence_bps,
        bump,
    )?;

    create_program_account(
        authority_info,
        converter_info,
        system_program,
        program_id,
        &[
            seeds::CONVERTER,
            oracle_info.key.as_ref(),
            ledger_info.key.as_ref(),
            &[bump],
        ],
        &config,
    )?;

    msg!(
        "Converter initialized: default conversion {} bps, min confidence {} bps",
        config.default_conversion_bps,
        config.default_min_confidence_bps
    );
    Ok(())
}

pub fn process_register_rule(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    terms: RuleTerms,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let holder_info = next_account_info(account_info_iter)?;
    let converter_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let rule_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate_signer(holder_info)?;

    let mut converter: ConverterConfig = load(converter_info, program_id)?;
    let maturity = load_maturity(maturity_info, program_id, &converter.ledger)?;
    let pool: Pool = load(pool_info, program_id)?;

    let now = current_timestamp()?;
    if maturity.is_expired(now) {
        return Err(YieldError::MaturityExpired.into());
    }

    let (rule_key, bump) = RulePDA::derive(program_id, converter_info.key, converter.next_rule_id);
    validate_pda(rule_info, &rule_key)?;

    let rule = converter.register_rule(
        *converter_info.key,
        *holder_info.key,
        *maturity_info.key,
        *pool_info.key,
        &pool,
        terms,
        now,
        bump,
    )?;

    store(&converter, converter_info)?;
    create_program_account(
        holder_info,
        rule_info,
        system_program,
        program_id,
        &[
            seeds::RULE,
            converter_info.key.as_ref(),
            &rule.rule_id.to_le_bytes(),
            &[bump],
        ],
        &rule,
    )?;

    msg!(
        "Rule {} registered: {:?} {} on {}, {} bps per execution",
        rule.rule_id,
        rule.direction,
        rule.threshold_price,
        rule.reference_asset,
        rule.conversion_bps
    );
    Ok(())
}

pub fn process_cancel_rule(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let holder_info = next_account_info(account_info_iter)?;
    let rule_info = next_account_info(account_info_iter)?;

    validate_signer(holder_info)?;

    let mut rule: ConversionRule = load(rule_info, program_id)?;
    rule.cancel(holder_info.key)?;
    store(&rule, rule_info)?;

    msg!("Rule {} cancelled", rule.rule_id);
    Ok(())
}

pub fn process_check_and_convert(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let keeper_info = next_account_info(account_info_iter)?;
    let converter_info = next_account_info(account_info_iter)?;
    let rule_info = next_account_info(account_info_iter)?;
    let oracle_info = next_account_info(account_info_iter)?;
    let feed_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let pool_info = next_account_info(account_info_iter)?;
    let holder_position_info = next_account_info(account_info_iter)?;
    let pool_position_info = next_account_info(account_info_iter)?;

    validate_signer(keeper_info)?;

    let mut converter: ConverterConfig = load(converter_info, program_id)?;
    let mut rule: ConversionRule = load(rule_info, program_id)?;
    if rule.converter != *converter_info.key {
        return Err(YieldError::InvalidAccountData.into());
    }

    validate_key(oracle_info, &converter.oracle)?;
    let oracle: OracleConfig = load(oracle_info, program_id)?;
    let feed: PriceFeed = load(feed_info, program_id)?;
    if feed.oracle != *oracle_info.key {
        return Err(YieldError::InvalidAccountData.into());
    }

    validate_key(maturity_info, &rule.maturity)?;
    let maturity = load_maturity(maturity_info, program_id, &converter.ledger)?;

    validate_key(pool_info, &rule.pool)?;
    let mut pool: Pool = load(pool_info, program_id)?;
    validate_key(pool_position_info, &pool.position)?;

    let mut holder_position = load_position(holder_position_info, program_id, maturity_info.key)?;
    let mut pool_position = load_position(pool_position_info, program_id, maturity_info.key)?;

    let now = current_timestamp()?;
    let outcome = ConversionEngine::check_and_convert(
        &mut rule,
        ConversionContext {
            oracle: &oracle,
            feed: &feed,
            maturity: &maturity,
            pool: &mut pool,
            holder_position: &mut holder_position,
            pool_position: &mut pool_position,
        },
        now,
    )?;

    match outcome {
        ConversionOutcome::NotTriggered { price } => {
            msg!(
                "Rule {} not triggered: price {} vs threshold {}",
                rule.rule_id,
                price,
                rule.threshold_price
            );
        }
        ConversionOutcome::Executed(receipt) => {
            converter.total_conversions = converter.total_conversions.saturating_add(1);

            store(&rule, rule_info)?;
            store(&converter, converter_info)?;
            store(&pool, pool_info)?;
            store(&holder_position, holder_position_info)?;
            store(&pool_position, pool_position_info)?;

            msg!(
                "Rule {} executed at {}: {} YT -> {} PT, transitions {:?}",
                rule.rule_id,
                receipt.price,
                receipt.yt_in,
                receipt.pt_out,
                receipt.transitions
            );
        }
    }

    Ok(())
}
