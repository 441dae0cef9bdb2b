use std::collections::BTreeSet;

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    account_validation::{
        create_program_account, load, store, transfer_tokens, transfer_tokens_signed,
        validate_key, validate_owner, validate_pda, validate_signer, validate_token_account,
    },
    error::YieldError,
    pda::{seeds, LedgerPDA, MaturityPDA, PositionPDA, VaultAuthorityPDA},
    processor::current_timestamp,
    state::{HolderPosition, Ledger, Maturity},
};

/// Load a maturity and check it belongs to `ledger_key`
pub(crate) fn load_maturity(
    maturity_info: &AccountInfo,
    program_id: &Pubkey,
    ledger_key: &Pubkey,
) -> Result<Maturity, ProgramError> {
    let maturity: Maturity = load(maturity_info, program_id)?;
    if maturity.ledger != *ledger_key {
        return Err(YieldError::UnknownMaturity.into());
    }
    Ok(maturity)
}

/// Load a holder position and check it belongs to `maturity_key`
pub(crate) fn load_position(
    position_info: &AccountInfo,
    program_id: &Pubkey,
    maturity_key: &Pubkey,
) -> Result<HolderPosition, ProgramError> {
    let position: HolderPosition = load(position_info, program_id)?;
    if position.maturity != *maturity_key {
        return Err(YieldError::InvalidAccountData.into());
    }
    Ok(position)
}

/// Load a holder position that `holder_info` must own
pub(crate) fn load_owned_position(
    position_info: &AccountInfo,
    program_id: &Pubkey,
    maturity_key: &Pubkey,
    holder_info: &AccountInfo,
) -> Result<HolderPosition, ProgramError> {
    let position = load_position(position_info, program_id, maturity_key)?;
    if position.holder != *holder_info.key {
        return Err(YieldError::Unauthorized.into());
    }
    Ok(position)
}

fn validate_vault_authority(
    vault_authority_info: &AccountInfo,
    program_id: &Pubkey,
    ledger_info: &AccountInfo,
) -> ProgramResult {
    let (vault_authority, _) = VaultAuthorityPDA::derive(program_id, ledger_info.key);
    validate_pda(vault_authority_info, &vault_authority)
}

pub fn process_initialize_ledger(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let mint_info = next_account_info(account_info_iter)?;
    let vault_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate_signer(authority_info)?;
    validate_owner(mint_info, &spl_token::id())?;

    let (ledger_key, bump) = LedgerPDA::derive(program_id, mint_info.key);
    validate_pda(ledger_info, &ledger_key)?;

    let (vault_authority, vault_authority_bump) = VaultAuthorityPDA::derive(program_id, &ledger_key);
    validate_token_account(vault_info, mint_info.key, &vault_authority)?;

    let ledger = Ledger::new(
        *authority_info.key,
        *mint_info.key,
        *vault_info.key,
        vault_authority_bump,
        bump,
    );

    create_program_account(
        authority_info,
        ledger_info,
        system_program,
        program_id,
        &[seeds::LEDGER, mint_info.key.as_ref(), &[bump]],
        &ledger,
    )?;

    msg!("Ledger initialized for underlying {}", mint_info.key);
    Ok(())
}

pub fn process_create_maturity(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    expiry: i64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate_signer(authority_info)?;

    let mut ledger: Ledger = load(ledger_info, program_id)?;

    let (maturity_key, bump) = MaturityPDA::derive(program_id, ledger_info.key, expiry);
    validate_pda(maturity_info, &maturity_key)?;

    let now = current_timestamp()?;
    let maturity = ledger.create_maturity(authority_info.key, *ledger_info.key, expiry, now, bump)?;

    store(&ledger, ledger_info)?;
    create_program_account(
        authority_info,
        maturity_info,
        system_program,
        program_id,
        &[
            seeds::MATURITY,
            ledger_info.key.as_ref(),
            &expiry.to_le_bytes(),
            &[bump],
        ],
        &maturity,
    )?;

    msg!(
        "Maturity created: expiry {} ({} of {} slots used)",
        expiry,
        ledger.maturities.len(),
        crate::constants::MAX_MATURITIES
    );
    Ok(())
}

pub fn process_open_position(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let payer_info = next_account_info(account_info_iter)?;
    let holder_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let position_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    validate_signer(payer_info)?;

    let mut maturity: Maturity = load(maturity_info, program_id)?;

    let (position_key, bump) = PositionPDA::derive(program_id, maturity_info.key, holder_info.key);
    validate_pda(position_info, &position_key)?;

    maturity.register_position()?;
    store(&maturity, maturity_info)?;

    let position = HolderPosition::new(
        *maturity_info.key,
        *holder_info.key,
        maturity.yield_index,
        bump,
    );
    create_program_account(
        payer_info,
        position_info,
        system_program,
        program_id,
        &[
            seeds::POSITION,
            maturity_info.key.as_ref(),
            holder_info.key.as_ref(),
            &[bump],
        ],
        &position,
    )?;

    msg!("Position opened for {} in maturity {}", holder_info.key, maturity.expiry);
    Ok(())
}

pub fn process_split(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let holder_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let position_info = next_account_info(account_info_iter)?;
    let holder_token_info = next_account_info(account_info_iter)?;
    let vault_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    validate_signer(holder_info)?;

    let mut ledger: Ledger = load(ledger_info, program_id)?;
    let mut maturity = load_maturity(maturity_info, program_id, ledger_info.key)?;
    let mut position = load_owned_position(position_info, program_id, maturity_info.key, holder_info)?;
    validate_key(vault_info, &ledger.vault)?;

    let now = current_timestamp()?;
    maturity.split(&mut position, amount, now)?;
    ledger.lock(amount)?;

    store(&ledger, ledger_info)?;
    store(&maturity, maturity_info)?;
    store(&position, position_info)?;

    transfer_tokens(token_program, holder_token_info, vault_info, holder_info, amount)?;

    msg!(
        "Split {} into PT/YT for maturity {}; supplies {}/{}",
        amount,
        maturity.expiry,
        maturity.pt_supply,
        maturity.yt_supply
    );
    Ok(())
}

pub fn process_claim_yield(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    yt_amount: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let holder_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let position_info = next_account_info(account_info_iter)?;
    let holder_token_info = next_account_info(account_info_iter)?;
    let vault_info = next_account_info(account_info_iter)?;
    let vault_authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    validate_signer(holder_info)?;

    let ledger: Ledger = load(ledger_info, program_id)?;
    let mut maturity = load_maturity(maturity_info, program_id, ledger_info.key)?;
    let mut position = load_owned_position(position_info, program_id, maturity_info.key, holder_info)?;
    validate_key(vault_info, &ledger.vault)?;
    validate_vault_authority(vault_authority_info, program_id, ledger_info)?;

    let now = current_timestamp()?;
    let payout = maturity.claim_yield(&mut position, yt_amount, now)?;

    store(&maturity, maturity_info)?;
    store(&position, position_info)?;

    if payout > 0 {
        transfer_tokens_signed(
            token_program,
            vault_info,
            holder_token_info,
            vault_authority_info,
            payout,
            &VaultAuthorityPDA::signer_seeds(ledger_info.key, &[ledger.vault_authority_bump]),
        )?;
    }

    msg!("Claimed {} yield against {} YT", payout, yt_amount);
    Ok(())
}

pub fn process_redeem(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    pt_amount: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let holder_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let position_info = next_account_info(account_info_iter)?;
    let holder_token_info = next_account_info(account_info_iter)?;
    let vault_info = next_account_info(account_info_iter)?;
    let vault_authority_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    validate_signer(holder_info)?;

    let mut ledger: Ledger = load(ledger_info, program_id)?;
    let mut maturity = load_maturity(maturity_info, program_id, ledger_info.key)?;
    let mut position = load_owned_position(position_info, program_id, maturity_info.key, holder_info)?;
    validate_key(vault_info, &ledger.vault)?;
    validate_vault_authority(vault_authority_info, program_id, ledger_info)?;

    let now = current_timestamp()?;
    maturity.redeem(&mut position, pt_amount, now)?;
    ledger.release(pt_amount)?;

    store(&ledger, ledger_info)?;
    store(&maturity, maturity_info)?;
    store(&position, position_info)?;

    transfer_tokens_signed(
        token_program,
        vault_info,
        holder_token_info,
        vault_authority_info,
        pt_amount,
        &VaultAuthorityPDA::signer_seeds(ledger_info.key, &[ledger.vault_authority_bump]),
    )?;

    msg!("Redeemed {} PT from maturity {}", pt_amount, maturity.expiry);
    Ok(())
}

pub fn process_settle_maturity(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let caller_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;

    validate_signer(caller_info)?;

    let mut maturity: Maturity = load(maturity_info, program_id)?;
    let now = current_timestamp()?;
    maturity.settle(now)?;
    store(&maturity, maturity_info)?;

    msg!(
        "Maturity {} settled; {} PT outstanding",
        maturity.expiry,
        maturity.pt_supply
    );
    Ok(())
}

pub fn process_distribute_yield(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let source_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let source_token_info = next_account_info(account_info_iter)?;
    let vault_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    validate_signer(source_info)?;

    let ledger: Ledger = load(ledger_info, program_id)?;
    let mut maturity = load_maturity(maturity_info, program_id, ledger_info.key)?;
    validate_key(vault_info, &ledger.vault)?;

    let now = current_timestamp()?;
    maturity.distribute_yield(amount, now)?;
    store(&maturity, maturity_info)?;

    transfer_tokens(token_program, source_token_info, vault_info, source_info, amount)?;

    msg!(
        "Distributed {} yield over {} YT; index {}",
        amount,
        maturity.yt_supply,
        maturity.yield_index
    );
    Ok(())
}

pub fn process_transfer_position(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    pt_amount: u64,
    yt_amount: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let holder_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;
    let from_info = next_account_info(account_info_iter)?;
    let to_info = next_account_info(account_info_iter)?;

    validate_signer(holder_info)?;
    if from_info.key == to_info.key {
        return Err(YieldError::InvalidInput.into());
    }

    let maturity: Maturity = load(maturity_info, program_id)?;
    let mut from = load_owned_position(from_info, program_id, maturity_info.key, holder_info)?;
    let mut to = load_position(to_info, program_id, maturity_info.key)?;

    maturity.transfer(&mut from, &mut to, pt_amount, yt_amount)?;

    store(&from, from_info)?;
    store(&to, to_info)?;

    msg!(
        "Transferred {} PT / {} YT from {} to {}",
        pt_amount,
        yt_amount,
        from.holder,
        to.holder
    );
    Ok(())
}

pub fn process_audit_maturity(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    let ledger_info = next_account_info(account_info_iter)?;
    let maturity_info = next_account_info(account_info_iter)?;

    validate_signer(authority_info)?;

    let ledger: Ledger = load(ledger_info, program_id)?;
    ledger.ensure_authority(authority_info.key)?;
    let mut maturity = load_maturity(maturity_info, program_id, ledger_info.key)?;

    let mut seen = BTreeSet::new();
    let mut positions = Vec::new();
    for position_info in account_info_iter {
        if !seen.insert(*position_info.key) {
            return Err(YieldError::InvalidInput.into());
        }
        positions.push(load_position(position_info, program_id, maturity_info.key)?);
    }

    if maturity.balances_match(maturity_info.key, &positions)? {
        msg!(
            "Audit passed for maturity {} over {} positions",
            maturity.expiry,
            positions.len()
        );
        return Ok(());
    }

    maturity.halt();
    store(&maturity, maturity_info)?;
    msg!(
        "Audit failed for maturity {}: supplies {}/{}",
        maturity.expiry,
        maturity.pt_supply,
        maturity.yt_supply
    );
    Ok(())
}
