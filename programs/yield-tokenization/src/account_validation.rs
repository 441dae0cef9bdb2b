//! Account validation, (de)serialization and CPI helpers shared by the
//! processors

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use crate::{
    error::YieldError,
    state::{
        ConversionRule, ConverterConfig, HolderPosition, Ledger, LiquidityPosition, Maturity,
        OracleConfig, Pool, PriceFeed,
    },
};

/// A program-owned account with a fixed allocation and a self check
pub trait ProgramAccount: BorshSerialize + BorshDeserialize {
    const LEN: usize;

    fn check(&self) -> Result<(), YieldError>;
}

macro_rules! program_account {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ProgramAccount for $ty {
                const LEN: usize = <$ty>::LEN;

                fn check(&self) -> Result<(), YieldError> {
                    self.validate()
                }
            }
        )*
    };
}

program_account!(
    OracleConfig,
    PriceFeed,
    Ledger,
    Maturity,
    HolderPosition,
    Pool,
    LiquidityPosition,
    ConverterConfig,
    ConversionRule,
);

/// Validate that an account is owned by the expected program
pub fn validate_owner(account: &AccountInfo, expected_owner: &Pubkey) -> ProgramResult {
    if account.owner != expected_owner {
        msg!(
            "Account owner mismatch. Expected: {}, Actual: {}",
            expected_owner,
            account.owner
        );
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

/// Validate that an account is a signer
pub fn validate_signer(account: &AccountInfo) -> ProgramResult {
    if !account.is_signer {
        msg!("Account {} must be a signer", account.key);
        return Err(ProgramError::MissingRequiredSignature);
    }
    Ok(())
}

/// Validate that an account is writable
pub fn validate_writable(account: &AccountInfo) -> ProgramResult {
    if !account.is_writable {
        msg!("Account {} must be writable", account.key);
        return Err(ProgramError::InvalidAccountData);
    }
    Ok(())
}

/// Validate that an account sits at the derived address
pub fn validate_pda(account: &AccountInfo, expected: &Pubkey) -> ProgramResult {
    if account.key != expected {
        msg!("PDA mismatch. Expected: {}, Actual: {}", expected, account.key);
        return Err(YieldError::InvalidPDA.into());
    }
    Ok(())
}

/// Validate that an account is the one a stored key points at
pub fn validate_key(account: &AccountInfo, expected: &Pubkey) -> ProgramResult {
    if account.key != expected {
        msg!("Account mismatch. Expected: {}, Actual: {}", expected, account.key);
        return Err(YieldError::InvalidAccountData.into());
    }
    Ok(())
}

pub fn validate_system_program(account: &AccountInfo) -> ProgramResult {
    if account.key != &system_program::id() {
        msg!("Invalid system program");
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

pub fn validate_token_program(account: &AccountInfo) -> ProgramResult {
    if account.key != &spl_token::id() {
        msg!("Invalid token program");
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

/// Validate an SPL token account's mint and owner
pub fn validate_token_account(account: &AccountInfo, mint: &Pubkey, owner: &Pubkey) -> ProgramResult {
    validate_owner(account, &spl_token::id())?;

    let token_account = spl_token::state::Account::unpack(&account.try_borrow_data()?)?;

    if &token_account.mint != mint {
        msg!("Token account mint mismatch");
        return Err(YieldError::InvalidInput.into());
    }
    if &token_account.owner != owner {
        msg!("Token account owner mismatch");
        return Err(YieldError::Unauthorized.into());
    }
    Ok(())
}

/// Deserialize and check a program-owned account. Trailing padding is ignored.
pub fn load<T: ProgramAccount>(account: &AccountInfo, program_id: &Pubkey) -> Result<T, ProgramError> {
    validate_owner(account, program_id)?;
    let data = account.try_borrow_data()?;
    let value = T::deserialize(&mut &data[..]).map_err(|_| YieldError::InvalidAccountData)?;
    value.check()?;
    Ok(value)
}

pub fn store<T: ProgramAccount>(value: &T, account: &AccountInfo) -> ProgramResult {
    validate_writable(account)?;
    value.serialize(&mut &mut account.data.borrow_mut()[..])?;
    Ok(())
}

/// Create a rent-exempt program account at a PDA and write its initial state
pub fn create_program_account<'a, T: ProgramAccount>(
    payer: &AccountInfo<'a>,
    new_account: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    program_id: &Pubkey,
    signer_seeds: &[&[u8]],
    value: &T,
) -> ProgramResult {
    validate_system_program(system_program)?;
    if new_account.lamports() > 0 || !new_account.data_is_empty() {
        return Err(YieldError::AlreadyInitialized.into());
    }

    let rent = Rent::get()?;
    invoke_signed(
        &system_instruction::create_account(
            payer.key,
            new_account.key,
            rent.minimum_balance(T::LEN),
            T::LEN as u64,
            program_id,
        ),
        &[payer.clone(), new_account.clone(), system_program.clone()],
        &[signer_seeds],
    )?;

    store(value, new_account)
}

/// SPL transfer signed by the caller
pub fn transfer_tokens<'a>(
    token_program: &AccountInfo<'a>,
    source: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    authority: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    validate_token_program(token_program)?;
    invoke(
        &spl_token::instruction::transfer(
            token_program.key,
            source.key,
            destination.key,
            authority.key,
            &[],
            amount,
        )?,
        &[
            source.clone(),
            destination.clone(),
            authority.clone(),
            token_program.clone(),
        ],
    )
}

/// SPL transfer out of a vault, signed by its vault authority PDA
pub fn transfer_tokens_signed<'a>(
    token_program: &AccountInfo<'a>,
    source: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    authority: &AccountInfo<'a>,
    amount: u64,
    signer_seeds: &[&[u8]],
) -> ProgramResult {
    validate_token_program(token_program)?;
    invoke_signed(
        &spl_token::instruction::transfer(
            token_program.key,
            source.key,
            destination.key,
            authority.key,
            &[],
            amount,
        )?,
        &[
            source.clone(),
            destination.clone(),
            authority.clone(),
            token_program.clone(),
        ],
        &[signer_seeds],
    )
}
