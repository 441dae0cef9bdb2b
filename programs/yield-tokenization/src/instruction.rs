use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    error::YieldError,
    state::{PoolAsset, RuleTerms},
};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub enum YieldInstruction {
    /// Create the oracle config; the authority becomes the first updater.
    /// Unset parameters take the protocol defaults.
    /// Accounts:
    /// 0. `[signer, writable]` Authority (payer)
    /// 1. `[writable]` Oracle config PDA
    /// 2. `[]` System program
    InitializeOracle {
        heartbeat_seconds: Option<i64>,
        max_deviation_bps: Option<u16>,
        min_update_interval: Option<i64>,
    },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[writable]` Oracle config
    UpdateOracleConfig {
        heartbeat_seconds: Option<i64>,
        max_deviation_bps: Option<u16>,
        min_update_interval: Option<i64>,
    },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[writable]` Oracle config
    AddUpdater { updater: Pubkey },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[writable]` Oracle config
    RemoveUpdater { updater: Pubkey },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[writable]` Oracle config
    SetPaused { paused: bool },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[writable]` Oracle config
    ResetCircuitBreaker,

    /// Accounts:
    /// 0. `[signer, writable]` Authority (payer)
    /// 1. `[]` Oracle config
    /// 2. `[writable]` Price feed PDA
    /// 3. `[]` System program
    InitializePriceFeed { asset: Pubkey },

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[]` Oracle config
    /// 2. `[writable]` Price feed
    SetThreshold { threshold: u64 },

    /// Accounts:
    /// 0. `[signer]` Updater
    /// 1. `[writable]` Oracle config (breaker latch)
    /// 2. `[writable]` Price feed
    UpdatePrice { price: u64, confidence_bps: u16 },

    /// Accounts:
    /// 0. `[signer, writable]` Authority (payer)
    /// 1. `[writable]` Ledger PDA
    /// 2. `[]` Underlying mint
    /// 3. `[]` Vault token account, owned by the ledger's vault authority
    /// 4. `[]` System program
    InitializeLedger,

    /// Accounts:
    /// 0. `[signer, writable]` Ledger authority (payer)
    /// 1. `[writable]` Ledger
    /// 2. `[writable]` Maturity PDA
    /// 3. `[]` System program
    CreateMaturity { expiry: i64 },

    /// Accounts:
    /// 0. `[signer, writable]` Payer
    /// 1. `[]` Holder
    /// 2. `[writable]` Maturity (position count)
    /// 3. `[writable]` Holder position PDA
    /// 4. `[]` System program
    OpenPosition,

    /// Accounts:
    /// 0. `[signer]` Holder
    /// 1. `[writable]` Ledger
    /// 2. `[writable]` Maturity
    /// 3. `[writable]` Holder position
    /// 4. `[writable]` Holder underlying token account
    /// 5. `[writable]` Ledger vault
    /// 6. `[]` Token program
    Split { amount: u64 },

    /// Accounts:
    /// 0. `[signer]` Holder
    /// 1. `[]` Ledger
    /// 2. `[writable]` Maturity
    /// 3. `[writable]` Holder position
    /// 4. `[writable]` Holder underlying token account
    /// 5. `[writable]` Ledger vault
    /// 6. `[]` Ledger vault authority
    /// 7. `[]` Token program
    ClaimYield { yt_amount: u64 },

    /// Accounts: as `ClaimYield`, with the ledger writable
    Redeem { pt_amount: u64 },

    /// Accounts:
    /// 0. `[signer]` Anyone
    /// 1. `[writable]` Maturity
    SettleMaturity,

    /// Accounts:
    /// 0. `[signer]` Yield source
    /// 1. `[]` Ledger
    /// 2. `[writable]` Maturity
    /// 3. `[writable]` Source underlying token account
    /// 4. `[writable]` Ledger vault
    /// 5. `[]` Token program
    DistributeYield { amount: u64 },

    /// Accounts:
    /// 0. `[signer]` Holder
    /// 1. `[]` Maturity
    /// 2. `[writable]` Sender position
    /// 3. `[writable]` Receiver position
    TransferPosition { pt_amount: u64, yt_amount: u64 },

    /// Accounts:
    /// 0. `[signer]` Ledger authority
    /// 1. `[]` Ledger
    /// 2. `[writable]` Maturity
    /// 3.. `[]` Every holder position of the maturity, pool custody included
    AuditMaturity,

    /// Accounts:
    /// 0. `[signer, writable]` Payer
    /// 1. `[writable]` Maturity (position count)
    /// 2. `[writable]` Pool PDA
    /// 3. `[writable]` Pool's holder position PDA
    /// 4. `[]` Pool vault authority
    /// 5. `[]` System program
    /// 6. `[]` Pool vault token account (token leg only)
    InitializePool {
        asset_a: PoolAsset,
        asset_b: PoolAsset,
        fee_bps: u16,
    },

    /// Accounts:
    /// 0. `[signer, writable]` Provider
    /// 1. `[writable]` Pool
    /// 2. `[]` Maturity
    /// 3. `[writable]` Liquidity position PDA (created on first deposit)
    /// 4. `[writable]` Provider holder position
    /// 5. `[writable]` Pool holder position
    /// 6. `[]` System program
    /// 7. `[writable]` Provider token account (token leg only)
    /// 8. `[writable]` Pool vault (token leg only)
    /// 9. `[]` Token program (token leg only)
    AddLiquidity { max_amount_a: u64, max_amount_b: u64 },

    /// Accounts:
    /// 0. `[signer]` Provider
    /// 1. `[writable]` Pool
    /// 2. `[]` Maturity
    /// 3. `[writable]` Liquidity position
    /// 4. `[writable]` Provider holder position
    /// 5. `[writable]` Pool holder position
    /// 6. `[writable]` Provider token account (token leg only)
    /// 7. `[writable]` Pool vault (token leg only)
    /// 8. `[]` Pool vault authority (token leg only)
    /// 9. `[]` Token program (token leg only)
    RemoveLiquidity { shares: u64 },

    /// Accounts:
    /// 0. `[signer]` Trader
    /// 1. `[writable]` Pool
    /// 2. `[]` Maturity
    /// 3. `[writable]` Trader holder position
    /// 4. `[writable]` Pool holder position
    /// 5. `[writable]` Trader token account (token leg only)
    /// 6. `[writable]` Pool vault (token leg only)
    /// 7. `[]` Pool vault authority (token leg only)
    /// 8. `[]` Token program (token leg only)
    Swap {
        amount_in: u64,
        min_amount_out: u64,
        token_in_is_a: bool,
    },

    /// Accounts:
    /// 0. `[signer, writable]` Authority (payer)
    /// 1. `[]` Oracle config
    /// 2. `[]` Ledger
    /// 3. `[writable]` Converter PDA
    /// 4. `[]` System program
    InitializeConverter {
        default_conversion_bps: Option<u16>,
        default_min_confidence_bps: Option<u16>,
    },

    /// Accounts:
    /// 0. `[signer, writable]` Holder (payer)
    /// 1. `[writable]` Converter
    /// 2. `[]` Maturity
    /// 3. `[]` Pool
    /// 4. `[writable]` Rule PDA
    /// 5. `[]` System program
    RegisterConversionRule { terms: RuleTerms },

    /// Accounts:
    /// 0. `[signer]` Holder
    /// 1. `[writable]` Rule
    CancelConversionRule,

    /// Accounts:
    /// 0. `[signer]` Keeper (anyone)
    /// 1. `[writable]` Converter
    /// 2. `[writable]` Rule
    /// 3. `[]` Oracle config
    /// 4. `[]` Price feed for the rule's reference asset
    /// 5. `[]` Maturity
    /// 6. `[writable]` Pool
    /// 7. `[writable]` Holder position
    /// 8. `[writable]` Pool holder position
    CheckAndConvert,
}

impl YieldInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| YieldError::InvalidInstruction.into())
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec()
            .map_err(|_| ProgramError::InvalidInstructionData)
    }
}

/// Token-side accounts for pools with a token leg
#[derive(Debug, Clone, Copy)]
pub struct TokenLegAccounts {
    pub user_token: Pubkey,
    pub pool_vault: Pubkey,
    pub vault_authority: Pubkey,
}

fn build(
    program_id: &Pubkey,
    accounts: Vec<AccountMeta>,
    instruction: YieldInstruction,
) -> Result<Instruction, ProgramError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: instruction.pack()?,
    })
}

fn authority_only(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
    instruction: YieldInstruction,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new(*oracle, false),
        ],
        instruction,
    )
}

pub fn initialize_oracle(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
    heartbeat_seconds: Option<i64>,
    max_deviation_bps: Option<u16>,
    min_update_interval: Option<i64>,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(*oracle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        YieldInstruction::InitializeOracle {
            heartbeat_seconds,
            max_deviation_bps,
            min_update_interval,
        },
    )
}

pub fn update_oracle_config(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
    heartbeat_seconds: Option<i64>,
    max_deviation_bps: Option<u16>,
    min_update_interval: Option<i64>,
) -> Result<Instruction, ProgramError> {
    authority_only(
        program_id,
        authority,
        oracle,
        YieldInstruction::UpdateOracleConfig {
            heartbeat_seconds,
            max_deviation_bps,
            min_update_interval,
        },
    )
}

pub fn add_updater(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
    updater: Pubkey,
) -> Result<Instruction, ProgramError> {
    authority_only(program_id, authority, oracle, YieldInstruction::AddUpdater { updater })
}

pub fn remove_updater(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
    updater: Pubkey,
) -> Result<Instruction, ProgramError> {
    authority_only(program_id, authority, oracle, YieldInstruction::RemoveUpdater { updater })
}

pub fn set_paused(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
    paused: bool,
) -> Result<Instruction, ProgramError> {
    authority_only(program_id, authority, oracle, YieldInstruction::SetPaused { paused })
}

pub fn reset_circuit_breaker(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
) -> Result<Instruction, ProgramError> {
    authority_only(program_id, authority, oracle, YieldInstruction::ResetCircuitBreaker)
}

pub fn initialize_price_feed(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
    feed: &Pubkey,
    asset: Pubkey,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(*oracle, false),
            AccountMeta::new(*feed, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        YieldInstruction::InitializePriceFeed { asset },
    )
}

pub fn set_threshold(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
    feed: &Pubkey,
    threshold: u64,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new_readonly(*oracle, false),
            AccountMeta::new(*feed, false),
        ],
        YieldInstruction::SetThreshold { threshold },
    )
}

pub fn update_price(
    program_id: &Pubkey,
    updater: &Pubkey,
    oracle: &Pubkey,
    feed: &Pubkey,
    price: u64,
    confidence_bps: u16,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*updater, true),
            AccountMeta::new(*oracle, false),
            AccountMeta::new(*feed, false),
        ],
        YieldInstruction::UpdatePrice {
            price,
            confidence_bps,
        },
    )
}

pub fn initialize_ledger(
    program_id: &Pubkey,
    authority: &Pubkey,
    ledger: &Pubkey,
    underlying_mint: &Pubkey,
    vault: &Pubkey,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(*ledger, false),
            AccountMeta::new_readonly(*underlying_mint, false),
            AccountMeta::new_readonly(*vault, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        YieldInstruction::InitializeLedger,
    )
}

pub fn create_maturity(
    program_id: &Pubkey,
    authority: &Pubkey,
    ledger: &Pubkey,
    maturity: &Pubkey,
    expiry: i64,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(*ledger, false),
            AccountMeta::new(*maturity, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        YieldInstruction::CreateMaturity { expiry },
    )
}

pub fn open_position(
    program_id: &Pubkey,
    payer: &Pubkey,
    holder: &Pubkey,
    maturity: &Pubkey,
    position: &Pubkey,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*holder, false),
            AccountMeta::new(*maturity, false),
            AccountMeta::new(*position, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        YieldInstruction::OpenPosition,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn split(
    program_id: &Pubkey,
    holder: &Pubkey,
    ledger: &Pubkey,
    maturity: &Pubkey,
    position: &Pubkey,
    holder_token: &Pubkey,
    vault: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*holder, true),
            AccountMeta::new(*ledger, false),
            AccountMeta::new(*maturity, false),
            AccountMeta::new(*position, false),
            AccountMeta::new(*holder_token, false),
            AccountMeta::new(*vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        YieldInstruction::Split { amount },
    )
}

#[allow(clippy::too_many_arguments)]
fn payout_accounts(
    holder: &Pubkey,
    ledger: &Pubkey,
    ledger_writable: bool,
    maturity: &Pubkey,
    position: &Pubkey,
    holder_token: &Pubkey,
    vault: &Pubkey,
    vault_authority: &Pubkey,
) -> Vec<AccountMeta> {
    let ledger_meta = if ledger_writable {
        AccountMeta::new(*ledger, false)
    } else {
        AccountMeta::new_readonly(*ledger, false)
    };
    vec![
        AccountMeta::new_readonly(*holder, true),
        ledger_meta,
        AccountMeta::new(*maturity, false),
        AccountMeta::new(*position, false),
        AccountMeta::new(*holder_token, false),
        AccountMeta::new(*vault, false),
        AccountMeta::new_readonly(*vault_authority, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ]
}

#[allow(clippy::too_many_arguments)]
pub fn claim_yield(
    program_id: &Pubkey,
    holder: &Pubkey,
    ledger: &Pubkey,
    maturity: &Pubkey,
    position: &Pubkey,
    holder_token: &Pubkey,
    vault: &Pubkey,
    vault_authority: &Pubkey,
    yt_amount: u64,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        payout_accounts(
            holder,
            ledger,
            false,
            maturity,
            position,
            holder_token,
            vault,
            vault_authority,
        ),
        YieldInstruction::ClaimYield { yt_amount },
    )
}

#[allow(clippy::too_many_arguments)]
pub fn redeem(
    program_id: &Pubkey,
    holder: &Pubkey,
    ledger: &Pubkey,
    maturity: &Pubkey,
    position: &Pubkey,
    holder_token: &Pubkey,
    vault: &Pubkey,
    vault_authority: &Pubkey,
    pt_amount: u64,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        payout_accounts(
            holder,
            ledger,
            true,
            maturity,
            position,
            holder_token,
            vault,
            vault_authority,
        ),
        YieldInstruction::Redeem { pt_amount },
    )
}

pub fn settle_maturity(
    program_id: &Pubkey,
    caller: &Pubkey,
    maturity: &Pubkey,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new(*maturity, false),
        ],
        YieldInstruction::SettleMaturity,
    )
}

pub fn distribute_yield(
    program_id: &Pubkey,
    source: &Pubkey,
    ledger: &Pubkey,
    maturity: &Pubkey,
    source_token: &Pubkey,
    vault: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*source, true),
            AccountMeta::new_readonly(*ledger, false),
            AccountMeta::new(*maturity, false),
            AccountMeta::new(*source_token, false),
            AccountMeta::new(*vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        YieldInstruction::DistributeYield { amount },
    )
}

pub fn transfer_position(
    program_id: &Pubkey,
    holder: &Pubkey,
    maturity: &Pubkey,
    from_position: &Pubkey,
    to_position: &Pubkey,
    pt_amount: u64,
    yt_amount: u64,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*holder, true),
            AccountMeta::new_readonly(*maturity, false),
            AccountMeta::new(*from_position, false),
            AccountMeta::new(*to_position, false),
        ],
        YieldInstruction::TransferPosition {
            pt_amount,
            yt_amount,
        },
    )
}

pub fn audit_maturity(
    program_id: &Pubkey,
    authority: &Pubkey,
    ledger: &Pubkey,
    maturity: &Pubkey,
    positions: &[Pubkey],
) -> Result<Instruction, ProgramError> {
    let mut accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new_readonly(*ledger, false),
        AccountMeta::new(*maturity, false),
    ];
    accounts.extend(
        positions
            .iter()
            .map(|position| AccountMeta::new_readonly(*position, false)),
    );
    build(program_id, accounts, YieldInstruction::AuditMaturity)
}

#[allow(clippy::too_many_arguments)]
pub fn initialize_pool(
    program_id: &Pubkey,
    payer: &Pubkey,
    maturity: &Pubkey,
    pool: &Pubkey,
    pool_position: &Pubkey,
    vault_authority: &Pubkey,
    vault: Option<&Pubkey>,
    asset_a: PoolAsset,
    asset_b: PoolAsset,
    fee_bps: u16,
) -> Result<Instruction, ProgramError> {
    let mut accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*maturity, false),
        AccountMeta::new(*pool, false),
        AccountMeta::new(*pool_position, false),
        AccountMeta::new_readonly(*vault_authority, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    if let Some(vault) = vault {
        accounts.push(AccountMeta::new_readonly(*vault, false));
    }
    build(
        program_id,
        accounts,
        YieldInstruction::InitializePool {
            asset_a,
            asset_b,
            fee_bps,
        },
    )
}

fn push_token_leg(accounts: &mut Vec<AccountMeta>, token_leg: Option<&TokenLegAccounts>, with_authority: bool) {
    if let Some(leg) = token_leg {
        accounts.push(AccountMeta::new(leg.user_token, false));
        accounts.push(AccountMeta::new(leg.pool_vault, false));
        if with_authority {
            accounts.push(AccountMeta::new_readonly(leg.vault_authority, false));
        }
        accounts.push(AccountMeta::new_readonly(spl_token::id(), false));
    }
}

#[allow(clippy::too_many_arguments)]
pub fn add_liquidity(
    program_id: &Pubkey,
    provider: &Pubkey,
    pool: &Pubkey,
    maturity: &Pubkey,
    liquidity_position: &Pubkey,
    provider_position: &Pubkey,
    pool_position: &Pubkey,
    token_leg: Option<&TokenLegAccounts>,
    max_amount_a: u64,
    max_amount_b: u64,
) -> Result<Instruction, ProgramError> {
    let mut accounts = vec![
        AccountMeta::new(*provider, true),
        AccountMeta::new(*pool, false),
        AccountMeta::new_readonly(*maturity, false),
        AccountMeta::new(*liquidity_position, false),
        AccountMeta::new(*provider_position, false),
        AccountMeta::new(*pool_position, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    push_token_leg(&mut accounts, token_leg, false);
    build(
        program_id,
        accounts,
        YieldInstruction::AddLiquidity {
            max_amount_a,
            max_amount_b,
        },
    )
}

#[allow(clippy::too_many_arguments)]
pub fn remove_liquidity(
    program_id: &Pubkey,
    provider: &Pubkey,
    pool: &Pubkey,
    maturity: &Pubkey,
    liquidity_position: &Pubkey,
    provider_position: &Pubkey,
    pool_position: &Pubkey,
    token_leg: Option<&TokenLegAccounts>,
    shares: u64,
) -> Result<Instruction, ProgramError> {
    let mut accounts = vec![
        AccountMeta::new_readonly(*provider, true),
        AccountMeta::new(*pool, false),
        AccountMeta::new_readonly(*maturity, false),
        AccountMeta::new(*liquidity_position, false),
        AccountMeta::new(*provider_position, false),
        AccountMeta::new(*pool_position, false),
    ];
    push_token_leg(&mut accounts, token_leg, true);
    build(
        program_id,
        accounts,
        YieldInstruction::RemoveLiquidity { shares },
    )
}

#[allow(clippy::too_many_arguments)]
pub fn swap(
    program_id: &Pubkey,
    trader: &Pubkey,
    pool: &Pubkey,
    maturity: &Pubkey,
    trader_position: &Pubkey,
    pool_position: &Pubkey,
    token_leg: Option<&TokenLegAccounts>,
    amount_in: u64,
    min_amount_out: u64,
    token_in_is_a: bool,
) -> Result<Instruction, ProgramError> {
    let mut accounts = vec![
        AccountMeta::new_readonly(*trader, true),
        AccountMeta::new(*pool, false),
        AccountMeta::new_readonly(*maturity, false),
        AccountMeta::new(*trader_position, false),
        AccountMeta::new(*pool_position, false),
    ];
    push_token_leg(&mut accounts, token_leg, true);
    build(
        program_id,
        accounts,
        YieldInstruction::Swap {
            amount_in,
            min_amount_out,
            token_in_is_a,
        },
    )
}

pub fn initialize_converter(
    program_id: &Pubkey,
    authority: &Pubkey,
    oracle: &Pubkey,
    ledger: &Pubkey,
    converter: &Pubkey,
    default_conversion_bps: Option<u16>,
    default_min_confidence_bps: Option<u16>,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(*oracle, false),
            AccountMeta::new_readonly(*ledger, false),
            AccountMeta::new(*converter, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        YieldInstruction::InitializeConverter {
            default_conversion_bps,
            default_min_confidence_bps,
        },
    )
}

pub fn register_conversion_rule(
    program_id: &Pubkey,
    holder: &Pubkey,
    converter: &Pubkey,
    maturity: &Pubkey,
    pool: &Pubkey,
    rule: &Pubkey,
    terms: RuleTerms,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new(*holder, true),
            AccountMeta::new(*converter, false),
            AccountMeta::new_readonly(*maturity, false),
            AccountMeta::new_readonly(*pool, false),
            AccountMeta::new(*rule, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        YieldInstruction::RegisterConversionRule { terms },
    )
}

pub fn cancel_conversion_rule(
    program_id: &Pubkey,
    holder: &Pubkey,
    rule: &Pubkey,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*holder, true),
            AccountMeta::new(*rule, false),
        ],
        YieldInstruction::CancelConversionRule,
    )
}

/// Accounts for `CheckAndConvert`
#[derive(Debug, Clone, Copy)]
pub struct ConversionAccounts {
    pub converter: Pubkey,
    pub rule: Pubkey,
    pub oracle: Pubkey,
    pub feed: Pubkey,
    pub maturity: Pubkey,
    pub pool: Pubkey,
    pub holder_position: Pubkey,
    pub pool_position: Pubkey,
}

pub fn check_and_convert(
    program_id: &Pubkey,
    keeper: &Pubkey,
    accounts: &ConversionAccounts,
) -> Result<Instruction, ProgramError> {
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*keeper, true),
            AccountMeta::new(accounts.converter, false),
            AccountMeta::new(accounts.rule, false),
            AccountMeta::new_readonly(accounts.oracle, false),
            AccountMeta::new_readonly(accounts.feed, false),
            AccountMeta::new_readonly(accounts.maturity, false),
            AccountMeta::new(accounts.pool, false),
            AccountMeta::new(accounts.holder_position, false),
            AccountMeta::new(accounts.pool_position, false),
        ],
        YieldInstruction::CheckAndConvert,
    )
}
