use solana_program::{
    account_info::AccountInfo,
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
    sysvar::Sysvar,
};

use crate::instruction::YieldInstruction;

pub mod amm;
pub mod converter;
pub mod ledger;
pub mod oracle;

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = YieldInstruction::unpack(instruction_data)?;

        match instruction {
            YieldInstruction::InitializeOracle {
                heartbeat_seconds,
                max_deviation_bps,
                min_update_interval,
            } => {
                msg!("Instruction: InitializeOracle");
                oracle::process_initialize_oracle(
                    program_id,
                    accounts,
                    heartbeat_seconds,
                    max_deviation_bps,
                    min_update_interval,
                )
            }

            YieldInstruction::UpdateOracleConfig {
                heartbeat_seconds,
                max_deviation_bps,
                min_update_interval,
            } => {
                msg!("Instruction: UpdateOracleConfig");
                oracle::process_update_oracle_config(
                    program_id,
                    accounts,
                    heartbeat_seconds,
                    max_deviation_bps,
                    min_update_interval,
                )
            }

            YieldInstruction::AddUpdater { updater } => {
                msg!("Instruction: AddUpdater");
                oracle::process_add_updater(program_id, accounts, updater)
            }

            YieldInstruction::RemoveUpdater { updater } => {
                msg!("Instruction: RemoveUpdater");
                oracle::process_remove_updater(program_id, accounts, updater)
            }

            YieldInstruction::SetPaused { paused } => {
                msg!("Instruction: SetPaused");
                oracle::process_set_paused(program_id, accounts, paused)
            }

            YieldInstruction::ResetCircuitBreaker => {
                msg!("Instruction: ResetCircuitBreaker");
                oracle::process_reset_circuit_breaker(program_id, accounts)
            }

            YieldInstruction::InitializePriceFeed { asset } => {
                msg!("Instruction: InitializePriceFeed");
                oracle::process_initialize_price_feed(program_id, accounts, asset)
            }

            YieldInstruction::SetThreshold { threshold } => {
                msg!("Instruction: SetThreshold");
                oracle::process_set_threshold(program_id, accounts, threshold)
            }

            YieldInstruction::UpdatePrice {
                price,
                confidence_bps,
            } => {
                msg!("Instruction: UpdatePrice");
                oracle::process_update_price(program_id, accounts, price, confidence_bps)
            }

            YieldInstruction::InitializeLedger => {
                msg!("Instruction: InitializeLedger");
                ledger::process_initialize_ledger(program_id, accounts)
            }

            YieldInstruction::CreateMaturity { expiry } => {
                msg!("Instruction: CreateMaturity");
                ledger::process_create_maturity(program_id, accounts, expiry)
            }

            YieldInstruction::OpenPosition => {
                msg!("Instruction: OpenPosition");
                ledger::process_open_position(program_id, accounts)
            }

            YieldInstruction::Split { amount } => {
                msg!("Instruction: Split");
                ledger::process_split(program_id, accounts, amount)
            }

            YieldInstruction::ClaimYield { yt_amount } => {
                msg!("Instruction: ClaimYield");
                ledger::process_claim_yield(program_id, accounts, yt_amount)
            }

            YieldInstruction::Redeem { pt_amount } => {
                msg!("Instruction: Redeem");
                ledger::process_redeem(program_id, accounts, pt_amount)
            }

            YieldInstruction::SettleMaturity => {
                msg!("Instruction: SettleMaturity");
                ledger::process_settle_maturity(program_id, accounts)
            }

            YieldInstruction::DistributeYield { amount } => {
                msg!("Instruction: DistributeYield");
                ledger::process_distribute_yield(program_id, accounts, amount)
            }

            YieldInstruction::TransferPosition {
                pt_amount,
                yt_amount,
            } => {
                msg!("Instruction: TransferPosition");
                ledger::process_transfer_position(program_id, accounts, pt_amount, yt_amount)
            }

            YieldInstruction::AuditMaturity => {
                msg!("Instruction: AuditMaturity");
                ledger::process_audit_maturity(program_id, accounts)
            }

            YieldInstruction::InitializePool {
                asset_a,
                asset_b,
                fee_bps,
            } => {
                msg!("Instruction: InitializePool");
                amm::process_initialize_pool(program_id, accounts, asset_a, asset_b, fee_bps)
            }

            YieldInstruction::AddLiquidity {
                max_amount_a,
                max_amount_b,
            } => {
                msg!("Instruction: AddLiquidity");
                amm::process_add_liquidity(program_id, accounts, max_amount_a, max_amount_b)
            }

            YieldInstruction::RemoveLiquidity { shares } => {
                msg!("Instruction: RemoveLiquidity");
                amm::process_remove_liquidity(program_id, accounts, shares)
            }

            YieldInstruction::Swap {
                amount_in,
                min_amount_out,
                token_in_is_a,
            } => {
                msg!("Instruction: Swap");
                amm::process_swap(program_id, accounts, amount_in, min_amount_out, token_in_is_a)
            }

            YieldInstruction::InitializeConverter {
                default_conversion_bps,
                default_min_confidence_bps,
            } => {
                msg!("Instruction: InitializeConverter");
                converter::process_initialize_converter(
                    program_id,
                    accounts,
                    default_conversion_bps,
                    default_min_confidence_bps,
                )
            }

            YieldInstruction::RegisterConversionRule { terms } => {
                msg!("Instruction: RegisterConversionRule");
                converter::process_register_rule(program_id, accounts, terms)
            }

            YieldInstruction::CancelConversionRule => {
                msg!("Instruction: CancelConversionRule");
                converter::process_cancel_rule(program_id, accounts)
            }

            YieldInstruction::CheckAndConvert => {
                msg!("Instruction: CheckAndConvert");
                converter::process_check_and_convert(program_id, accounts)
            }
        }
    }
}

pub(crate) fn current_timestamp() -> Result<i64, ProgramError> {
    Ok(Clock::get()?.unix_timestamp)
}
