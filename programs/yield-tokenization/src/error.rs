use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, FromPrimitive, PartialEq, Eq)]
pub enum YieldError {
    #[error("Invalid instruction")]
    InvalidInstruction = 0,

    #[error("Invalid account data")]
    InvalidAccountData = 1,

    #[error("Account not initialized")]
    NotInitialized = 2,

    #[error("Account already initialized")]
    AlreadyInitialized = 3,

    #[error("Invalid PDA")]
    InvalidPDA = 4,

    #[error("Unauthorized")]
    Unauthorized = 5,

    #[error("Invalid input")]
    InvalidInput = 6,

    #[error("Price must be greater than zero")]
    InvalidPrice = 7,

    #[error("Confidence must be at most 10000 bps")]
    InvalidConfidence = 8,

    #[error("Price data stale")]
    StaleData = 9,

    #[error("Oracle paused or circuit breaker active")]
    OracleUnhealthy = 10,

    #[error("No price data for asset")]
    NoData = 11,

    #[error("Price confidence below required minimum")]
    InsufficientConfidence = 12,

    #[error("Insufficient liquidity")]
    InsufficientLiquidity = 13,

    #[error("Slippage exceeded")]
    SlippageExceeded = 14,

    #[error("Zero liquidity")]
    ZeroLiquidity = 15,

    #[error("Expiry must be in the future and unique")]
    InvalidExpiry = 16,

    #[error("Unknown maturity")]
    UnknownMaturity = 17,

    #[error("Maturity expired")]
    MaturityExpired = 18,

    #[error("Maturity not reached yet")]
    NotYetMatured = 19,

    #[error("Maturity not settled")]
    NotSettled = 20,

    #[error("Conversion rule inactive")]
    RuleInactive = 21,

    #[error("Insufficient balance")]
    InsufficientBalance = 22,

    #[error("Capacity exceeded")]
    CapacityExceeded = 23,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 24,

    #[error("Division by zero")]
    DivisionByZero = 25,

    #[error("Ledger invariant violated")]
    InvariantViolation = 26,
}

impl PrintProgramError for YieldError {
    fn print<E>(&self) {
        use solana_program::msg;
        msg!("YieldError: {}", self);
    }
}

impl From<YieldError> for ProgramError {
    fn from(e: YieldError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for YieldError {
    fn type_of() -> &'static str {
        "YieldError"
    }
}
