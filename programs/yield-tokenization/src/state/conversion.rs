use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    constants::{DEFAULT_CONVERSION_BPS, DEFAULT_MIN_CONFIDENCE_BPS, MAX_CONFIDENCE_BPS},
    error::YieldError,
    state::{Pool, PoolAsset},
};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Fires when price >= threshold
    Above,
    /// Fires when price <= threshold
    Below,
}

impl Direction {
    pub fn is_reached(&self, price: u64, threshold: u64) -> bool {
        match self {
            Direction::Above => price >= threshold,
            Direction::Below => price <= threshold,
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStatus {
    Active,
    Triggered,
    Executed,
    Cancelled,
}

/// Holder-chosen parameters of a conversion rule
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTerms {
    pub reference_asset: Pubkey,
    pub threshold_price: u64,
    pub direction: Direction,
    /// Fraction of the YT balance converted per execution; converter default if None
    pub conversion_bps: Option<u16>,
    /// Minimum oracle confidence; converter default if None
    pub min_confidence_bps: Option<u16>,
    /// 8-decimal PT received per YT floor; 0 disables
    pub min_pt_per_yt: u64,
    pub repeatable: bool,
}

/// Converter configuration tying one oracle to one ledger
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct ConverterConfig {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,
    pub authority: Pubkey,
    pub oracle: Pubkey,
    pub ledger: Pubkey,
    pub default_conversion_bps: u16,
    pub default_min_confidence_bps: u16,

    /// Id given to the next registered rule
    pub next_rule_id: u64,

    pub total_conversions: u64,
    pub bump: u8,
}

/// A holder's standing instruction to convert YT into PT on a price condition
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct ConversionRule {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,
    pub converter: Pubkey,
    pub rule_id: u64,
    pub holder: Pubkey,
    pub maturity: Pubkey,
    pub reference_asset: Pubkey,
    pub threshold_price: u64,
    pub direction: Direction,
    pub pool: Pubkey,
    pub conversion_bps: u16,
    pub min_confidence_bps: u16,
    pub min_pt_per_yt: u64,
    pub repeatable: bool,
    pub status: RuleStatus,

    /// Stats
    pub executions: u32,
    pub last_executed_at: i64,
    pub total_yt_converted: u64,
    pub total_pt_received: u64,

    pub created_at: i64,
    pub bump: u8,
}

fn validate_bps(bps: u16, allow_zero: bool) -> Result<(), YieldError> {
    if bps > MAX_CONFIDENCE_BPS || (!allow_zero && bps == 0) {
        return Err(YieldError::InvalidInput);
    }
    Ok(())
}

impl ConverterConfig {
    pub const DISCRIMINATOR: [u8; 8] = [67, 79, 78, 86, 67, 78, 70, 71]; // "CONVCNFG"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // authority
        32 + // oracle
        32 + // ledger
        2 + // default_conversion_bps
        2 + // default_min_confidence_bps
        8 + // next_rule_id
        8 + // total_conversions
        1 + // bump
        32; // padding

    pub fn new(
        authority: Pubkey,
        oracle: Pubkey,
        ledger: Pubkey,
        default_conversion_bps: Option<u16>,
        default_min_confidence_bps: Option<u16>,
        bump: u8,
    ) -> Result<Self, YieldError> {
        let config = Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            authority,
            oracle,
            ledger,
            default_conversion_bps: default_conversion_bps.unwrap_or(DEFAULT_CONVERSION_BPS),
            default_min_confidence_bps: default_min_confidence_bps
                .unwrap_or(DEFAULT_MIN_CONFIDENCE_BPS),
            next_rule_id: 0,
            total_conversions: 0,
            bump,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), YieldError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(YieldError::InvalidAccountData);
        }
        if !self.is_initialized {
            return Err(YieldError::NotInitialized);
        }
        validate_bps(self.default_conversion_bps, false)?;
        validate_bps(self.default_min_confidence_bps, true)
    }

    /// Build the next rule for `holder` and advance the id counter
    #[allow(clippy::too_many_arguments)]
    pub fn register_rule(
        &mut self,
        converter_key: Pubkey,
        holder: Pubkey,
        maturity_key: Pubkey,
        pool_key: Pubkey,
        pool: &Pool,
        terms: RuleTerms,
        now: i64,
        bump: u8,
    ) -> Result<ConversionRule, YieldError> {
        if terms.threshold_price == 0 {
            return Err(YieldError::InvalidPrice);
        }
        let conversion_bps = terms.conversion_bps.unwrap_or(self.default_conversion_bps);
        let min_confidence_bps = terms
            .min_confidence_bps
            .unwrap_or(self.default_min_confidence_bps);
        validate_bps(conversion_bps, false)?;
        validate_bps(min_confidence_bps, true)?;

        // Conversions route YT -> PT through this maturity's own pool
        if pool.maturity != maturity_key
            || pool.side_of(&PoolAsset::Principal(pool.expiry)).is_none()
            || pool.side_of(&PoolAsset::Yield(pool.expiry)).is_none()
        {
            return Err(YieldError::InvalidInput);
        }

        let rule_id = self.next_rule_id;
        let next_rule_id = rule_id
            .checked_add(1)
            .ok_or(YieldError::ArithmeticOverflow)?;

        let rule = ConversionRule {
            discriminator: ConversionRule::DISCRIMINATOR,
            is_initialized: true,
            converter: converter_key,
            rule_id,
            holder,
            maturity: maturity_key,
            reference_asset: terms.reference_asset,
            threshold_price: terms.threshold_price,
            direction: terms.direction,
            pool: pool_key,
            conversion_bps,
            min_confidence_bps,
            min_pt_per_yt: terms.min_pt_per_yt,
            repeatable: terms.repeatable,
            status: RuleStatus::Active,
            executions: 0,
            last_executed_at: 0,
            total_yt_converted: 0,
            total_pt_received: 0,
            created_at: now,
            bump,
        };

        self.next_rule_id = next_rule_id;
        Ok(rule)
    }
}

impl ConversionRule {
    pub const DISCRIMINATOR: [u8; 8] = [67, 79, 78, 86, 82, 85, 76, 69]; // "CONVRULE"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // converter
        8 + // rule_id
        32 + // holder
        32 + // maturity
        32 + // reference_asset
        8 + // threshold_price
        1 + // direction
        32 + // pool
        2 + // conversion_bps
        2 + // min_confidence_bps
        8 + // min_pt_per_yt
        1 + // repeatable
        1 + // status
        4 + // executions
        8 + // last_executed_at
        8 + // total_yt_converted
        8 + // total_pt_received
        8 + // created_at
        1 + // bump
        32; // padding

    pub fn validate(&self) -> Result<(), YieldError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(YieldError::InvalidAccountData);
        }
        if !self.is_initialized {
            return Err(YieldError::NotInitialized);
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    pub fn cancel(&mut self, caller: &Pubkey) -> Result<(), YieldError> {
        if *caller != self.holder {
            return Err(YieldError::Unauthorized);
        }
        if !self.is_active() {
            return Err(YieldError::RuleInactive);
        }
        self.status = RuleStatus::Cancelled;
        Ok(())
    }
}
