use solana_program::msg;

use crate::{
    constants::PRICE_SCALE,
    error::YieldError,
    math::{apply_bps, checked_add, mul_div},
    state::{
        ConversionRule, HolderPosition, Maturity, OracleConfig, Pool, PoolAsset, PriceFeed,
        RuleStatus,
    },
};

/// Component state a conversion reads and writes. Everything here is
/// borrowed from already-loaded accounts; nothing is persisted by the engine.
pub struct ConversionContext<'a> {
    pub oracle: &'a OracleConfig,
    pub feed: &'a PriceFeed,
    pub maturity: &'a Maturity,
    pub pool: &'a mut Pool,
    pub holder_position: &'a mut HolderPosition,
    /// Pool's custody position in the same maturity
    pub pool_position: &'a mut HolderPosition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReceipt {
    pub price: u64,
    pub yt_in: u64,
    pub pt_out: u64,
    /// Holder's pending yield after settlement against the index
    pub pending_yield: u64,
    /// Every status the rule passed through, in order
    pub transitions: Vec<RuleStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    NotTriggered { price: u64 },
    Executed(ConversionReceipt),
}

/// Threshold-driven YT -> PT conversion
pub struct ConversionEngine;

impl ConversionEngine {
    /// Evaluate `rule` against the oracle and, when its condition holds,
    /// swap part of the holder's YT for PT through the rule's pool.
    ///
    /// Every result is computed on copies first. `rule` and the context are
    /// only written after all checks pass, so an error leaves them untouched.
    pub fn check_and_convert(
        rule: &mut ConversionRule,
        ctx: ConversionContext,
        now: i64,
    ) -> Result<ConversionOutcome, YieldError> {
        if !rule.is_active() {
            return Err(YieldError::RuleInactive);
        }
        if ctx.feed.asset != rule.reference_asset {
            return Err(YieldError::InvalidInput);
        }

        let reading = ctx.oracle.get_price(ctx.feed, now)?;
        if reading.confidence_bps < rule.min_confidence_bps {
            return Err(YieldError::InsufficientConfidence);
        }

        if !rule.direction.is_reached(reading.price, rule.threshold_price) {
            return Ok(ConversionOutcome::NotTriggered {
                price: reading.price,
            });
        }

        let mut transitions = vec![RuleStatus::Triggered];
        msg!(
            "Rule {} triggered at {} (threshold {})",
            rule.rule_id,
            reading.price,
            rule.threshold_price
        );

        if ctx.holder_position.holder != rule.holder
            || ctx.holder_position.maturity != rule.maturity
            || ctx.pool_position.maturity != rule.maturity
        {
            return Err(YieldError::InvalidInput);
        }
        ctx.maturity.ensure_writable()?;

        // Realize the holder's yield before any YT leaves the position
        let mut holder = ctx.holder_position.clone();
        ctx.maturity.accrue(&mut holder)?;

        let yt_in = apply_bps(holder.yt_balance, rule.conversion_bps)?;
        if yt_in == 0 {
            return Err(YieldError::InsufficientBalance);
        }
        let min_pt_out = mul_div(yt_in, rule.min_pt_per_yt, PRICE_SCALE)?;

        let yt_is_a = ctx
            .pool
            .side_of(&PoolAsset::Yield(ctx.maturity.expiry))
            .ok_or(YieldError::InvalidInput)?;
        if ctx.pool.side_of(&PoolAsset::Principal(ctx.maturity.expiry)) != Some(!yt_is_a) {
            return Err(YieldError::InvalidInput);
        }

        let mut pool = ctx.pool.clone();
        let swap = pool.swap(yt_in, min_pt_out, yt_is_a, now)?;

        let mut pool_position = ctx.pool_position.clone();
        ctx.maturity
            .transfer(&mut holder, &mut pool_position, 0, swap.amount_in)?;
        ctx.maturity
            .transfer(&mut pool_position, &mut holder, swap.amount_out, 0)?;

        let total_yt_converted = checked_add(rule.total_yt_converted, swap.amount_in)?;
        let total_pt_received = checked_add(rule.total_pt_received, swap.amount_out)?;

        transitions.push(RuleStatus::Executed);
        let status = if rule.repeatable {
            transitions.push(RuleStatus::Active);
            RuleStatus::Active
        } else {
            RuleStatus::Executed
        };

        *ctx.pool = pool;
        *ctx.pool_position = pool_position;
        *ctx.holder_position = holder;

        rule.status = status;
        rule.executions = rule.executions.saturating_add(1);
        rule.last_executed_at = now;
        rule.total_yt_converted = total_yt_converted;
        rule.total_pt_received = total_pt_received;

        Ok(ConversionOutcome::Executed(ConversionReceipt {
            price: reading.price,
            yt_in: swap.amount_in,
            pt_out: swap.amount_out,
            pending_yield: ctx.holder_position.pending_yield,
            transitions,
        }))
    }
}
