use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

use crate::{
    constants::{BPS_DENOMINATOR, MAX_CONFIDENCE_BPS, MAX_UPDATERS},
    error::YieldError,
    math::deviation_bps,
};

/// Process-wide oracle configuration and health latches
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct OracleConfig {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized flag
    pub is_initialized: bool,

    /// Authority that manages updaters, thresholds, pause and breaker reset
    pub authority: Pubkey,

    /// Maximum age of a price record before it is stale
    pub heartbeat_seconds: i64,

    /// Largest price move (basis points) accepted inside `min_update_interval`
    pub max_deviation_bps: u16,

    /// Updates closer together than this are checked for anomalous moves
    pub min_update_interval: i64,

    /// Latched by an anomalous update; cleared only by the authority
    pub circuit_breaker_active: bool,

    /// Blocks price consumption
    pub paused: bool,

    /// Authorized price submitters
    pub updaters: Vec<Pubkey>,

    /// Stats
    pub breaker_trips: u32,
    pub last_breaker_trip: i64,

    pub bump: u8,
}

/// Latest price for one asset. No history is kept.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct PriceFeed {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,
    pub oracle: Pubkey,
    pub asset: Pubkey,

    /// 8-decimal fixed point; zero until the first accepted update
    pub price: u64,
    pub confidence_bps: u16,
    pub timestamp: i64,
    pub updater: Pubkey,

    /// Price at or above which `threshold_reached` reports true (0 = unset)
    pub threshold: u64,

    pub bump: u8,
}

/// A validated price read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceReading {
    pub price: u64,
    pub confidence_bps: u16,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUpdateOutcome {
    Applied,
    /// The update was rejected and the breaker latched
    CircuitBreakerTripped {
        previous_price: u64,
        submitted_price: u64,
        deviation_bps: u64,
    },
}

impl OracleConfig {
    pub const DISCRIMINATOR: [u8; 8] = [79, 82, 65, 67, 76, 67, 70, 71]; // "ORACLCFG"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // authority
        8 + // heartbeat_seconds
        2 + // max_deviation_bps
        8 + // min_update_interval
        1 + // circuit_breaker_active
        1 + // paused
        4 + (32 * MAX_UPDATERS) + // updaters
        4 + // breaker_trips
        8 + // last_breaker_trip
        1 + // bump
        64; // padding

    pub fn new(
        authority: Pubkey,
        heartbeat_seconds: i64,
        max_deviation_bps: u16,
        min_update_interval: i64,
        bump: u8,
    ) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            authority,
            heartbeat_seconds,
            max_deviation_bps,
            min_update_interval,
            circuit_breaker_active: false,
            paused: false,
            updaters: vec![authority],
            breaker_trips: 0,
            last_breaker_trip: 0,
            bump,
        }
    }

    pub fn validate(&self) -> Result<(), YieldError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(YieldError::InvalidAccountData);
        }
        if !self.is_initialized {
            return Err(YieldError::NotInitialized);
        }
        if self.heartbeat_seconds <= 0
            || self.min_update_interval < 0
            || self.max_deviation_bps as u64 > BPS_DENOMINATOR
        {
            return Err(YieldError::InvalidInput);
        }
        if self.updaters.len() > MAX_UPDATERS {
            return Err(YieldError::CapacityExceeded);
        }
        Ok(())
    }

    pub fn is_healthy(&self) -> bool {
        !self.paused && !self.circuit_breaker_active
    }

    pub fn is_updater(&self, key: &Pubkey) -> bool {
        self.updaters.contains(key)
    }

    fn ensure_authority(&self, caller: &Pubkey) -> Result<(), YieldError> {
        if *caller != self.authority {
            return Err(YieldError::Unauthorized);
        }
        Ok(())
    }

    pub fn add_updater(&mut self, caller: &Pubkey, updater: Pubkey) -> Result<(), YieldError> {
        self.ensure_authority(caller)?;
        if self.is_updater(&updater) {
            return Err(YieldError::InvalidInput);
        }
        if self.updaters.len() >= MAX_UPDATERS {
            return Err(YieldError::CapacityExceeded);
        }
        self.updaters.push(updater);
        Ok(())
    }

    pub fn remove_updater(&mut self, caller: &Pubkey, updater: &Pubkey) -> Result<(), YieldError> {
        self.ensure_authority(caller)?;
        if !self.is_updater(updater) {
            return Err(YieldError::InvalidInput);
        }
        self.updaters.retain(|key| key != updater);
        Ok(())
    }

    pub fn set_paused(&mut self, caller: &Pubkey, paused: bool) -> Result<(), YieldError> {
        self.ensure_authority(caller)?;
        self.paused = paused;
        Ok(())
    }

    pub fn reset_circuit_breaker(&mut self, caller: &Pubkey) -> Result<(), YieldError> {
        self.ensure_authority(caller)?;
        self.circuit_breaker_active = false;
        Ok(())
    }

    /// Apply optional parameter changes; all-or-nothing
    pub fn update_parameters(
        &mut self,
        caller: &Pubkey,
        heartbeat_seconds: Option<i64>,
        max_deviation_bps: Option<u16>,
        min_update_interval: Option<i64>,
    ) -> Result<(), YieldError> {
        self.ensure_authority(caller)?;

        let mut updated = self.clone();
        if let Some(value) = heartbeat_seconds {
            updated.heartbeat_seconds = value;
        }
        if let Some(value) = max_deviation_bps {
            updated.max_deviation_bps = value;
        }
        if let Some(value) = min_update_interval {
            updated.min_update_interval = value;
        }
        updated.validate()?;

        *self = updated;
        Ok(())
    }

    pub fn set_threshold(
        &self,
        caller: &Pubkey,
        feed: &mut PriceFeed,
        threshold: u64,
    ) -> Result<(), YieldError> {
        self.ensure_authority(caller)?;
        feed.threshold = threshold;
        Ok(())
    }

    /// Submit a price. An update that moves the price by more than
    /// `max_deviation_bps` within `min_update_interval` of the previous one is
    /// not applied; the breaker latches instead and the call still succeeds so
    /// the latch persists.
    pub fn update_price(
        &mut self,
        feed: &mut PriceFeed,
        updater: &Pubkey,
        price: u64,
        confidence_bps: u16,
        now: i64,
    ) -> Result<PriceUpdateOutcome, YieldError> {
        if !self.is_updater(updater) {
            return Err(YieldError::Unauthorized);
        }
        if confidence_bps > MAX_CONFIDENCE_BPS {
            return Err(YieldError::InvalidConfidence);
        }
        if price == 0 {
            return Err(YieldError::InvalidPrice);
        }

        if feed.has_data() && now.saturating_sub(feed.timestamp) < self.min_update_interval {
            let deviation = deviation_bps(feed.price, price);
            if deviation > self.max_deviation_bps as u64 {
                msg!(
                    "Anomalous update rejected: {} -> {} ({} bps)",
                    feed.price,
                    price,
                    deviation
                );
                self.circuit_breaker_active = true;
                self.breaker_trips = self.breaker_trips.saturating_add(1);
                self.last_breaker_trip = now;
                return Ok(PriceUpdateOutcome::CircuitBreakerTripped {
                    previous_price: feed.price,
                    submitted_price: price,
                    deviation_bps: deviation,
                });
            }
        }

        feed.price = price;
        feed.confidence_bps = confidence_bps;
        feed.timestamp = now;
        feed.updater = *updater;

        Ok(PriceUpdateOutcome::Applied)
    }

    pub fn get_price(&self, feed: &PriceFeed, now: i64) -> Result<PriceReading, YieldError> {
        if !self.is_healthy() {
            return Err(YieldError::OracleUnhealthy);
        }
        if !feed.has_data() {
            return Err(YieldError::NoData);
        }
        if now.saturating_sub(feed.timestamp) > self.heartbeat_seconds {
            return Err(YieldError::StaleData);
        }

        Ok(PriceReading {
            price: feed.price,
            confidence_bps: feed.confidence_bps,
            timestamp: feed.timestamp,
        })
    }

    pub fn threshold_reached(&self, feed: &PriceFeed, now: i64) -> Result<bool, YieldError> {
        let reading = self.get_price(feed, now)?;
        Ok(feed.threshold > 0 && reading.price >= feed.threshold)
    }
}

impl PriceFeed {
    pub const DISCRIMINATOR: [u8; 8] = [80, 82, 67, 95, 70, 69, 69, 68]; // "PRC_FEED"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // oracle
        32 + // asset
        8 + // price
        2 + // confidence_bps
        8 + // timestamp
        32 + // updater
        8 + // threshold
        1 + // bump
        32; // padding

    pub fn new(oracle: Pubkey, asset: Pubkey, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            oracle,
            asset,
            price: 0,
            confidence_bps: 0,
            timestamp: 0,
            updater: Pubkey::default(),
            threshold: 0,
            bump,
        }
    }

    pub fn validate(&self) -> Result<(), YieldError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(YieldError::InvalidAccountData);
        }
        if !self.is_initialized {
            return Err(YieldError::NotInitialized);
        }
        Ok(())
    }

    pub fn has_data(&self) -> bool {
        self.price > 0
    }
}
