use std::collections::BTreeSet;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

use crate::{
    constants::{MAX_MATURITIES, YIELD_INDEX_SCALE},
    error::YieldError,
    math::{checked_add, checked_sub},
};

/// Custody of the underlying and the list of maturities it backs
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct Ledger {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,

    /// Creates maturities and runs audits
    pub authority: Pubkey,

    /// Yield-bearing deposit asset
    pub underlying_mint: Pubkey,

    /// Token account holding every locked deposit and distributed yield
    pub vault: Pubkey,
    pub vault_authority_bump: u8,

    /// Expiries of every maturity created, in creation order
    pub maturities: Vec<i64>,

    /// Principal currently locked across maturities
    pub total_locked: u64,

    pub bump: u8,
}

impl Ledger {
    pub const DISCRIMINATOR: [u8; 8] = [89, 76, 68, 76, 69, 68, 71, 82]; // "YLDLEDGR"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // authority
        32 + // underlying_mint
        32 + // vault
        1 + // vault_authority_bump
        4 + (8 * MAX_MATURITIES) + // maturities
        8 + // total_locked
        1 + // bump
        64; // padding

    pub fn new(
        authority: Pubkey,
        underlying_mint: Pubkey,
        vault: Pubkey,
        vault_authority_bump: u8,
        bump: u8,
    ) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            authority,
            underlying_mint,
            vault,
            vault_authority_bump,
            maturities: Vec::new(),
            total_locked: 0,
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
        if self.maturities.len() > MAX_MATURITIES {
            return Err(YieldError::CapacityExceeded);
        }
        Ok(())
    }

    pub fn ensure_authority(&self, caller: &Pubkey) -> Result<(), YieldError> {
        if *caller != self.authority {
            return Err(YieldError::Unauthorized);
        }
        Ok(())
    }

    pub fn has_maturity(&self, expiry: i64) -> bool {
        self.maturities.contains(&expiry)
    }

    /// Register a new expiry and return its empty maturity state
    pub fn create_maturity(
        &mut self,
        caller: &Pubkey,
        ledger_key: Pubkey,
        expiry: i64,
        now: i64,
        bump: u8,
    ) -> Result<Maturity, YieldError> {
        self.ensure_authority(caller)?;
        if expiry <= now || self.has_maturity(expiry) {
            return Err(YieldError::InvalidExpiry);
        }
        if self.maturities.len() >= MAX_MATURITIES {
            return Err(YieldError::CapacityExceeded);
        }

        self.maturities.push(expiry);
        Ok(Maturity::new(ledger_key, expiry, now, bump))
    }

    pub fn lock(&mut self, amount: u64) -> Result<(), YieldError> {
        self.total_locked = checked_add(self.total_locked, amount)?;
        Ok(())
    }

    pub fn release(&mut self, amount: u64) -> Result<(), YieldError> {
        self.total_locked = checked_sub(self.total_locked, amount)
            .map_err(|_| YieldError::InvariantViolation)?;
        Ok(())
    }
}

/// One PT/YT market
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct Maturity {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,
    pub ledger: Pubkey,
    pub expiry: i64,

    pub pt_supply: u64,
    pub yt_supply: u64,

    /// Set once after expiry; PT redemption opens and YT stops accruing
    pub settled: bool,

    /// Latched when an audit finds balances out of line with supplies
    pub halted: bool,

    /// Holder positions opened in this maturity, pool custody included
    pub position_count: u64,

    /// Cumulative yield per YT, scaled by 1e12
    pub yield_index: u128,
    pub total_yield_distributed: u64,
    pub total_yield_claimed: u64,

    /// Underlying backing outstanding PT
    pub principal_locked: u64,

    pub created_at: i64,
    pub bump: u8,
}

/// PT/YT balances of one holder in one maturity
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct HolderPosition {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,
    pub maturity: Pubkey,
    pub holder: Pubkey,
    pub pt_balance: u64,
    pub yt_balance: u64,

    /// Maturity yield index at the last settlement of this position
    pub yield_checkpoint: u128,

    /// Accrued and not yet claimed
    pub pending_yield: u64,
    pub total_yield_claimed: u64,

    pub bump: u8,
}

impl Maturity {
    pub const DISCRIMINATOR: [u8; 8] = [77, 65, 84, 85, 82, 73, 84, 89]; // "MATURITY"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // ledger
        8 + // expiry
        8 + // pt_supply
        8 + // yt_supply
        1 + // settled
        1 + // halted
        8 + // position_count
        16 + // yield_index
        8 + // total_yield_distributed
        8 + // total_yield_claimed
        8 + // principal_locked
        8 + // created_at
        1 + // bump
        32; // padding

    pub fn new(ledger: Pubkey, expiry: i64, now: i64, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            ledger,
            expiry,
            pt_supply: 0,
            yt_supply: 0,
            settled: false,
            halted: false,
            position_count: 0,
            yield_index: 0,
            total_yield_distributed: 0,
            total_yield_claimed: 0,
            principal_locked: 0,
            created_at: now,
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

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expiry
    }

    pub fn ensure_writable(&self) -> Result<(), YieldError> {
        if self.halted {
            return Err(YieldError::InvariantViolation);
        }
        Ok(())
    }

    fn ensure_active(&self, now: i64) -> Result<(), YieldError> {
        self.ensure_writable()?;
        if self.is_expired(now) {
            return Err(YieldError::MaturityExpired);
        }
        Ok(())
    }

    /// Bring a position's pending yield current against the index
    pub fn accrue(&self, position: &mut HolderPosition) -> Result<(), YieldError> {
        let delta = self
            .yield_index
            .checked_sub(position.yield_checkpoint)
            .ok_or(YieldError::InvariantViolation)?;
        let earned = (position.yt_balance as u128)
            .checked_mul(delta)
            .ok_or(YieldError::ArithmeticOverflow)?
            / YIELD_INDEX_SCALE;
        let earned = u64::try_from(earned).map_err(|_| YieldError::ArithmeticOverflow)?;

        position.pending_yield = checked_add(position.pending_yield, earned)?;
        position.yield_checkpoint = self.yield_index;
        Ok(())
    }

    /// Mint `amount` PT and YT against `amount` of locked underlying
    pub fn split(
        &mut self,
        position: &mut HolderPosition,
        amount: u64,
        now: i64,
    ) -> Result<(), YieldError> {
        self.ensure_active(now)?;
        if amount == 0 {
            return Err(YieldError::InvalidInput);
        }

        let mut updated = position.clone();
        self.accrue(&mut updated)?;
        updated.pt_balance = checked_add(updated.pt_balance, amount)?;
        updated.yt_balance = checked_add(updated.yt_balance, amount)?;

        let pt_supply = checked_add(self.pt_supply, amount)?;
        let yt_supply = checked_add(self.yt_supply, amount)?;
        let principal_locked = checked_add(self.principal_locked, amount)?;

        self.pt_supply = pt_supply;
        self.yt_supply = yt_supply;
        self.principal_locked = principal_locked;
        *position = updated;
        Ok(())
    }

    /// Burn `amount` PT for the same amount of underlying
    pub fn redeem(
        &mut self,
        position: &mut HolderPosition,
        amount: u64,
        now: i64,
    ) -> Result<(), YieldError> {
        self.ensure_writable()?;
        if amount == 0 {
            return Err(YieldError::InvalidInput);
        }
        if !self.is_expired(now) {
            return Err(YieldError::NotYetMatured);
        }
        if !self.settled {
            return Err(YieldError::NotSettled);
        }
        if position.pt_balance < amount {
            return Err(YieldError::InsufficientBalance);
        }

        let pt_supply =
            checked_sub(self.pt_supply, amount).map_err(|_| YieldError::InvariantViolation)?;
        let principal_locked = checked_sub(self.principal_locked, amount)
            .map_err(|_| YieldError::InvariantViolation)?;

        position.pt_balance -= amount;
        self.pt_supply = pt_supply;
        self.principal_locked = principal_locked;
        Ok(())
    }

    pub fn settle(&mut self, now: i64) -> Result<(), YieldError> {
        self.ensure_writable()?;
        if !self.is_expired(now) {
            return Err(YieldError::NotYetMatured);
        }
        if self.settled {
            return Err(YieldError::InvalidInput);
        }
        self.settled = true;
        Ok(())
    }

    /// Spread `amount` of deposited yield over the outstanding YT
    pub fn distribute_yield(&mut self, amount: u64, now: i64) -> Result<(), YieldError> {
        self.ensure_writable()?;
        if amount == 0 || self.yt_supply == 0 || self.is_expired(now) {
            return Err(YieldError::InvalidInput);
        }

        let increment = (amount as u128)
            .checked_mul(YIELD_INDEX_SCALE)
            .ok_or(YieldError::ArithmeticOverflow)?
            / self.yt_supply as u128;
        let yield_index = self
            .yield_index
            .checked_add(increment)
            .ok_or(YieldError::ArithmeticOverflow)?;
        let total_yield_distributed = checked_add(self.total_yield_distributed, amount)?;

        self.yield_index = yield_index;
        self.total_yield_distributed = total_yield_distributed;
        Ok(())
    }

    /// Pay out the share of pending yield attributable to `yt_amount` of the
    /// position's YT. A position with no YT left is paid everything it has
    /// realized. Returns the payout.
    pub fn claim_yield(
        &mut self,
        position: &mut HolderPosition,
        yt_amount: u64,
        now: i64,
    ) -> Result<u64, YieldError> {
        self.ensure_active(now)?;

        let mut updated = position.clone();
        self.accrue(&mut updated)?;

        let payout = if updated.yt_balance == 0 {
            if updated.pending_yield == 0 {
                return Err(YieldError::InvalidInput);
            }
            updated.pending_yield
        } else {
            if yt_amount == 0 {
                return Err(YieldError::InvalidInput);
            }
            if yt_amount > updated.yt_balance {
                return Err(YieldError::InsufficientBalance);
            }
            ((updated.pending_yield as u128 * yt_amount as u128) / updated.yt_balance as u128)
                as u64
        };
        updated.pending_yield -= payout;
        updated.total_yield_claimed = checked_add(updated.total_yield_claimed, payout)?;
        let total_yield_claimed = checked_add(self.total_yield_claimed, payout)?;
        if total_yield_claimed > self.total_yield_distributed {
            return Err(YieldError::InvariantViolation);
        }

        self.total_yield_claimed = total_yield_claimed;
        *position = updated;
        Ok(payout)
    }

    /// Move PT and YT between two positions of this maturity. Supplies are
    /// unchanged.
    pub fn transfer(
        &self,
        from: &mut HolderPosition,
        to: &mut HolderPosition,
        pt_amount: u64,
        yt_amount: u64,
    ) -> Result<(), YieldError> {
        self.ensure_writable()?;
        if from.maturity != to.maturity || from.holder == to.holder {
            return Err(YieldError::InvalidInput);
        }
        if pt_amount == 0 && yt_amount == 0 {
            return Err(YieldError::InvalidInput);
        }
        if from.pt_balance < pt_amount || from.yt_balance < yt_amount {
            return Err(YieldError::InsufficientBalance);
        }

        let mut sender = from.clone();
        let mut receiver = to.clone();
        self.accrue(&mut sender)?;
        self.accrue(&mut receiver)?;

        sender.pt_balance -= pt_amount;
        sender.yt_balance -= yt_amount;
        receiver.pt_balance = checked_add(receiver.pt_balance, pt_amount)?;
        receiver.yt_balance = checked_add(receiver.yt_balance, yt_amount)?;

        *from = sender;
        *to = receiver;
        Ok(())
    }

    /// Count a newly opened position. Audits require all of them.
    pub fn register_position(&mut self) -> Result<(), YieldError> {
        self.position_count = self
            .position_count
            .checked_add(1)
            .ok_or(YieldError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Whether the supplied positions account for exactly the outstanding
    /// supply. `positions` must be every distinct position of this maturity;
    /// anything less fails `InvalidInput` without a verdict.
    pub fn balances_match(
        &self,
        maturity_key: &Pubkey,
        positions: &[HolderPosition],
    ) -> Result<bool, YieldError> {
        if positions.len() as u64 != self.position_count {
            return Err(YieldError::InvalidInput);
        }
        let mut holders = BTreeSet::new();
        if !positions.iter().all(|position| holders.insert(position.holder)) {
            return Err(YieldError::InvalidInput);
        }

        let mut pt_total: u128 = 0;
        let mut yt_total: u128 = 0;
        for position in positions {
            if position.maturity != *maturity_key {
                return Err(YieldError::InvalidInput);
            }
            pt_total += position.pt_balance as u128;
            yt_total += position.yt_balance as u128;
        }
        Ok(pt_total == self.pt_supply as u128 && yt_total == self.yt_supply as u128)
    }

    pub fn halt(&mut self) {
        msg!("Maturity {} halted", self.expiry);
        self.halted = true;
    }
}

impl HolderPosition {
    pub const DISCRIMINATOR: [u8; 8] = [72, 79, 76, 68, 82, 80, 79, 83]; // "HOLDRPOS"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // maturity
        32 + // holder
        8 + // pt_balance
        8 + // yt_balance
        16 + // yield_checkpoint
        8 + // pending_yield
        8 + // total_yield_claimed
        1 + // bump
        32; // padding

    pub fn new(maturity: Pubkey, holder: Pubkey, yield_index: u128, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            maturity,
            holder,
            pt_balance: 0,
            yt_balance: 0,
            yield_checkpoint: yield_index,
            pending_yield: 0,
            total_yield_claimed: 0,
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
}
