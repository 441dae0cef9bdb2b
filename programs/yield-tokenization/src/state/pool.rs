use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    constants::{BPS_DENOMINATOR, MAX_FEE_BPS},
    error::YieldError,
    math::{checked_add, checked_sub, isqrt, mul_div},
};

/// One side of a pool
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolAsset {
    /// SPL mint held in the pool vault
    Token(Pubkey),
    /// PT of the maturity with this expiry, held in the pool's ledger position
    Principal(i64),
    /// YT of the maturity with this expiry, held in the pool's ledger position
    Yield(i64),
}

impl PoolAsset {
    pub fn expiry(&self) -> Option<i64> {
        match self {
            PoolAsset::Token(_) => None,
            PoolAsset::Principal(expiry) | PoolAsset::Yield(expiry) => Some(*expiry),
        }
    }

    pub fn is_ledger_claim(&self) -> bool {
        self.expiry().is_some()
    }

    pub fn mint(&self) -> Option<Pubkey> {
        match self {
            PoolAsset::Token(mint) => Some(*mint),
            _ => None,
        }
    }

    /// (PT, YT) amounts moved through the ledger for `amount` of this asset
    pub fn ledger_amounts(&self, amount: u64) -> (u64, u64) {
        match self {
            PoolAsset::Token(_) => (0, 0),
            PoolAsset::Principal(_) => (amount, 0),
            PoolAsset::Yield(_) => (0, amount),
        }
    }

    /// PDA seed component identifying this leg within a maturity
    pub fn seed(&self) -> Vec<u8> {
        match self {
            PoolAsset::Token(mint) => mint.to_bytes().to_vec(),
            PoolAsset::Principal(_) => b"pt".to_vec(),
            PoolAsset::Yield(_) => b"yt".to_vec(),
        }
    }
}

/// amountOut = floor(amountIn * (10000 - fee) * reserveOut / (reserveIn * 10000 + amountIn * (10000 - fee)))
pub fn quote(
    amount_in: u64,
    reserve_in: u64,
    reserve_out: u64,
    fee_bps: u16,
) -> Result<u64, YieldError> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(YieldError::InsufficientLiquidity);
    }
    if fee_bps as u64 >= BPS_DENOMINATOR {
        return Err(YieldError::InvalidInput);
    }

    let fee_factor = (BPS_DENOMINATOR - fee_bps as u64) as u128;
    let amount_in_with_fee = (amount_in as u128)
        .checked_mul(fee_factor)
        .ok_or(YieldError::ArithmeticOverflow)?;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out as u128)
        .ok_or(YieldError::ArithmeticOverflow)?;
    let denominator = (reserve_in as u128)
        .checked_mul(BPS_DENOMINATOR as u128)
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or(YieldError::ArithmeticOverflow)?;

    u64::try_from(numerator / denominator).map_err(|_| YieldError::ArithmeticOverflow)
}

/// Two-asset constant-product pool
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct Pool {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,

    /// Maturity whose PT/YT this pool trades
    pub maturity: Pubkey,
    pub expiry: i64,

    pub asset_a: PoolAsset,
    pub asset_b: PoolAsset,

    /// Pool's own holder position in `maturity` (custody for ledger legs)
    pub position: Pubkey,

    /// Token account custody for the token leg (default when there is none)
    pub vault: Pubkey,
    pub vault_authority_bump: u8,

    pub reserve_a: u64,
    pub reserve_b: u64,
    pub fee_bps: u16,

    /// Outstanding LP shares
    pub total_shares: u64,

    /// Stats
    pub swap_count: u64,
    pub volume_a: u64,
    pub volume_b: u64,

    pub bump: u8,
}

/// Pool state after a swap, computed before anything is committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapResult {
    pub amount_in: u64,
    pub amount_out: u64,
    pub token_in_is_a: bool,
    pub reserve_a: u64,
    pub reserve_b: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityDeposit {
    pub amount_a: u64,
    pub amount_b: u64,
    pub shares: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityWithdrawal {
    pub amount_a: u64,
    pub amount_b: u64,
    pub shares: u64,
}

impl Pool {
    pub const DISCRIMINATOR: [u8; 8] = [67, 80, 77, 77, 80, 79, 79, 76]; // "CPMMPOOL"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        32 + // maturity
        8 + // expiry
        33 + // asset_a
        33 + // asset_b
        32 + // position
        32 + // vault
        1 + // vault_authority_bump
        8 + // reserve_a
        8 + // reserve_b
        2 + // fee_bps
        8 + // total_shares
        8 + // swap_count
        8 + // volume_a
        8 + // volume_b
        1 + // bump
        64; // padding

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        maturity: Pubkey,
        expiry: i64,
        asset_a: PoolAsset,
        asset_b: PoolAsset,
        position: Pubkey,
        vault: Pubkey,
        vault_authority_bump: u8,
        fee_bps: u16,
        bump: u8,
    ) -> Result<Self, YieldError> {
        let pool = Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            maturity,
            expiry,
            asset_a,
            asset_b,
            position,
            vault,
            vault_authority_bump,
            reserve_a: 0,
            reserve_b: 0,
            fee_bps,
            total_shares: 0,
            swap_count: 0,
            volume_a: 0,
            volume_b: 0,
            bump,
        };
        pool.validate()?;
        Ok(pool)
    }

    pub fn validate(&self) -> Result<(), YieldError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(YieldError::InvalidAccountData);
        }
        if !self.is_initialized {
            return Err(YieldError::NotInitialized);
        }
        if self.fee_bps > MAX_FEE_BPS || self.asset_a == self.asset_b {
            return Err(YieldError::InvalidInput);
        }

        // At least one leg is a claim on this pool's maturity, at most one is a token
        let legs = [self.asset_a, self.asset_b];
        if !legs.iter().any(|leg| leg.is_ledger_claim()) {
            return Err(YieldError::InvalidInput);
        }
        if legs
            .iter()
            .filter_map(|leg| leg.expiry())
            .any(|expiry| expiry != self.expiry)
        {
            return Err(YieldError::InvalidInput);
        }
        Ok(())
    }

    /// The token leg, if the pool has one
    pub fn token_leg(&self) -> Option<PoolAsset> {
        [self.asset_a, self.asset_b]
            .into_iter()
            .find(|leg| leg.mint().is_some())
    }

    /// Some(true) if `asset` is leg A, Some(false) if leg B
    pub fn side_of(&self, asset: &PoolAsset) -> Option<bool> {
        if self.asset_a == *asset {
            Some(true)
        } else if self.asset_b == *asset {
            Some(false)
        } else {
            None
        }
    }

    pub fn reserves(&self) -> (u64, u64) {
        (self.reserve_a, self.reserve_b)
    }

    fn ensure_trading(&self, now: i64) -> Result<(), YieldError> {
        if now >= self.expiry {
            return Err(YieldError::MaturityExpired);
        }
        Ok(())
    }

    pub fn quote(&self, amount_in: u64, token_in_is_a: bool) -> Result<u64, YieldError> {
        let (reserve_in, reserve_out) = if token_in_is_a {
            (self.reserve_a, self.reserve_b)
        } else {
            (self.reserve_b, self.reserve_a)
        };
        quote(amount_in, reserve_in, reserve_out, self.fee_bps)
    }

    /// Compute a swap without touching reserves
    pub fn preview_swap(
        &self,
        amount_in: u64,
        min_amount_out: u64,
        token_in_is_a: bool,
        now: i64,
    ) -> Result<SwapResult, YieldError> {
        self.ensure_trading(now)?;
        if self.reserve_a == 0 || self.reserve_b == 0 {
            return Err(YieldError::InsufficientLiquidity);
        }
        if amount_in == 0 {
            return Err(YieldError::InvalidInput);
        }

        let amount_out = self.quote(amount_in, token_in_is_a)?;
        if amount_out == 0 {
            return Err(YieldError::InsufficientLiquidity);
        }
        if amount_out < min_amount_out {
            return Err(YieldError::SlippageExceeded);
        }

        let (reserve_a, reserve_b) = if token_in_is_a {
            (
                checked_add(self.reserve_a, amount_in)?,
                checked_sub(self.reserve_b, amount_out)?,
            )
        } else {
            (
                checked_sub(self.reserve_a, amount_out)?,
                checked_add(self.reserve_b, amount_in)?,
            )
        };

        // Fee stays in the pool, so k can only grow
        let k_before = self.reserve_a as u128 * self.reserve_b as u128;
        let k_after = reserve_a as u128 * reserve_b as u128;
        if k_after < k_before {
            return Err(YieldError::InvariantViolation);
        }

        Ok(SwapResult {
            amount_in,
            amount_out,
            token_in_is_a,
            reserve_a,
            reserve_b,
        })
    }

    pub fn swap(
        &mut self,
        amount_in: u64,
        min_amount_out: u64,
        token_in_is_a: bool,
        now: i64,
    ) -> Result<SwapResult, YieldError> {
        let result = self.preview_swap(amount_in, min_amount_out, token_in_is_a, now)?;

        self.reserve_a = result.reserve_a;
        self.reserve_b = result.reserve_b;
        self.swap_count = self.swap_count.saturating_add(1);
        if token_in_is_a {
            self.volume_a = self.volume_a.saturating_add(amount_in);
        } else {
            self.volume_b = self.volume_b.saturating_add(amount_in);
        }

        Ok(result)
    }

    /// Deposit up to (`max_amount_a`, `max_amount_b`). The first deposit sets
    /// the price ratio; later ones take only the proportional amounts.
    pub fn add_liquidity(
        &mut self,
        max_amount_a: u64,
        max_amount_b: u64,
        now: i64,
    ) -> Result<LiquidityDeposit, YieldError> {
        self.ensure_trading(now)?;

        let deposit = if self.total_shares == 0 {
            if max_amount_a == 0 || max_amount_b == 0 {
                return Err(YieldError::ZeroLiquidity);
            }
            let shares = isqrt(max_amount_a as u128 * max_amount_b as u128) as u64;
            LiquidityDeposit {
                amount_a: max_amount_a,
                amount_b: max_amount_b,
                shares,
            }
        } else {
            if self.reserve_a == 0 || self.reserve_b == 0 {
                return Err(YieldError::InvariantViolation);
            }
            let shares_a = mul_div(max_amount_a, self.total_shares, self.reserve_a)?;
            let shares_b = mul_div(max_amount_b, self.total_shares, self.reserve_b)?;
            let shares = shares_a.min(shares_b);
            if shares == 0 {
                return Err(YieldError::ZeroLiquidity);
            }

            // Rounded up in favour of the pool
            let amount_a = mul_div_ceil(shares, self.reserve_a, self.total_shares)?;
            let amount_b = mul_div_ceil(shares, self.reserve_b, self.total_shares)?;
            if amount_a > max_amount_a || amount_b > max_amount_b {
                return Err(YieldError::SlippageExceeded);
            }
            LiquidityDeposit {
                amount_a,
                amount_b,
                shares,
            }
        };

        if deposit.shares == 0 {
            return Err(YieldError::ZeroLiquidity);
        }

        let reserve_a = checked_add(self.reserve_a, deposit.amount_a)?;
        let reserve_b = checked_add(self.reserve_b, deposit.amount_b)?;
        let total_shares = checked_add(self.total_shares, deposit.shares)?;

        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        self.total_shares = total_shares;

        Ok(deposit)
    }

    /// Burn `shares` for the proportional reserves. Allowed after expiry.
    pub fn remove_liquidity(&mut self, shares: u64) -> Result<LiquidityWithdrawal, YieldError> {
        if self.total_shares == 0 || shares == 0 {
            return Err(YieldError::ZeroLiquidity);
        }
        if shares > self.total_shares {
            return Err(YieldError::InsufficientBalance);
        }

        let amount_a = mul_div(shares, self.reserve_a, self.total_shares)?;
        let amount_b = mul_div(shares, self.reserve_b, self.total_shares)?;
        if amount_a == 0 && amount_b == 0 {
            return Err(YieldError::ZeroLiquidity);
        }

        let reserve_a = checked_sub(self.reserve_a, amount_a)?;
        let reserve_b = checked_sub(self.reserve_b, amount_b)?;
        let total_shares = checked_sub(self.total_shares, shares)?;

        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        self.total_shares = total_shares;

        Ok(LiquidityWithdrawal {
            amount_a,
            amount_b,
            shares,
        })
    }
}

fn mul_div_ceil(a: u64, b: u64, denominator: u64) -> Result<u64, YieldError> {
    if denominator == 0 {
        return Err(YieldError::DivisionByZero);
    }
    let product = a as u128 * b as u128;
    let result = (product + denominator as u128 - 1) / denominator as u128;
    u64::try_from(result).map_err(|_| YieldError::ArithmeticOverflow)
}

/// LP shares held by one provider in one pool
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub struct LiquidityPosition {
    pub discriminator: [u8; 8],
    pub is_initialized: bool,
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub shares: u64,
    pub bump: u8,
}

impl LiquidityPosition {
    pub const DISCRIMINATOR: [u8; 8] = [76, 80, 95, 83, 72, 65, 82, 69]; // "LP_SHARE"

    pub const LEN: usize = 8 + 1 + 32 + 32 + 8 + 1 + 16;

    pub fn new(pool: Pubkey, owner: Pubkey, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            pool,
            owner,
            shares: 0,
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

    pub fn credit(&mut self, shares: u64) -> Result<(), YieldError> {
        self.shares = checked_add(self.shares, shares)?;
        Ok(())
    }

    pub fn debit(&mut self, shares: u64) -> Result<(), YieldError> {
        if shares > self.shares {
            return Err(YieldError::InsufficientBalance);
        }
        self.shares -= shares;
        Ok(())
    }
}
