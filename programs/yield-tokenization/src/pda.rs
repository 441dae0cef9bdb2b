//! Program Derived Address (PDA) derivation functions

use solana_program::pubkey::Pubkey;

use crate::state::PoolAsset;

/// PDA seed constants
pub mod seeds {
    pub const ORACLE: &[u8] = b"oracle";
    pub const PRICE_FEED: &[u8] = b"price_feed";
    pub const LEDGER: &[u8] = b"ledger";
    pub const MATURITY: &[u8] = b"maturity";
    pub const POSITION: &[u8] = b"position";
    pub const POOL: &[u8] = b"pool";
    pub const LIQUIDITY_POSITION: &[u8] = b"lp";
    pub const CONVERTER: &[u8] = b"converter";
    pub const RULE: &[u8] = b"rule";
    pub const VAULT_AUTHORITY: &[u8] = b"vault_authority";
}

pub struct OraclePDA;
impl OraclePDA {
    pub fn derive(program_id: &Pubkey, authority: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[seeds::ORACLE, authority.as_ref()], program_id)
    }
}

pub struct PriceFeedPDA;
impl PriceFeedPDA {
    pub fn derive(program_id: &Pubkey, oracle: &Pubkey, asset: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[seeds::PRICE_FEED, oracle.as_ref(), asset.as_ref()],
            program_id,
        )
    }
}

pub struct LedgerPDA;
impl LedgerPDA {
    pub fn derive(program_id: &Pubkey, underlying_mint: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[seeds::LEDGER, underlying_mint.as_ref()], program_id)
    }
}

pub struct MaturityPDA;
impl MaturityPDA {
    pub fn derive(program_id: &Pubkey, ledger: &Pubkey, expiry: i64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[seeds::MATURITY, ledger.as_ref(), &expiry.to_le_bytes()],
            program_id,
        )
    }
}

/// Holder position in one maturity
pub struct PositionPDA;
impl PositionPDA {
    pub fn derive(program_id: &Pubkey, maturity: &Pubkey, holder: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[seeds::POSITION, maturity.as_ref(), holder.as_ref()],
            program_id,
        )
    }
}

/// One pool per leg pair; either orientation maps to the same address
pub struct PoolPDA;
impl PoolPDA {
    pub fn derive(
        program_id: &Pubkey,
        maturity: &Pubkey,
        asset_a: &PoolAsset,
        asset_b: &PoolAsset,
    ) -> (Pubkey, u8) {
        let [first, second] = Self::leg_seeds(asset_a, asset_b);
        Pubkey::find_program_address(
            &[seeds::POOL, maturity.as_ref(), &first, &second],
            program_id,
        )
    }

    /// Leg seeds sorted bytewise
    pub fn leg_seeds(asset_a: &PoolAsset, asset_b: &PoolAsset) -> [Vec<u8>; 2] {
        let (a, b) = (asset_a.seed(), asset_b.seed());
        if a <= b {
            [a, b]
        } else {
            [b, a]
        }
    }
}

pub struct LiquidityPositionPDA;
impl LiquidityPositionPDA {
    pub fn derive(program_id: &Pubkey, pool: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[seeds::LIQUIDITY_POSITION, pool.as_ref(), owner.as_ref()],
            program_id,
        )
    }
}

pub struct ConverterPDA;
impl ConverterPDA {
    pub fn derive(program_id: &Pubkey, oracle: &Pubkey, ledger: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[seeds::CONVERTER, oracle.as_ref(), ledger.as_ref()],
            program_id,
        )
    }
}

pub struct RulePDA;
impl RulePDA {
    pub fn derive(program_id: &Pubkey, converter: &Pubkey, rule_id: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[seeds::RULE, converter.as_ref(), &rule_id.to_le_bytes()],
            program_id,
        )
    }
}

/// Signs token transfers out of a ledger or pool vault
pub struct VaultAuthorityPDA;
impl VaultAuthorityPDA {
    pub fn derive(program_id: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[seeds::VAULT_AUTHORITY, owner.as_ref()], program_id)
    }

    pub fn signer_seeds<'a>(owner: &'a Pubkey, bump: &'a [u8; 1]) -> [&'a [u8]; 3] {
        [seeds::VAULT_AUTHORITY, owner.as_ref(), bump]
    }
}
