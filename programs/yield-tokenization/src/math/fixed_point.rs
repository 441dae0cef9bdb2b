use crate::{
    constants::BPS_DENOMINATOR,
    error::YieldError,
};

/// floor(a * b / denominator) with a u128 intermediate
pub fn mul_div(a: u64, b: u64, denominator: u64) -> Result<u64, YieldError> {
    if denominator == 0 {
        return Err(YieldError::DivisionByZero);
    }
    let product = (a as u128)
        .checked_mul(b as u128)
        .ok_or(YieldError::ArithmeticOverflow)?;
    u64::try_from(product / denominator as u128).map_err(|_| YieldError::ArithmeticOverflow)
}

/// Scale `amount` by a basis point fraction, rounding down
pub fn apply_bps(amount: u64, bps: u16) -> Result<u64, YieldError> {
    mul_div(amount, bps as u64, BPS_DENOMINATOR)
}

/// Absolute deviation of `observed` from `reference` in basis points.
/// Saturates at u64::MAX; a zero reference has no meaningful deviation.
pub fn deviation_bps(reference: u64, observed: u64) -> u64 {
    if reference == 0 {
        return 0;
    }
    let diff = reference.abs_diff(observed) as u128;
    let bps = diff * BPS_DENOMINATOR as u128 / reference as u128;
    bps.min(u64::MAX as u128) as u64
}

/// Integer square root (Newton's method), rounding down
pub fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }

    let mut x = n / 2;
    let mut y = (x + n / x) / 2;

    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }

    x
}

pub fn checked_add(a: u64, b: u64) -> Result<u64, YieldError> {
    a.checked_add(b).ok_or(YieldError::ArithmeticOverflow)
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64, YieldError> {
    a.checked_sub(b).ok_or(YieldError::ArithmeticOverflow)
}
