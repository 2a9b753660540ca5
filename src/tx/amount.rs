//! Decimal-string amounts and fixed-point units
//!
//! Amounts cross every public boundary as decimal strings; on-chain
//! arithmetic uses integers scaled by the token's decimal count. Parsing
//! is strict: malformed input is rejected, never truncated to zero.
//! Excess fractional digits truncate toward zero when scaling.

use crate::error::{TransferError, TransferResult};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest decimal count the converter supports exactly
const MAX_DECIMALS: u32 = 27;

/// Parse a decimal amount and scale it to fixed-point units
pub fn to_fixed(amount: &str, decimals: u32) -> TransferResult<u128> {
    if decimals > MAX_DECIMALS {
        return Err(TransferError::Validation(format!(
            "unsupported decimal count {}",
            decimals
        )));
    }

    let parsed = Decimal::from_str(amount.trim())
        .map_err(|_| TransferError::Validation(format!("malformed amount '{}'", amount)))?;

    if parsed <= Decimal::ZERO {
        return Err(TransferError::Validation(format!(
            "amount must be positive, got '{}'",
            amount
        )));
    }

    let factor = Decimal::from(10u128.pow(decimals));
    let scaled = parsed
        .checked_mul(factor)
        .ok_or_else(|| TransferError::Validation(format!("amount '{}' out of range", amount)))?
        .trunc();

    scaled
        .to_u128()
        .ok_or_else(|| TransferError::Validation(format!("amount '{}' out of range", amount)))
}

/// Convert fixed-point units back to the decimal representation
///
/// Exact for every value produced by `to_fixed` at the same decimal count.
pub fn to_decimal(units: u128, decimals: u32) -> TransferResult<String> {
    if decimals > MAX_DECIMALS {
        return Err(TransferError::Validation(format!(
            "unsupported decimal count {}",
            decimals
        )));
    }

    let signed = i128::try_from(units)
        .map_err(|_| TransferError::Validation(format!("units {} out of range", units)))?;

    let value = Decimal::from_i128_with_scale(signed, decimals);
    Ok(value.normalize().to_string())
}

/// Parse a non-fungible token identifier
pub fn parse_token_id(id: &str) -> TransferResult<u128> {
    let parsed: u128 = id
        .trim()
        .parse()
        .map_err(|_| TransferError::Validation(format!("malformed token id '{}'", id)))?;

    if parsed == 0 {
        return Err(TransferError::Validation("token id must be positive".to_string()));
    }

    Ok(parsed)
}
