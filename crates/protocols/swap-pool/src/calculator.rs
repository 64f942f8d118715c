//! Swap-Limit Calculator
//!
//! Rate conversion and swap-capacity bounds over unbounded integers.
//! Everything here is pure; malformed inputs are rejected by [`parse_amount`]
//! before any arithmetic runs.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use ussd_core::{CalcError, SwapRate};

use crate::constants::fields;
use crate::state::SwapBalances;

fn pow10(exp: u8) -> BigUint {
    BigUint::from(10u32).pow(u32::from(exp))
}

/// Convert an amount of the output token into the equivalent amount of the
/// input token.
///
/// Formula: floor(amount_out * out_rate * 10^in_decimals / (in_rate * 10^out_decimals))
///
/// A zero `in_rate` means there is no conversion path and yields zero.
pub fn equivalent_input(
    amount_out: &BigUint,
    in_rate: u64,
    out_rate: u64,
    in_decimals: u8,
    out_decimals: u8,
) -> BigUint {
    if in_rate == 0 || amount_out.is_zero() {
        return BigUint::zero();
    }

    let numerator = amount_out * BigUint::from(out_rate) * pow10(in_decimals);
    let denominator = BigUint::from(in_rate) * pow10(out_decimals);

    numerator / denominator
}

/// Input amount needed to receive `desired_output` of the output token
pub fn reverse_quote(
    desired_output: &BigUint,
    in_rate: u64,
    out_rate: u64,
    in_decimals: u8,
    out_decimals: u8,
) -> BigUint {
    equivalent_input(desired_output, in_rate, out_rate, in_decimals, out_decimals)
}

/// Largest input the initiator can swap through the pool.
///
/// The tightest of three bounds: the user's input balance, the headroom left
/// under the pool's input cap, and the input the pool's output liquidity can
/// absorb at the configured rate.
pub fn max_swap_input(
    user_in: &BigUint,
    in_token_limit: &BigUint,
    pool_in: &BigUint,
    pool_out: &BigUint,
    rate: &SwapRate,
) -> BigUint {
    if pool_out.is_zero() {
        return BigUint::zero();
    }

    let headroom = if in_token_limit > pool_in {
        in_token_limit - pool_in
    } else {
        BigUint::zero()
    };
    let liquidity_bound = equivalent_input(
        pool_out,
        rate.in_rate,
        rate.out_rate,
        rate.in_decimals,
        rate.out_decimals,
    );

    user_in.min(&headroom).min(&liquidity_bound).clone()
}

/// Parse the rate's limits and compute [`max_swap_input`] against live balances
pub fn max_swap_input_for(rate: &SwapRate, balances: &SwapBalances) -> Result<BigUint, CalcError> {
    let in_token_limit = rate.in_token_limit_amount()?;
    // unused by the bound but still has to be well formed
    rate.out_token_limit_amount()?;

    Ok(max_swap_input(
        &balances.user_in,
        &in_token_limit,
        &balances.pool_in,
        &balances.pool_out,
        rate,
    ))
}

/// Chain-only limit: the smallest of the limiter's cap for the input token,
/// the initiator's input balance and the pool's output balance.
pub fn max_limit(
    in_token_limit: &BigUint,
    initiator_in_balance: &BigUint,
    pool_out_balance: &BigUint,
) -> BigUint {
    in_token_limit
        .min(initiator_in_balance)
        .min(pool_out_balance)
        .clone()
}

/// Remaining capacity of a user against a pool-wide cap for one token.
///
/// Negative when the user already holds more than the cap.
pub fn absolute_credit(user_balance: &BigUint, pool_limit: &BigUint) -> BigInt {
    let balance = BigInt::from(user_balance.clone());
    let remaining = BigInt::from(pool_limit.clone()) - &balance;
    balance.min(remaining)
}

/// Render a signed amount with an explicit sign, e.g. `+10`, `-10`, `0`
pub fn format_signed(value: &BigInt) -> String {
    match value.sign() {
        Sign::Plus => format!("+{}", value),
        Sign::Minus | Sign::NoSign => value.to_string(),
    }
}

/// Parse a non-negative decimal integer string
pub fn parse_amount(field: &'static str, text: &str) -> Result<BigUint, CalcError> {
    let trimmed = text.trim();
    let malformed = || CalcError::MalformedAmount {
        field,
        value: text.to_string(),
    };

    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    trimmed.parse::<BigUint>().map_err(|_| malformed())
}

/// Limit accessors for store-provided rates
pub trait SwapRateExt {
    fn in_token_limit_amount(&self) -> Result<BigUint, CalcError>;
    fn out_token_limit_amount(&self) -> Result<BigUint, CalcError>;
}

impl SwapRateExt for SwapRate {
    fn in_token_limit_amount(&self) -> Result<BigUint, CalcError> {
        parse_amount(fields::IN_TOKEN_LIMIT, &self.in_token_limit)
    }

    fn out_token_limit_amount(&self) -> Result<BigUint, CalcError> {
        parse_amount(fields::OUT_TOKEN_LIMIT, &self.out_token_limit)
    }
}
