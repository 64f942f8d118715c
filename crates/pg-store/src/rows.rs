//! Row mappings from query results to service types.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use ussd_core::{Address, PoolDetails, StoreError, SwapRate, TokenDetails, TokenHolding, Transfer};

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name).map_err(|e| StoreError::InvalidRow {
        message: format!("{}: {}", name, e),
    })
}

fn address(row: &PgRow, name: &str) -> Result<Address, StoreError> {
    let raw: String = column(row, name)?;
    parse_address(name, &raw)
}

/// Nullable address column, zero when absent or empty
fn optional_address(row: &PgRow, name: &str) -> Result<Address, StoreError> {
    let raw: Option<String> = column(row, name)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Address::ZERO),
        Some(raw) => parse_address(name, raw),
    }
}

fn parse_address(name: &str, raw: &str) -> Result<Address, StoreError> {
    raw.trim().parse().map_err(|e| StoreError::InvalidRow {
        message: format!("{}: {:?} is not an address ({})", name, raw, e),
    })
}

fn decimals(row: &PgRow, name: &str) -> Result<u8, StoreError> {
    let raw: i32 = column(row, name)?;
    u8::try_from(raw).map_err(|_| StoreError::InvalidRow {
        message: format!("{}: {} out of range", name, raw),
    })
}

fn rate(row: &PgRow, name: &str) -> Result<u64, StoreError> {
    let raw: i64 = column(row, name)?;
    u64::try_from(raw).map_err(|_| StoreError::InvalidRow {
        message: format!("{}: {} is negative", name, raw),
    })
}

pub fn transfer(row: &PgRow) -> Result<Transfer, StoreError> {
    let date_block: DateTime<Utc> = column(row, "date_block")?;
    Ok(Transfer {
        sender: address(row, "sender")?,
        recipient: address(row, "recipient")?,
        transfer_value: column(row, "transfer_value")?,
        contract_address: address(row, "contract_address")?,
        tx_hash: column(row, "tx_hash")?,
        date_block,
        token_symbol: column(row, "token_symbol")?,
        token_decimals: decimals(row, "token_decimals")?,
    })
}

pub fn token_holding(row: &PgRow) -> Result<TokenHolding, StoreError> {
    Ok(TokenHolding::new(
        address(row, "contract_address")?,
        column::<String>(row, "token_symbol")?,
        decimals(row, "token_decimals")?,
    ))
}

pub fn token_details(row: &PgRow) -> Result<TokenDetails, StoreError> {
    Ok(TokenDetails {
        token_address: address(row, "contract_address")?,
        token_name: column(row, "token_name")?,
        token_symbol: column(row, "token_symbol")?,
        token_decimals: decimals(row, "token_decimals")?,
        sink_address: optional_address(row, "sink_address")?,
    })
}

pub fn pool_details(row: &PgRow) -> Result<PoolDetails, StoreError> {
    Ok(PoolDetails {
        pool_name: column(row, "pool_name")?,
        pool_symbol: column(row, "pool_symbol")?,
        pool_contract_address: address(row, "contract_address")?,
        limiter_address: optional_address(row, "limiter_address")?,
        voucher_registry: optional_address(row, "voucher_registry")?,
    })
}

pub fn swap_rate(row: &PgRow) -> Result<SwapRate, StoreError> {
    Ok(SwapRate {
        in_rate: rate(row, "in_rate")?,
        out_rate: rate(row, "out_rate")?,
        in_decimals: decimals(row, "in_decimals")?,
        out_decimals: decimals(row, "out_decimals")?,
        in_token_limit: column(row, "in_token_limit")?,
        out_token_limit: column(row, "out_token_limit")?,
    })
}

pub fn token_limit(row: &PgRow) -> Result<String, StoreError> {
    column(row, "token_limit")
}
