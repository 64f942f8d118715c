//! Core type definitions for the USSD data service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use alloy_primitives::Address;

/// The zero address. Stands in for absent optional address fields and marks
/// padding slots in registry pages.
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// A token the owner holds, as listed by the relational store and completed
/// with a live on-chain balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolding {
    #[serde(rename = "contractAddress", with = "checksummed")]
    pub token_address: Address,
    pub token_symbol: String,
    pub token_decimals: u8,
    /// Raw balance as a decimal string. Empty until merged with chain state.
    #[serde(default)]
    pub balance: String,
}

impl TokenHolding {
    /// A holding record as it comes from the store, balance not yet resolved
    pub fn new(token_address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            token_address,
            token_symbol: symbol.into(),
            token_decimals: decimals,
            balance: String::new(),
        }
    }
}

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetails {
    #[serde(with = "checksummed")]
    pub token_address: Address,
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimals: u8,
    /// Zero address when the token contract has no sink
    #[serde(with = "checksummed")]
    pub sink_address: Address,
}

/// Swap pool metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDetails {
    pub pool_name: String,
    pub pool_symbol: String,
    #[serde(with = "checksummed")]
    pub pool_contract_address: Address,
    /// Contract enforcing per-(token, pool) input caps
    #[serde(with = "checksummed")]
    pub limiter_address: Address,
    /// Index contract listing the tokens the pool accepts
    #[serde(with = "checksummed")]
    pub voucher_registry: Address,
}

/// Configured exchange rates and caps for one ordered (pool, in, out) pair.
///
/// Rates are only meaningful as a ratio `out_rate / in_rate`. Token limits are
/// kept as the decimal strings the store returns and parsed right before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRate {
    pub in_rate: u64,
    pub out_rate: u64,
    pub in_decimals: u8,
    pub out_decimals: u8,
    pub in_token_limit: String,
    pub out_token_limit: String,
}

/// One token transfer from the address' recent history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    #[serde(with = "checksummed")]
    pub sender: Address,
    #[serde(with = "checksummed")]
    pub recipient: Address,
    pub transfer_value: String,
    #[serde(with = "checksummed")]
    pub contract_address: Address,
    pub tx_hash: String,
    pub date_block: DateTime<Utc>,
    pub token_symbol: String,
    pub token_decimals: u8,
}

/// Serialize addresses in EIP-55 checksummed form, the format USSD clients
/// compare against.
pub mod checksummed {
    use alloy_primitives::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&address.to_checksum(None))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        Address::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const CUSD: &str = "0x765DE816845861e75A25fCA122bb6898B8B1282a";

    #[test]
    fn test_holding_serializes_checksummed() {
        let address = Address::from_str(&CUSD.to_lowercase()).unwrap();
        let holding = TokenHolding::new(address, "cUSD", 18);
        let json = serde_json::to_value(&holding).unwrap();

        assert_eq!(json["contractAddress"], CUSD);
        assert_eq!(json["tokenSymbol"], "cUSD");
        assert_eq!(json["tokenDecimals"], 18);
        assert_eq!(json["balance"], "");
    }

    #[test]
    fn test_token_details_round_trip_keeps_zero_sink() {
        let details = TokenDetails {
            token_address: Address::from_str(CUSD).unwrap(),
            token_name: "Celo Dollar".into(),
            token_symbol: "cUSD".into(),
            token_decimals: 18,
            sink_address: ZERO_ADDRESS,
        };
        let json = serde_json::to_string(&details).unwrap();
        let parsed: TokenDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sink_address, Address::ZERO);
        assert_eq!(parsed, details);
    }
}
