//! Data Transfer Objects for API responses

use serde::{Deserialize, Serialize};
use ussd_core::{PoolDetails, TokenDetails, TokenHolding, Transfer};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Success envelope wrapping every data response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub description: String,
    pub result: T,
}

impl<T> ApiResponse<T> {
    pub fn new(description: impl Into<String>, result: T) -> Self {
        Self {
            ok: true,
            description: description.into(),
            result,
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub ok: bool,
    pub description: String,
    pub error_code: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            ok: false,
            description: description.into(),
            error_code: code.into(),
        }
    }

    pub fn internal(description: impl Into<String>) -> Self {
        Self::new("internal_error", description)
    }

    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new("not_found", description)
    }

    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new("bad_request", description)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransfersResult {
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingsResult {
    pub holdings: Vec<TokenHolding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetailsResult {
    pub token_details: TokenDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDetailsResult {
    pub pool_details: PoolDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPoolsResult {
    pub top_pools: Vec<PoolDetails>,
}

/// Token list narrowed to what a swap leg can use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredResult {
    pub filtered: Vec<TokenHolding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapFromCheckResult {
    pub can_swap_from: bool,
}

/// Raw token amount, decimal string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxResult {
    pub max: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResult {
    /// Input needed for the requested output, raw units
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditResult {
    /// Signed, e.g. `+10` or `-10`
    pub credit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryTokensResult {
    pub tokens: Vec<TokenDetails>,
}

/// Query string of the swap-to list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwapToQuery {
    pub stables: Option<String>,
}

impl SwapToQuery {
    /// Only the literal `true` selects the stables list
    pub fn stables_only(&self) -> bool {
        self.stables.as_deref() == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let json = serde_json::to_value(ApiError::not_found("Pool not found")).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["description"], "Pool not found");
        assert_eq!(json["errorCode"], "not_found");
    }

    #[test]
    fn test_result_keys_are_camel_case() {
        let json = serde_json::to_value(ApiResponse::new(
            "Swap from check",
            SwapFromCheckResult {
                can_swap_from: true,
            },
        ))
        .unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["result"]["canSwapFrom"], true);
    }

    #[test]
    fn test_stables_flag_is_literal() {
        let query = |v: Option<&str>| SwapToQuery {
            stables: v.map(str::to_string),
        };
        assert!(query(Some("true")).stables_only());
        assert!(!query(Some("TRUE")).stables_only());
        assert!(!query(Some("1")).stables_only());
        assert!(!query(None).stables_only());
    }
}
