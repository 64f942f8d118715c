//! chain-client: JSON-RPC client for batched contract reads
//!
//! This crate provides the long-lived [`ChainClient`] which submits groups of
//! read-only calls as a single `Multicall3.aggregate3` round trip, plus the
//! timeout and cancellation wrappers every chain read runs under.

pub mod abi;
pub mod multicall;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use ussd_core::{ChainConfig, ChainError};

use abi::IMulticall3;

pub use multicall::{
    read, read_or_default, read_outcomes, u256_to_biguint, CallSubmitter, ContractCall,
    DecodedValue, RawReturn, ReturnKind,
};

/// Result type for chain client operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Shared RPC client. Cheap to clone.
#[derive(Clone)]
pub struct ChainClient {
    provider: Arc<RootProvider>,
    multicall: Address,
    timeout: Duration,
}

impl ChainClient {
    /// Create a client for the configured endpoint. Does not touch the network.
    pub fn new(config: &ChainConfig) -> Result<Self> {
        let url: Url = config
            .rpc_endpoint
            .parse()
            .map_err(|e| ChainError::Transport {
                message: format!("invalid RPC endpoint {}: {}", config.rpc_endpoint, e),
            })?;
        let multicall: Address =
            config
                .multicall_address
                .parse()
                .map_err(|e| ChainError::Transport {
                    message: format!(
                        "invalid multicall address {}: {}",
                        config.multicall_address, e
                    ),
                })?;

        Ok(Self {
            provider: Arc::new(RootProvider::new_http(url)),
            multicall,
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Chain id reported by the endpoint
    pub async fn chain_id(&self) -> Result<u64> {
        timed_request(self.timeout, self.provider.get_chain_id()).await
    }
}

#[async_trait]
impl CallSubmitter for ChainClient {
    async fn submit(&self, calls: &[ContractCall]) -> Result<Vec<RawReturn>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let batch = calls
            .iter()
            .map(|call| IMulticall3::Call3 {
                target: call.target,
                allowFailure: true,
                callData: call.calldata.clone(),
            })
            .collect();
        let input = IMulticall3::aggregate3Call { calls: batch }.abi_encode();
        let tx = TransactionRequest::default()
            .to(self.multicall)
            .input(input.into());

        let output = timed_request(self.timeout, self.provider.call(tx)).await?;
        let results = IMulticall3::aggregate3Call::abi_decode_returns(&output).map_err(|e| {
            ChainError::Transport {
                message: format!("malformed multicall response: {}", e),
            }
        })?;

        tracing::trace!(calls = calls.len(), "multicall submitted");

        Ok(results
            .into_iter()
            .map(|result| RawReturn {
                success: result.success,
                data: result.returnData,
            })
            .collect())
    }
}

/// Run an RPC request under `timeout`
pub async fn timed_request<T, E: std::fmt::Display>(
    timeout: Duration,
    fut: impl IntoFuture<Output = std::result::Result<T, E>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut.into_future())
        .await
        .map_err(|_| ChainError::Timeout {
            secs: timeout.as_secs(),
        })?
        .map_err(|e| ChainError::Transport {
            message: e.to_string(),
        })
}

/// Abort `fut` with [`ChainError::Cancelled`] once `token` fires.
///
/// The future is dropped on cancellation, so any in-flight request is
/// abandoned.
pub async fn cancellable<T, E>(
    token: &CancellationToken,
    fut: impl Future<Output = std::result::Result<T, E>>,
) -> std::result::Result<T, E>
where
    E: From<ChainError>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ChainError::Cancelled.into()),
        out = fut => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_bad_endpoint() {
        let config = ChainConfig {
            rpc_endpoint: "not a url".to_string(),
            ..ChainConfig::default()
        };
        assert!(ChainClient::new(&config).is_err());
    }

    #[test]
    fn test_client_rejects_bad_multicall_address() {
        let config = ChainConfig {
            multicall_address: "0x1234".to_string(),
            ..ChainConfig::default()
        };
        assert!(ChainClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_empty_submit_is_local() {
        // nothing listens on this port; an empty batch must not try
        let client = ChainClient::new(&ChainConfig {
            rpc_endpoint: "http://127.0.0.1:9".to_string(),
            ..ChainConfig::default()
        })
        .unwrap();
        assert!(client.submit(&[]).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_request_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, String>(1u32)
        };
        let err = timed_request(Duration::from_secs(10), slow).await.unwrap_err();
        assert!(matches!(err, ChainError::Timeout { secs: 10 }));
    }

    #[tokio::test]
    async fn test_timed_request_maps_transport_error() {
        let failing = async { Err::<u32, _>("connection reset") };
        let err = timed_request(Duration::from_secs(1), failing)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_cancellable_stops_pending_work() {
        let token = CancellationToken::new();
        token.cancel();
        let pending = std::future::pending::<Result<u32>>();
        let err = cancellable(&token, pending).await.unwrap_err();
        assert!(matches!(err, ChainError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancellable_passes_through() {
        let token = CancellationToken::new();
        let value = cancellable(&token, async { Ok::<_, ChainError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
