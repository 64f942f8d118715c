//! Error types for the USSD data service

use std::fmt;

use alloy_primitives::Address;
use thiserror::Error;

/// Core errors that can occur in the service
#[derive(Debug, Error)]
pub enum Error {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Calculation error: {0}")]
    Calc(#[from] CalcError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// RPC transport and contract call errors
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC endpoint unreachable: {message}")]
    Transport { message: String },

    #[error("RPC request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("RPC request cancelled")]
    Cancelled,

    #[error("{0}")]
    CallsFailed(BatchError),

    #[error("Failed to decode RPC response: {message}")]
    Decode { message: String },
}

impl ChainError {
    /// Whether the failure is on the transport side (unreachable, timed out,
    /// cancelled) rather than specific to the calls that were made.
    ///
    /// `Decode` is deterministic for a given call and is not transport.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Cancelled
        )
    }
}

/// Why a single call inside a batch failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The call reverted (e.g. the contract lacks the method)
    Reverted,
    /// The call succeeded but returned data of the wrong shape
    Decode(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reverted => write!(f, "reverted"),
            Self::Decode(msg) => write!(f, "undecodable return data ({})", msg),
        }
    }
}

/// A single failed call inside a multicall batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    /// Position of the call in the submitted batch
    pub index: usize,
    pub target: Address,
    pub signature: &'static str,
    pub reason: FailureReason,
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} on {} {}",
            self.index, self.signature, self.target, self.reason
        )
    }
}

/// Aggregated per-call failures of one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    pub total: usize,
    pub failures: Vec<CallFailure>,
}

impl BatchError {
    /// Indices of the failed calls, in submission order
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} calls failed", self.failures.len(), self.total)?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

/// Relational store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Named query not found: {name}")]
    MissingQuery { name: String },

    #[error("Failed to load queries: {message}")]
    QueryFile { message: String },

    #[error("Malformed row: {message}")]
    InvalidRow { message: String },
}

/// Swap-limit calculation errors
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Malformed {field}: {value:?} is not a non-negative integer")]
    MalformedAmount { field: &'static str, value: String },
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Chain(ChainError::Timeout { .. }) => "rpc_timeout",
            Self::Chain(ChainError::Cancelled) => "cancelled",
            Self::Chain(ChainError::CallsFailed(_)) => "call_reverted",
            Self::Chain(_) => "rpc_unavailable",
            Self::Store(StoreError::InvalidRow { .. }) => "invalid_row",
            Self::Store(_) => "store_unavailable",
            Self::Calc(CalcError::MalformedAmount { .. }) => "malformed_amount",
            Self::Config(_) => "config_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Chain(ChainError::Timeout { .. }) => 504,
            Self::Chain(ChainError::Cancelled) => 503,
            Self::Chain(ChainError::CallsFailed(_)) => 502,
            Self::Chain(_) | Self::Store(_) => 503,
            Self::Calc(_) | Self::Config(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(index: usize, reason: FailureReason) -> CallFailure {
        CallFailure {
            index,
            target: Address::repeat_byte(0x11),
            signature: "sinkAddress()",
            reason,
        }
    }

    #[test]
    fn test_batch_error_lists_failed_calls() {
        let err = BatchError {
            total: 3,
            failures: vec![
                failure(0, FailureReason::Reverted),
                failure(2, FailureReason::Decode("short".into())),
            ],
        };
        assert_eq!(err.failed_indices(), vec![0, 2]);

        let msg = err.to_string();
        assert!(msg.starts_with("2 of 3 calls failed"));
        assert!(msg.contains("[0] sinkAddress()"));
        assert!(msg.contains("reverted"));
        assert!(msg.contains("undecodable return data (short)"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(ChainError::Timeout { secs: 10 }.is_transport());
        assert!(ChainError::Cancelled.is_transport());
        assert!(ChainError::Transport {
            message: "connection refused".into()
        }
        .is_transport());

        let reverted = ChainError::CallsFailed(BatchError {
            total: 1,
            failures: vec![failure(0, FailureReason::Reverted)],
        });
        assert!(!reverted.is_transport());

        let wrong_shape = ChainError::Decode {
            message: "expected uint8 value, got Bool(true)".into(),
        };
        assert!(!wrong_shape.is_transport());
    }

    #[test]
    fn test_error_codes() {
        let err: Error = CalcError::MalformedAmount {
            field: "inTokenLimit",
            value: "12x".into(),
        }
        .into();
        assert_eq!(err.error_code(), "malformed_amount");
        assert_eq!(err.status_code(), 500);

        let err: Error = ChainError::Timeout { secs: 10 }.into();
        assert_eq!(err.error_code(), "rpc_timeout");
        assert_eq!(err.status_code(), 504);

        let err: Error = StoreError::Database {
            message: "pool closed".into(),
        }
        .into();
        assert_eq!(err.error_code(), "store_unavailable");
        assert_eq!(err.status_code(), 503);
    }
}
