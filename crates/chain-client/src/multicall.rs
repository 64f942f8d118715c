//! Batched read-only contract calls.
//!
//! Every chain read in the service goes through [`read`], [`read_outcomes`] or
//! [`read_or_default`], which hand a group of [`ContractCall`]s to a
//! [`CallSubmitter`] as one round trip and decode each result by its declared
//! [`ReturnKind`].

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{sol_data, SolCall, SolType};
use async_trait::async_trait;
use num_bigint::BigUint;
use ussd_core::{BatchError, CallFailure, ChainError, FailureReason};

use crate::Result;

/// Expected ABI shape of a call's return data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    String,
    Uint8,
    Uint256,
    Address,
    Bool,
}

impl ReturnKind {
    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Uint8 => "uint8",
            Self::Uint256 => "uint256",
            Self::Address => "address",
            Self::Bool => "bool",
        }
    }

    /// Decode raw return data as this kind
    pub fn decode(self, data: &[u8]) -> std::result::Result<DecodedValue, String> {
        let decoded = match self {
            Self::String => sol_data::String::abi_decode(data).map(DecodedValue::String),
            Self::Uint8 => <sol_data::Uint<8>>::abi_decode(data).map(DecodedValue::Uint8),
            Self::Uint256 => <sol_data::Uint<256>>::abi_decode(data)
                .map(|value| DecodedValue::Uint256(u256_to_biguint(value))),
            Self::Address => sol_data::Address::abi_decode(data).map(DecodedValue::Address),
            Self::Bool => sol_data::Bool::abi_decode(data).map(DecodedValue::Bool),
        };
        decoded.map_err(|e| format!("expected {}: {}", self.name(), e))
    }
}

/// A decoded call result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    String(String),
    Uint8(u8),
    Uint256(BigUint),
    Address(Address),
    Bool(bool),
}

impl DecodedValue {
    fn mismatch(&self, expected: ReturnKind) -> ChainError {
        ChainError::Decode {
            message: format!("expected {} value, got {:?}", expected.name(), self),
        }
    }

    pub fn into_string(self) -> Result<String> {
        match self {
            Self::String(value) => Ok(value),
            other => Err(other.mismatch(ReturnKind::String)),
        }
    }

    pub fn into_u8(self) -> Result<u8> {
        match self {
            Self::Uint8(value) => Ok(value),
            other => Err(other.mismatch(ReturnKind::Uint8)),
        }
    }

    pub fn into_uint(self) -> Result<BigUint> {
        match self {
            Self::Uint256(value) => Ok(value),
            other => Err(other.mismatch(ReturnKind::Uint256)),
        }
    }

    pub fn into_address(self) -> Result<Address> {
        match self {
            Self::Address(value) => Ok(value),
            other => Err(other.mismatch(ReturnKind::Address)),
        }
    }

    pub fn into_bool(self) -> Result<bool> {
        match self {
            Self::Bool(value) => Ok(value),
            other => Err(other.mismatch(ReturnKind::Bool)),
        }
    }
}

/// Convert an on-chain word to an unbounded integer
pub fn u256_to_biguint(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// A single read-only contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub target: Address,
    /// Solidity signature, kept for error reports
    pub signature: &'static str,
    pub calldata: Bytes,
    pub returns: ReturnKind,
}

impl ContractCall {
    /// Build a call from a typed `sol!` call struct
    pub fn new<C: SolCall>(target: Address, call: C, returns: ReturnKind) -> Self {
        Self {
            target,
            signature: C::SIGNATURE,
            calldata: call.abi_encode().into(),
            returns,
        }
    }
}

/// Undecoded outcome of one call in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReturn {
    pub success: bool,
    pub data: Bytes,
}

/// Submits a batch of calls as one network round trip.
///
/// Implementations return exactly one [`RawReturn`] per call, in order. An
/// empty batch must not touch the network.
#[async_trait]
pub trait CallSubmitter: Send + Sync {
    async fn submit(&self, calls: &[ContractCall]) -> Result<Vec<RawReturn>>;
}

/// Submit `calls` and decode every result, keeping per-call failures
pub async fn read_outcomes<C>(
    chain: &C,
    calls: &[ContractCall],
) -> Result<Vec<std::result::Result<DecodedValue, CallFailure>>>
where
    C: CallSubmitter + ?Sized,
{
    if calls.is_empty() {
        return Ok(Vec::new());
    }

    let raw = chain.submit(calls).await?;
    if raw.len() != calls.len() {
        return Err(ChainError::Transport {
            message: format!("submitted {} calls, got {} results", calls.len(), raw.len()),
        });
    }

    let outcomes = calls
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(index, (call, ret))| {
            let reason = if !ret.success {
                FailureReason::Reverted
            } else {
                match call.returns.decode(&ret.data) {
                    Ok(value) => return Ok(value),
                    Err(msg) => FailureReason::Decode(msg),
                }
            };
            Err(CallFailure {
                index,
                target: call.target,
                signature: call.signature,
                reason,
            })
        })
        .collect();

    Ok(outcomes)
}

/// Submit `calls` and decode every result.
///
/// Fails with [`ChainError::CallsFailed`] listing every call that reverted or
/// returned undecodable data.
pub async fn read<C>(chain: &C, calls: &[ContractCall]) -> Result<Vec<DecodedValue>>
where
    C: CallSubmitter + ?Sized,
{
    let outcomes = read_outcomes(chain, calls).await?;

    let mut values = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(failure) => failures.push(failure),
        }
    }

    if failures.is_empty() {
        Ok(values)
    } else {
        Err(ChainError::CallsFailed(BatchError {
            total: calls.len(),
            failures,
        }))
    }
}

/// Read a single optional field, substituting `default` when the call fails.
///
/// Only per-call failures are absorbed. Transport, timeout and cancellation
/// errors still propagate.
pub async fn read_or_default<C>(
    chain: &C,
    call: ContractCall,
    default: DecodedValue,
) -> Result<DecodedValue>
where
    C: CallSubmitter + ?Sized,
{
    match read(chain, std::slice::from_ref(&call)).await {
        Ok(mut values) => Ok(values.pop().unwrap_or(default)),
        Err(ChainError::CallsFailed(err)) => {
            tracing::debug!(contract = %call.target, signature = call.signature, "using default: {}", err);
            Ok(default)
        }
        Err(e) => Err(e),
    }
}
