//! In-memory [`CallSubmitter`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::{sol_data, SolCall, SolType, SolValue};
use async_trait::async_trait;
use ussd_core::ChainError;

use crate::multicall::{CallSubmitter, ContractCall, RawReturn};
use crate::Result;

/// Canned chain state keyed by `(target, calldata)`.
///
/// Calls without a canned response revert.
#[derive(Debug, Default)]
pub struct MockChain {
    responses: Mutex<HashMap<(Address, Bytes), Bytes>>,
    submissions: AtomicUsize,
    offline: AtomicBool,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `call` on `target` return `value`, ABI-encoded
    pub fn respond<C: SolCall, V: SolValue>(&self, target: Address, call: C, value: V) {
        self.respond_raw(target, call, value.abi_encode().into());
    }

    /// Make `call` on `target` return a `uint8`
    pub fn respond_u8<C: SolCall>(&self, target: Address, call: C, value: u8) {
        let data = <sol_data::Uint<8> as SolType>::abi_encode(&value);
        self.respond_raw(target, call, data.into());
    }

    /// Make `call` on `target` return arbitrary bytes
    pub fn respond_raw<C: SolCall>(&self, target: Address, call: C, data: Bytes) {
        let key = (target, Bytes::from(call.abi_encode()));
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .insert(key, data);
    }

    /// Fail every subsequent submission with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of batches submitted so far
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallSubmitter for MockChain {
    async fn submit(&self, calls: &[ContractCall]) -> Result<Vec<RawReturn>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        self.submissions.fetch_add(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            return Err(ChainError::Transport {
                message: "connection refused".to_string(),
            });
        }

        let responses = self.responses.lock().expect("mock lock poisoned");
        Ok(calls
            .iter()
            .map(|call| match responses.get(&(call.target, call.calldata.clone())) {
                Some(data) => RawReturn {
                    success: true,
                    data: data.clone(),
                },
                None => RawReturn {
                    success: false,
                    data: Bytes::new(),
                },
            })
            .collect())
    }
}
