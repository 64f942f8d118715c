//! Swap Pool State Types
//!
//! Live balances and registry pages read from chain.

use num_bigint::BigUint;
use ussd_core::Address;

/// Live balances that bound a swap through a pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapBalances {
    /// Initiator's balance of the input token
    pub user_in: BigUint,
    /// Pool's holding of the input token
    pub pool_in: BigUint,
    /// Pool's holding of the output token (liquidity available to pay out)
    pub pool_out: BigUint,
}

/// One page of registry members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPage {
    /// Members in index order. May contain zero-address padding.
    pub members: Vec<Address>,
    /// Cursor of the following page, `None` once the index is exhausted
    pub next: Option<u64>,
}
