//! Swap Pool Protocol
//!
//! Read-only views of the token-swap protocol behind the USSD service: token
//! and pool metadata, registry enumeration, balance merging, and the
//! swap-limit arithmetic.

pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod registry;
pub mod state;

// Re-exports
pub use calculator::{
    absolute_credit, equivalent_input, format_signed, max_limit, max_swap_input,
    max_swap_input_for, parse_amount, reverse_quote, SwapRateExt,
};
pub use fetch::{
    merge_token_balances, pool_details, swap_balances, token_balance, token_details,
};
pub use registry::{
    all_token_details, exists, exists_all, filter_registered, members, EntryPager, RegistryPager,
};
pub use state::{RegistryPage, SwapBalances};
