//! Swap Pool Constants

/// Registry enumeration defaults
pub mod registry {
    /// Index entries requested per multicall page
    pub const DEFAULT_PAGE_SIZE: usize = 100;
}

/// Store field names reported in parse failures
pub mod fields {
    pub const IN_TOKEN_LIMIT: &str = "inTokenLimit";
    pub const OUT_TOKEN_LIMIT: &str = "outTokenLimit";
    pub const POOL_LIMIT: &str = "tokenLimit";
    pub const AMOUNT: &str = "amount";
}
