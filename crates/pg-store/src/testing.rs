//! In-memory [`MetadataStore`] for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use ussd_core::{
    Address, PoolDetails, StoreError, SwapRate, TokenDetails, TokenHolding, Transfer,
};

use crate::{MetadataStore, Result};

/// Fixed rows keyed the way the queries are parameterised.
///
/// Build it up through the public fields before handing it out.
#[derive(Debug, Default, Clone)]
pub struct MockStore {
    pub transfers: HashMap<Address, Vec<Transfer>>,
    pub holdings: HashMap<Address, Vec<TokenHolding>>,
    pub tokens: HashMap<Address, TokenDetails>,
    pub pools: Vec<PoolDetails>,
    /// (pool, token) pairs the pool accepts
    pub allowed: Vec<(Address, Address)>,
    /// Pool -> tokens flagged as stables
    pub stables: HashMap<Address, Vec<TokenHolding>>,
    pub rates: HashMap<(Address, Address, Address), SwapRate>,
    pub limits: HashMap<(Address, Address), String>,
    /// Fail every query as if the database were down
    pub offline: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self) -> Result<()> {
        if self.offline {
            return Err(StoreError::Database {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn accepted(&self, pool: Address) -> Vec<Address> {
        self.allowed
            .iter()
            .filter(|(p, _)| *p == pool)
            .map(|(_, token)| *token)
            .collect()
    }

    fn holding_for(&self, token: Address) -> TokenHolding {
        match self.tokens.get(&token) {
            Some(details) => {
                TokenHolding::new(token, details.token_symbol.clone(), details.token_decimals)
            }
            None => TokenHolding::new(token, "", 0),
        }
    }
}

#[async_trait]
impl MetadataStore for MockStore {
    async fn last_10_tx(&self, address: Address) -> Result<Vec<Transfer>> {
        self.check()?;
        Ok(self.transfers.get(&address).cloned().unwrap_or_default())
    }

    async fn token_holdings(&self, address: Address) -> Result<Vec<TokenHolding>> {
        self.check()?;
        Ok(self.holdings.get(&address).cloned().unwrap_or_default())
    }

    async fn token_details(&self, token: Address) -> Result<Option<TokenDetails>> {
        self.check()?;
        Ok(self.tokens.get(&token).cloned())
    }

    async fn pool_details(&self, pool: Address) -> Result<Option<PoolDetails>> {
        self.check()?;
        Ok(self
            .pools
            .iter()
            .find(|p| p.pool_contract_address == pool)
            .cloned())
    }

    async fn pool_reverse_details(&self, symbol: &str) -> Result<Option<PoolDetails>> {
        self.check()?;
        Ok(self.pools.iter().find(|p| p.pool_symbol == symbol).cloned())
    }

    async fn top_pools(&self) -> Result<Vec<PoolDetails>> {
        self.check()?;
        Ok(self.pools.iter().take(5).cloned().collect())
    }

    async fn pool_token_allowed(&self, pool: Address, token: Address) -> Result<bool> {
        self.check()?;
        Ok(self.allowed.contains(&(pool, token)))
    }

    async fn pool_allowed_tokens_for_user(
        &self,
        user: Address,
        pool: Address,
    ) -> Result<Vec<TokenHolding>> {
        self.check()?;
        let accepted = self.accepted(pool);
        Ok(self
            .holdings
            .get(&user)
            .map(|held| {
                held.iter()
                    .filter(|h| accepted.contains(&h.token_address))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn pool_allowed_tokens(&self, pool: Address) -> Result<Vec<TokenHolding>> {
        self.check()?;
        Ok(self
            .accepted(pool)
            .into_iter()
            .map(|token| self.holding_for(token))
            .collect())
    }

    async fn pool_allowed_stables(&self, pool: Address) -> Result<Vec<TokenHolding>> {
        self.check()?;
        Ok(self.stables.get(&pool).cloned().unwrap_or_default())
    }

    async fn pool_token_swap_rates(
        &self,
        pool: Address,
        in_token: Address,
        out_token: Address,
    ) -> Result<Option<SwapRate>> {
        self.check()?;
        Ok(self.rates.get(&(pool, in_token, out_token)).cloned())
    }

    async fn pool_token_limit(&self, pool: Address, token: Address) -> Result<Option<String>> {
        self.check()?;
        Ok(self.limits.get(&(pool, token)).cloned())
    }
}
