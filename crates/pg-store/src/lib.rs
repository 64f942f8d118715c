//! pg-store: Read-only relational metadata store
//!
//! Token, pool and swap-configuration rows the indexer keeps in Postgres,
//! behind the [`MetadataStore`] trait. Query text is loaded from a named-query
//! file at startup (see [`queries`]).

pub mod queries;
mod rows;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::PgPool;
use ussd_core::{
    Address, PoolDetails, PostgresConfig, StoreError, SwapRate, TokenDetails, TokenHolding,
    Transfer,
};

pub use queries::{QueryName, Queries};

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Read access to indexed token and pool metadata.
///
/// Single-row lookups return `None` when no row matches.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Most recent transfers to or from `address`
    async fn last_10_tx(&self, address: Address) -> Result<Vec<Transfer>>;

    /// Tokens `address` has interacted with. Balances are left empty.
    async fn token_holdings(&self, address: Address) -> Result<Vec<TokenHolding>>;

    async fn token_details(&self, token: Address) -> Result<Option<TokenDetails>>;

    async fn pool_details(&self, pool: Address) -> Result<Option<PoolDetails>>;

    /// Pool lookup by its symbol
    async fn pool_reverse_details(&self, symbol: &str) -> Result<Option<PoolDetails>>;

    /// Pools ranked by swap activity
    async fn top_pools(&self) -> Result<Vec<PoolDetails>>;

    /// Whether `pool` accepts `token` as swap input
    async fn pool_token_allowed(&self, pool: Address, token: Address) -> Result<bool>;

    /// Tokens `user` holds that `pool` accepts
    async fn pool_allowed_tokens_for_user(
        &self,
        user: Address,
        pool: Address,
    ) -> Result<Vec<TokenHolding>>;

    async fn pool_allowed_tokens(&self, pool: Address) -> Result<Vec<TokenHolding>>;

    async fn pool_allowed_stables(&self, pool: Address) -> Result<Vec<TokenHolding>>;

    /// Rates and caps for swapping `in_token` into `out_token` through `pool`
    async fn pool_token_swap_rates(
        &self,
        pool: Address,
        in_token: Address,
        out_token: Address,
    ) -> Result<Option<SwapRate>>;

    /// The pool-wide cap for `token`, as a decimal string
    async fn pool_token_limit(&self, pool: Address, token: Address) -> Result<Option<String>>;
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database {
        message: e.to_string(),
    }
}

/// Addresses are bound in checksummed form, the same form clients send
fn bind_address(address: Address) -> String {
    address.to_checksum(None)
}

/// Postgres-backed [`MetadataStore`]
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
    queries: Arc<Queries>,
}

impl PgStore {
    pub fn new(pool: PgPool, queries: Queries) -> Self {
        Self {
            pool: Arc::new(pool),
            queries: Arc::new(queries),
        }
    }

    /// Open a connection pool for `config`
    pub async fn connect(config: &PostgresConfig, queries: Queries) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.dsn)
            .await
            .map_err(db_error)?;
        tracing::info!(max_connections = config.max_connections, "connected to postgres");
        Ok(Self::new(pool, queries))
    }

    async fn fetch_all(&self, name: QueryName, params: &[String]) -> Result<Vec<PgRow>> {
        let mut query = sqlx::query(self.queries.get(name));
        for param in params {
            query = query.bind(param.as_str());
        }
        query.fetch_all(self.pool.as_ref()).await.map_err(db_error)
    }

    async fn fetch_optional(&self, name: QueryName, params: &[String]) -> Result<Option<PgRow>> {
        let mut query = sqlx::query(self.queries.get(name));
        for param in params {
            query = query.bind(param.as_str());
        }
        query
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(db_error)
    }

    async fn holdings(&self, name: QueryName, params: &[String]) -> Result<Vec<TokenHolding>> {
        let rows = self.fetch_all(name, params).await?;
        rows.iter().map(rows::token_holding).collect()
    }
}

#[async_trait]
impl MetadataStore for PgStore {
    async fn last_10_tx(&self, address: Address) -> Result<Vec<Transfer>> {
        let rows = self
            .fetch_all(QueryName::Last10Tx, &[bind_address(address)])
            .await?;
        rows.iter().map(rows::transfer).collect()
    }

    async fn token_holdings(&self, address: Address) -> Result<Vec<TokenHolding>> {
        self.holdings(QueryName::TokenHoldings, &[bind_address(address)])
            .await
    }

    async fn token_details(&self, token: Address) -> Result<Option<TokenDetails>> {
        let row = self
            .fetch_optional(QueryName::TokenDetails, &[bind_address(token)])
            .await?;
        row.as_ref().map(rows::token_details).transpose()
    }

    async fn pool_details(&self, pool: Address) -> Result<Option<PoolDetails>> {
        let row = self
            .fetch_optional(QueryName::PoolDetails, &[bind_address(pool)])
            .await?;
        row.as_ref().map(rows::pool_details).transpose()
    }

    async fn pool_reverse_details(&self, symbol: &str) -> Result<Option<PoolDetails>> {
        let row = self
            .fetch_optional(QueryName::PoolReverseDetails, &[symbol.to_string()])
            .await?;
        row.as_ref().map(rows::pool_details).transpose()
    }

    async fn top_pools(&self) -> Result<Vec<PoolDetails>> {
        let rows = self.fetch_all(QueryName::TopActivePools, &[]).await?;
        rows.iter().map(rows::pool_details).collect()
    }

    async fn pool_token_allowed(&self, pool: Address, token: Address) -> Result<bool> {
        let row = self
            .fetch_optional(
                QueryName::PoolTokenAllowed,
                &[bind_address(pool), bind_address(token)],
            )
            .await?;
        Ok(row.is_some())
    }

    async fn pool_allowed_tokens_for_user(
        &self,
        user: Address,
        pool: Address,
    ) -> Result<Vec<TokenHolding>> {
        self.holdings(
            QueryName::PoolAllowedTokensForUser,
            &[bind_address(user), bind_address(pool)],
        )
        .await
    }

    async fn pool_allowed_tokens(&self, pool: Address) -> Result<Vec<TokenHolding>> {
        self.holdings(QueryName::PoolAllowedTokens, &[bind_address(pool)])
            .await
    }

    async fn pool_allowed_stables(&self, pool: Address) -> Result<Vec<TokenHolding>> {
        self.holdings(QueryName::PoolAllowedStables, &[bind_address(pool)])
            .await
    }

    async fn pool_token_swap_rates(
        &self,
        pool: Address,
        in_token: Address,
        out_token: Address,
    ) -> Result<Option<SwapRate>> {
        let row = self
            .fetch_optional(
                QueryName::PoolTokenSwapRates,
                &[
                    bind_address(pool),
                    bind_address(in_token),
                    bind_address(out_token),
                ],
            )
            .await?;
        row.as_ref().map(rows::swap_rate).transpose()
    }

    async fn pool_token_limit(&self, pool: Address, token: Address) -> Result<Option<String>> {
        let row = self
            .fetch_optional(
                QueryName::PoolTokenLimit,
                &[bind_address(pool), bind_address(token)],
            )
            .await?;
        row.as_ref().map(rows::token_limit).transpose()
    }
}
