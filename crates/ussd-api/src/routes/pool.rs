//! Swap Pool Routes
//!
//! Pool metadata, the token lists each swap leg can use, and the swap-limit
//! calculations. Every amount is a raw integer decimal string.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use swap_pool::constants::fields;
use swap_pool::{
    absolute_credit, fetch, format_signed, max_swap_input_for, merge_token_balances,
    parse_amount, reverse_quote, swap_balances, token_balance,
};
use ussd_core::{Address, ChainError, PoolDetails};

use super::{respond, RouteResult};
use crate::dto::{
    CreditResult, FilteredResult, MaxResult, PoolDetailsResult, QuoteResult,
    SwapFromCheckResult, SwapToQuery, TopPoolsResult,
};
use crate::error::{checksummed, RouteError};
use crate::AppState;

/// Create pool routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pools/top", get(top_pools))
        .route("/pool/reverse/{symbol}", get(pool_reverse_details))
        .route("/pool/{pool}", get(pool_details))
        .route("/pool/{pool}/swap-from/{address}", get(swap_from_list))
        .route("/pool/{pool}/swap-from/{address}/check", get(swap_from_check))
        .route("/pool/{pool}/swap-to", get(swap_to_list))
        .route("/pool/{pool}/limit/{address}/{from}/{to}", get(max_swap_input))
        .route("/pool/{pool}/max-limit/{address}/{from}/{to}", get(max_limit))
        .route("/pool/{pool}/quote/{from}/{to}/{amount}", get(quote))
        .route("/pool/{pool}/credit/{address}/{token}", get(credit))
}

/// Indexed pool, falling back to the pool contract itself
async fn resolve_pool(state: &AppState, pool: Address) -> Result<PoolDetails, RouteError> {
    if let Some(details) = state.store().pool_details(pool).await? {
        return Ok(details);
    }
    tracing::debug!(%pool, "pool not indexed, reading from chain");
    fetch::pool_details(state.chain(), pool)
        .await
        .map_err(|e| match e {
            ChainError::CallsFailed(_) => RouteError::NotFound("Pool not found"),
            other => other.into(),
        })
}

/// GET /pool/{pool} - Pool metadata
async fn pool_details(
    State(state): State<AppState>,
    Path(pool): Path<String>,
) -> RouteResult<PoolDetailsResult> {
    let pool = checksummed(&pool)?;
    let pool_details = state.run(resolve_pool(&state, pool)).await?;

    respond("Pool details", PoolDetailsResult { pool_details })
}

/// GET /pool/reverse/{symbol} - Pool metadata by symbol
async fn pool_reverse_details(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> RouteResult<PoolDetailsResult> {
    if symbol.trim().is_empty() {
        return Err(RouteError::Validation("Symbol validation failed"));
    }

    let pool_details = state
        .store()
        .pool_reverse_details(&symbol)
        .await?
        .ok_or(RouteError::NotFound("Pool not found"))?;

    respond("Pool details", PoolDetailsResult { pool_details })
}

/// GET /pools/top - Most active pools
async fn top_pools(State(state): State<AppState>) -> RouteResult<TopPoolsResult> {
    let top_pools = state.store().top_pools().await?;

    respond("Top 5 pools sorted by swaps", TopPoolsResult { top_pools })
}

/// GET /pool/{pool}/swap-from/{address} - Held tokens the pool accepts
async fn swap_from_list(
    State(state): State<AppState>,
    Path((pool, address)): Path<(String, String)>,
) -> RouteResult<FilteredResult> {
    let pool = checksummed(&pool)?;
    let user = checksummed(&address)?;

    let filtered = state
        .run(async {
            if state.store().pool_details(pool).await?.is_none() {
                return Err(RouteError::NotFound("Pool not found"));
            }
            let allowed = state.store().pool_allowed_tokens_for_user(user, pool).await?;
            Ok::<_, RouteError>(merge_token_balances(state.chain(), allowed, user).await?)
        })
        .await?;

    respond("Swap from list", FilteredResult { filtered })
}

/// GET /pool/{pool}/swap-from/{address}/check - Whether the pool takes a token
async fn swap_from_check(
    State(state): State<AppState>,
    Path((pool, address)): Path<(String, String)>,
) -> RouteResult<SwapFromCheckResult> {
    let pool = checksummed(&pool)?;
    let token = checksummed(&address)?;

    let can_swap_from = state.store().pool_token_allowed(pool, token).await?;

    respond("Swap from check", SwapFromCheckResult { can_swap_from })
}

/// GET /pool/{pool}/swap-to - Tokens the pool can pay out
///
/// With `stables=true` the indexed stables list is returned as is. Otherwise
/// every accepted token is listed with the pool's own balance, dropping the
/// ones it holds none of.
async fn swap_to_list(
    State(state): State<AppState>,
    Path(pool): Path<String>,
    Query(query): Query<SwapToQuery>,
) -> RouteResult<FilteredResult> {
    let pool = checksummed(&pool)?;

    if query.stables_only() {
        let filtered = state.store().pool_allowed_stables(pool).await?;
        return respond("Swap to list (stables only)", FilteredResult { filtered });
    }

    let filtered = state
        .run(async {
            let tokens = state.store().pool_allowed_tokens(pool).await?;
            Ok::<_, RouteError>(merge_token_balances(state.chain(), tokens, pool).await?)
        })
        .await?;

    respond("Swap to list (all tokens)", FilteredResult { filtered })
}

/// GET /pool/{pool}/limit/{address}/{from}/{to} - Largest `from` input the
/// user can swap into `to`
async fn max_swap_input(
    State(state): State<AppState>,
    Path((pool, address, from, to)): Path<(String, String, String, String)>,
) -> RouteResult<MaxResult> {
    let pool = checksummed(&pool)?;
    let user = checksummed(&address)?;
    let from = checksummed(&from)?;
    let to = checksummed(&to)?;

    tracing::debug!(%pool, %user, %from, %to, "max swap input request");

    let max = state
        .run(async {
            let rate = state
                .store()
                .pool_token_swap_rates(pool, from, to)
                .await?
                .ok_or(RouteError::NotFound(
                    "Token swap rates not found for this pool",
                ))?;
            tracing::debug!(
                in_rate = rate.in_rate,
                out_rate = rate.out_rate,
                in_decimals = rate.in_decimals,
                out_decimals = rate.out_decimals,
                in_token_limit = %rate.in_token_limit,
                out_token_limit = %rate.out_token_limit,
                "swap rates found"
            );

            let balances = swap_balances(state.chain(), user, pool, from, to).await?;
            Ok::<_, RouteError>(max_swap_input_for(&rate, &balances)?)
        })
        .await?;

    respond(
        "From token max swap input",
        MaxResult {
            max: max.to_string(),
        },
    )
}

/// GET /pool/{pool}/max-limit/{address}/{from}/{to} - Limit read straight from
/// the pool's limiter contract
async fn max_limit(
    State(state): State<AppState>,
    Path((pool, address, from, to)): Path<(String, String, String, String)>,
) -> RouteResult<MaxResult> {
    let pool = checksummed(&pool)?;
    let user = checksummed(&address)?;
    let from = checksummed(&from)?;
    let to = checksummed(&to)?;

    let max = state
        .run(async {
            let details = resolve_pool(&state, pool).await?;
            let limit = fetch::max_limit(
                state.chain(),
                user,
                pool,
                details.limiter_address,
                from,
                to,
            )
            .await?;
            Ok::<_, RouteError>(limit)
        })
        .await?;

    respond(
        "From token max limit",
        MaxResult {
            max: max.to_string(),
        },
    )
}

/// GET /pool/{pool}/quote/{from}/{to}/{amount} - `from` input needed to
/// receive `amount` of `to`
async fn quote(
    State(state): State<AppState>,
    Path((pool, from, to, amount)): Path<(String, String, String, String)>,
) -> RouteResult<QuoteResult> {
    let pool = checksummed(&pool)?;
    let from = checksummed(&from)?;
    let to = checksummed(&to)?;
    let desired = parse_amount(fields::AMOUNT, &amount)
        .map_err(|_| RouteError::Validation("Amount validation failed"))?;

    let rate = state
        .store()
        .pool_token_swap_rates(pool, from, to)
        .await?
        .ok_or(RouteError::NotFound(
            "Token swap rates not found for this pool",
        ))?;

    let input = reverse_quote(
        &desired,
        rate.in_rate,
        rate.out_rate,
        rate.in_decimals,
        rate.out_decimals,
    );

    respond(
        "Reverse swap quote",
        QuoteResult {
            amount: input.to_string(),
        },
    )
}

/// GET /pool/{pool}/credit/{address}/{token} - How far the user's balance of
/// `token` sits from the pool's cap, signed
async fn credit(
    State(state): State<AppState>,
    Path((pool, address, token)): Path<(String, String, String)>,
) -> RouteResult<CreditResult> {
    let pool = checksummed(&pool)?;
    let user = checksummed(&address)?;
    let token = checksummed(&token)?;

    let credit = state
        .run(async {
            let limit = state
                .store()
                .pool_token_limit(pool, token)
                .await?
                .ok_or(RouteError::NotFound("Token limit not found for this pool"))?;
            let limit = parse_amount(fields::POOL_LIMIT, &limit)?;
            let balance = token_balance(state.chain(), user, token).await?;
            Ok::<_, RouteError>(absolute_credit(&balance, &limit))
        })
        .await?;

    respond(
        "Absolute credit",
        CreditResult {
            credit: format_signed(&credit),
        },
    )
}
