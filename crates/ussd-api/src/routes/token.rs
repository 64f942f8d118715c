//! Token Routes

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use futures::TryStreamExt;
use swap_pool::{all_token_details, fetch, EntryPager};
use ussd_core::{Address, ChainError, TokenDetails};

use super::{respond, RouteResult};
use crate::dto::{RegistryTokensResult, TokenDetailsResult};
use crate::error::{checksummed, RouteError};
use crate::AppState;

/// Create token routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token/{address}", get(token_details))
        .route("/registry/{registry}/tokens", get(registry_tokens))
}

/// GET /token/{address} - Token metadata, indexed copy first
async fn token_details(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> RouteResult<TokenDetailsResult> {
    let token = checksummed(&address)?;

    let token_details = state.run(resolve_token(&state, token)).await?;

    respond("Token details", TokenDetailsResult { token_details })
}

async fn resolve_token(state: &AppState, token: Address) -> Result<TokenDetails, RouteError> {
    if let Some(details) = state.store().token_details(token).await? {
        return Ok(details);
    }
    tracing::debug!(%token, "token not indexed, reading from chain");
    fetch::token_details(state.chain(), token)
        .await
        .map_err(|e| match e {
            ChainError::CallsFailed(_) => RouteError::NotFound("Token not found"),
            other => other.into(),
        })
}

/// GET /registry/{registry}/tokens - Metadata of every token in an index
async fn registry_tokens(
    State(state): State<AppState>,
    Path(registry): Path<String>,
) -> RouteResult<RegistryTokensResult> {
    let registry = checksummed(&registry)?;

    let tokens = state
        .run(async {
            let pager = EntryPager::new(state.chain(), registry, state.page_size());
            let tokens: Vec<_> = all_token_details(state.chain(), &pager)
                .try_collect()
                .await?;
            Ok::<_, RouteError>(tokens)
        })
        .await?;

    tracing::info!(%registry, count = tokens.len(), "registry enumerated");

    respond("Registry tokens", RegistryTokensResult { tokens })
}
