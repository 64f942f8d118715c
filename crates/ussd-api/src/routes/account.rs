//! Account Routes
//!
//! Transfer history and token holdings of a single address.

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use swap_pool::merge_token_balances;

use super::{respond, RouteResult};
use crate::dto::{HoldingsResult, TransfersResult};
use crate::error::{checksummed, RouteError};
use crate::AppState;

/// Create account routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transfers/last10/{address}", get(last_10_tx))
        .route("/holdings/{address}", get(token_holdings))
}

/// GET /transfers/last10/{address} - Most recent token transfers
async fn last_10_tx(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> RouteResult<TransfersResult> {
    let address = checksummed(&address)?;
    let transfers = state.store().last_10_tx(address).await?;

    respond("Last 10 token transfers", TransfersResult { transfers })
}

/// GET /holdings/{address} - Held tokens with current balances
async fn token_holdings(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> RouteResult<HoldingsResult> {
    let address = checksummed(&address)?;

    let holdings = state
        .run(async {
            let listed = state.store().token_holdings(address).await?;
            let merged = merge_token_balances(state.chain(), listed, address).await?;
            Ok::<_, RouteError>(merged)
        })
        .await?;

    respond(
        "Token holdings with current balances",
        HoldingsResult { holdings },
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use chain_client::abi::IToken;
    use chain_client::testing::MockChain;
    use pg_store::testing::MockStore;
    use ussd_core::{TokenHolding, Transfer};

    use crate::routes::test_support::{addr, get, path, state};

    #[tokio::test]
    async fn test_last_10_tx() {
        let mut store = MockStore::new();
        store.transfers.insert(
            addr(1),
            vec![Transfer {
                sender: addr(1),
                recipient: addr(2),
                transfer_value: "1000000".into(),
                contract_address: addr(9),
                tx_hash: "0xabc".into(),
                date_block: chrono::Utc::now(),
                token_symbol: "SRF".into(),
                token_decimals: 6,
            }],
        );

        let (status, body) = get(
            state(store, Arc::new(MockChain::new())),
            &format!("/api/v1/transfers/last10/{}", path(1)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["result"]["transfers"][0]["transferValue"], "1000000");
        assert_eq!(body["result"]["transfers"][0]["recipient"], path(2));
    }

    #[tokio::test]
    async fn test_rejects_unchecksummed_address() {
        let uri = format!(
            "/api/v1/transfers/last10/{}",
            path(0xab).to_lowercase()
        );
        let (status, body) = get(state(MockStore::new(), Arc::new(MockChain::new())), &uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["description"], "Address validation failed");
    }

    #[tokio::test]
    async fn test_holdings_drop_zero_and_failed_balances() {
        let owner = addr(1);
        let mut store = MockStore::new();
        store.holdings.insert(
            owner,
            vec![
                TokenHolding::new(addr(0x10), "AAA", 6),
                TokenHolding::new(addr(0x11), "BBB", 6),
                TokenHolding::new(addr(0x12), "CCC", 18),
            ],
        );

        let chain = Arc::new(MockChain::new());
        chain.respond(
            addr(0x10),
            IToken::balanceOfCall { owner },
            alloy::primitives::U256::from(250u64),
        );
        chain.respond(
            addr(0x11),
            IToken::balanceOfCall { owner },
            alloy::primitives::U256::ZERO,
        );
        // 0x12 reverts

        let (status, body) = get(
            state(store, chain.clone()),
            &format!("/api/v1/holdings/{}", path(1)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let holdings = body["result"]["holdings"].as_array().unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0]["tokenSymbol"], "AAA");
        assert_eq!(holdings[0]["balance"], "250");
        assert_eq!(chain.submissions(), 1);
    }

    #[tokio::test]
    async fn test_holdings_chain_down_is_unavailable() {
        let mut store = MockStore::new();
        store
            .holdings
            .insert(addr(1), vec![TokenHolding::new(addr(0x10), "AAA", 6)]);
        let chain = Arc::new(MockChain::new());
        chain.set_offline(true);

        let (status, body) = get(
            state(store, chain),
            &format!("/api/v1/holdings/{}", path(1)),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["errorCode"], "rpc_unavailable");
    }

    #[tokio::test]
    async fn test_store_down_is_unavailable() {
        let store = MockStore {
            offline: true,
            ..MockStore::new()
        };
        let (status, body) = get(
            state(store, Arc::new(MockChain::new())),
            &format!("/api/v1/transfers/last10/{}", path(1)),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["errorCode"], "store_unavailable");
    }
}
