//! Token and Pool Reads
//!
//! Metadata lookups, swap balances and the balance merge, each issued as a
//! single multicall batch.

use chain_client::abi::{ILimiter, ISwapPool, IToken};
use chain_client::{
    read, read_or_default, read_outcomes, CallSubmitter, ContractCall, DecodedValue, ReturnKind,
    Result,
};
use num_bigint::BigUint;
use num_traits::Zero;
use ussd_core::{Address, ChainError, PoolDetails, TokenDetails, TokenHolding, ZERO_ADDRESS};

use crate::calculator;
use crate::state::SwapBalances;

fn unpack<const N: usize>(values: Vec<DecodedValue>) -> Result<[DecodedValue; N]> {
    let got = values.len();
    values.try_into().map_err(|_| ChainError::Decode {
        message: format!("expected {} values, got {}", N, got),
    })
}

fn balance_of(token: Address, owner: Address) -> ContractCall {
    ContractCall::new(token, IToken::balanceOfCall { owner }, ReturnKind::Uint256)
}

/// Read token metadata from chain.
///
/// `name`, `symbol` and `decimals` are required. `sinkAddress` is optional and
/// falls back to the zero address when the contract lacks it.
pub async fn token_details<C>(chain: &C, token: Address) -> Result<TokenDetails>
where
    C: CallSubmitter + ?Sized,
{
    let calls = [
        ContractCall::new(token, IToken::nameCall {}, ReturnKind::String),
        ContractCall::new(token, IToken::symbolCall {}, ReturnKind::String),
        ContractCall::new(token, IToken::decimalsCall {}, ReturnKind::Uint8),
    ];
    let [name, symbol, decimals] = unpack::<3>(read(chain, &calls).await?)?;

    let sink = read_or_default(
        chain,
        ContractCall::new(token, IToken::sinkAddressCall {}, ReturnKind::Address),
        DecodedValue::Address(ZERO_ADDRESS),
    )
    .await?;

    Ok(TokenDetails {
        token_address: token,
        token_name: name.into_string()?,
        token_symbol: symbol.into_string()?,
        token_decimals: decimals.into_u8()?,
        sink_address: sink.into_address()?,
    })
}

/// Read pool metadata from chain
pub async fn pool_details<C>(chain: &C, pool: Address) -> Result<PoolDetails>
where
    C: CallSubmitter + ?Sized,
{
    let calls = [
        ContractCall::new(pool, ISwapPool::nameCall {}, ReturnKind::String),
        ContractCall::new(pool, ISwapPool::symbolCall {}, ReturnKind::String),
        ContractCall::new(pool, ISwapPool::tokenRegistryCall {}, ReturnKind::Address),
        ContractCall::new(pool, ISwapPool::tokenLimiterCall {}, ReturnKind::Address),
    ];
    let [name, symbol, registry, limiter] = unpack::<4>(read(chain, &calls).await?)?;

    Ok(PoolDetails {
        pool_name: name.into_string()?,
        pool_symbol: symbol.into_string()?,
        pool_contract_address: pool,
        limiter_address: limiter.into_address()?,
        voucher_registry: registry.into_address()?,
    })
}

/// Live balances bounding a swap of `in_token` for `out_token` through `pool`
pub async fn swap_balances<C>(
    chain: &C,
    initiator: Address,
    pool: Address,
    in_token: Address,
    out_token: Address,
) -> Result<SwapBalances>
where
    C: CallSubmitter + ?Sized,
{
    let calls = [
        balance_of(in_token, initiator),
        balance_of(in_token, pool),
        balance_of(out_token, pool),
    ];
    let [user_in, pool_in, pool_out] = unpack::<3>(read(chain, &calls).await?)?;

    let balances = SwapBalances {
        user_in: user_in.into_uint()?,
        pool_in: pool_in.into_uint()?,
        pool_out: pool_out.into_uint()?,
    };
    tracing::info!(
        %pool,
        %in_token,
        %out_token,
        user_in = %balances.user_in,
        pool_in = %balances.pool_in,
        pool_out = %balances.pool_out,
        "swap balances"
    );

    Ok(balances)
}

/// Chain-only swap limit: the limiter's cap for `in_token` on `pool`, the
/// initiator's `in_token` balance and the pool's `out_token` balance, whichever
/// is smallest.
pub async fn max_limit<C>(
    chain: &C,
    initiator: Address,
    pool: Address,
    limiter: Address,
    in_token: Address,
    out_token: Address,
) -> Result<BigUint>
where
    C: CallSubmitter + ?Sized,
{
    let calls = [
        balance_of(in_token, initiator),
        balance_of(out_token, pool),
        ContractCall::new(
            limiter,
            ILimiter::limitOfCall {
                token: in_token,
                holder: pool,
            },
            ReturnKind::Uint256,
        ),
    ];
    let [user_in, pool_out, limit] = unpack::<3>(read(chain, &calls).await?)?;

    Ok(calculator::max_limit(
        &limit.into_uint()?,
        &user_in.into_uint()?,
        &pool_out.into_uint()?,
    ))
}

/// Balance of `token` held by `owner`
pub async fn token_balance<C>(chain: &C, owner: Address, token: Address) -> Result<BigUint>
where
    C: CallSubmitter + ?Sized,
{
    let [balance] = unpack::<1>(read(chain, &[balance_of(token, owner)]).await?)?;
    balance.into_uint()
}

/// Attach live balances to `holdings`, keeping only tokens `owner` actually
/// holds.
///
/// All balances are read in one batch. A record survives if its balance call
/// succeeded and returned a non-zero amount; survivors keep their relative
/// order. Transport failures abort the whole merge.
pub async fn merge_token_balances<C>(
    chain: &C,
    holdings: Vec<TokenHolding>,
    owner: Address,
) -> Result<Vec<TokenHolding>>
where
    C: CallSubmitter + ?Sized,
{
    if holdings.is_empty() {
        return Ok(holdings);
    }

    let calls: Vec<ContractCall> = holdings
        .iter()
        .map(|holding| balance_of(holding.token_address, owner))
        .collect();
    let outcomes = read_outcomes(chain, &calls).await?;

    let merged = holdings
        .into_iter()
        .zip(outcomes)
        .filter_map(|(mut holding, outcome)| match outcome {
            Ok(DecodedValue::Uint256(balance)) if !balance.is_zero() => {
                holding.balance = balance.to_string();
                Some(holding)
            }
            Ok(_) => None,
            Err(failure) => {
                tracing::debug!(%owner, "no balance: {}", failure);
                None
            }
        })
        .collect();

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use chain_client::testing::MockChain;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn holding(byte: u8, symbol: &str) -> TokenHolding {
        TokenHolding::new(addr(byte), symbol, 6)
    }

    #[tokio::test]
    async fn test_token_details_defaults_missing_sink() {
        let chain = MockChain::new();
        let token = addr(0x10);
        chain.respond(token, IToken::nameCall {}, String::from("Sarafu"));
        chain.respond(token, IToken::symbolCall {}, String::from("SRF"));
        chain.respond_u8(token, IToken::decimalsCall {}, 6);

        let details = token_details(&chain, token).await.unwrap();
        assert_eq!(details.token_name, "Sarafu");
        assert_eq!(details.token_symbol, "SRF");
        assert_eq!(details.token_decimals, 6);
        assert_eq!(details.sink_address, ZERO_ADDRESS);
    }

    #[tokio::test]
    async fn test_token_details_reads_sink() {
        let chain = MockChain::new();
        let token = addr(0x10);
        chain.respond(token, IToken::nameCall {}, String::from("Sarafu"));
        chain.respond(token, IToken::symbolCall {}, String::from("SRF"));
        chain.respond_u8(token, IToken::decimalsCall {}, 6);
        chain.respond(token, IToken::sinkAddressCall {}, addr(0x5c));

        let details = token_details(&chain, token).await.unwrap();
        assert_eq!(details.sink_address, addr(0x5c));
    }

    #[tokio::test]
    async fn test_token_details_requires_metadata() {
        let chain = MockChain::new();
        let token = addr(0x10);
        chain.respond(token, IToken::nameCall {}, String::from("Sarafu"));

        let err = token_details(&chain, token).await.unwrap_err();
        match err {
            ChainError::CallsFailed(batch) => assert_eq!(batch.failed_indices(), vec![1, 2]),
            other => panic!("expected CallsFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_token_details_offline() {
        let chain = MockChain::new();
        chain.set_offline(true);
        let err = token_details(&chain, addr(0x10)).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_pool_details() {
        let chain = MockChain::new();
        let pool = addr(0x20);
        chain.respond(pool, ISwapPool::nameCall {}, String::from("Kibera Pool"));
        chain.respond(pool, ISwapPool::symbolCall {}, String::from("KBP"));
        chain.respond(pool, ISwapPool::tokenRegistryCall {}, addr(0x21));
        chain.respond(pool, ISwapPool::tokenLimiterCall {}, addr(0x22));

        let details = pool_details(&chain, pool).await.unwrap();
        assert_eq!(details.pool_name, "Kibera Pool");
        assert_eq!(details.pool_symbol, "KBP");
        assert_eq!(details.pool_contract_address, pool);
        assert_eq!(details.voucher_registry, addr(0x21));
        assert_eq!(details.limiter_address, addr(0x22));
        assert_eq!(chain.submissions(), 1);
    }

    #[tokio::test]
    async fn test_swap_balances_single_batch() {
        let chain = MockChain::new();
        let (user, pool, token_in, token_out) = (addr(1), addr(2), addr(3), addr(4));
        chain.respond(token_in, IToken::balanceOfCall { owner: user }, U256::from(500u64));
        chain.respond(token_in, IToken::balanceOfCall { owner: pool }, U256::from(20u64));
        chain.respond(token_out, IToken::balanceOfCall { owner: pool }, U256::from(9000u64));

        let balances = swap_balances(&chain, user, pool, token_in, token_out)
            .await
            .unwrap();
        assert_eq!(balances.user_in, BigUint::from(500u32));
        assert_eq!(balances.pool_in, BigUint::from(20u32));
        assert_eq!(balances.pool_out, BigUint::from(9000u32));
        assert_eq!(chain.submissions(), 1);
    }

    #[tokio::test]
    async fn test_max_limit_reads_limiter() {
        let chain = MockChain::new();
        let (user, pool, limiter, token_in, token_out) =
            (addr(1), addr(2), addr(5), addr(3), addr(4));
        chain.respond(token_in, IToken::balanceOfCall { owner: user }, U256::from(500u64));
        chain.respond(token_out, IToken::balanceOfCall { owner: pool }, U256::from(9000u64));
        chain.respond(
            limiter,
            ILimiter::limitOfCall {
                token: token_in,
                holder: pool,
            },
            U256::from(300u64),
        );

        let limit = max_limit(&chain, user, pool, limiter, token_in, token_out)
            .await
            .unwrap();
        assert_eq!(limit, BigUint::from(300u32));
    }

    #[tokio::test]
    async fn test_token_balance() {
        let chain = MockChain::new();
        chain.respond(addr(3), IToken::balanceOfCall { owner: addr(1) }, U256::from(77u64));
        let balance = token_balance(&chain, addr(1), addr(3)).await.unwrap();
        assert_eq!(balance, BigUint::from(77u32));
    }

    #[tokio::test]
    async fn test_merge_empty_makes_no_call() {
        let chain = MockChain::new();
        let merged = merge_token_balances(&chain, Vec::new(), addr(1)).await.unwrap();
        assert!(merged.is_empty());
        assert_eq!(chain.submissions(), 0);
    }

    #[tokio::test]
    async fn test_merge_keeps_held_tokens_in_order() {
        let chain = MockChain::new();
        let owner = addr(1);
        chain.respond(addr(0x10), IToken::balanceOfCall { owner }, U256::from(5u64));
        chain.respond(addr(0x11), IToken::balanceOfCall { owner }, U256::ZERO);
        // 0x12 reverts
        chain.respond(
            addr(0x13),
            IToken::balanceOfCall { owner },
            U256::from(10u64).pow(U256::from(24u64)),
        );

        let holdings = vec![
            holding(0x10, "AAA"),
            holding(0x11, "BBB"),
            holding(0x12, "CCC"),
            holding(0x13, "DDD"),
        ];
        let merged = merge_token_balances(&chain, holdings, owner).await.unwrap();

        let symbols: Vec<&str> = merged.iter().map(|h| h.token_symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "DDD"]);
        assert_eq!(merged[0].balance, "5");
        assert_eq!(merged[1].balance, "1000000000000000000000000");
        assert_eq!(chain.submissions(), 1);
    }

    #[tokio::test]
    async fn test_merge_aborts_on_transport_failure() {
        let chain = MockChain::new();
        chain.set_offline(true);
        let err = merge_token_balances(&chain, vec![holding(0x10, "AAA")], addr(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Transport { .. }));
    }
}
