//! Registry Enumerator
//!
//! Membership checks and paginated walks over on-chain token indexes.

use alloy::primitives::U256;
use async_trait::async_trait;
use chain_client::abi::ITokenIndex;
use chain_client::{read, read_outcomes, CallSubmitter, ContractCall, DecodedValue, ReturnKind, Result};
use futures::future;
use futures::stream::{self, Stream, TryStreamExt};
use ussd_core::{Address, ChainError, TokenDetails, TokenHolding};

use crate::fetch::token_details;
use crate::state::RegistryPage;

fn have(registry: Address, member: Address) -> ContractCall {
    ContractCall::new(registry, ITokenIndex::haveCall { member }, ReturnKind::Bool)
}

/// Whether `member` is listed in `registry`
pub async fn exists<C>(chain: &C, registry: Address, member: Address) -> Result<bool>
where
    C: CallSubmitter + ?Sized,
{
    let found = exists_all(chain, registry, &[member]).await?;
    Ok(found.first().copied().unwrap_or(false))
}

/// Membership of every address in `members`, positionally aligned with the
/// input. One batch regardless of length.
pub async fn exists_all<C>(chain: &C, registry: Address, members: &[Address]) -> Result<Vec<bool>>
where
    C: CallSubmitter + ?Sized,
{
    let calls: Vec<ContractCall> = members.iter().map(|m| have(registry, *m)).collect();
    read(chain, &calls)
        .await?
        .into_iter()
        .map(DecodedValue::into_bool)
        .collect()
}

/// Keep only the holdings whose token is listed in `registry`, in order
pub async fn filter_registered<C>(
    chain: &C,
    registry: Address,
    holdings: Vec<TokenHolding>,
) -> Result<Vec<TokenHolding>>
where
    C: CallSubmitter + ?Sized,
{
    let tokens: Vec<Address> = holdings.iter().map(|h| h.token_address).collect();
    let listed = exists_all(chain, registry, &tokens).await?;

    Ok(holdings
        .into_iter()
        .zip(listed)
        .filter_map(|(holding, listed)| listed.then_some(holding))
        .collect())
}

/// Source of registry pages
#[async_trait]
pub trait RegistryPager: Send + Sync {
    /// Fetch the page starting at `cursor`. The first page is at cursor 0.
    async fn fetch_page(&self, cursor: u64) -> Result<RegistryPage>;
}

/// Pages through an index contract by batching `entry(i)` calls.
///
/// Slots past the end of the index revert. A page with a reverted slot, or
/// with nothing but zero-address padding, is the last one.
pub struct EntryPager<'a, C: ?Sized> {
    chain: &'a C,
    registry: Address,
    page_size: usize,
}

impl<'a, C: CallSubmitter + ?Sized> EntryPager<'a, C> {
    pub fn new(chain: &'a C, registry: Address, page_size: usize) -> Self {
        Self {
            chain,
            registry,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl<'a, C: CallSubmitter + ?Sized> RegistryPager for EntryPager<'a, C> {
    async fn fetch_page(&self, cursor: u64) -> Result<RegistryPage> {
        let calls: Vec<ContractCall> = (0..self.page_size as u64)
            .map(|offset| {
                ContractCall::new(
                    self.registry,
                    ITokenIndex::entryCall {
                        index: U256::from(cursor + offset),
                    },
                    ReturnKind::Address,
                )
            })
            .collect();

        let mut members = Vec::with_capacity(calls.len());
        let mut exhausted = false;
        for outcome in read_outcomes(self.chain, &calls).await? {
            match outcome {
                Ok(DecodedValue::Address(member)) => members.push(member),
                _ => {
                    exhausted = true;
                    break;
                }
            }
        }
        if members.iter().all(|member| member.is_zero()) {
            exhausted = true;
        }

        tracing::debug!(
            registry = %self.registry,
            cursor,
            fetched = members.len(),
            exhausted,
            "registry page"
        );

        Ok(RegistryPage {
            next: (!exhausted).then(|| cursor + self.page_size as u64),
            members,
        })
    }
}

/// Walk every member of the registry behind `pager`, page by page.
///
/// The stream is lazy and forward-only: a page is requested only when the
/// previous one is drained. Zero-address padding is skipped. A failed page
/// fetch yields the error and ends the walk.
pub fn members<P>(pager: &P) -> impl Stream<Item = Result<Address>> + Send + '_
where
    P: RegistryPager + ?Sized,
{
    stream::try_unfold(Some(0u64), move |cursor| async move {
        let Some(cursor) = cursor else {
            return Ok(None);
        };
        let page = pager.fetch_page(cursor).await?;
        let members = stream::iter(page.members.into_iter().map(Ok));
        Ok::<_, ChainError>(Some((members, page.next)))
    })
    .try_flatten()
    .try_filter(|member| future::ready(!member.is_zero()))
}

/// Resolve token metadata for every registry member.
///
/// A member whose metadata calls revert or do not decode is logged and
/// skipped. Transport failures end the stream.
pub fn all_token_details<'a, C, P>(
    chain: &'a C,
    pager: &'a P,
) -> impl Stream<Item = Result<TokenDetails>> + Send + 'a
where
    C: CallSubmitter + ?Sized,
    P: RegistryPager + ?Sized,
{
    members(pager).try_filter_map(move |member| async move {
        match token_details(chain, member).await {
            Ok(details) => Ok(Some(details)),
            Err(e) if !e.is_transport() => {
                tracing::error!(token = %member, "skipping registry member: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    })
}
