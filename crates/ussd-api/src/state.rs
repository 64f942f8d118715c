//! Application state shared across API handlers

use std::future::Future;
use std::sync::Arc;

use chain_client::{cancellable, CallSubmitter};
use pg_store::MetadataStore;
use swap_pool::constants::registry::DEFAULT_PAGE_SIZE;
use tokio_util::sync::CancellationToken;
use ussd_core::ChainError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn MetadataStore>,
    chain: Arc<dyn CallSubmitter>,
    shutdown: CancellationToken,
    page_size: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        chain: Arc<dyn CallSubmitter>,
        shutdown: CancellationToken,
    ) -> Self {
        Self::with_page_size(store, chain, shutdown, DEFAULT_PAGE_SIZE)
    }

    /// Create with a specific registry page size
    pub fn with_page_size(
        store: Arc<dyn MetadataStore>,
        chain: Arc<dyn CallSubmitter>,
        shutdown: CancellationToken,
        page_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                chain,
                shutdown,
                page_size,
            }),
        }
    }

    pub fn store(&self) -> &dyn MetadataStore {
        self.inner.store.as_ref()
    }

    pub fn chain(&self) -> &dyn CallSubmitter {
        self.inner.chain.as_ref()
    }

    /// Entries fetched per registry page
    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    /// Cancels in-flight handler work once the shutdown grace period is over
    pub fn shutdown(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    /// Run handler work until it finishes or the shutdown token cancels it
    pub async fn run<T, E>(&self, work: impl Future<Output = Result<T, E>>) -> Result<T, E>
    where
        E: From<ChainError>,
    {
        let token = self.inner.shutdown.child_token();
        cancellable(&token, work).await
    }
}
