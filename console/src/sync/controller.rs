//! List view controller
//!
//! Owns the query of one list view and the page currently displayed. Fetches
//! replace the page wholesale, real-time patches are merged into it in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::errors::ConsoleError;
use crate::models::entity::Entity;
use crate::models::page::Page;
use crate::notify::Notifier;
use crate::sync::merge::merge_patch;
use crate::sync::query::{FilterChange, ListQuery, SortOrder};

/// Where pages come from
#[async_trait]
pub trait ListSource<T: Entity>: Send + Sync {
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<T>, ConsoleError>;
}

/// Result of a refresh that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the displayed page
    Applied,

    /// A newer refresh was issued meanwhile; the response was dropped
    Stale,
}

/// Point-in-time copy of the controller state
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    pub query: ListQuery,
    pub page: Page<T>,

    /// A fetch is in flight. Advisory only.
    pub loading: bool,

    /// At least one fetch has succeeded
    pub loaded: bool,
}

struct ListState<T> {
    query: ListQuery,
    page: Page<T>,
    in_flight: usize,
    loaded: bool,
}

/// Controller for one list view
pub struct ListController<T: Entity> {
    source: Arc<dyn ListSource<T>>,
    notifier: Notifier,
    state: RwLock<ListState<T>>,
    issued: AtomicU64,
}

impl<T: Entity> ListController<T> {
    pub fn new(source: Arc<dyn ListSource<T>>, notifier: Notifier, query: ListQuery) -> Self {
        Self {
            source,
            notifier,
            state: RwLock::new(ListState {
                query,
                page: Page::empty(),
                in_flight: 0,
                loaded: false,
            }),
            issued: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> ListSnapshot<T> {
        let state = self.state.read().await;
        ListSnapshot {
            query: state.query.clone(),
            page: state.page.clone(),
            loading: state.in_flight > 0,
            loaded: state.loaded,
        }
    }

    pub async fn query(&self) -> ListQuery {
        self.state.read().await.query.clone()
    }

    /// Query string that reproduces this view
    pub async fn query_string(&self) -> String {
        self.state.read().await.query.to_query_string()
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.read().await.page.items.clone()
    }

    pub async fn displayed_ids(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.page.items.iter().map(|i| i.id().to_string()).collect()
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        let state = self.state.read().await;
        state.page.items.iter().find(|i| i.id() == id).cloned()
    }

    /// Fetch the page for the current query and display it.
    ///
    /// On failure the displayed page is kept and an error notice raised.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ConsoleError> {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let query = {
            let mut state = self.state.write().await;
            state.in_flight += 1;
            state.query.clone()
        };

        debug!("Fetching {} page {} (request {})", T::KIND, query.page, seq);
        let result = self.source.fetch_page(&query).await;

        let mut state = self.state.write().await;
        state.in_flight = state.in_flight.saturating_sub(1);

        if seq != self.issued.load(Ordering::SeqCst) {
            debug!("Dropping stale {} response (request {})", T::KIND, seq);
            return Ok(RefreshOutcome::Stale);
        }

        match result {
            Ok(page) => {
                debug!(
                    "Loaded {} {} records (page {} of {})",
                    page.items.len(),
                    T::KIND,
                    query.page,
                    page.total_pages
                );
                state.page = page;
                state.loaded = true;
                Ok(RefreshOutcome::Applied)
            }
            Err(e) => {
                drop(state);
                warn!("Failed to fetch {} list: {}", T::KIND, e);
                self.notifier.error(e.user_message());
                Err(e)
            }
        }
    }

    /// Edit a filter (returning to page 1) and refresh
    pub async fn apply_filter(&self, change: FilterChange) -> Result<RefreshOutcome, ConsoleError> {
        self.state.write().await.query.apply_filter(change);
        self.refresh().await
    }

    pub async fn set_sort(&self, sort: SortOrder) -> Result<RefreshOutcome, ConsoleError> {
        self.state.write().await.query.set_sort(sort);
        self.refresh().await
    }

    pub async fn set_page(&self, page: u32) -> Result<RefreshOutcome, ConsoleError> {
        self.state.write().await.query.set_page(page);
        self.refresh().await
    }

    pub async fn next_page(&self) -> Result<RefreshOutcome, ConsoleError> {
        let next = {
            let state = self.state.read().await;
            state.query.page.saturating_add(1).min(state.page.total_pages.max(1))
        };
        self.set_page(next).await
    }

    pub async fn prev_page(&self) -> Result<RefreshOutcome, ConsoleError> {
        let prev = self.state.read().await.query.page.saturating_sub(1);
        self.set_page(prev).await
    }

    /// Replace the whole query from a query string and refresh
    pub async fn load_query_string(&self, query: &str) -> Result<RefreshOutcome, ConsoleError> {
        {
            let mut state = self.state.write().await;
            let page_size = state.query.page_size;
            state.query = ListQuery::from_query_string(query, page_size);
        }
        self.refresh().await
    }

    /// Merge a partial real-time payload into the displayed record with
    /// this id. Returns false when the record is not displayed.
    pub async fn apply_event(&self, id: &str, patch: &Map<String, Value>) -> bool {
        let mut state = self.state.write().await;
        let Some(slot) = state.page.items.iter_mut().find(|i| i.id() == id) else {
            debug!("Ignoring event for {} {} (not displayed)", T::KIND, id);
            return false;
        };

        match merge_patch(slot, patch) {
            Ok(merged) => {
                *slot = merged;
                true
            }
            Err(e) => {
                warn!("Dropping malformed event for {} {}: {}", T::KIND, id, e);
                false
            }
        }
    }

    /// Edit a displayed record in place, returning its previous value
    pub async fn update_item<F>(&self, id: &str, edit: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut state = self.state.write().await;
        let slot = state.page.items.iter_mut().find(|i| i.id() == id)?;
        let previous = slot.clone();
        edit(slot);
        Some(previous)
    }

    pub async fn remove_item(&self, id: &str) -> Option<T> {
        let mut state = self.state.write().await;
        let index = state.page.items.iter().position(|i| i.id() == id)?;
        state.page.total = state.page.total.saturating_sub(1);
        Some(state.page.items.remove(index))
    }
}
