use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use genie_console::errors::ConsoleError;
use genie_console::models::campaign::{Campaign, CampaignStatus};
use genie_console::models::page::Page;
use genie_console::notify::Notifier;
use genie_console::sync::controller::{ListController, ListSource, RefreshOutcome};
use genie_console::sync::query::{FilterChange, ListQuery};

use crate::support::{campaign, StaticSource};

/// Holds back the first fetch until released
struct GatedSource {
    calls: AtomicUsize,
    started: Notify,
    release: Notify,
    first: Page<Campaign>,
    second: Page<Campaign>,
}

#[async_trait]
impl ListSource<Campaign> for GatedSource {
    async fn fetch_page(&self, _query: &ListQuery) -> Result<Page<Campaign>, ConsoleError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.notify_one();
            self.release.notified().await;
            Ok(self.first.clone())
        } else {
            Ok(self.second.clone())
        }
    }
}

#[tokio::test]
async fn test_late_response_is_dropped() {
    let source = Arc::new(GatedSource {
        calls: AtomicUsize::new(0),
        started: Notify::new(),
        release: Notify::new(),
        first: Page::new(vec![campaign("old", "paused", 0.0)], None, None, 10),
        second: Page::new(vec![campaign("new", "in_progress", 10.0)], None, None, 10),
    });
    let controller = Arc::new(ListController::new(
        source.clone(),
        Notifier::default(),
        ListQuery::new(10),
    ));

    let slow = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.refresh().await })
    };
    source.started.notified().await;

    assert_eq!(controller.refresh().await.unwrap(), RefreshOutcome::Applied);
    source.release.notify_one();
    assert_eq!(slow.await.unwrap().unwrap(), RefreshOutcome::Stale);

    let snapshot = controller.snapshot().await;
    assert_eq!(controller.displayed_ids().await, vec!["new".to_string()]);
    assert!(!snapshot.loading);
    assert!(snapshot.loaded);
}

#[tokio::test]
async fn test_partial_event_keeps_other_fields() {
    let source = StaticSource::new(vec![
        campaign("1", "in_progress", 40.0),
        campaign("2", "scheduled", 0.0),
    ]);
    let controller = ListController::new(source, Notifier::default(), ListQuery::new(10));
    controller.refresh().await.unwrap();

    let patch = json!({"status": "paused", "progress_percent": null, "unknown_field": 1});
    assert!(controller.apply_event("1", patch.as_object().unwrap()).await);

    let updated = controller.get("1").await.unwrap();
    assert_eq!(updated.status, CampaignStatus::Paused);
    assert_eq!(updated.progress_percent, Some(40.0));
    assert_eq!(updated.name.as_deref(), Some("Campaign 1"));

    let untouched = controller.get("2").await.unwrap();
    assert_eq!(untouched.status, CampaignStatus::Scheduled);
}

#[tokio::test]
async fn test_paging_stays_in_range() {
    let items: Vec<Campaign> = (1..=3)
        .map(|i| campaign(&i.to_string(), "scheduled", 0.0))
        .collect();
    let source = StaticSource::new(items);
    let controller = ListController::new(source.clone(), Notifier::default(), ListQuery::new(10));
    controller.refresh().await.unwrap();

    // One page in total
    controller.next_page().await.unwrap();
    assert_eq!(controller.query().await.page, 1);
    controller.prev_page().await.unwrap();
    assert_eq!(controller.query().await.page, 1);

    controller.set_page(5).await.unwrap();
    controller
        .apply_filter(FilterChange::Search(Some("acme".to_string())))
        .await
        .unwrap();
    let last = source.seen().pop().unwrap();
    assert_eq!(last.page, 1);
    assert_eq!(last.filters.search.as_deref(), Some("acme"));
}

#[tokio::test]
async fn test_next_page_from_largest_page() {
    let source = StaticSource::new(vec![campaign("1", "running", 10.0)]);
    let controller = ListController::new(source.clone(), Notifier::default(), ListQuery::new(10));

    controller.load_query_string("?page=4294967295").await.unwrap();
    assert_eq!(controller.query().await.page, 1);

    // The watch session passes any u32 straight through
    controller.set_page(u32::MAX).await.unwrap();
    controller.next_page().await.unwrap();
    assert_eq!(controller.query().await.page, 1);
    assert_eq!(source.seen().pop().unwrap().page, 1);
}

#[tokio::test]
async fn test_query_string_reload() {
    let source = StaticSource::new(vec![campaign("1", "paused", 0.0)]);
    let controller = ListController::new(source.clone(), Notifier::default(), ListQuery::new(10));

    controller
        .load_query_string("?page=2&status=paused&search=acme")
        .await
        .unwrap();
    let query = controller.query().await;
    assert_eq!(query.page, 2);
    assert_eq!(query.filters.status.as_deref(), Some("paused"));

    let reproduced = ListQuery::from_query_string(&controller.query_string().await, 10);
    assert_eq!(reproduced, query);
}
