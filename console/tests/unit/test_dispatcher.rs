use std::sync::Arc;

use serde_json::json;

use genie_console::actions::dispatcher::ActionDispatcher;
use genie_console::authn::permissions::{Capability, Permissions};
use genie_console::errors::ConsoleError;
use genie_console::http::response::ActionAck;
use genie_console::models::call::Call;
use genie_console::models::campaign::{CampaignAction, CampaignStatus};
use genie_console::models::lead::Lead;
use genie_console::notify::{NoticeLevel, Notifier};
use genie_console::sync::controller::ListController;
use genie_console::sync::query::ListQuery;

use crate::support::{campaign, records, ScriptedBackend, StaticSource};

fn make_dispatcher(backend: Arc<ScriptedBackend>, permissions: Permissions) -> (ActionDispatcher, Notifier) {
    let notifier = Notifier::default();
    (ActionDispatcher::new(backend, permissions, notifier.clone()), notifier)
}

#[tokio::test]
async fn test_failed_pause_is_reverted() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.answer(Err(ConsoleError::ActionFailed(
        "Campaign is already completed".to_string(),
    )));

    let source = StaticSource::new(vec![campaign("1", "in_progress", 40.0)]);
    let (dispatcher, notifier) = make_dispatcher(backend.clone(), Permissions::all());
    let view = Arc::new(ListController::new(source, notifier.clone(), ListQuery::new(10)));
    view.refresh().await.unwrap();
    *backend.watched.lock().unwrap() = Some(view.clone());
    let mut notices = notifier.subscribe();

    let result = dispatcher
        .campaign_action(Some(&view), "1", CampaignAction::Pause)
        .await;

    assert!(matches!(result, Err(ConsoleError::ActionFailed(_))));
    assert_eq!(*backend.status_in_flight.lock().unwrap(), vec!["paused".to_string()]);
    assert_eq!(view.get("1").await.unwrap().status, CampaignStatus::InProgress);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Campaign is already completed");
}

#[tokio::test]
async fn test_pause_applies_authoritative_record() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.answer(Ok(ActionAck {
        message: None,
        data: Some(json!({"id": 1, "status": "paused", "progress_percent": 55.0})),
    }));

    let source = StaticSource::new(vec![campaign("1", "in_progress", 40.0)]);
    let (dispatcher, notifier) = make_dispatcher(backend.clone(), Permissions::all());
    let view = ListController::new(source.clone(), notifier.clone(), ListQuery::new(10));
    view.refresh().await.unwrap();
    source.set_items(vec![campaign("1", "paused", 55.0)]);
    let mut notices = notifier.subscribe();

    dispatcher
        .campaign_action(Some(&view), "1", CampaignAction::Pause)
        .await
        .unwrap();

    let shown = view.get("1").await.unwrap();
    assert_eq!(shown.status, CampaignStatus::Paused);
    assert_eq!(shown.progress_percent, Some(55.0));
    assert_eq!(backend.requests(), vec!["pause 1".to_string()]);
    // Initial load plus the refresh after success
    assert_eq!(source.seen().len(), 2);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Pause request sent for campaign 1");
}

#[tokio::test]
async fn test_forbidden_action_sends_nothing() {
    let backend = Arc::new(ScriptedBackend::default());
    let permissions = Permissions::none().grant(Capability::ViewCampaigns);
    let (dispatcher, _notifier) = make_dispatcher(backend.clone(), permissions);

    let result = dispatcher.campaign_action(None, "1", CampaignAction::Cancel).await;

    assert!(matches!(
        result,
        Err(ConsoleError::Forbidden(Capability::ManageCampaigns))
    ));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_toggle_lead_reverts_on_failure() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.answer(Ok(ActionAck::default()));
    backend.answer(Err(ConsoleError::Backend {
        status: Some(500),
        message: "Database unavailable".to_string(),
    }));

    let calls: Vec<Call> = records(json!([
        {"id": 7, "status": "completed", "is_lead": false},
        {"id": 8, "status": "failed", "is_lead": false},
    ]));
    let (dispatcher, notifier) = make_dispatcher(backend.clone(), Permissions::all());
    let view = ListController::new(StaticSource::new(calls), notifier, ListQuery::new(10));
    view.refresh().await.unwrap();

    assert!(dispatcher.toggle_lead(&view, "7").await.unwrap());
    assert!(view.get("7").await.unwrap().is_lead);

    assert!(dispatcher.toggle_lead(&view, "8").await.is_err());
    assert!(!view.get("8").await.unwrap().is_lead);

    assert!(matches!(
        dispatcher.toggle_lead(&view, "99").await,
        Err(ConsoleError::NotFound(_))
    ));
    assert_eq!(
        backend.requests(),
        vec!["lead 7 true".to_string(), "lead 8 true".to_string()]
    );
}

#[tokio::test]
async fn test_delete_lead_removes_row() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.answer(Ok(ActionAck {
        message: Some("Lead removed".to_string()),
        data: None,
    }));

    let leads: Vec<Lead> = records(json!([{"id": "a", "name": "Ann"}, {"id": "b", "name": "Bob"}]));
    let source = StaticSource::new(leads.clone());
    let (dispatcher, notifier) = make_dispatcher(backend.clone(), Permissions::all());
    let view = ListController::new(source.clone(), notifier.clone(), ListQuery::new(10));
    view.refresh().await.unwrap();
    source.set_items(leads[1..].to_vec());
    let mut notices = notifier.subscribe();

    dispatcher.delete_lead(Some(&view), "a").await.unwrap();

    assert_eq!(view.displayed_ids().await, vec!["b".to_string()]);
    assert_eq!(notices.try_recv().unwrap().message, "Lead removed");
}

#[tokio::test]
async fn test_assign_voice_account() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.answer(Ok(ActionAck {
        message: None,
        data: Some(json!({"updated": 3})),
    }));
    let (dispatcher, _notifier) = make_dispatcher(backend.clone(), Permissions::all());

    assert_eq!(
        dispatcher.assign_voice_account("u-1", " acc-9 ").await.unwrap(),
        Some(3)
    );
    assert!(matches!(
        dispatcher.assign_voice_account("u-1", "  ").await,
        Err(ConsoleError::ValidationError(_))
    ));
    assert_eq!(backend.requests(), vec!["assign u-1 acc-9".to_string()]);
}
