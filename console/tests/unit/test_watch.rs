use std::sync::{Arc, Mutex};
use std::time::Duration;

use openapi_client::models::RealtimeFrame;

use genie_console::actions::dispatcher::ActionDispatcher;
use genie_console::app::watch::{Output, WatchSession, WatchTarget};
use genie_console::authn::permissions::Permissions;
use genie_console::notify::Notifier;
use genie_console::realtime::hub::RealtimeHub;
use genie_console::sync::controller::ListController;
use genie_console::sync::query::ListQuery;

use crate::support::{campaign, ScriptedBackend, StaticSource};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<String>>>);

impl Output for Captured {
    fn print(&mut self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }
}

impl Captured {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<RealtimeFrame>) -> Vec<RealtimeFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

#[tokio::test]
async fn test_watch_session_commands() {
    let source = StaticSource::new(vec![
        campaign("1", "in_progress", 10.0),
        campaign("2", "paused", 80.0),
    ]);
    let notifier = Notifier::default();
    let controller = Arc::new(ListController::new(source.clone(), notifier.clone(), ListQuery::new(10)));
    let dispatcher = Arc::new(ActionDispatcher::new(
        Arc::new(ScriptedBackend::default()),
        Permissions::all(),
        notifier.clone(),
    ));
    let (hub, mut outbound) = RealtimeHub::new();
    let output = Captured::default();

    let session = WatchSession::new(
        WatchTarget::Campaigns(controller.clone()),
        dispatcher,
        notifier,
        hub.clone(),
        Duration::from_millis(10),
        output.clone(),
    );
    let input = tokio_test::io::Builder::new()
        .read(b"url\nstatus paused\nurl\nmenu 1\nquit\n")
        .build();

    session
        .run(input, Box::pin(std::future::pending::<()>()))
        .await
        .unwrap();

    let printed = output.lines();
    assert!(printed[0].contains("Campaign 1"));
    assert!(printed.iter().any(|l| l == "?"));
    assert!(printed.iter().any(|l| l == "?status=paused"));
    assert!(printed.iter().any(|l| l.contains("Campaign 1 (in_progress)")));

    let last_query = source.seen().pop().unwrap();
    assert_eq!(last_query.filters.status.as_deref(), Some("paused"));

    // Every displayed room is joined once and left when the session ends
    let frames = drain(&mut outbound);
    let joins = frames
        .iter()
        .filter(|f| matches!(f, RealtimeFrame::Join { .. }))
        .count();
    let leaves = frames
        .iter()
        .filter(|f| matches!(f, RealtimeFrame::Leave { .. }))
        .count();
    assert_eq!(joins, 2);
    assert_eq!(leaves, 2);
    assert!(hub.live_rooms().is_empty());
}
