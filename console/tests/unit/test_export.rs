use std::path::PathBuf;
use std::sync::Arc;

use genie_console::actions::dispatcher::ActionDispatcher;
use genie_console::authn::permissions::{Capability, Permissions};
use genie_console::errors::ConsoleError;
use genie_console::export::{export_leads, ExportOptions, MIN_EXPORT_BYTES};
use genie_console::http::client::RawBody;
use genie_console::notify::{NoticeLevel, Notifier};
use genie_console::sync::query::{FilterChange, ListQuery};

use crate::support::ScriptedBackend;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("genie-export-{}", uuid::Uuid::new_v4()))
}

fn backend_with(bytes: &[u8], content_type: &str) -> Arc<ScriptedBackend> {
    let backend = Arc::new(ScriptedBackend::default());
    *backend.export.lock().unwrap() = Some(RawBody {
        bytes: bytes.to_vec(),
        content_type: Some(content_type.to_string()),
    });
    backend
}

fn options(directory: PathBuf) -> ExportOptions {
    ExportOptions {
        directory,
        min_bytes: MIN_EXPORT_BYTES,
    }
}

#[tokio::test]
async fn test_header_only_export_writes_nothing() {
    let dir = scratch_dir();
    let backend = backend_with(b"name,phone,email,summary\n", "text/csv");
    let notifier = Notifier::default();
    let mut notices = notifier.subscribe();
    let dispatcher = ActionDispatcher::new(backend, Permissions::all(), notifier);

    let result = export_leads(&dispatcher, &options(dir.clone()), &ListQuery::new(10), None).await;

    assert!(matches!(result, Err(ConsoleError::EmptyExport)));
    assert!(!dir.exists());
    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "No data available to export");
}

#[tokio::test]
async fn test_json_error_export_writes_nothing() {
    let dir = scratch_dir();
    let backend = backend_with(
        br#"{"success":false,"error":"No leads match the selected filters for export"}"#,
        "application/json",
    );
    let notifier = Notifier::default();
    let mut notices = notifier.subscribe();
    let dispatcher = ActionDispatcher::new(backend, Permissions::all(), notifier);

    let target = dir.join("out.csv");
    let result = export_leads(&dispatcher, &options(dir.clone()), &ListQuery::new(10), Some(&target)).await;

    match result {
        Err(ConsoleError::Backend { message, .. }) => {
            assert_eq!(message, "No leads match the selected filters for export");
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(!target.exists());
    assert!(!dir.exists());
    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "No leads match the selected filters for export");
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_export_writes_csv_with_filters() {
    let dir = scratch_dir();
    let csv = "name,phone,email,summary\nAnn,555-0101,ann@example.com,Wants a demo\n";
    let backend = backend_with(csv.as_bytes(), "text/csv; charset=utf-8");
    let dispatcher = ActionDispatcher::new(backend.clone(), Permissions::all(), Notifier::default());

    let mut query = ListQuery::new(10);
    query.apply_filter(FilterChange::Search(Some("ann".to_string())));
    query.set_page(3);

    let target = dir.join("out.csv");
    let written = export_leads(&dispatcher, &options(dir.clone()), &query, Some(&target))
        .await
        .unwrap();

    assert_eq!(written, target);
    assert_eq!(tokio::fs::read_to_string(&target).await.unwrap(), csv);

    // Export sends filters only, never paging
    let request = &backend.requests()[0];
    assert!(request.contains("search"));
    assert!(!request.contains("page"));

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn test_json_wrapped_export_is_unwrapped() {
    let dir = scratch_dir();
    let body = serde_json::json!({
        "data": "name,phone\nBob,555-0199\nCarol,555-0142\nDan,555-0177\n"
    });
    let backend = backend_with(body.to_string().as_bytes(), "application/json");
    let dispatcher = ActionDispatcher::new(backend, Permissions::all(), Notifier::default());

    let written = export_leads(&dispatcher, &options(dir.clone()), &ListQuery::new(10), None)
        .await
        .unwrap();

    let file_name = written.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("leads_export_"));
    assert!(file_name.ends_with(".csv"));
    let contents = tokio::fs::read_to_string(&written).await.unwrap();
    assert!(contents.starts_with("name,phone\nBob"));

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn test_export_requires_capability() {
    let backend = backend_with(b"irrelevant", "text/csv");
    let permissions = Permissions::none().grant(Capability::ViewLeads);
    let dispatcher = ActionDispatcher::new(backend.clone(), permissions, Notifier::default());

    let result = export_leads(&dispatcher, &options(scratch_dir()), &ListQuery::new(10), None).await;

    assert!(matches!(result, Err(ConsoleError::Forbidden(Capability::ExportLeads))));
    assert!(backend.requests().is_empty());
}
