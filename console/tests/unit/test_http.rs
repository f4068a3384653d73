use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{json, Value};

use genie_console::actions::dispatcher::ActionBackend;
use genie_console::authn::permissions::Capability;
use genie_console::authn::session::{SessionManager, SessionManagerExt};
use genie_console::errors::ConsoleError;
use genie_console::filesys::file::File;
use genie_console::http::backend::Backend;
use genie_console::http::client::HttpClient;
use genie_console::http::response::GENERIC_FAILURE;
use genie_console::models::campaign::{Campaign, CampaignAction, CampaignStatus};
use genie_console::models::lead::Lead;
use genie_console::notify::Notifier;
use genie_console::sync::controller::{ListController, ListSource};
use genie_console::sync::query::{FilterChange, ListQuery};

use crate::support::make_token;

fn authorized(headers: &HeaderMap) -> bool {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") && v.len() > 7);
    bearer && headers.contains_key("x-request-id")
}

async fn list_campaigns(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Missing token"})));
    }
    let expected = [("page", "2"), ("limit", "10"), ("status", "paused")];
    if expected
        .iter()
        .any(|(k, v)| params.get(*k).map(String::as_str) != Some(*v))
    {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Unexpected query"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "data": [{"id": 11, "name": "Spring promo", "status": "paused", "progress_percent": 62.5}],
            "total": 11,
            "totalPages": 2
        })),
    )
}

async fn list_leads() -> Json<Value> {
    Json(json!({"data": [], "error": "Database offline"}))
}

async fn campaign_action(Path((id, action)): Path<(String, String)>) -> impl IntoResponse {
    match action.as_str() {
        "pause" => (
            StatusCode::OK,
            Json(json!({"success": true, "message": format!("Campaign {} paused", id)})),
        ),
        "cancel" => (
            StatusCode::CONFLICT,
            Json(json!({"error": "Campaign already completed"})),
        ),
        _ => (StatusCode::OK, Json(json!({}))),
    }
}

async fn call_lead(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"data": {"id": id, "is_lead": body["is_lead"]}}))
}

async fn delete_lead(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({"success": "true"}))
}

async fn export_leads(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let body = format!(
        "name,phone,status\nAnn,555-0101,{}\n",
        params.get("status").cloned().unwrap_or_default()
    );
    ([(header::CONTENT_TYPE, "text/csv")], body)
}

async fn assign_voice_account(Json(body): Json<Value>) -> Json<Value> {
    let count = if body["owner_user_id"] == "u-1" { 3 } else { 0 };
    Json(json!({"success": true, "data": {"updated": count}}))
}

async fn permissions() -> Json<Value> {
    Json(json!({"permissions": ["bots:assign", "not-a-capability"]}))
}

async fn impersonate(Path(user_id): Path<String>) -> Json<Value> {
    if user_id == "admin-2" {
        return Json(json!({"success": false, "message": "Cannot impersonate an admin"}));
    }
    let token = make_token(json!({"sub": user_id, "role": "consumer", "impersonator": "1"}));
    // Numeric ids come back as JSON numbers
    let user_id = user_id
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or(Value::String(user_id));
    Json(json!({"data": {"token": token, "user_id": user_id}}))
}

/// Start a mock backend and return its API base URL
async fn start_backend() -> String {
    let app = Router::new()
        .route("/api/campaigns", get(list_campaigns))
        .route("/api/campaigns/{id}/{action}", post(campaign_action))
        .route("/api/leads", get(list_leads))
        .route("/api/leads/export", get(export_leads))
        .route("/api/leads/{id}", delete(delete_lead))
        .route("/api/calls/{id}/lead", patch(call_lead))
        .route("/api/bots/voice-account", put(assign_voice_account))
        .route("/api/auth/permissions", get(permissions))
        .route("/api/admin/impersonate/{user_id}", post(impersonate));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn session(base_url: &str, role: &str) -> (Arc<SessionManager>, Arc<HttpClient>, File) {
    let http = Arc::new(HttpClient::new(base_url, Duration::from_secs(5)).unwrap());
    let dir = std::env::temp_dir().join(format!("genie-http-{}", uuid::Uuid::new_v4()));
    let file = File::new(dir.join("session.json"));
    let token = make_token(json!({"sub": 1, "role": role}));
    let manager = SessionManager::new(
        Arc::new(file.clone()),
        http.clone(),
        Some(SecretString::from(token)),
    );
    (Arc::new(manager), http, file)
}

async fn backend(role: &str) -> Backend {
    let base_url = start_backend().await;
    let (session, http, _file) = session(&base_url, role);
    Backend::new(http, session)
}

#[tokio::test]
async fn test_list_page_through_controller() {
    let backend = Arc::new(backend("admin").await);
    let mut query = ListQuery::new(10);
    query.apply_filter(FilterChange::Status(Some("paused".to_string())));
    query.set_page(2);
    let controller = ListController::<Campaign>::new(backend, Notifier::default(), query);

    controller.refresh().await.unwrap();

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.page.total, 11);
    assert_eq!(snapshot.page.total_pages, 2);
    assert_eq!(snapshot.page.items.len(), 1);
    assert_eq!(snapshot.page.items[0].id, "11");
    assert_eq!(snapshot.page.items[0].status, CampaignStatus::Paused);
}

#[tokio::test]
async fn test_error_envelope_is_failure() {
    let backend = backend("admin").await;

    let result = <Backend as ListSource<Lead>>::fetch_page(&backend, &ListQuery::new(10)).await;

    match result {
        Err(ConsoleError::Backend { message, .. }) => assert_eq!(message, "Database offline"),
        other => panic!("unexpected result: {:?}", other.map(|p| p.items.len())),
    }
}

#[tokio::test]
async fn test_campaign_action_responses() {
    let backend = backend("admin").await;

    let ack = backend.campaign_action("5", CampaignAction::Pause).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("Campaign 5 paused"));

    match backend.campaign_action("5", CampaignAction::Cancel).await {
        Err(ConsoleError::Backend { status, message }) => {
            assert_eq!(status, Some(409));
            assert_eq!(message, "Campaign already completed");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // An empty object acknowledges nothing
    match backend.campaign_action("5", CampaignAction::Resume).await {
        Err(ConsoleError::ActionFailed(message)) => assert_eq!(message, GENERIC_FAILURE),
        other => panic!("unexpected result: {:?}", other),
    }

    assert!(matches!(
        backend.campaign_action("5/../6", CampaignAction::Pause).await,
        Err(ConsoleError::ValidationError(_))
    ));
}

#[tokio::test]
async fn test_mutation_endpoints() {
    let backend = backend("admin").await;

    let ack = backend.set_call_lead("7", true).await.unwrap();
    assert_eq!(ack.data, Some(json!({"id": "7", "is_lead": true})));

    assert!(backend.delete_lead("3").await.is_ok());

    let ack = backend.assign_voice_account("u-1", "acc-9").await.unwrap();
    assert_eq!(ack.data, Some(json!({"updated": 3})));

    let body = backend
        .export_leads(&[("status".to_string(), "qualified".to_string())])
        .await
        .unwrap();
    assert_eq!(body.content_type.as_deref(), Some("text/csv"));
    assert_eq!(
        String::from_utf8(body.bytes).unwrap(),
        "name,phone,status\nAnn,555-0101,qualified\n"
    );
}

#[tokio::test]
async fn test_permissions_combine_token_and_backend() {
    let base_url = start_backend().await;
    let (session, _http, _file) = session(&base_url, "consumer");

    let permissions = session.permissions().await.unwrap();

    assert!(permissions.can(Capability::ManageCampaigns));
    assert!(permissions.can(Capability::AssignVoiceAccount));
    assert!(!permissions.can(Capability::ImpersonateUsers));
    assert!(matches!(
        session.impersonate("42").await,
        Err(ConsoleError::Forbidden(Capability::ImpersonateUsers))
    ));
}

#[tokio::test]
async fn test_impersonation_round_trip() {
    let base_url = start_backend().await;
    let (session, _http, file) = session(&base_url, "admin");

    let token = session.impersonate("42").await.unwrap();
    assert_eq!(token.user_id(), "42");
    assert!(session.is_impersonating().await.unwrap());
    assert!(file.exists().await);

    let restored = session.stop_impersonating().await.unwrap();
    assert_eq!(restored.user_id(), "1");
    assert!(!session.is_impersonating().await.unwrap());

    match session.impersonate("admin-2").await {
        Err(ConsoleError::AuthError(message)) => assert_eq!(message, "Cannot impersonate an admin"),
        other => panic!("unexpected result: {:?}", other.map(|t| t.user_id().to_string())),
    }
    assert_eq!(session.get_token().await.unwrap().user_id(), "1");
}
