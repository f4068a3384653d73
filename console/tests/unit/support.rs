//! Shared test doubles

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use genie_console::actions::dispatcher::ActionBackend;
use genie_console::authn::permissions::Permissions;
use genie_console::authn::session::SessionManagerExt;
use genie_console::authn::session_token::SessionToken;
use genie_console::errors::ConsoleError;
use genie_console::http::client::RawBody;
use genie_console::http::response::ActionAck;
use genie_console::models::campaign::{Campaign, CampaignAction};
use genie_console::models::entity::Entity;
use genie_console::models::page::Page;
use genie_console::sync::controller::{ListController, ListSource};
use genie_console::sync::query::ListQuery;

pub fn make_token(claims: Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test")).unwrap()
}

pub fn campaign(id: &str, status: &str, progress: f64) -> Campaign {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Campaign {}", id),
        "status": status,
        "progress_percent": progress,
    }))
    .unwrap()
}

pub fn records<T: Entity>(value: Value) -> Vec<T> {
    serde_json::from_value(value).unwrap()
}

/// Answers every fetch with the same page
pub struct StaticSource<T> {
    pub page: Mutex<Page<T>>,
    pub seen: Mutex<Vec<ListQuery>>,
}

impl<T: Entity> StaticSource<T> {
    pub fn new(items: Vec<T>) -> Arc<Self> {
        let total = items.len() as u64;
        Arc::new(Self {
            page: Mutex::new(Page::new(items, Some(total), None, 10)),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn set_items(&self, items: Vec<T>) {
        let total = items.len() as u64;
        *self.page.lock().unwrap() = Page::new(items, Some(total), None, 10);
    }

    pub fn seen(&self) -> Vec<ListQuery> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: Entity> ListSource<T> for StaticSource<T> {
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<T>, ConsoleError> {
        self.seen.lock().unwrap().push(query.clone());
        Ok(self.page.lock().unwrap().clone())
    }
}

/// Backend whose answers are queued by the test
#[derive(Default)]
pub struct ScriptedBackend {
    pub acks: Mutex<VecDeque<Result<ActionAck, ConsoleError>>>,
    pub export: Mutex<Option<RawBody>>,
    pub requests: Mutex<Vec<String>>,

    /// Campaign view inspected while a campaign request is in flight
    pub watched: Mutex<Option<Arc<ListController<Campaign>>>>,
    pub status_in_flight: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn answer(&self, ack: Result<ActionAck, ConsoleError>) {
        self.acks.lock().unwrap().push_back(ack);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: String) -> Result<ActionAck, ConsoleError> {
        self.requests.lock().unwrap().push(request);
        self.acks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ConsoleError::Internal("no scripted answer".to_string())))
    }
}

#[async_trait]
impl ActionBackend for ScriptedBackend {
    async fn campaign_action(
        &self,
        campaign_id: &str,
        action: CampaignAction,
    ) -> Result<ActionAck, ConsoleError> {
        let watched = self.watched.lock().unwrap().clone();
        if let Some(view) = watched {
            if let Some(current) = view.get(campaign_id).await {
                self.status_in_flight
                    .lock()
                    .unwrap()
                    .push(current.status.to_string());
            }
        }
        self.next(format!("{} {}", action, campaign_id))
    }

    async fn set_call_lead(&self, call_id: &str, is_lead: bool) -> Result<ActionAck, ConsoleError> {
        self.next(format!("lead {} {}", call_id, is_lead))
    }

    async fn delete_lead(&self, lead_id: &str) -> Result<ActionAck, ConsoleError> {
        self.next(format!("delete {}", lead_id))
    }

    async fn assign_voice_account(
        &self,
        owner_user_id: &str,
        account: &str,
    ) -> Result<ActionAck, ConsoleError> {
        self.next(format!("assign {} {}", owner_user_id, account))
    }

    async fn export_leads(&self, filters: &[(String, String)]) -> Result<RawBody, ConsoleError> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("export {:?}", filters));
        self.export
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ConsoleError::Internal("no scripted export".to_string()))
    }
}

/// Session with a fixed token
pub struct StaticSession {
    pub token: SessionToken,
}

impl StaticSession {
    pub fn new(claims: Value) -> Arc<Self> {
        Arc::new(Self {
            token: SessionToken::from_raw(make_token(claims)).unwrap(),
        })
    }
}

#[async_trait]
impl SessionManagerExt for StaticSession {
    async fn get_token(&self) -> Result<SessionToken, ConsoleError> {
        Ok(self.token.clone())
    }

    async fn permissions(&self) -> Result<Permissions, ConsoleError> {
        Ok(Permissions::from_token(&self.token))
    }

    async fn impersonate(&self, _user_id: &str) -> Result<SessionToken, ConsoleError> {
        Err(ConsoleError::AuthError("not supported".to_string()))
    }

    async fn stop_impersonating(&self) -> Result<SessionToken, ConsoleError> {
        Err(ConsoleError::AuthError("not supported".to_string()))
    }

    async fn is_impersonating(&self) -> Result<bool, ConsoleError> {
        Ok(false)
    }
}
