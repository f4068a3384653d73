//! Authenticated backend facade
//!
//! Binds the HTTP client to the session so list controllers and the action
//! dispatcher never handle tokens themselves.

use std::sync::Arc;

use async_trait::async_trait;
use openapi_client::models::VoiceAccountAssignment;

use crate::actions::dispatcher::ActionBackend;
use crate::authn::session::SessionManagerExt;
use crate::errors::ConsoleError;
use crate::http::client::{HttpClient, RawBody};
use crate::http::response::ActionAck;
use crate::models::campaign::CampaignAction;
use crate::models::entity::Entity;
use crate::models::page::Page;
use crate::sync::controller::ListSource;
use crate::sync::query::ListQuery;

pub struct Backend {
    http: Arc<HttpClient>,
    session: Arc<dyn SessionManagerExt>,
}

impl Backend {
    pub fn new(http: Arc<HttpClient>, session: Arc<dyn SessionManagerExt>) -> Self {
        Self { http, session }
    }

    async fn token(&self) -> Result<String, ConsoleError> {
        Ok(self.session.get_token().await?.expose().to_string())
    }
}

#[async_trait]
impl<T: Entity> ListSource<T> for Backend {
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<T>, ConsoleError> {
        let token = self.token().await?;
        self.http.list::<T>(&token, query).await
    }
}

#[async_trait]
impl ActionBackend for Backend {
    async fn campaign_action(
        &self,
        campaign_id: &str,
        action: CampaignAction,
    ) -> Result<ActionAck, ConsoleError> {
        let token = self.token().await?;
        self.http.campaign_action(campaign_id, action, &token).await
    }

    async fn set_call_lead(&self, call_id: &str, is_lead: bool) -> Result<ActionAck, ConsoleError> {
        let token = self.token().await?;
        self.http.set_call_lead(call_id, is_lead, &token).await
    }

    async fn delete_lead(&self, lead_id: &str) -> Result<ActionAck, ConsoleError> {
        let token = self.token().await?;
        self.http.delete_lead(lead_id, &token).await
    }

    async fn assign_voice_account(
        &self,
        owner_user_id: &str,
        account: &str,
    ) -> Result<ActionAck, ConsoleError> {
        let token = self.token().await?;
        let assignment = VoiceAccountAssignment {
            owner_user_id: owner_user_id.to_string(),
            account: account.to_string(),
        };
        self.http.assign_voice_account(&assignment, &token).await
    }

    async fn export_leads(&self, filters: &[(String, String)]) -> Result<RawBody, ConsoleError> {
        let token = self.token().await?;
        self.http.export_leads(&token, filters).await
    }
}
