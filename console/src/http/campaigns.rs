//! Campaign API client

use serde_json::{json, Value};

use crate::errors::ConsoleError;
use crate::http::client::{path_id, HttpClient};
use crate::http::response::{interpret_action, ActionAck};
use crate::models::campaign::CampaignAction;

impl HttpClient {
    /// Pause, resume or cancel a campaign
    pub async fn campaign_action(
        &self,
        campaign_id: &str,
        action: CampaignAction,
        token: &str,
    ) -> Result<ActionAck, ConsoleError> {
        let path = format!("/campaigns/{}/{}", path_id(campaign_id)?, action.as_str());
        let body: Value = self.post(&path, token, &json!({})).await?;
        interpret_action(&body)
    }
}
