//! Call API client

use openapi_client::models::LeadToggleRequest;
use serde_json::Value;

use crate::errors::ConsoleError;
use crate::http::client::{path_id, HttpClient};
use crate::http::response::{interpret_action, ActionAck};

impl HttpClient {
    /// Mark or unmark a call as a lead
    pub async fn set_call_lead(
        &self,
        call_id: &str,
        is_lead: bool,
        token: &str,
    ) -> Result<ActionAck, ConsoleError> {
        let path = format!("/calls/{}/lead", path_id(call_id)?);
        let body: Value = self
            .patch(&path, token, &LeadToggleRequest { is_lead })
            .await?;
        interpret_action(&body)
    }
}
