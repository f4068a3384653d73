//! Lead API client

use serde_json::Value;

use crate::errors::ConsoleError;
use crate::http::client::{path_id, HttpClient, RawBody};
use crate::http::response::{interpret_action, ActionAck};

impl HttpClient {
    /// Delete a lead
    pub async fn delete_lead(&self, lead_id: &str, token: &str) -> Result<ActionAck, ConsoleError> {
        let path = format!("/leads/{}", path_id(lead_id)?);
        let body: Value = self.delete(&path, token).await?;
        interpret_action(&body)
    }

    /// Request a CSV export of the leads matching `filters`
    pub async fn export_leads(
        &self,
        token: &str,
        filters: &[(String, String)],
    ) -> Result<RawBody, ConsoleError> {
        self.get_raw("/leads/export", token, filters).await
    }
}
