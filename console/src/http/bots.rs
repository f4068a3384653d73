//! Bot API client

use openapi_client::models::VoiceAccountAssignment;
use serde_json::Value;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::http::response::{interpret_action, ActionAck};

impl HttpClient {
    /// Assign a voice provider account to every bot of one owner
    pub async fn assign_voice_account(
        &self,
        assignment: &VoiceAccountAssignment,
        token: &str,
    ) -> Result<ActionAck, ConsoleError> {
        let body: Value = self.put("/bots/voice-account", token, assignment).await?;
        interpret_action(&body)
    }
}
