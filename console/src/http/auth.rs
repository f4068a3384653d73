//! Auth and impersonation API client

use openapi_client::models::{ImpersonateResponse, PermissionsResponse};
use serde_json::{json, Value};

use crate::errors::ConsoleError;
use crate::http::client::{path_id, HttpClient};
use crate::http::response::backend_message;

impl HttpClient {
    /// Permission strings granted to the bearer of `token`
    pub async fn fetch_permissions(&self, token: &str) -> Result<PermissionsResponse, ConsoleError> {
        self.get("/auth/permissions", token, &[]).await
    }

    /// Obtain a session token for another user
    pub async fn impersonate(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<ImpersonateResponse, ConsoleError> {
        let path = format!("/admin/impersonate/{}", path_id(user_id)?);
        let body: Value = self.post(&path, token, &json!({})).await?;

        // Some deployments wrap the token in `data`
        let payload = match body.get("data") {
            Some(data) if data.get("token").is_some() => data.clone(),
            _ => body.clone(),
        };

        serde_json::from_value(payload).map_err(|_| {
            ConsoleError::AuthError(
                backend_message(&body).unwrap_or_else(|| "Impersonation was refused".to_string()),
            )
        })
    }
}
