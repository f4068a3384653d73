//! Session manager

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::authn::permissions::{Capability, Permissions};
use crate::authn::session_token::SessionToken;
use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::http::client::HttpClient;

/// Contents of the session file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Token used for every request
    pub token: String,

    /// Token of the admin session while impersonating someone else
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_token: Option<String>,
}

/// Session manager trait for testability
#[async_trait]
pub trait SessionManagerExt: Send + Sync {
    /// Get the current session token
    async fn get_token(&self) -> Result<SessionToken, ConsoleError>;

    /// Capabilities of the current session
    async fn permissions(&self) -> Result<Permissions, ConsoleError>;

    /// Switch the session to another user, keeping the current token aside
    async fn impersonate(&self, user_id: &str) -> Result<SessionToken, ConsoleError>;

    /// Return to the session that started impersonating
    async fn stop_impersonating(&self) -> Result<SessionToken, ConsoleError>;

    async fn is_impersonating(&self) -> Result<bool, ConsoleError>;
}

#[derive(Clone)]
struct Cached {
    token: SessionToken,
    original: Option<SessionToken>,
}

/// Session manager implementation
pub struct SessionManager {
    session_file: Arc<File>,
    http_client: Arc<HttpClient>,
    fallback_token: Option<SecretString>,
    cached: RwLock<Option<Cached>>,
}

impl SessionManager {
    /// Create a new session manager.
    ///
    /// `fallback_token` is used when no session file exists yet.
    pub fn new(
        session_file: Arc<File>,
        http_client: Arc<HttpClient>,
        fallback_token: Option<SecretString>,
    ) -> Self {
        Self {
            session_file,
            http_client,
            fallback_token,
            cached: RwLock::new(None),
        }
    }

    async fn load(&self) -> Result<Cached, ConsoleError> {
        let record = if self.session_file.exists().await {
            debug!("Loading session from {}", self.session_file.path().display());
            self.session_file.read_json::<SessionRecord>().await?
        } else if let Some(token) = &self.fallback_token {
            SessionRecord {
                token: token.expose_secret().to_string(),
                original_token: None,
            }
        } else {
            return Err(ConsoleError::AuthError(
                "No session found. Set backend.api_token in the settings file".to_string(),
            ));
        };

        let cached = Cached {
            token: SessionToken::from_raw(record.token)?,
            original: record.original_token.map(SessionToken::from_raw).transpose()?,
        };

        *self.cached.write().await = Some(cached.clone());
        Ok(cached)
    }

    async fn current(&self) -> Result<Cached, ConsoleError> {
        {
            let cached = self.cached.read().await;
            if let Some(cached) = cached.as_ref() {
                return Ok(cached.clone());
            }
        }
        self.load().await
    }

    async fn save(&self, token: SessionToken, original: Option<SessionToken>) -> Result<(), ConsoleError> {
        let record = SessionRecord {
            token: token.expose().to_string(),
            original_token: original.as_ref().map(|t| t.expose().to_string()),
        };
        self.session_file.write_private_json(&record).await?;

        *self.cached.write().await = Some(Cached { token, original });
        Ok(())
    }
}

#[async_trait]
impl SessionManagerExt for SessionManager {
    async fn get_token(&self) -> Result<SessionToken, ConsoleError> {
        let token = self.current().await?.token;
        if token.is_expired() {
            return Err(ConsoleError::AuthError(format!(
                "Session for user {} has expired",
                token.user_id()
            )));
        }
        Ok(token)
    }

    async fn permissions(&self) -> Result<Permissions, ConsoleError> {
        let token = self.get_token().await?;
        let mut permissions = Permissions::from_token(&token);

        match self.http_client.fetch_permissions(token.expose()).await {
            Ok(response) => permissions.extend_from_strings(&response.permissions),
            Err(e) => warn!("Using token permissions only, backend lookup failed: {}", e),
        }

        Ok(permissions)
    }

    async fn impersonate(&self, user_id: &str) -> Result<SessionToken, ConsoleError> {
        let current = self.current().await?;
        let permissions = self.permissions().await?;
        permissions.require(Capability::ImpersonateUsers)?;

        info!("Impersonating user {}...", user_id);
        let response = self
            .http_client
            .impersonate(user_id, current.token.expose())
            .await?;
        let token = SessionToken::from_raw(response.token)?;

        // Nested impersonation keeps the first admin token
        let original = current.original.unwrap_or(current.token);
        self.save(token.clone(), Some(original)).await?;

        info!("Now acting as user {}", token.user_id());
        Ok(token)
    }

    async fn stop_impersonating(&self) -> Result<SessionToken, ConsoleError> {
        let current = self.current().await?;
        let Some(original) = current.original else {
            return Err(ConsoleError::ValidationError(
                "Not impersonating anyone".to_string(),
            ));
        };

        self.save(original.clone(), None).await?;
        info!("Restored session of user {}", original.user_id());
        Ok(original)
    }

    async fn is_impersonating(&self) -> Result<bool, ConsoleError> {
        let current = self.current().await?;
        Ok(current.original.is_some() || current.token.is_impersonating())
    }
}
