//! Application state management

use std::sync::Arc;

use openapi_client::models::RealtimeFrame;
use tokio::sync::mpsc;
use tracing::info;

use crate::actions::dispatcher::ActionDispatcher;
use crate::app::options::AppOptions;
use crate::authn::permissions::Permissions;
use crate::authn::session::{SessionManager, SessionManagerExt};
use crate::errors::ConsoleError;
use crate::http::backend::Backend;
use crate::http::client::HttpClient;
use crate::models::entity::Entity;
use crate::notify::Notifier;
use crate::realtime::hub::RealtimeHub;
use crate::sync::controller::ListController;
use crate::sync::query::ListQuery;

/// Main application state
pub struct AppState {
    /// HTTP client for backend communication
    pub http_client: Arc<HttpClient>,

    /// Session manager for authentication
    pub session: Arc<SessionManager>,

    /// Authenticated backend facade
    pub backend: Arc<Backend>,

    /// User notifications
    pub notifier: Notifier,

    /// Real-time room registry
    pub hub: RealtimeHub,
}

impl AppState {
    /// Initialize application state.
    ///
    /// Also returns the queue of outbound real-time frames, to be handed to
    /// the real-time worker.
    pub fn init(
        options: &AppOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RealtimeFrame>), ConsoleError> {
        info!("Initializing application state...");

        let http_client = Arc::new(HttpClient::new(
            &options.backend_base_url,
            options.request_timeout,
        )?);

        let session = Arc::new(SessionManager::new(
            Arc::new(options.layout.session_file()),
            http_client.clone(),
            options.fallback_token.clone(),
        ));

        let backend = Arc::new(Backend::new(http_client.clone(), session.clone()));
        let (hub, outbound) = RealtimeHub::new();

        let state = Self {
            http_client,
            session,
            backend,
            notifier: Notifier::default(),
            hub,
        };

        Ok((state, outbound))
    }

    /// Capabilities of the current session
    pub async fn permissions(&self) -> Result<Permissions, ConsoleError> {
        self.session.permissions().await
    }

    /// Dispatcher bound to the session's capabilities
    pub async fn dispatcher(&self) -> Result<ActionDispatcher, ConsoleError> {
        let permissions = self.permissions().await?;
        Ok(ActionDispatcher::new(
            self.backend.clone(),
            permissions,
            self.notifier.clone(),
        ))
    }

    /// List controller fed by the backend
    pub fn controller<T: Entity>(&self, query: ListQuery) -> ListController<T> {
        ListController::new(self.backend.clone(), self.notifier.clone(), query)
    }
}
