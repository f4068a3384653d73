//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::export::ExportOptions;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::workers::realtime;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Backend API base URL
    pub backend_base_url: String,

    /// Request timeout for backend calls
    pub request_timeout: Duration,

    /// Token used when no session file exists
    pub fallback_token: Option<SecretString>,

    /// Storage layout paths
    pub layout: StorageLayout,

    /// Rows per page
    pub page_size: u32,

    /// Quiet period before search text is applied
    pub search_debounce: Duration,

    /// Export configuration
    pub export: ExportOptions,

    /// Enable the real-time worker in watch mode
    pub enable_realtime: bool,

    /// Real-time worker options
    pub realtime_worker: realtime::Options,
}

impl AppOptions {
    /// Build options from the settings file
    pub fn from_settings(settings: &Settings, layout: StorageLayout) -> Self {
        let export_dir = settings
            .export
            .directory
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| layout.exports_dir().path().to_path_buf());

        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: settings.backend.base_url.clone(),
            request_timeout: Duration::from_secs(settings.backend.timeout_secs.max(1)),
            fallback_token: settings.backend.api_token.clone(),
            page_size: settings.lists.page_size.max(1),
            search_debounce: Duration::from_millis(settings.lists.search_debounce_ms),
            export: ExportOptions {
                directory: export_dir,
                min_bytes: settings.export.min_bytes,
            },
            enable_realtime: settings.realtime.enabled,
            realtime_worker: realtime::Options {
                reconnect_delay: Duration::from_secs(settings.realtime.reconnect_delay_secs.max(1)),
                heartbeat_interval: Duration::from_secs(settings.realtime.heartbeat_secs.max(1)),
            },
            layout,
        }
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), StorageLayout::default())
    }
}

/// Lifecycle options for the console
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(10),
        }
    }
}
