//! Settings file management

use secrecy::SecretString;
use serde::Deserialize;

use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Console settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Also write logs to the logs directory
    #[serde(default)]
    pub log_to_file: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Real-time channel configuration
    #[serde(default)]
    pub realtime: RealtimeSettings,

    /// List view configuration
    #[serde(default)]
    pub lists: ListSettings,

    /// Export configuration
    #[serde(default)]
    pub export: ExportSettings,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_to_file: false,
            backend: BackendSettings::default(),
            realtime: RealtimeSettings::default(),
            lists: ListSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl Settings {
    /// Read the settings file, falling back to defaults when it is missing
    pub async fn load(file: &File) -> Result<Self, ConsoleError> {
        if !file.exists().await {
            tracing::debug!("No settings file at {}, using defaults", file.path().display());
            return Ok(Self::default());
        }
        file.read_json().await.map_err(|e| {
            ConsoleError::ConfigError(format!(
                "Unable to read {}: {}",
                file.path().display(),
                e
            ))
        })
    }
}

/// Backend API settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Bearer token used when no session file exists
    #[serde(default)]
    pub api_token: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Real-time channel settings
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            heartbeat_secs: default_heartbeat_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

/// List view settings
#[derive(Debug, Clone, Deserialize)]
pub struct ListSettings {
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

fn default_page_size() -> u32 {
    crate::sync::query::DEFAULT_PAGE_SIZE
}

fn default_search_debounce_ms() -> u64 {
    500
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

/// Export settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSettings {
    /// Bodies smaller than this are treated as header-only
    #[serde(default = "default_min_bytes")]
    pub min_bytes: usize,

    /// Where exports are written; the layout's exports directory if unset
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_min_bytes() -> usize {
    crate::export::MIN_EXPORT_BYTES
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            min_bytes: default_min_bytes(),
            directory: None,
        }
    }
}
