//! Utility functions

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ConsoleError;

/// Version information for the console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// WebSocket URL for a backend base URL: `http(s)` becomes `ws(s)` and
/// `suffix` is appended to the existing path.
pub fn websocket_url(base_url: &str, suffix: &str) -> Result<Url, ConsoleError> {
    let mut url = Url::parse(base_url).map_err(|e| ConsoleError::ConfigError(e.to_string()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ConsoleError::ConfigError(format!(
                "Invalid backend URL scheme: {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ConsoleError::ConfigError("Failed to set scheme".to_string()))?;

    let path = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        suffix.trim_start_matches('/')
    );
    url.set_path(&path);
    url.set_query(None);

    Ok(url)
}

/// Truncate `text` to at most `max` characters, marking the cut with `…`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
