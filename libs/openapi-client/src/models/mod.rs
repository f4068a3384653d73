//! API models

use serde::{Deserialize, Serialize};

/// Paged collection response
///
/// Every collection endpoint answers with this envelope. `total` and
/// `totalPages` are sometimes omitted, and `error` may be set even on an
/// HTTP 200. Failed listings usually send `data: null` next to `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListEnvelope<T> {
    #[serde(default)]
    pub data: Option<Vec<T>>,

    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default, rename = "totalPages", alias = "total_pages")]
    pub total_pages: Option<u32>,

    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Lead flag toggle request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadToggleRequest {
    pub is_lead: bool,
}

/// Bulk voice account assignment for all bots of an owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceAccountAssignment {
    pub owner_user_id: String,
    pub account: String,
}

/// Permission set of the current session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionsResponse {
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Impersonation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpersonateResponse {
    pub token: String,

    /// String or numeric id, depending on the backend version
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
}

/// Frames exchanged on the real-time channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RealtimeFrame {
    /// Subscribe to a room
    Join { room: String },

    /// Unsubscribe from a room
    Leave { room: String },

    /// Heartbeat
    Ping,

    /// Heartbeat reply
    Pong,

    /// Entity change pushed by the backend
    Event {
        room: String,

        #[serde(default)]
        event: String,

        #[serde(default)]
        data: serde_json::Value,
    },
}
