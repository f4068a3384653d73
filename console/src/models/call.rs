//! Call models

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::entity::{deserialize_id, deserialize_opt_id, Entity, EntityKind};

/// A single placed call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default, alias = "status")]
    pub call_status: CallStatus,

    /// The only field the console may change
    #[serde(default)]
    pub is_lead: bool,

    /// Duration in decimal minutes
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default, alias = "bot_id", deserialize_with = "deserialize_opt_id")]
    pub bot_ref: Option<String>,
}

impl Entity for Call {
    const KIND: EntityKind = EntityKind::Call;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Call status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallStatus::Pending => "pending",
            CallStatus::InProgress => "in_progress",
            CallStatus::Completed => "completed",
            CallStatus::Failed => "failed",
            CallStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Format decimal minutes as `m:ss`
pub fn format_duration(minutes: f64) -> String {
    let total_secs = (minutes.max(0.0) * 60.0).round() as u64;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
