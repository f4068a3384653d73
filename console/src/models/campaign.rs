//! Campaign models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::entity::{deserialize_id, deserialize_opt_id, Entity, EntityKind};

/// A scheduled batch of automated calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Unique campaign ID
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Current status as last reported
    #[serde(default)]
    pub status: CampaignStatus,

    /// Completion, 0 to 100
    #[serde(default)]
    pub progress_percent: Option<f64>,

    #[serde(default)]
    pub contacts_count: Option<u64>,

    #[serde(default)]
    pub calls_completed: Option<u64>,

    #[serde(default)]
    pub calls_failed: Option<u64>,

    #[serde(default)]
    pub leads_count: Option<u64>,

    /// Scheduled start, as sent by the backend
    #[serde(default)]
    pub scheduled_at: Option<String>,

    /// IANA time zone of `scheduled_at`
    #[serde(default)]
    pub tz: Option<String>,

    /// Bot placing the calls
    #[serde(default, alias = "bot_id", deserialize_with = "deserialize_opt_id")]
    pub bot_ref: Option<String>,

    /// Contact list being called
    #[serde(default, alias = "contact_list_id", deserialize_with = "deserialize_opt_id")]
    pub contact_list_ref: Option<String>,
}

impl Entity for Campaign {
    const KIND: EntityKind = EntityKind::Campaign;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Campaign status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Scheduled,
    #[serde(alias = "running")]
    InProgress,
    Paused,
    Completed,
    Cancelled,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CampaignStatus {
    /// Terminal states accept no further mutation
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CampaignStatus::Completed | CampaignStatus::Cancelled | CampaignStatus::Failed
        )
    }

    /// Actions offered to the user in this state.
    ///
    /// This only decides what is shown. Transition legality is up to the
    /// backend, which rejects stale requests.
    pub fn offered_actions(&self) -> &'static [CampaignAction] {
        match self {
            CampaignStatus::Scheduled | CampaignStatus::InProgress => {
                &[CampaignAction::Pause, CampaignAction::Cancel]
            }
            CampaignStatus::Paused => &[CampaignAction::Resume, CampaignAction::Cancel],
            CampaignStatus::Completed
            | CampaignStatus::Cancelled
            | CampaignStatus::Failed
            | CampaignStatus::Unknown => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::InProgress => "in_progress",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
            CampaignStatus::Failed => "failed",
            CampaignStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-triggered campaign transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CampaignAction {
    Pause,
    Resume,
    Cancel,
}

impl CampaignAction {
    /// Status the campaign is expected to reach
    pub fn target_status(&self) -> CampaignStatus {
        match self {
            CampaignAction::Pause => CampaignStatus::Paused,
            CampaignAction::Resume => CampaignStatus::InProgress,
            CampaignAction::Cancel => CampaignStatus::Cancelled,
        }
    }

    /// Path segment of the action endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignAction::Pause => "pause",
            CampaignAction::Resume => "resume",
            CampaignAction::Cancel => "cancel",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CampaignAction::Pause => "Pause",
            CampaignAction::Resume => "Resume",
            CampaignAction::Cancel => "Cancel",
        }
    }
}

impl fmt::Display for CampaignAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pause" => Ok(CampaignAction::Pause),
            "resume" => Ok(CampaignAction::Resume),
            "cancel" => Ok(CampaignAction::Cancel),
            _ => Err(format!("Invalid campaign action: {}", s)),
        }
    }
}
