//! Lead models

use serde::{Deserialize, Serialize};

use crate::models::entity::{deserialize_id, deserialize_opt_id, Entity, EntityKind};

/// A call result flagged as a qualified contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Conversation summary produced by the bot
    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub recording_url: Option<String>,

    #[serde(default, alias = "bot_id", deserialize_with = "deserialize_opt_id")]
    pub bot_ref: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entity for Lead {
    const KIND: EntityKind = EntityKind::Lead;

    fn id(&self) -> &str {
        &self.id
    }
}
