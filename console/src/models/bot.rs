//! Bot (agent) models

use serde::{Deserialize, Serialize};

use crate::models::entity::{deserialize_id, deserialize_opt_id, Entity, EntityKind};

/// A configured conversational calling profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub company_name: Option<String>,

    #[serde(default)]
    pub goal: Option<String>,

    #[serde(default)]
    pub voice: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default, alias = "user_id", deserialize_with = "deserialize_opt_id")]
    pub owner_user_id: Option<String>,

    /// Identifier of the bot on the external voice provider
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub vapi_id: Option<String>,

    /// Shared voice account currently assigned
    #[serde(default)]
    pub account_in_use: Option<String>,
}

impl Entity for Bot {
    const KIND: EntityKind = EntityKind::Bot;

    fn id(&self) -> &str {
        &self.id
    }
}
