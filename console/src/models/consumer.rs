//! Consumer (end customer account) models

use serde::{Deserialize, Serialize};

use crate::models::entity::{deserialize_id, deserialize_opt_id, Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default, alias = "reseller_id", deserialize_with = "deserialize_opt_id")]
    pub reseller_ref: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entity for Consumer {
    const KIND: EntityKind = EntityKind::Consumer;

    fn id(&self) -> &str {
        &self.id
    }
}
