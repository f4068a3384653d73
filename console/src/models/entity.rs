//! Shared entity plumbing

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Entity collections exposed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Campaign,
    Lead,
    Call,
    Bot,
    Consumer,
}

impl EntityKind {
    /// Collection endpoint path
    pub fn collection_path(&self) -> &'static str {
        match self {
            EntityKind::Campaign => "/campaigns",
            EntityKind::Lead => "/leads",
            EntityKind::Call => "/calls",
            EntityKind::Bot => "/bots",
            EntityKind::Consumer => "/consumers",
        }
    }

    /// Singular name, used as the real-time room prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Campaign => "campaign",
            EntityKind::Lead => "lead",
            EntityKind::Call => "call",
            EntityKind::Bot => "bot",
            EntityKind::Consumer => "consumer",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "campaign" | "campaigns" => Ok(EntityKind::Campaign),
            "lead" | "leads" => Ok(EntityKind::Lead),
            "call" | "calls" => Ok(EntityKind::Call),
            "bot" | "bots" | "agent" | "agents" => Ok(EntityKind::Bot),
            "consumer" | "consumers" => Ok(EntityKind::Consumer),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

/// A server-defined record the console can list and patch
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Float(n) => n.to_string(),
        }
    }
}

/// Accept identifiers sent either as JSON strings or numbers
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

/// Optional variant of [`deserialize_id`]
pub fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Normalize a JSON id (string or number) the same way record ids are
pub fn id_from_value(value: &serde_json::Value) -> Option<String> {
    RawId::deserialize(value).ok().map(String::from)
}
