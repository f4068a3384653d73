//! Shallow merge of partial real-time payloads into displayed records

use serde_json::{Map, Value};

use crate::errors::ConsoleError;
use crate::models::entity::Entity;

/// Merge `patch` over `record` and return the merged record.
///
/// Only fields the record already has are taken from the patch. A field
/// that is missing or `null` in the patch keeps the record's value, and the
/// `id` is never replaced.
pub fn merge_patch<T: Entity>(record: &T, patch: &Map<String, Value>) -> Result<T, ConsoleError> {
    let mut current = match serde_json::to_value(record)? {
        Value::Object(map) => map,
        other => {
            return Err(ConsoleError::Internal(format!(
                "{} did not serialize to an object: {}",
                T::KIND,
                other
            )))
        }
    };

    for (key, value) in patch {
        if key == "id" || value.is_null() {
            continue;
        }
        if let Some(slot) = current.get_mut(key) {
            *slot = value.clone();
        }
    }

    Ok(serde_json::from_value(Value::Object(current))?)
}
