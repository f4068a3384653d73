//! Normalization of backend response shapes
//!
//! The backend does not signal success consistently. Every heuristic used to
//! read its responses lives here so call sites only ever see a `Result`.

use openapi_client::models::ListEnvelope;
use serde_json::Value;

use crate::errors::ConsoleError;
use crate::models::page::Page;

/// Shown when the backend gives no usable message
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Acknowledged action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionAck {
    /// Backend message, if any
    pub message: Option<String>,

    /// Authoritative record returned with the acknowledgement
    pub data: Option<Value>,
}

/// Message carried by a response body: `error` first, then `message`
pub fn backend_message(body: &Value) -> Option<String> {
    let from_error = match body.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(o)) => o
            .get("message")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .or_else(|| Some(Value::Object(o.clone()).to_string())),
        Some(other) => Some(other.to_string()),
    };

    from_error.or_else(|| {
        body.get("message")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
    })
}

fn is_truthy_flag(value: Option<&Value>) -> Option<bool> {
    match value {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Some(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Decide whether a state-transition response means success.
///
/// In order:
/// 1. `success` is `true` or `"true"`: success
/// 2. a non-null `error`: failure carrying that message
/// 3. `success` is `false` or `"false"`: failure
/// 4. an object with `data` or `id`: success
/// 5. anything else: failure
pub fn interpret_action(body: &Value) -> Result<ActionAck, ConsoleError> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(|s| s.to_string());
    let data = match body.get("data") {
        Some(Value::Null) | None => None,
        Some(v) => Some(v.clone()),
    };

    let success_flag = is_truthy_flag(body.get("success"));
    if success_flag == Some(true) {
        return Ok(ActionAck { message, data });
    }

    let has_error = !matches!(body.get("error"), None | Some(Value::Null));
    if has_error || success_flag == Some(false) {
        let reason = backend_message(body).unwrap_or_else(|| GENERIC_FAILURE.to_string());
        return Err(ConsoleError::ActionFailed(reason));
    }

    if body.is_object() && (body.get("data").is_some() || body.get("id").is_some()) {
        // A bare record is taken as the authoritative result
        let data = data.or_else(|| body.get("id").map(|_| body.clone()));
        return Ok(ActionAck { message, data });
    }

    Err(ConsoleError::ActionFailed(
        message.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
    ))
}

/// Turn a collection envelope into a displayable page
pub fn normalize_list<T>(envelope: ListEnvelope<T>, page_size: u32) -> Result<Page<T>, ConsoleError> {
    if let Some(error) = envelope.error.as_ref().filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => backend_message(&serde_json::json!({ "error": other }))
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        };
        return Err(ConsoleError::Backend {
            status: None,
            message,
        });
    }

    Ok(Page::new(
        envelope.data.unwrap_or_default(),
        envelope.total,
        envelope.total_pages,
        page_size,
    ))
}
