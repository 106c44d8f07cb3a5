//! Wire format of the background-removal workflow API.
//!
//! The workflow answers with a JSON envelope whose `data` field is itself a
//! JSON document serialized into a string:
//!
//! ```text
//! { "code": 0, "msg": "Success", "data": "{\"output\":\"https://...\"}" }
//! ```
//!
//! Everything that has to know about that double encoding lives here.

use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    output: Option<String>,
}

/// Body of a workflow run request.
pub fn workflow_request_body(workflow_id: &str, parameters: Value) -> Value {
    json!({
        "workflow_id": workflow_id,
        "parameters": parameters,
    })
}

/// Extract the output URL from a workflow response body.
///
/// # Errors
///
/// Returns `Error::RemoteProcessingFailed` when the body is not JSON, `data`
/// is missing or not a string, the inner document is not JSON, or `output`
/// is missing or not a URL.
pub fn parse_workflow_response(body: &[u8]) -> Result<Url> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| malformed(format!("response is not a JSON envelope: {e}")))?;

    let inner = match envelope.data {
        Some(Value::String(inner)) => inner,
        Some(other) => {
            return Err(malformed(format!(
                "expected `data` to be an encoded JSON string, got {}",
                value_kind(&other)
            )))
        }
        None => {
            let detail = match (envelope.code, envelope.msg) {
                (Some(code), Some(msg)) => format!(" (code {code}: {msg})"),
                (None, Some(msg)) => format!(" ({msg})"),
                (Some(code), None) => format!(" (code {code})"),
                (None, None) => String::new(),
            };
            return Err(malformed(format!("response has no `data` field{detail}")));
        }
    };

    let payload: Payload = serde_json::from_str(&inner)
        .map_err(|e| malformed(format!("`data` is not valid JSON: {e}")))?;

    let output = payload
        .output
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| malformed("`data` has no `output` URL".to_string()))?;

    Url::parse(output.trim())
        .map_err(|e| malformed(format!("`output` is not a valid URL ({output}): {e}")))
}

fn malformed(message: String) -> Error {
    Error::RemoteProcessingFailed(message)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
