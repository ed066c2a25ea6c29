//! W3C WebDriver wire format.

use harvest_core::{LocatorSpec, Strategy};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::DriverError;

/// Key under which the remote end returns element references.
pub(crate) const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Every WebDriver response body is `{"value": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub value: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Error codes that mean the element went away between lookup and use.
pub(crate) fn is_stale(err: &DriverError) -> bool {
    matches!(
        err,
        DriverError::Remote { error, .. }
            if error == "stale element reference" || error == "no such element"
    )
}

/// `POST /elements` body. `id` and `name` have no W3C strategy of their own
/// and are expressed as attribute selectors.
pub(crate) fn find_elements_body(locator: &LocatorSpec) -> Value {
    let selector = locator.selector.as_str();
    let (using, value) = match locator.by {
        Strategy::Css => ("css selector", selector.to_string()),
        Strategy::Xpath => ("xpath", selector.to_string()),
        Strategy::Id => ("css selector", format!("[id=\"{}\"]", escape_attr(selector))),
        Strategy::Name => (
            "css selector",
            format!("[name=\"{}\"]", escape_attr(selector)),
        ),
        Strategy::Tag => ("tag name", selector.to_string()),
        Strategy::LinkText => ("link text", selector.to_string()),
    };
    json!({ "using": using, "value": value })
}

fn escape_attr(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Element ids from a `find elements` response, in document order.
pub(crate) fn element_ids(elements: &[Value]) -> Vec<String> {
    elements
        .iter()
        .filter_map(|e| e.get(ELEMENT_KEY).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Maps an error response to a [`DriverError`].
pub(crate) fn classify_error(command: &str, status: u16, body: &str) -> DriverError {
    match serde_json::from_str::<Envelope<WireError>>(body) {
        Ok(Envelope { value }) => match value.error.as_str() {
            "invalid session id" | "session not created" => DriverError::Session {
                reason: format!("{}: {}", value.error, value.message),
            },
            "timeout" | "script timeout" => DriverError::Timeout {
                context: command.to_string(),
            },
            _ => DriverError::Remote {
                command: command.to_string(),
                error: value.error,
                message: value.message,
            },
        },
        Err(_) => DriverError::Remote {
            command: command.to_string(),
            error: format!("HTTP {status}"),
            message: body.chars().take(200).collect(),
        },
    }
}

/// Renders a property value the way an attribute would read.
pub(crate) fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
