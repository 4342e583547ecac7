//! Response shapes accepted from the reply webhook.
//!
//! Webhook providers wrap their answer differently. Each matcher looks for
//! one known shape; they are tried in order and the first hit wins.

use serde_json::Value;

/// A recognizer for one response shape.
pub type ShapeMatcher = fn(&Value) -> Option<String>;

/// Accepted shapes, in priority order.
pub const SHAPES: &[(&str, ShapeMatcher)] = &[
    ("reply", direct_reply),
    ("response", response_alias),
    ("envelope.reply", envelope_reply),
    ("envelope.confirmation", envelope_confirmation),
];

/// Extract the reply text, returning the matching shape name with it.
pub fn extract_reply(body: &Value) -> Option<(&'static str, String)> {
    SHAPES
        .iter()
        .find_map(|(name, matcher)| matcher(body).map(|text| (*name, text)))
}

/// `{"reply": "..."}`
fn direct_reply(body: &Value) -> Option<String> {
    string_field(body, "reply")
}

/// `{"response": "..."}`
fn response_alias(body: &Value) -> Option<String> {
    string_field(body, "response")
}

/// `[{"json": {"reply": "..."}}]`, the n8n item envelope.
fn envelope_reply(body: &Value) -> Option<String> {
    envelope_json(body).and_then(|json| string_field(json, "reply"))
}

/// `[{"json": {"confirmation": "..."}}]`
fn envelope_confirmation(body: &Value) -> Option<String> {
    envelope_json(body).and_then(|json| string_field(json, "confirmation"))
}

fn envelope_json(body: &Value) -> Option<&Value> {
    body.as_array()?.first()?.get("json")
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}
