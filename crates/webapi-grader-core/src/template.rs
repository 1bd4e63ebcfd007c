//! Mustache-style parameter substitution over nested values.
//!
//! Only variable tags are supported:
//! - `{{name}}` inserts the value HTML-escaped
//! - `{{{name}}}` and `{{& name}}` insert it verbatim
//! - `{{! comment}}` renders as nothing
//!
//! Names may be dotted (`user.id`, `items.0`). Missing names render as the
//! empty string. Other tag kinds (sections, partials, delimiter changes) are
//! left in the output untouched.

use crate::types::Params;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

/// Render every string leaf of `target` with `params`.
///
/// Arrays keep their length and order, objects keep exactly their keys, and
/// non-string scalars are returned unchanged.
#[must_use]
pub fn render(target: &Value, params: &Params) -> Value {
    match target {
        Value::String(s) => Value::String(render_str(s, params)),
        Value::Array(items) => Value::Array(items.iter().map(|item| render(item, params)).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), render(value, params)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Static regex matching `{{{name}}}` and `{{<sigil> name}}` tags.
fn tag_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\{\s*([^}]*?)\s*\}\}\}|\{\{\s*([!&#^/>=]?)\s*([^}]*?)\s*\}\}").ok()
    })
    .as_ref()
}

/// Render one template string.
#[must_use]
pub fn render_str(template: &str, params: &Params) -> String {
    let Some(re) = tag_regex() else {
        return template.to_string();
    };

    re.replace_all(template, |caps: &Captures<'_>| {
        if let Some(raw) = caps.get(1) {
            return lookup_text(params, raw.as_str());
        }
        let name = caps.get(3).map_or("", |m| m.as_str());
        match caps.get(2).map_or("", |m| m.as_str()) {
            "!" => String::new(),
            "&" => lookup_text(params, name),
            "" if !name.contains('{') => escape_html(&lookup_text(params, name)),
            // Sections, partials, delimiter changes and `{{{name}}`
            _ => caps[0].to_string(),
        }
    })
    .into_owned()
}

/// Escape text the way mustache.js does for `{{name}}`.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '/' => escaped.push_str("&#x2F;"),
            '`' => escaped.push_str("&#x60;"),
            '=' => escaped.push_str("&#x3D;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn lookup_text(params: &Params, name: &str) -> String {
    lookup(params, name).map(value_text).unwrap_or_default()
}

fn lookup<'a>(params: &'a Params, name: &str) -> Option<&'a Value> {
    let mut segments = name.split('.');
    let first = params.get(segments.next()?)?;
    segments.try_fold(first, |value, segment| match value {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => value.get(segment),
    })
}

/// Text form of a parameter value as inserted into a template.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
