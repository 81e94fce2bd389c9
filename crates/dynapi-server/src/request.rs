//! Request input decoding.
//!
//! Handlers see one JSON object built from the query string and the body, with body
//! fields taking precedence. Form bodies use bracket notation for nesting
//! (`data[name]=alice&filters[status]=active`); every other body is parsed as JSON.

use serde_json::{Map, Value};

/// Merged request fields.
pub type RequestInput = Map<String, Value>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Build the input object from the raw query string and body.
///
/// An empty or malformed body, or a JSON body that is not an object, contributes
/// nothing.
pub fn decode_input(query: Option<&str>, content_type: Option<&str>, body: &[u8]) -> RequestInput {
    let mut input = query
        .map(|q| decode_form(q.as_bytes()))
        .unwrap_or_default();

    let body = if is_form(content_type) {
        decode_form(body)
    } else {
        decode_json(body)
    };
    input.extend(body);
    input
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

fn decode_json(body: &[u8]) -> RequestInput {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Map::new();
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::debug!(kind = json_kind(&other), "ignoring non-object JSON body");
            Map::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed JSON body");
            Map::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode `application/x-www-form-urlencoded` pairs with bracket nesting.
///
/// `a[b][c]=1` nests objects, `tags[]=x&tags[]=y` builds an array, and a repeated plain
/// key keeps its last value. A key whose nesting conflicts with an earlier scalar
/// replaces it.
pub fn decode_form(raw: &[u8]) -> RequestInput {
    let mut out = Map::new();
    for (key, value) in url::form_urlencoded::parse(raw) {
        let path = split_key(&key);
        let Some((head, rest)) = path.split_first() else {
            continue;
        };
        if head.is_empty() {
            continue;
        }
        let slot = out.entry(head.to_string()).or_insert(Value::Null);
        insert_path(slot, rest, Value::String(value.into_owned()));
    }
    out
}

/// `data[name][first]` -> `["data", "name", "first"]`. Malformed brackets keep the
/// whole key as a single segment.
fn split_key(key: &str) -> Vec<&str> {
    let Some(open) = key.find('[') else {
        return vec![key];
    };
    let (head, mut rest) = key.split_at(open);
    let mut parts = vec![head];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return vec![key];
        };
        parts.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }
    if !rest.is_empty() {
        return vec![key];
    }
    parts
}

fn insert_path(slot: &mut Value, path: &[&str], value: Value) {
    let Some((segment, rest)) = path.split_first() else {
        *slot = value;
        return;
    };

    if segment.is_empty() {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(items) = slot {
            let mut item = Value::Null;
            insert_path(&mut item, rest, value);
            items.push(item);
        }
        return;
    }

    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        let child = map.entry(segment.to_string()).or_insert(Value::Null);
        insert_path(child, rest, value);
    }
}

/// Whether a field counts as supplied.
///
/// Missing, `null`, `false`, `""`, `[]` and `{}` are absent; every number (including
/// `0`) is present. This is a deliberate middle ground: a plain truthiness check would
/// reject key value `0`, and a null-only check would accept an empty string as a key.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Bool(true)) | Some(Value::Number(_)) => true,
    }
}

/// The field when it counts as present.
pub fn present<'a>(input: &'a RequestInput, key: &str) -> Option<&'a Value> {
    input.get(key).filter(|v| is_present(Some(v)))
}
