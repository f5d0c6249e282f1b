use serde_json::{Map, Value};

/// Any successful response body: a JSON object with loosely-typed values.
///
/// Strongly-typed views are left to callers, e.g. via
/// `serde_json::from_value(Value::Object(obj))`.
pub type ApiObject = Map<String, Value>;

/// Query-string pairs. Pairs with an empty value are not sent.
pub type Query<'a> = [(&'a str, &'a str)];

/// Pull a string out of a JSON object, or `""` if missing or not a string.
pub fn json_str<'a>(obj: &'a ApiObject, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

/// The `status` field every pollable resource carries.
pub fn status_of(obj: &ApiObject) -> &str {
    json_str(obj, "status")
}

/// Parse a raw response body. Empty, invalid, or non-object JSON yields an
/// empty object.
pub(crate) fn object_from_bytes(bytes: &[u8]) -> ApiObject {
    if bytes.is_empty() {
        return ApiObject::new();
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(obj)) => obj,
        _ => ApiObject::new(),
    }
}
