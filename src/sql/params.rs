//! Parameters are bound as text and cast in SQL (`$1::integer`), so one bind type
//! covers every column.

use serde_json::Value;

/// Text form of a JSON value for binding. `None` binds SQL NULL.
pub fn to_sql_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}
