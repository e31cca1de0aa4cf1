use serde::Serialize;

/// Canonical group identifier. Integer-like ids from either source collapse
/// to `Int` so they compare equal regardless of how they were stored.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Int(i64),
    Str(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Group {
    pub id: GroupKey,
    pub name: String,
    pub members: u64,
}

impl Group {
    pub fn new<N>(id: GroupKey, name: N, members: u64) -> Self
    where
        N: Into<String>,
    {
        Group {
            id,
            name: name.into(),
            members,
        }
    }
}

/// A loosely typed value as handed back by SQLite or a JSON document, before
/// normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<rusqlite::types::Value> for RawValue {
    fn from(value: rusqlite::types::Value) -> Self {
        use rusqlite::types::Value;
        match value {
            Value::Null => RawValue::Null,
            Value::Integer(i) => RawValue::Integer(i),
            Value::Real(f) => RawValue::Real(f),
            Value::Text(s) => RawValue::Text(s),
            Value::Blob(b) => RawValue::Bytes(b),
        }
    }
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Integer(i),
                None => n
                    .as_f64()
                    .map(RawValue::Real)
                    .unwrap_or_else(|| RawValue::Text(n.to_string())),
            },
            Value::String(s) => RawValue::Text(s.clone()),
            other => RawValue::Text(other.to_string()),
        }
    }
}
