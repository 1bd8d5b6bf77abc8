//! Journal record definitions
//!
//! Defines the structure of individual journal lines and the codec that
//! turns them into text and back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Result, StoreError};

/// Reserved key carrying the primary key of a record
pub const ID_KEY: &str = "_id";

/// Reserved key marking a tombstone (always `true` when present)
pub const DELETED_KEY: &str = "_deleted";

/// Reserved key on an upsert written by a rekey, naming the retired id
pub const REKEYED_FROM_KEY: &str = "_rekeyed_from";

/// Field bag of one live record
pub type Fields = BTreeMap<String, Value>;

/// A field value.
///
/// The journal only admits strings, integers, booleans, arrays of strings
/// and nested maps of these. Anything else in a journal line (null, floats,
/// mixed arrays) fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(str::to_string).collect())
    }
}

/// One line of a journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Set or overwrite `id`. `rekeyed_from` is set when the entity used to
    /// live under another id, which this record retires.
    Upsert {
        id: String,
        fields: Fields,
        rekeyed_from: Option<String>,
    },

    /// Logically delete `id`
    Tombstone { id: String },
}

impl Record {
    pub fn upsert(id: impl Into<String>, fields: Fields) -> Self {
        Record::Upsert {
            id: id.into(),
            fields,
            rekeyed_from: None,
        }
    }

    pub fn tombstone(id: impl Into<String>) -> Self {
        Record::Tombstone { id: id.into() }
    }

    /// Primary key the record applies to
    pub fn id(&self) -> &str {
        match self {
            Record::Upsert { id, .. } | Record::Tombstone { id } => id,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Record::Tombstone { .. })
    }

    /// Encode as a single JSON object (no trailing newline)
    pub fn encode(&self) -> Result<String> {
        let mut object = serde_json::Map::new();
        match self {
            Record::Upsert {
                id,
                fields,
                rekeyed_from,
            } => {
                check_field_names(fields)?;
                for (name, value) in fields {
                    object.insert(name.clone(), serde_json::to_value(value)?);
                }
                object.insert(ID_KEY.to_string(), JsonValue::String(id.clone()));
                if let Some(old) = rekeyed_from {
                    object.insert(REKEYED_FROM_KEY.to_string(), JsonValue::String(old.clone()));
                }
            }
            Record::Tombstone { id } => {
                object.insert(ID_KEY.to_string(), JsonValue::String(id.clone()));
                object.insert(DELETED_KEY.to_string(), JsonValue::Bool(true));
            }
        }
        Ok(serde_json::to_string(&object)?)
    }

    /// Decode one journal line
    pub fn decode(line: &str) -> Result<Self> {
        let mut object: serde_json::Map<String, JsonValue> = serde_json::from_str(line)
            .map_err(|e| malformed(format!("not a JSON object: {}", e)))?;

        let id = match object.remove(ID_KEY) {
            Some(JsonValue::String(id)) if !id.is_empty() => id,
            Some(other) => return Err(malformed(format!("bad `{}`: {}", ID_KEY, other))),
            None => return Err(malformed(format!("missing `{}`", ID_KEY))),
        };

        match object.remove(DELETED_KEY) {
            Some(JsonValue::Bool(true)) => {
                if let Some(extra) = object.keys().next() {
                    return Err(malformed(format!(
                        "tombstone for '{}' carries field '{}'",
                        id, extra
                    )));
                }
                return Ok(Record::Tombstone { id });
            }
            Some(other) => {
                return Err(malformed(format!("bad `{}`: {}", DELETED_KEY, other)));
            }
            None => {}
        }

        let rekeyed_from = match object.remove(REKEYED_FROM_KEY) {
            Some(JsonValue::String(old)) if !old.is_empty() => Some(old),
            Some(other) => {
                return Err(malformed(format!("bad `{}`: {}", REKEYED_FROM_KEY, other)));
            }
            None => None,
        };

        let mut fields = Fields::new();
        for (name, raw) in object {
            if is_reserved(&name) {
                return Err(malformed(format!("unknown reserved key '{}'", name)));
            }
            let value: Value = serde_json::from_value(raw)
                .map_err(|_| malformed(format!("field '{}' of '{}' has an unsupported value", name, id)))?;
            fields.insert(name, value);
        }

        Ok(Record::Upsert {
            id,
            fields,
            rekeyed_from,
        })
    }
}

/// Reject field names that collide with the reserved record keys
pub fn check_field_names(fields: &Fields) -> Result<()> {
    match fields.keys().find(|name| is_reserved(name)) {
        Some(name) => Err(StoreError::validation(format!(
            "field name '{}' is reserved",
            name
        ))),
        None => Ok(()),
    }
}

fn is_reserved(name: &str) -> bool {
    name.starts_with('_')
}

fn malformed(reason: String) -> StoreError {
    StoreError::InconsistentJournal(reason)
}
