//! Structured values.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// A structured value flowing through the pipeline.
///
/// Inputs, outputs and error fields are all represented as `Value`s shaped
/// by the operation's structures. Structures and maps keep insertion order
/// so serialized output is deterministic.
///
/// # Example
///
/// ```
/// use hermes_core::Value;
///
/// let input = Value::structure()
///     .with("Bucket", "photos")
///     .with("MaxKeys", 50_i64);
///
/// assert_eq!(input.get("Bucket").and_then(Value::as_str), Some("photos"));
/// assert_eq!(input.get("MaxKeys").and_then(Value::as_i64), Some(50));
/// assert!(input.get("Prefix").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / null.
    #[default]
    Null,
    /// Boolean.
    Boolean(bool),
    /// Any integral number.
    Integer(i64),
    /// Any floating point number.
    Float(f64),
    /// String or enum value.
    String(String),
    /// Raw bytes.
    Blob(Bytes),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// List.
    List(Vec<Value>),
    /// String-keyed map.
    Map(IndexMap<String, Value>),
    /// Structure or union, keyed by member name.
    Structure(IndexMap<String, Value>),
    /// Untyped document.
    Document(serde_json::Value),
}

impl Value {
    /// Creates an empty structure.
    #[must_use]
    pub fn structure() -> Self {
        Self::Structure(IndexMap::new())
    }

    /// Sets a member and returns the structure, for literal construction.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a member of a structure or an entry of a map.
    ///
    /// Setting on any other variant turns it into a structure first.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        match self {
            Self::Structure(fields) | Self::Map(fields) => {
                fields.insert(name.into(), value.into());
            }
            other => {
                let mut fields = IndexMap::new();
                fields.insert(name.into(), value.into());
                *other = Self::Structure(fields);
            }
        }
    }

    /// Removes a member, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        match self {
            Self::Structure(fields) | Self::Map(fields) => fields.shift_remove(name),
            _ => None,
        }
    }

    /// Returns a member; `None` if absent, null, or this is not a structure/map.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Structure(fields) | Self::Map(fields) => {
                fields.get(name).filter(|v| !v.is_null())
            }
            _ => None,
        }
    }

    /// Returns the fields of a structure or map.
    #[must_use]
    pub fn fields(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Structure(fields) | Self::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string contents.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean contents.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer contents.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric contents as a float.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the list contents.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the timestamp contents.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Returns the blob contents.
    #[must_use]
    pub const fn as_blob(&self) -> Option<&Bytes> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Returns a short name of the variant for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Blob(_) => "blob",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Structure(_) => "structure",
            Self::Document(_) => "document",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Self::Blob(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
