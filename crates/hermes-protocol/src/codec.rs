//! Structured-document codec.
//!
//! Aggregate values bound to the body (document members, structure payloads)
//! are encoded and decoded through a [`DocumentCodec`]. [`JsonCodec`] is the
//! REST + JSON implementation.

use crate::timestamp::{epoch_seconds, format_timestamp, parse_timestamp};
use crate::wire::{format_float, parse_float};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use hermes_core::{Member, Shape, ShapeKind, TimestampFormat, Value};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};
use thiserror::Error;

/// A document could not be encoded or decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {message}")]
pub struct CodecError {
    /// Location inside the document, e.g. `$.Items[2].Name`.
    pub path: String,
    /// What went wrong.
    pub message: String,
}

impl CodecError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Encodes and decodes aggregate values for the body.
pub trait DocumentCodec: Send + Sync {
    /// Content type of encoded documents.
    fn content_type(&self) -> &str;

    /// Encodes a value shaped by `shape`.
    fn encode(&self, value: &Value, shape: &Shape) -> Result<Bytes, CodecError>;

    /// Decodes a body into a value shaped by `shape`.
    fn decode(&self, body: &[u8], shape: &Shape) -> Result<Value, CodecError>;
}

/// JSON document codec.
///
/// - structure members are keyed by their document name (`json_name` or member name)
/// - blobs are base64 strings
/// - timestamps use the member's format, else the codec default
/// - unions are single-key objects; unknown union members are ignored on decode
/// - documents pass through verbatim
///
/// # Example
///
/// ```
/// use hermes_core::{Member, Shape, Value};
/// use hermes_protocol::{DocumentCodec, JsonCodec};
///
/// let shape = Shape::structure(
///     "Item",
///     vec![Member::new("Name", Shape::string("Name")).json_name("name")],
/// );
/// let codec = JsonCodec::default();
/// let body = codec.encode(&Value::structure().with("Name", "a"), &shape).unwrap();
/// assert_eq!(&body[..], br#"{"name":"a"}"#);
/// ```
#[derive(Debug, Clone)]
pub struct JsonCodec {
    timestamp_format: TimestampFormat,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new(TimestampFormat::EpochSeconds)
    }
}

impl JsonCodec {
    /// Creates a codec with the given default timestamp format.
    #[must_use]
    pub const fn new(timestamp_format: TimestampFormat) -> Self {
        Self { timestamp_format }
    }

    fn encode_value(
        &self,
        path: &str,
        value: &Value,
        shape: &Shape,
        format: Option<TimestampFormat>,
    ) -> Result<Json, CodecError> {
        let mismatch = || {
            CodecError::new(
                path,
                format!("expected {}, got {}", shape.kind.name(), value.kind_name()),
            )
        };
        let json = match (&shape.kind, value) {
            (_, Value::Null) => Json::Null,
            (ShapeKind::Document, value) => untyped_to_json(value),
            (ShapeKind::Boolean, Value::Boolean(b)) => Json::Bool(*b),
            (
                ShapeKind::Byte
                | ShapeKind::Short
                | ShapeKind::Integer
                | ShapeKind::Long
                | ShapeKind::IntEnum { .. }
                | ShapeKind::Float
                | ShapeKind::Double,
                Value::Integer(i),
            ) => Json::from(*i),
            (ShapeKind::Float | ShapeKind::Double, Value::Float(f)) => {
                Number::from_f64(*f).map_or_else(|| Json::String(format_float(*f)), Json::Number)
            }
            (ShapeKind::String { .. } | ShapeKind::Enum { .. }, Value::String(s)) => {
                Json::String(s.clone())
            }
            (ShapeKind::Blob, Value::Blob(bytes)) => Json::String(BASE64.encode(bytes)),
            (ShapeKind::Timestamp, Value::Timestamp(ts)) => {
                let format = format.unwrap_or(self.timestamp_format);
                match format {
                    TimestampFormat::EpochSeconds => {
                        let text = format_timestamp(ts, format);
                        text.parse::<Number>().map_or(Json::String(text), Json::Number)
                    }
                    _ => Json::String(format_timestamp(ts, format)),
                }
            }
            (ShapeKind::List { member }, Value::List(items)) => Json::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.encode_value(&format!("{path}[{i}]"), item, member, format))
                    .collect::<Result<_, _>>()?,
            ),
            (ShapeKind::Map { value: inner }, Value::Map(entries) | Value::Structure(entries)) => {
                let mut object = Map::new();
                for (key, entry) in entries {
                    if entry.is_null() {
                        continue;
                    }
                    let json = self.encode_value(&format!("{path}.{key}"), entry, inner, format)?;
                    object.insert(key.clone(), json);
                }
                Json::Object(object)
            }
            (ShapeKind::Structure { members }, Value::Structure(fields)) => {
                Json::Object(self.encode_members(path, members, fields)?)
            }
            (ShapeKind::Union { members }, Value::Structure(fields)) => {
                let object = self.encode_members(path, members, fields)?;
                if object.len() != 1 {
                    return Err(CodecError::new(
                        path,
                        format!("union must have exactly one member set, found {}", object.len()),
                    ));
                }
                Json::Object(object)
            }
            _ => return Err(mismatch()),
        };
        Ok(json)
    }

    fn encode_members(
        &self,
        path: &str,
        members: &[Member],
        fields: &IndexMap<String, Value>,
    ) -> Result<Map<String, Json>, CodecError> {
        let mut object = Map::new();
        for member in members {
            let Some(value) = fields.get(&member.name).filter(|v| !v.is_null()) else {
                continue;
            };
            let json = self.encode_value(
                &format!("{path}.{}", member.name),
                value,
                &member.target,
                member.traits.timestamp_format,
            )?;
            object.insert(member.document_name().to_string(), json);
        }
        Ok(object)
    }

    fn decode_value(
        &self,
        path: &str,
        json: &Json,
        shape: &Shape,
        format: Option<TimestampFormat>,
    ) -> Result<Value, CodecError> {
        let mismatch = || CodecError::new(path, format!("expected {}", shape.kind.name()));
        if json.is_null() {
            return Ok(Value::Null);
        }
        let value = match &shape.kind {
            ShapeKind::Document => Value::Document(json.clone()),
            ShapeKind::Boolean => Value::Boolean(json.as_bool().ok_or_else(mismatch)?),
            ShapeKind::Byte
            | ShapeKind::Short
            | ShapeKind::Integer
            | ShapeKind::Long
            | ShapeKind::IntEnum { .. } => {
                let n = json.as_i64().ok_or_else(mismatch)?;
                let in_range = match &shape.kind {
                    ShapeKind::Byte => i8::try_from(n).is_ok(),
                    ShapeKind::Short => i16::try_from(n).is_ok(),
                    ShapeKind::Integer => i32::try_from(n).is_ok(),
                    _ => true,
                };
                if !in_range {
                    return Err(CodecError::new(
                        path,
                        format!("{n} is out of range for {}", shape.kind.name()),
                    ));
                }
                Value::Integer(n)
            }
            ShapeKind::Float | ShapeKind::Double => match json {
                Json::Number(n) => Value::Float(n.as_f64().ok_or_else(mismatch)?),
                Json::String(s) => Value::Float(parse_float(s).ok_or_else(mismatch)?),
                _ => return Err(mismatch()),
            },
            ShapeKind::String { .. } | ShapeKind::Enum { .. } => {
                Value::String(json.as_str().ok_or_else(mismatch)?.to_string())
            }
            ShapeKind::Blob => {
                let text = json.as_str().ok_or_else(mismatch)?;
                let bytes = BASE64
                    .decode(text)
                    .map_err(|err| CodecError::new(path, format!("invalid base64: {err}")))?;
                Value::Blob(Bytes::from(bytes))
            }
            ShapeKind::Timestamp => match json {
                Json::Number(n) => n
                    .as_f64()
                    .and_then(epoch_seconds)
                    .map(Value::Timestamp)
                    .ok_or_else(mismatch)?,
                Json::String(s) => {
                    let format = match format.unwrap_or(self.timestamp_format) {
                        // Epoch-seconds documents may still carry date-time strings.
                        TimestampFormat::EpochSeconds => TimestampFormat::DateTime,
                        other => other,
                    };
                    parse_timestamp(s, format)
                        .map(Value::Timestamp)
                        .map_err(|err| CodecError::new(path, err.to_string()))?
                }
                _ => return Err(mismatch()),
            },
            ShapeKind::List { member } => {
                let items = json.as_array().ok_or_else(mismatch)?;
                Value::List(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            self.decode_value(&format!("{path}[{i}]"), item, member, format)
                        })
                        .collect::<Result<_, _>>()?,
                )
            }
            ShapeKind::Map { value: inner } => {
                let object = json.as_object().ok_or_else(mismatch)?;
                let mut entries = IndexMap::with_capacity(object.len());
                for (key, entry) in object {
                    let decoded = self.decode_value(&format!("{path}.{key}"), entry, inner, format)?;
                    entries.insert(key.clone(), decoded);
                }
                Value::Map(entries)
            }
            ShapeKind::Structure { members } | ShapeKind::Union { members } => {
                let object = json.as_object().ok_or_else(mismatch)?;
                let mut fields = IndexMap::new();
                for member in members {
                    let Some(entry) = object.get(member.document_name()) else {
                        continue;
                    };
                    let decoded = self.decode_value(
                        &format!("{path}.{}", member.name),
                        entry,
                        &member.target,
                        member.traits.timestamp_format,
                    )?;
                    if !decoded.is_null() {
                        fields.insert(member.name.clone(), decoded);
                    }
                }
                Value::Structure(fields)
            }
        };
        Ok(value)
    }
}

impl DocumentCodec for JsonCodec {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn encode(&self, value: &Value, shape: &Shape) -> Result<Bytes, CodecError> {
        let json = self.encode_value("$", value, shape, None)?;
        serde_json::to_vec(&json)
            .map(Bytes::from)
            .map_err(|err| CodecError::new("$", err.to_string()))
    }

    fn decode(&self, body: &[u8], shape: &Shape) -> Result<Value, CodecError> {
        let json: Json =
            serde_json::from_slice(body).map_err(|err| CodecError::new("$", err.to_string()))?;
        self.decode_value("$", &json, shape, None)
    }
}

/// Converts a value with no shape information, used for document members.
fn untyped_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::from(*i),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::Blob(bytes) => Json::String(BASE64.encode(bytes)),
        Value::Timestamp(ts) => Json::String(format_timestamp(ts, TimestampFormat::DateTime)),
        Value::List(items) => Json::Array(items.iter().map(untyped_to_json).collect()),
        Value::Map(fields) | Value::Structure(fields) => Json::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), untyped_to_json(v)))
                .collect(),
        ),
        Value::Document(json) => json.clone(),
    }
}
