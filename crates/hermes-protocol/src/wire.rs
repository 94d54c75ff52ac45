//! Text formatting of bound scalars.
//!
//! Headers, query parameters and labels carry scalars as text. This module
//! holds the formatting rules in both directions plus the header list
//! splitting and label escaping helpers.

use crate::timestamp::{format_timestamp, parse_timestamp};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use hermes_core::{SerializationError, Shape, ShapeKind, TimestampFormat, Value};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;

/// Everything but RFC 3986 unreserved characters is escaped in labels.
const LABEL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Greedy labels additionally keep `/`.
const GREEDY_LABEL_ENCODE_SET: &AsciiSet = &LABEL_ENCODE_SET.remove(b'/');

/// Formats a float the way every location expects it.
///
/// ```
/// use hermes_protocol::wire::format_float;
///
/// assert_eq!(format_float(1.5), "1.5");
/// assert_eq!(format_float(f64::NAN), "NaN");
/// assert_eq!(format_float(f64::NEG_INFINITY), "-Infinity");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() && value.is_sign_positive() {
        "Infinity".to_string()
    } else if value.is_infinite() {
        "-Infinity".to_string()
    } else {
        value.to_string()
    }
}

/// Parses the text form written by [`format_float`].
#[must_use]
pub fn parse_float(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}

/// How a scalar is rendered at one location.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextFormat {
    pub timestamp: TimestampFormat,
    /// Base64-encode media-typed strings (headers only).
    pub encode_media: bool,
}

/// Formats one bound scalar. `Ok(None)` means the value is null.
pub(crate) fn scalar_to_text(
    member: &str,
    value: &Value,
    target: &Shape,
    format: TextFormat,
) -> Result<Option<String>, SerializationError> {
    check_scalar(member, value, target)?;
    let text = match value {
        Value::Null => return Ok(None),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) if format.encode_media && target.is_media_type() => BASE64.encode(s),
        Value::String(s) => s.clone(),
        Value::Timestamp(ts) => format_timestamp(ts, format.timestamp),
        Value::Blob(bytes) => BASE64.encode(bytes),
        other => {
            return Err(mismatch(member, target, other));
        }
    };
    Ok(Some(text))
}

/// Parses one bound scalar. Plain strings are taken verbatim; every other
/// kind ignores surrounding whitespace.
pub(crate) fn text_to_scalar(raw: &str, target: &Shape, format: TextFormat) -> Result<Value, String> {
    let text = raw.trim();
    let int = |parsed: Result<i64, std::num::ParseIntError>| {
        parsed
            .map(Value::Integer)
            .map_err(|err| format!("invalid {}: {err}", target.kind.name()))
    };
    match &target.kind {
        ShapeKind::Boolean => match text {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err("invalid boolean".to_string()),
        },
        ShapeKind::Byte => int(text.parse::<i8>().map(i64::from)),
        ShapeKind::Short => int(text.parse::<i16>().map(i64::from)),
        ShapeKind::Integer => int(text.parse::<i32>().map(i64::from)),
        ShapeKind::Long | ShapeKind::IntEnum { .. } => int(text.parse::<i64>()),
        ShapeKind::Float | ShapeKind::Double => parse_float(text)
            .map(Value::Float)
            .ok_or_else(|| format!("invalid {}", target.kind.name())),
        ShapeKind::String { media_type } if format.encode_media && media_type.is_some() => {
            let decoded = BASE64
                .decode(text)
                .map_err(|err| format!("invalid base64: {err}"))?;
            String::from_utf8(decoded)
                .map(Value::String)
                .map_err(|_| "base64 contents are not UTF-8".to_string())
        }
        ShapeKind::String { .. } | ShapeKind::Enum { .. } => Ok(Value::String(raw.to_string())),
        ShapeKind::Timestamp => parse_timestamp(text, format.timestamp)
            .map(Value::Timestamp)
            .map_err(|err| err.to_string()),
        ShapeKind::Blob => BASE64
            .decode(text)
            .map(|bytes| Value::Blob(Bytes::from(bytes)))
            .map_err(|err| format!("invalid base64: {err}")),
        other => Err(format!("{} cannot be bound to text", other.name())),
    }
}

/// Checks that a value fits a scalar shape.
pub(crate) fn check_scalar(
    member: &str,
    value: &Value,
    target: &Shape,
) -> Result<(), SerializationError> {
    let ok = match (&target.kind, value) {
        (_, Value::Null)
        | (ShapeKind::Boolean, Value::Boolean(_))
        | (
            ShapeKind::Byte
            | ShapeKind::Short
            | ShapeKind::Integer
            | ShapeKind::Long
            | ShapeKind::IntEnum { .. }
            | ShapeKind::Float
            | ShapeKind::Double,
            Value::Integer(_),
        )
        | (ShapeKind::Float | ShapeKind::Double, Value::Float(_))
        | (ShapeKind::String { .. } | ShapeKind::Enum { .. }, Value::String(_))
        | (ShapeKind::Timestamp, Value::Timestamp(_))
        | (ShapeKind::Blob, Value::Blob(_)) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(mismatch(member, target, value))
    }
}

pub(crate) fn mismatch(member: &str, target: &Shape, value: &Value) -> SerializationError {
    SerializationError::TypeMismatch {
        member: member.to_string(),
        expected: target.kind.name(),
        found: value.kind_name(),
    }
}

/// Percent-encodes a label value.
///
/// ```
/// use hermes_protocol::wire::encode_label;
///
/// assert_eq!(encode_label("a b/c", false), "a%20b%2Fc");
/// assert_eq!(encode_label("a b/c", true), "a%20b/c");
/// ```
#[must_use]
pub fn encode_label(value: &str, greedy: bool) -> String {
    let set = if greedy {
        GREEDY_LABEL_ENCODE_SET
    } else {
        LABEL_ENCODE_SET
    };
    utf8_percent_encode(value, set).to_string()
}

/// Quotes a header list element unless it survives splitting as is.
///
/// Elements containing a comma or a double quote, empty elements and
/// elements with leading or trailing whitespace are quoted.
///
/// ```
/// use hermes_protocol::wire::quote_header_value;
///
/// assert_eq!(quote_header_value("plain"), "plain");
/// assert_eq!(quote_header_value("a,b"), "\"a,b\"");
/// assert_eq!(quote_header_value("say \"hi\""), "\"say \\\"hi\\\"\"");
/// assert_eq!(quote_header_value(""), "\"\"");
/// assert_eq!(quote_header_value(" padded "), "\" padded \"");
/// ```
#[must_use]
pub fn quote_header_value(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value.contains([',', '"'])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_quotes {
        Cow::Owned(format!(
            "\"{}\"",
            value.replace('\\', "\\\\").replace('"', "\\\"")
        ))
    } else {
        Cow::Borrowed(value)
    }
}

/// Splits a header list on commas, honoring double-quoted elements.
///
/// ```
/// use hermes_protocol::wire::split_header_list;
///
/// assert_eq!(split_header_list("a, \"b,c\" ,d"), ["a", "b,c", "d"]);
/// assert!(split_header_list("  ").is_empty());
/// ```
#[must_use]
pub fn split_header_list(value: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => in_quotes = false,
            '"' if current.trim().is_empty() => {
                current.clear();
                quoted = true;
                in_quotes = true;
            }
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ',' if !in_quotes => {
                items.push(finish_item(&mut current, quoted));
                quoted = false;
            }
            _ if quoted && !in_quotes => {
                // Text after the closing quote is ignored unless it is space.
            }
            other => current.push(other),
        }
    }
    items.push(finish_item(&mut current, quoted));
    items
}

fn finish_item(current: &mut String, quoted: bool) -> String {
    let item = std::mem::take(current);
    if quoted {
        item
    } else {
        item.trim().to_string()
    }
}

/// Splits a list of http-dates, which contain a comma each, on every
/// second comma.
///
/// ```
/// use hermes_protocol::wire::split_http_date_list;
///
/// assert_eq!(
///     split_http_date_list("Mon, 01 Jan 2024 00:00:00 GMT, Tue, 02 Jan 2024 00:00:00 GMT"),
///     ["Mon, 01 Jan 2024 00:00:00 GMT", "Tue, 02 Jan 2024 00:00:00 GMT"]
/// );
/// ```
#[must_use]
pub fn split_http_date_list(value: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    let parts: Vec<&str> = value.split(',').collect();
    parts
        .chunks(2)
        .map(|pair| pair.join(",").trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const HEADER: TextFormat = TextFormat {
        timestamp: TimestampFormat::HttpDate,
        encode_media: true,
    };

    #[test]
    fn test_scalar_text() {
        let text = |value: Value, shape: Shape| scalar_to_text("M", &value, &shape, HEADER).unwrap();
        assert_eq!(text(Value::Boolean(true), Shape::boolean("B")).as_deref(), Some("true"));
        assert_eq!(text(Value::Integer(-7), Shape::integer("I")).as_deref(), Some("-7"));
        assert_eq!(text(Value::Float(2.0), Shape::double("D")).as_deref(), Some("2"));
        assert_eq!(text(Value::Null, Shape::string("S")), None);
        assert_eq!(
            text(
                Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                Shape::timestamp("T")
            )
            .as_deref(),
            Some("Mon, 01 Jan 2024 00:00:00 GMT")
        );
    }

    #[test]
    fn test_media_strings_are_base64_in_headers() {
        let shape = Shape::media_string("Json", "application/json");
        let value = Value::from("{\"a\":1}");
        let encoded = scalar_to_text("M", &value, &shape, HEADER).unwrap().unwrap();
        assert_eq!(encoded, "eyJhIjoxfQ==");
        assert_eq!(text_to_scalar(&encoded, &shape, HEADER).unwrap(), value);

        let query = TextFormat {
            timestamp: TimestampFormat::DateTime,
            encode_media: false,
        };
        assert_eq!(
            scalar_to_text("M", &value, &shape, query).unwrap().as_deref(),
            Some("{\"a\":1}")
        );
    }

    #[test]
    fn test_type_mismatch() {
        let err = scalar_to_text("Count", &Value::from("ten"), &Shape::integer("I"), HEADER)
            .unwrap_err();
        assert!(matches!(
            err,
            SerializationError::TypeMismatch { expected: "integer", found: "string", .. }
        ));
    }

    #[test]
    fn test_text_to_scalar_range_checks() {
        assert!(text_to_scalar("300", &Shape::new("B", ShapeKind::Byte), HEADER).is_err());
        assert_eq!(
            text_to_scalar(" 42 ", &Shape::integer("I"), HEADER).unwrap(),
            Value::Integer(42)
        );
        assert!(text_to_scalar("4x", &Shape::long("L"), HEADER).is_err());
        assert!(text_to_scalar("yes", &Shape::boolean("B"), HEADER).is_err());
        assert!(matches!(
            text_to_scalar("-Infinity", &Shape::double("D"), HEADER).unwrap(),
            Value::Float(f) if f == f64::NEG_INFINITY
        ));
    }

    #[test]
    fn test_quote_then_split_round_trips() {
        let values = ["plain", "with,comma", "with \"quote\"", ""];
        let joined = values
            .iter()
            .map(|v| quote_header_value(v))
            .collect::<Vec<_>>()
            .join(", ");
        assert_eq!(split_header_list(&joined), values);
    }

    #[test]
    fn test_padded_and_empty_elements_survive_splitting() {
        let values = [" padded ", "", "\ttab", "inner space"];
        let joined = values
            .iter()
            .map(|v| quote_header_value(v))
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(joined, "\" padded \",\"\",\"\ttab\",inner space");
        assert_eq!(split_header_list(&joined), values);

        // One header line per element, as the serializer writes them.
        let lines: Vec<Vec<String>> = values
            .iter()
            .map(|v| split_header_list(&quote_header_value(v)))
            .collect();
        assert_eq!(lines, [[" padded "], [""], ["\ttab"], ["inner space"]]);
    }

    #[test]
    fn test_strings_keep_whitespace_other_scalars_trim() {
        assert_eq!(
            text_to_scalar(" padded ", &Shape::string("S"), HEADER).unwrap(),
            Value::from(" padded ")
        );
        assert_eq!(
            text_to_scalar(" true ", &Shape::boolean("B"), HEADER).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_split_http_date_list_single() {
        assert_eq!(
            split_http_date_list("Mon, 01 Jan 2024 00:00:00 GMT"),
            ["Mon, 01 Jan 2024 00:00:00 GMT"]
        );
    }
}
