//! Wire response to output structure or error.

use crate::codec::DocumentCodec;
use crate::error_dispatch::{ErrorCodeExtractor, ErrorDispatcher, JsonErrorCodeExtractor};
use crate::serializer::document_shape;
use crate::settings::ProtocolSettings;
use crate::wire::{split_header_list, split_http_date_list, text_to_scalar, TextFormat};
use crate::ProtocolError;
use bytes::Bytes;
use hermes_core::{
    BindingLocation, DeserializationError, ErrorKind, HttpResponse, MemberBinding, Operation,
    OperationBindings, Shape, ShapeKind, TimestampFormat, Value,
};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Reads the bindings of one output or error structure from a response.
#[derive(Debug, Clone)]
pub(crate) struct ShapeReader {
    bindings: OperationBindings,
    document_shape: Option<Shape>,
}

impl ShapeReader {
    pub(crate) fn new(shape: &Shape) -> Result<Self, ProtocolError> {
        let bindings = OperationBindings::resolve_output(shape)?;
        let document_shape = document_shape(shape, &bindings);
        Ok(Self {
            bindings,
            document_shape,
        })
    }

    pub(crate) fn read(
        &self,
        response: &HttpResponse,
        settings: &ProtocolSettings,
        codec: &dyn DocumentCodec,
    ) -> Result<Value, DeserializationError> {
        let mut fields = IndexMap::new();

        for binding in self.bindings.bindings() {
            let value = match binding.location {
                BindingLocation::Header => read_header(response, binding, settings)?,
                BindingLocation::PrefixHeaders => read_prefix_headers(response, binding, settings)?,
                BindingLocation::Payload => read_payload(response, binding, codec)?,
                BindingLocation::Label | BindingLocation::Query | BindingLocation::Document => None,
            };
            if let Some(value) = value {
                fields.insert(binding.member.clone(), value);
            }
        }

        if let Some(shape) = &self.document_shape {
            if !response.body.is_empty() {
                let document = codec
                    .decode(&response.body, shape)
                    .map_err(|err| DeserializationError::Body {
                        message: err.to_string(),
                    })?;
                if let Value::Structure(decoded) = document {
                    fields.extend(decoded);
                }
            }
        }

        Ok(Value::Structure(fields))
    }
}

fn header_format(binding: &MemberBinding, settings: &ProtocolSettings) -> TextFormat {
    TextFormat {
        timestamp: settings.timestamp_format(binding.location, binding.timestamp_format),
        encode_media: true,
    }
}

fn binding_error(binding: &MemberBinding, name: &str, reason: String) -> DeserializationError {
    DeserializationError::Binding {
        member: binding.member.clone(),
        location: binding.location,
        name: name.to_string(),
        reason,
    }
}

fn read_header(
    response: &HttpResponse,
    binding: &MemberBinding,
    settings: &ProtocolSettings,
) -> Result<Option<Value>, DeserializationError> {
    let values = response.headers.get_all(&binding.wire_name);
    if values.is_empty() {
        return Ok(None);
    }
    let format = header_format(binding, settings);

    if let ShapeKind::List { member } = &binding.target.kind {
        let http_dates =
            matches!(member.kind, ShapeKind::Timestamp) && format.timestamp == TimestampFormat::HttpDate;
        let mut items = Vec::new();
        for value in values {
            let parts = if http_dates {
                split_http_date_list(value)
            } else {
                split_header_list(value)
            };
            for part in parts {
                let item = text_to_scalar(&part, member, format)
                    .map_err(|reason| binding_error(binding, &binding.wire_name, reason))?;
                items.push(item);
            }
        }
        return Ok(Some(Value::List(items)));
    }

    text_to_scalar(&values[0], &binding.target, format)
        .map(Some)
        .map_err(|reason| binding_error(binding, &binding.wire_name, reason))
}

fn read_prefix_headers(
    response: &HttpResponse,
    binding: &MemberBinding,
    settings: &ProtocolSettings,
) -> Result<Option<Value>, DeserializationError> {
    let ShapeKind::Map { value: inner } = &binding.target.kind else {
        return Ok(None);
    };
    let prefix = binding.wire_name.to_ascii_lowercase();
    let format = header_format(binding, settings);

    let mut entries = IndexMap::new();
    for (name, values) in response.headers.iter() {
        let lower = name.to_ascii_lowercase();
        let Some(suffix) = lower.strip_prefix(&prefix) else {
            continue;
        };
        let Some(first) = values.first() else {
            continue;
        };
        let value = text_to_scalar(first, inner, format)
            .map_err(|reason| binding_error(binding, name, reason))?;
        entries.insert(suffix.to_string(), value);
    }

    Ok((!entries.is_empty()).then_some(Value::Map(entries)))
}

fn read_payload(
    response: &HttpResponse,
    binding: &MemberBinding,
    codec: &dyn DocumentCodec,
) -> Result<Option<Value>, DeserializationError> {
    let body: &Bytes = &response.body;
    let value = match &binding.target.kind {
        ShapeKind::Blob => Value::Blob(body.clone()),
        _ if body.is_empty() => return Ok(None),
        ShapeKind::String { .. } | ShapeKind::Enum { .. } => {
            let text = std::str::from_utf8(body).map_err(|err| DeserializationError::Body {
                message: format!("payload is not UTF-8: {err}"),
            })?;
            Value::String(text.to_string())
        }
        _ => codec
            .decode(body, &binding.target)
            .map_err(|err| DeserializationError::Body {
                message: err.to_string(),
            })?,
    };
    Ok(Some(value))
}

/// Deserializes one operation's responses.
///
/// Successful responses become the output structure; anything outside
/// `200..=299` goes through the operation's [`ErrorDispatcher`].
#[derive(Clone)]
pub struct ResponseDeserializer {
    output: ShapeReader,
    errors: ErrorDispatcher,
    settings: ProtocolSettings,
    codec: Arc<dyn DocumentCodec>,
}

impl fmt::Debug for ResponseDeserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseDeserializer")
            .field("output", &self.output.bindings.shape_id())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl ResponseDeserializer {
    /// Builds the deserializer of an operation with the JSON error extractor.
    pub fn new(
        operation: &Operation,
        settings: ProtocolSettings,
        codec: Arc<dyn DocumentCodec>,
    ) -> Result<Self, ProtocolError> {
        let extractor = Arc::new(JsonErrorCodeExtractor::new(settings.error_type_header.clone()));
        Self::with_extractor(operation, settings, codec, extractor)
    }

    /// Builds the deserializer with a custom error code extractor.
    pub fn with_extractor(
        operation: &Operation,
        settings: ProtocolSettings,
        codec: Arc<dyn DocumentCodec>,
        extractor: Arc<dyn ErrorCodeExtractor>,
    ) -> Result<Self, ProtocolError> {
        let output = ShapeReader::new(&operation.output)?;
        let errors = ErrorDispatcher::new(&operation.errors, settings.clone(), codec.clone(), extractor)?;
        Ok(Self {
            output,
            errors,
            settings,
            codec,
        })
    }

    /// Returns the resolved output bindings.
    #[must_use]
    pub const fn bindings(&self) -> &OperationBindings {
        &self.output.bindings
    }

    /// Returns the error dispatcher.
    #[must_use]
    pub const fn errors(&self) -> &ErrorDispatcher {
        &self.errors
    }

    /// Deserializes a response into the output or a service error.
    pub fn deserialize(&self, response: &HttpResponse) -> Result<Value, ErrorKind> {
        if !response.is_success() {
            let error = self.errors.classify(response)?;
            return Err(ErrorKind::Api(error));
        }
        Ok(self
            .output
            .read(response, &self.settings, self.codec.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonCodec;
    use chrono::{TimeZone, Utc};
    use hermes_core::Member;
    use http::StatusCode;

    fn deserializer(output: Shape) -> ResponseDeserializer {
        let operation = Operation::new("Op", Shape::structure("In", vec![]), output);
        ResponseDeserializer::new(&operation, ProtocolSettings::default(), Arc::new(JsonCodec::default()))
            .unwrap()
    }

    fn ok(body: &'static str) -> HttpResponse {
        HttpResponse::new(StatusCode::OK, body)
    }

    #[test]
    fn test_header_lists_split_on_commas_and_dates() {
        let output = Shape::structure(
            "Out",
            vec![
                Member::new("Tags", Shape::list("Tags", Shape::string("Tag"))).header("x-tags"),
                Member::new("Dates", Shape::list("Dates", Shape::timestamp("D"))).header("x-dates"),
            ],
        );
        let response = ok("")
            .with_header("x-tags", "a, \"b,c\"")
            .with_header("x-tags", "d")
            .with_header(
                "x-dates",
                "Mon, 01 Jan 2024 00:00:00 GMT, Tue, 02 Jan 2024 00:00:00 GMT",
            );
        let value = deserializer(output).deserialize(&response).unwrap();

        assert_eq!(
            value.get("Tags").unwrap(),
            &Value::List(vec!["a".into(), "b,c".into(), "d".into()])
        );
        assert_eq!(
            value.get("Dates").unwrap(),
            &Value::List(vec![
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().into(),
                Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap().into(),
            ])
        );
    }

    #[test]
    fn test_out_of_range_body_integer_is_rejected() {
        let output = Shape::structure(
            "Out",
            vec![Member::new("Count", Shape::integer("Count")).json_name("count")],
        );
        let err = deserializer(output)
            .deserialize(&ok(r#"{"count":4294967296}"#))
            .unwrap_err();
        let ErrorKind::Deserialization(DeserializationError::Body { message }) = err else {
            panic!("expected a body error, got {err:?}");
        };
        assert!(message.contains("$.Count: 4294967296 is out of range"), "{message}");
    }

    #[test]
    fn test_malformed_header_names_member_and_location() {
        let output = Shape::structure(
            "Out",
            vec![Member::new("Count", Shape::integer("Count")).header("x-count")],
        );
        let err = deserializer(output)
            .deserialize(&ok("").with_header("x-count", "many"))
            .unwrap_err();
        let ErrorKind::Deserialization(DeserializationError::Binding {
            member, location, ..
        }) = err
        else {
            panic!("expected binding error, got {err:?}");
        };
        assert_eq!(member, "Count");
        assert_eq!(location, BindingLocation::Header);
    }

    #[test]
    fn test_prefix_headers_collect_suffixes() {
        let output = Shape::structure(
            "Out",
            vec![
                Member::new("Meta", Shape::map("Meta", Shape::string("V"))).prefix_headers("X-Meta-"),
            ],
        );
        let response = ok("")
            .with_header("x-meta-owner", "me")
            .with_header("x-other", "no");
        let value = deserializer(output).deserialize(&response).unwrap();
        assert_eq!(
            value.get("Meta").and_then(|m| m.get("owner")).and_then(Value::as_str),
            Some("me")
        );
    }

    #[test]
    fn test_document_members_and_headers_combine() {
        let output = Shape::structure(
            "Out",
            vec![
                Member::new("ETag", Shape::string("ETag")).header("etag"),
                Member::new("Name", Shape::string("Name")).json_name("name"),
            ],
        );
        let response = ok(r#"{"name":"photo"}"#).with_header("ETag", "\"abc\"");
        let value = deserializer(output).deserialize(&response).unwrap();
        assert_eq!(value.get("ETag").and_then(Value::as_str), Some("\"abc\""));
        assert_eq!(value.get("Name").and_then(Value::as_str), Some("photo"));
    }

    #[test]
    fn test_blob_payload_is_raw() {
        let output = Shape::structure(
            "Out",
            vec![Member::new("Body", Shape::blob("Body")).payload()],
        );
        let value = deserializer(output).deserialize(&ok("raw")).unwrap();
        assert_eq!(
            value.get("Body").and_then(Value::as_blob).map(|b| &b[..]),
            Some(&b"raw"[..])
        );
    }

    #[test]
    fn test_error_status_goes_to_dispatcher() {
        let response = HttpResponse::new(StatusCode::BAD_REQUEST, r#"{"code":"Bogus"}"#);
        let err = deserializer(Shape::structure("Out", vec![]))
            .deserialize(&response)
            .unwrap_err();
        assert!(matches!(err, ErrorKind::Api(ref api) if api.code() == "Bogus"));
    }
}
