//! Input structure to wire request.

use crate::codec::DocumentCodec;
use crate::settings::ProtocolSettings;
use crate::wire::{encode_label, mismatch, quote_header_value, scalar_to_text, TextFormat};
use crate::ProtocolError;
use hermes_core::{
    BindingLocation, HttpRequest, MemberBinding, Operation, OperationBindings, PathTemplate,
    SerializationError, Shape, ShapeKind, TimestampFormat, Value,
};
use http::Method;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

const CONTENT_TYPE: &str = "Content-Type";

/// Serializes one operation's input into an [`HttpRequest`].
///
/// Built once per operation; [`serialize`](Self::serialize) is called for
/// every attempt and always produces a fresh request.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hermes_core::{HttpTrait, Member, Operation, Shape, Value};
/// use hermes_protocol::{JsonCodec, ProtocolSettings, RequestSerializer};
///
/// let input = Shape::structure(
///     "GetItemInput",
///     vec![
///         Member::new("Id", Shape::string("Id")).required().label(),
///         Member::new("Trace", Shape::string("Trace")).header("x-trace-id"),
///     ],
/// );
/// let operation = Operation::new("GetItem", input, Shape::structure("GetItemOutput", vec![]))
///     .http(HttpTrait::new("GET", "/items/{Id}"));
///
/// let serializer =
///     RequestSerializer::new(&operation, ProtocolSettings::default(), Arc::new(JsonCodec::default()))
///         .unwrap();
/// let request = serializer
///     .serialize(&Value::structure().with("Id", "a b").with("Trace", "t-1"))
///     .unwrap();
///
/// assert_eq!(request.path, "/items/a%20b");
/// assert_eq!(request.headers.get("X-Trace-Id"), Some("t-1"));
/// assert!(request.body.is_empty());
/// ```
#[derive(Clone)]
pub struct RequestSerializer {
    method: Method,
    template: PathTemplate,
    bindings: OperationBindings,
    document_shape: Option<Shape>,
    settings: ProtocolSettings,
    codec: Arc<dyn DocumentCodec>,
}

impl fmt::Debug for RequestSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSerializer")
            .field("method", &self.method)
            .field("template", &self.template.as_str())
            .field("bindings", &self.bindings.bindings().len())
            .finish_non_exhaustive()
    }
}

impl RequestSerializer {
    /// Builds the serializer of an operation.
    ///
    /// Operations without an HTTP trait are sent as `POST /`.
    pub fn new(
        operation: &Operation,
        settings: ProtocolSettings,
        codec: Arc<dyn DocumentCodec>,
    ) -> Result<Self, ProtocolError> {
        let (method, uri) = match &operation.http {
            Some(http) => (http.method.as_str(), http.uri.as_str()),
            None => ("POST", "/"),
        };
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| ProtocolError::InvalidMethod {
            operation: operation.name.clone(),
            method: method.to_string(),
        })?;
        let template = PathTemplate::parse(uri)?;
        let bindings = OperationBindings::resolve_input(&operation.input, Some(&template))?;
        let document_shape = document_shape(&operation.input, &bindings);

        Ok(Self {
            method,
            template,
            bindings,
            document_shape,
            settings,
            codec,
        })
    }

    /// Returns the resolved input bindings.
    #[must_use]
    pub const fn bindings(&self) -> &OperationBindings {
        &self.bindings
    }

    /// Serializes an input structure.
    pub fn serialize(&self, input: &Value) -> Result<HttpRequest, SerializationError> {
        let empty = IndexMap::new();
        let fields = match input {
            Value::Structure(fields) => fields,
            Value::Null => &empty,
            other => {
                return Err(SerializationError::InvalidInput {
                    shape: self.bindings.shape_id().to_string(),
                    found: other.kind_name(),
                });
            }
        };
        let field = |name: &str| fields.get(name).filter(|v| !v.is_null());

        let mut request = HttpRequest::new(self.method.clone(), "/");
        request.query.extend(self.template.literal_query().iter().cloned());

        for binding in self.bindings.bindings() {
            let Some(value) = field(&binding.member) else {
                continue;
            };
            match binding.location {
                BindingLocation::Header => self.write_header(&mut request, binding, value)?,
                BindingLocation::PrefixHeaders => {
                    self.write_prefix_headers(&mut request, binding, value)?;
                }
                BindingLocation::Query if !binding.wire_name.is_empty() => {
                    self.write_query(&mut request, binding, &binding.wire_name, value)?;
                }
                BindingLocation::Query
                | BindingLocation::Label
                | BindingLocation::Payload
                | BindingLocation::Document => {}
            }
        }

        // Query-params maps never override explicitly bound parameters.
        for binding in self.bindings.located(BindingLocation::Query) {
            if !binding.wire_name.is_empty() {
                continue;
            }
            let Some(value) = field(&binding.member) else {
                continue;
            };
            let (Value::Map(entries) | Value::Structure(entries)) = value else {
                return Err(mismatch(&binding.member, &binding.target, value));
            };
            let ShapeKind::Map { value: inner } = &binding.target.kind else {
                return Err(mismatch(&binding.member, &binding.target, value));
            };
            let element = MemberBinding {
                target: inner.as_ref().clone(),
                ..binding.clone()
            };
            for (key, entry) in entries {
                if request.has_query(key) {
                    continue;
                }
                self.write_query(&mut request, &element, key, entry)?;
            }
        }

        self.write_body(&mut request, fields)?;

        request.path = self.template.expand(|label| {
            let binding = self
                .bindings
                .get(&label.name)
                .ok_or_else(|| SerializationError::MissingRequired {
                    member: label.name.clone(),
                })?;
            let value = field(&binding.member).ok_or_else(|| SerializationError::MissingRequired {
                member: binding.member.clone(),
            })?;
            let text = scalar_to_text(&binding.member, value, &binding.target, self.text_format(binding))?
                .unwrap_or_default();
            if text.is_empty() {
                return Err(SerializationError::EmptyLabel {
                    member: binding.member.clone(),
                });
            }
            Ok(encode_label(&text, label.greedy))
        })?;

        Ok(request)
    }

    fn text_format(&self, binding: &MemberBinding) -> TextFormat {
        TextFormat {
            timestamp: self
                .settings
                .timestamp_format(binding.location, binding.timestamp_format),
            encode_media: matches!(
                binding.location,
                BindingLocation::Header | BindingLocation::PrefixHeaders
            ),
        }
    }

    fn write_header(
        &self,
        request: &mut HttpRequest,
        binding: &MemberBinding,
        value: &Value,
    ) -> Result<(), SerializationError> {
        let format = self.text_format(binding);
        match (&binding.target.kind, value) {
            (ShapeKind::List { member }, Value::List(items)) => {
                let quote = !matches!(member.kind, ShapeKind::Timestamp)
                    || format.timestamp != TimestampFormat::HttpDate;
                for item in items {
                    if let Some(text) = scalar_to_text(&binding.member, item, member, format)? {
                        let text = if quote {
                            quote_header_value(&text).into_owned()
                        } else {
                            text
                        };
                        request.headers.append(&binding.wire_name, text);
                    }
                }
            }
            (ShapeKind::List { .. }, other) => {
                return Err(mismatch(&binding.member, &binding.target, other));
            }
            _ => {
                if let Some(text) = scalar_to_text(&binding.member, value, &binding.target, format)? {
                    request.headers.insert(&binding.wire_name, text);
                }
            }
        }
        Ok(())
    }

    fn write_prefix_headers(
        &self,
        request: &mut HttpRequest,
        binding: &MemberBinding,
        value: &Value,
    ) -> Result<(), SerializationError> {
        let (ShapeKind::Map { value: inner }, Value::Map(entries) | Value::Structure(entries)) =
            (&binding.target.kind, value)
        else {
            return Err(mismatch(&binding.member, &binding.target, value));
        };
        let format = self.text_format(binding);
        for (suffix, entry) in entries {
            if let Some(text) = scalar_to_text(&binding.member, entry, inner, format)? {
                request
                    .headers
                    .insert(&format!("{}{suffix}", binding.wire_name), text);
            }
        }
        Ok(())
    }

    fn write_query(
        &self,
        request: &mut HttpRequest,
        binding: &MemberBinding,
        key: &str,
        value: &Value,
    ) -> Result<(), SerializationError> {
        let format = self.text_format(binding);
        match (&binding.target.kind, value) {
            (ShapeKind::List { member }, Value::List(items)) => {
                for item in items {
                    if let Some(text) = scalar_to_text(&binding.member, item, member, format)? {
                        request.query.push((key.to_string(), text));
                    }
                }
            }
            (ShapeKind::List { .. }, other) => {
                return Err(mismatch(&binding.member, &binding.target, other));
            }
            _ => {
                if let Some(text) = scalar_to_text(&binding.member, value, &binding.target, format)? {
                    request.query.push((key.to_string(), text));
                }
            }
        }
        Ok(())
    }

    fn write_body(
        &self,
        request: &mut HttpRequest,
        fields: &IndexMap<String, Value>,
    ) -> Result<(), SerializationError> {
        let encode = |value: &Value, shape: &Shape| {
            self.codec
                .encode(value, shape)
                .map_err(|err| SerializationError::Document {
                    message: err.to_string(),
                })
        };

        if let Some(payload) = self.bindings.payload() {
            let Some(value) = fields.get(&payload.member).filter(|v| !v.is_null()) else {
                return Ok(());
            };
            let (body, content_type) = match (&payload.target.kind, value) {
                (ShapeKind::Blob, Value::Blob(bytes)) => {
                    (bytes.clone(), "application/octet-stream".to_string())
                }
                (ShapeKind::String { media_type }, Value::String(text)) => (
                    text.clone().into(),
                    media_type.clone().unwrap_or_else(|| "text/plain".to_string()),
                ),
                (ShapeKind::Enum { .. }, Value::String(text)) => {
                    (text.clone().into(), "text/plain".to_string())
                }
                (ShapeKind::Structure { .. } | ShapeKind::Union { .. } | ShapeKind::Document, _) => {
                    (encode(value, &payload.target)?, self.codec.content_type().to_string())
                }
                _ => return Err(mismatch(&payload.member, &payload.target, value)),
            };
            request.body = body;
            if !request.headers.contains(CONTENT_TYPE) {
                request.headers.insert(CONTENT_TYPE, content_type);
            }
        } else if let Some(shape) = &self.document_shape {
            let document: IndexMap<String, Value> = self
                .bindings
                .located(BindingLocation::Document)
                .filter_map(|b| {
                    fields
                        .get(&b.member)
                        .filter(|v| !v.is_null())
                        .map(|v| (b.member.clone(), v.clone()))
                })
                .collect();
            request.body = encode(&Value::Structure(document), shape)?;
            if !request.headers.contains(CONTENT_TYPE) {
                request
                    .headers
                    .insert(CONTENT_TYPE, self.codec.content_type().to_string());
            }
        }
        Ok(())
    }
}

/// The structure of only the document-bound members, if there are any.
pub(crate) fn document_shape(shape: &Shape, bindings: &OperationBindings) -> Option<Shape> {
    if !bindings.has_document_members() {
        return None;
    }
    let members = shape
        .members()
        .iter()
        .filter(|m| {
            bindings
                .get(&m.name)
                .is_some_and(|b| b.location == BindingLocation::Document)
        })
        .cloned()
        .collect();
    Some(Shape::structure(shape.id.clone(), members))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonCodec;
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};
    use hermes_core::{HttpTrait, Member};

    fn serializer(input: Shape, http: HttpTrait) -> RequestSerializer {
        let operation = Operation::new("Op", input, Shape::structure("Out", vec![])).http(http);
        RequestSerializer::new(&operation, ProtocolSettings::default(), Arc::new(JsonCodec::default()))
            .unwrap()
    }

    fn tags_input() -> Shape {
        Shape::structure(
            "In",
            vec![Member::new("Tags", Shape::list("Tags", Shape::string("Tag"))).header("x-tags")],
        )
    }

    #[test]
    fn test_empty_header_list_produces_no_header() {
        let s = serializer(tags_input(), HttpTrait::new("GET", "/"));
        let request = s
            .serialize(&Value::structure().with("Tags", Value::List(vec![])))
            .unwrap();
        assert!(!request.headers.contains("X-Tags"));
    }

    #[test]
    fn test_null_header_list_elements_are_skipped() {
        let s = serializer(tags_input(), HttpTrait::new("GET", "/"));
        let request = s
            .serialize(&Value::structure().with(
                "Tags",
                vec![Value::from("a"), Value::Null, Value::from("b,c")],
            ))
            .unwrap();
        assert_eq!(request.headers.get_all("x-tags"), ["a", "\"b,c\""]);
    }

    #[test]
    fn test_timestamp_locations_use_their_defaults() {
        let input = Shape::structure(
            "In",
            vec![
                Member::new("At", Shape::timestamp("At")).required().label(),
                Member::new("Since", Shape::timestamp("Since")).header("if-modified-since"),
                Member::new("Until", Shape::timestamp("Until")).query("until"),
                Member::new("Epoch", Shape::timestamp("Epoch"))
                    .query("epoch")
                    .timestamp_format(TimestampFormat::EpochSeconds),
            ],
        );
        let s = serializer(input, HttpTrait::new("GET", "/at/{At}"));
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let request = s
            .serialize(
                &Value::structure()
                    .with("At", ts)
                    .with("Since", ts)
                    .with("Until", ts)
                    .with("Epoch", ts),
            )
            .unwrap();
        assert_eq!(request.path, "/at/2024-01-01T00%3A00%3A00Z");
        assert_eq!(
            request.headers.get("If-Modified-Since"),
            Some("Mon, 01 Jan 2024 00:00:00 GMT")
        );
        assert_eq!(
            request.query,
            [
                ("until".to_string(), "2024-01-01T00:00:00Z".to_string()),
                ("epoch".to_string(), "1704067200".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_lists_and_params_merge() {
        let input = Shape::structure(
            "In",
            vec![
                Member::new("Ids", Shape::list("Ids", Shape::integer("Id"))).query("id"),
                Member::new("Limit", Shape::integer("Limit")).query("limit"),
                Member::new("Extra", Shape::map("Extra", Shape::string("V"))).query_params(),
            ],
        );
        let s = serializer(input, HttpTrait::new("GET", "/things?list-type=2"));
        let extra = Value::Map(IndexMap::from([
            ("limit".to_string(), Value::from("999")),
            ("list-type".to_string(), Value::from("1")),
            ("color".to_string(), Value::from("red")),
        ]));
        let request = s
            .serialize(
                &Value::structure()
                    .with("Ids", vec![Value::Integer(1), Value::Integer(2)])
                    .with("Limit", 10_i64)
                    .with("Extra", extra),
            )
            .unwrap();
        assert_eq!(request.path, "/things");
        assert_eq!(
            request.query_string(),
            "list-type=2&id=1&id=2&limit=10&color=red"
        );
    }

    #[test]
    fn test_prefix_headers_and_media_type() {
        let input = Shape::structure(
            "In",
            vec![
                Member::new("Meta", Shape::map("Meta", Shape::string("V"))).prefix_headers("x-meta-"),
                Member::new("Policy", Shape::media_string("Policy", "application/json"))
                    .header("x-policy"),
            ],
        );
        let s = serializer(input, HttpTrait::new("PUT", "/"));
        let meta = Value::Map(IndexMap::from([("owner".to_string(), Value::from("me"))]));
        let request = s
            .serialize(&Value::structure().with("Meta", meta).with("Policy", "{}"))
            .unwrap();
        assert_eq!(request.headers.get("X-Meta-Owner"), Some("me"));
        assert_eq!(request.headers.get("X-Policy"), Some("e30="));
        assert_eq!(request.method, Method::PUT);
    }

    #[test]
    fn test_greedy_label_keeps_slashes() {
        let input = Shape::structure(
            "In",
            vec![
                Member::new("Bucket", Shape::string("Bucket")).required().label(),
                Member::new("Key", Shape::string("Key")).required().label(),
            ],
        );
        let s = serializer(input, HttpTrait::new("GET", "/{Bucket}/{Key+}"));
        let request = s
            .serialize(&Value::structure().with("Bucket", "b/1").with("Key", "dir/a b.txt"))
            .unwrap();
        assert_eq!(request.path, "/b%2F1/dir/a%20b.txt");
    }

    #[test]
    fn test_missing_and_empty_labels_fail() {
        let input = Shape::structure(
            "In",
            vec![Member::new("Id", Shape::string("Id")).required().label()],
        );
        let s = serializer(input, HttpTrait::new("GET", "/items/{Id}"));
        assert!(matches!(
            s.serialize(&Value::structure()).unwrap_err(),
            SerializationError::MissingRequired { ref member } if member == "Id"
        ));
        assert!(matches!(
            s.serialize(&Value::structure().with("Id", "")).unwrap_err(),
            SerializationError::EmptyLabel { .. }
        ));
    }

    #[test]
    fn test_payload_blob_and_string() {
        let blob_input = Shape::structure(
            "In",
            vec![Member::new("Body", Shape::blob("Body")).payload()],
        );
        let s = serializer(blob_input, HttpTrait::new("PUT", "/"));
        let request = s
            .serialize(&Value::structure().with("Body", Bytes::from_static(b"\x00\x01")))
            .unwrap();
        assert_eq!(&request.body[..], b"\x00\x01");
        assert_eq!(
            request.headers.get("Content-Type"),
            Some("application/octet-stream")
        );

        let text_input = Shape::structure(
            "In",
            vec![
                Member::new("Body", Shape::string("Body")).payload(),
                Member::new("Type", Shape::string("Type")).header("content-type"),
            ],
        );
        let s = serializer(text_input, HttpTrait::new("PUT", "/"));
        let request = s
            .serialize(&Value::structure().with("Body", "hi").with("Type", "text/csv"))
            .unwrap();
        assert_eq!(&request.body[..], b"hi");
        assert_eq!(request.headers.get("Content-Type"), Some("text/csv"));
    }

    #[test]
    fn test_document_members_are_batched() {
        let input = Shape::structure(
            "In",
            vec![
                Member::new("Id", Shape::string("Id")).required().label(),
                Member::new("Name", Shape::string("Name")).json_name("name"),
                Member::new("Size", Shape::long("Size")),
            ],
        );
        let s = serializer(input, HttpTrait::new("POST", "/items/{Id}"));
        let request = s
            .serialize(&Value::structure().with("Id", "1").with("Name", "n"))
            .unwrap();
        assert_eq!(&request.body[..], br#"{"name":"n"}"#);
        assert_eq!(request.headers.get("content-type"), Some("application/json"));
    }

    #[test]
    fn test_no_body_members_means_no_content_type() {
        let s = serializer(tags_input(), HttpTrait::new("GET", "/"));
        let request = s.serialize(&Value::structure()).unwrap();
        assert!(request.body.is_empty());
        assert!(!request.headers.contains("Content-Type"));
    }

    #[test]
    fn test_invalid_input_kind() {
        let s = serializer(tags_input(), HttpTrait::new("GET", "/"));
        assert!(matches!(
            s.serialize(&Value::from("nope")).unwrap_err(),
            SerializationError::InvalidInput { found: "string", .. }
        ));
    }
}
