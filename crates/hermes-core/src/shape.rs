//! Shapes and members of the resolved type graph.
//!
//! A [`Shape`] is a typed value node; its [`ShapeKind`] is a closed
//! enumeration so every consumer matches it exhaustively. Aggregate kinds
//! own their members inline, which keeps the model self-contained once it
//! has been resolved.
//!
//! # Example
//!
//! ```
//! use hermes_core::{Member, Shape};
//!
//! let input = Shape::structure(
//!     "GetObjectInput",
//!     vec![
//!         Member::new("Bucket", Shape::string("BucketName")).required().label(),
//!         Member::new("VersionId", Shape::string("VersionId")).query("versionId"),
//!     ],
//! );
//!
//! assert_eq!(input.members().len(), 2);
//! assert!(input.member("Bucket").unwrap().traits.http_label);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire encodings for timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampFormat {
    /// RFC 3339 date-time, e.g. `2024-01-01T00:00:00Z`.
    DateTime,
    /// RFC 7231 IMF-fixdate, e.g. `Mon, 01 Jan 2024 00:00:00 GMT`.
    HttpDate,
    /// Seconds since the Unix epoch, with an optional fractional part.
    EpochSeconds,
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DateTime => write!(f, "date-time"),
            Self::HttpDate => write!(f, "http-date"),
            Self::EpochSeconds => write!(f, "epoch-seconds"),
        }
    }
}

/// The kind of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ShapeKind {
    /// `true` / `false`.
    Boolean,
    /// 8-bit signed integer.
    Byte,
    /// 16-bit signed integer.
    Short,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// UTF-8 string, optionally carrying a media type.
    String {
        /// Media type of the string contents (base64-encoded in headers).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },
    /// String restricted to a set of values.
    Enum {
        /// Allowed raw values.
        values: Vec<String>,
    },
    /// Integer restricted to a set of values.
    IntEnum {
        /// Allowed values.
        values: Vec<i64>,
    },
    /// Opaque bytes.
    Blob,
    /// Point in time.
    Timestamp,
    /// Untyped JSON-like document.
    Document,
    /// Ordered list.
    List {
        /// Element shape.
        member: Box<Shape>,
    },
    /// String-keyed map.
    Map {
        /// Value shape.
        value: Box<Shape>,
    },
    /// Named members, any subset may be set.
    Structure {
        /// Members in declaration order.
        members: Vec<Member>,
    },
    /// Named members, exactly one is set.
    Union {
        /// Members in declaration order.
        members: Vec<Member>,
    },
}

impl ShapeKind {
    /// Returns a short name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String { .. } => "string",
            Self::Enum { .. } => "enum",
            Self::IntEnum { .. } => "intEnum",
            Self::Blob => "blob",
            Self::Timestamp => "timestamp",
            Self::Document => "document",
            Self::List { .. } => "list",
            Self::Map { .. } => "map",
            Self::Structure { .. } => "structure",
            Self::Union { .. } => "union",
        }
    }
}

/// A node in the resolved type graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Shape identifier, unique within the service.
    pub id: String,
    /// The shape kind and its nested shapes.
    #[serde(flatten)]
    pub kind: ShapeKind,
}

impl Shape {
    /// Creates a shape of any kind.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Creates a boolean shape.
    #[must_use]
    pub fn boolean(id: impl Into<String>) -> Self {
        Self::new(id, ShapeKind::Boolean)
    }

    /// Creates a 32-bit integer shape.
    #[must_use]
    pub fn integer(id: impl Into<String>) -> Self {
        Self::new(id, ShapeKind::Integer)
    }

    /// Creates a 64-bit integer shape.
    #[must_use]
    pub fn long(id: impl Into<String>) -> Self {
        Self::new(id, ShapeKind::Long)
    }

    /// Creates a double shape.
    #[must_use]
    pub fn double(id: impl Into<String>) -> Self {
        Self::new(id, ShapeKind::Double)
    }

    /// Creates a plain string shape.
    #[must_use]
    pub fn string(id: impl Into<String>) -> Self {
        Self::new(id, ShapeKind::String { media_type: None })
    }

    /// Creates a string shape carrying a media type.
    #[must_use]
    pub fn media_string(id: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self::new(
            id,
            ShapeKind::String {
                media_type: Some(media_type.into()),
            },
        )
    }

    /// Creates an enum shape.
    #[must_use]
    pub fn enumeration<I, S>(id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            ShapeKind::Enum {
                values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Creates a blob shape.
    #[must_use]
    pub fn blob(id: impl Into<String>) -> Self {
        Self::new(id, ShapeKind::Blob)
    }

    /// Creates a timestamp shape.
    #[must_use]
    pub fn timestamp(id: impl Into<String>) -> Self {
        Self::new(id, ShapeKind::Timestamp)
    }

    /// Creates a document shape.
    #[must_use]
    pub fn document(id: impl Into<String>) -> Self {
        Self::new(id, ShapeKind::Document)
    }

    /// Creates a list shape.
    #[must_use]
    pub fn list(id: impl Into<String>, member: Shape) -> Self {
        Self::new(
            id,
            ShapeKind::List {
                member: Box::new(member),
            },
        )
    }

    /// Creates a string-keyed map shape.
    #[must_use]
    pub fn map(id: impl Into<String>, value: Shape) -> Self {
        Self::new(
            id,
            ShapeKind::Map {
                value: Box::new(value),
            },
        )
    }

    /// Creates a structure shape.
    #[must_use]
    pub fn structure(id: impl Into<String>, members: Vec<Member>) -> Self {
        Self::new(id, ShapeKind::Structure { members })
    }

    /// Creates a union shape.
    #[must_use]
    pub fn union(id: impl Into<String>, members: Vec<Member>) -> Self {
        Self::new(id, ShapeKind::Union { members })
    }

    /// Returns the members of a structure or union, or an empty slice.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        match &self.kind {
            ShapeKind::Structure { members } | ShapeKind::Union { members } => members,
            _ => &[],
        }
    }

    /// Looks up a member by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members().iter().find(|m| m.name == name)
    }

    /// Returns `true` for list, map, structure, union and document shapes.
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::List { .. }
                | ShapeKind::Map { .. }
                | ShapeKind::Structure { .. }
                | ShapeKind::Union { .. }
                | ShapeKind::Document
        )
    }

    /// Returns `true` if this is a string shape with a media type.
    #[must_use]
    pub const fn is_media_type(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::String {
                media_type: Some(_)
            }
        )
    }
}

/// Traits attached to a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemberTraits {
    /// The member must be set.
    pub required: bool,
    /// Bound to the named header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_header: Option<String>,
    /// Bound to all headers starting with this prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_prefix_headers: Option<String>,
    /// Bound to a path label of the same name.
    pub http_label: bool,
    /// Bound to the named query parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_query: Option<String>,
    /// Map member whose entries become query parameters.
    pub http_query_params: bool,
    /// Bound to the whole body.
    pub http_payload: bool,
    /// Overrides the member name in the document body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    /// Overrides the location's default timestamp format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_format: Option<TimestampFormat>,
}

/// A named field of a structure or union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Member name.
    pub name: String,
    /// Target shape.
    pub target: Shape,
    /// Member traits.
    #[serde(default)]
    pub traits: MemberTraits,
}

impl Member {
    /// Creates a member with no traits.
    #[must_use]
    pub fn new(name: impl Into<String>, target: Shape) -> Self {
        Self {
            name: name.into(),
            target,
            traits: MemberTraits::default(),
        }
    }

    /// Marks the member as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.traits.required = true;
        self
    }

    /// Binds the member to a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.traits.http_header = Some(name.into());
        self
    }

    /// Binds the member to every header with the given prefix.
    #[must_use]
    pub fn prefix_headers(mut self, prefix: impl Into<String>) -> Self {
        self.traits.http_prefix_headers = Some(prefix.into());
        self
    }

    /// Binds the member to the path label with the member's name.
    #[must_use]
    pub fn label(mut self) -> Self {
        self.traits.http_label = true;
        self
    }

    /// Binds the member to a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>) -> Self {
        self.traits.http_query = Some(name.into());
        self
    }

    /// Binds a map member's entries to query parameters.
    #[must_use]
    pub fn query_params(mut self) -> Self {
        self.traits.http_query_params = true;
        self
    }

    /// Binds the member to the whole body.
    #[must_use]
    pub fn payload(mut self) -> Self {
        self.traits.http_payload = true;
        self
    }

    /// Renames the member in the document body.
    #[must_use]
    pub fn json_name(mut self, name: impl Into<String>) -> Self {
        self.traits.json_name = Some(name.into());
        self
    }

    /// Sets an explicit timestamp format.
    #[must_use]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.traits.timestamp_format = Some(format);
        self
    }

    /// Returns the name used for this member in the document body.
    #[must_use]
    pub fn document_name(&self) -> &str {
        self.traits.json_name.as_deref().unwrap_or(&self.name)
    }
}
