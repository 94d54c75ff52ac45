//! Binding Model.
//!
//! For every member of an input, output or error structure the binding model
//! records where the member travels on the wire and under which name. The
//! serializer and deserializer only ever consult these bindings; they never
//! re-derive locations from raw traits.
//!
//! | Trait | Location | Wire name |
//! |---|---|---|
//! | `http_header` | [`BindingLocation::Header`] | header name |
//! | `http_prefix_headers` | [`BindingLocation::PrefixHeaders`] | prefix |
//! | `http_label` | [`BindingLocation::Label`] | member name |
//! | `http_query` / `http_query_params` | [`BindingLocation::Query`] | parameter name (empty for maps) |
//! | `http_payload` | [`BindingLocation::Payload`] | member name |
//! | none | [`BindingLocation::Document`] | `json_name` or member name |

use crate::shape::{Member, Shape, ShapeKind, TimestampFormat};
use crate::uri::PathTemplate;
use std::fmt;
use thiserror::Error;

/// Where a member is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingLocation {
    /// A single named header (repeated for lists).
    Header,
    /// Every header starting with a prefix, collected into a map.
    PrefixHeaders,
    /// A path label.
    Label,
    /// A query parameter, or a map of parameters.
    Query,
    /// The whole body.
    Payload,
    /// A member of the structured document body.
    Document,
}

impl fmt::Display for BindingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "header"),
            Self::PrefixHeaders => write!(f, "prefix headers"),
            Self::Label => write!(f, "label"),
            Self::Query => write!(f, "query"),
            Self::Payload => write!(f, "payload"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// Errors found while resolving bindings. These are generation-time errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// The bound shape is not a structure.
    #[error("shape `{shape}` must be a structure to carry bindings, found {kind}")]
    NotAStructure {
        /// Shape id.
        shape: String,
        /// Actual kind.
        kind: &'static str,
    },

    /// A member carries more than one HTTP binding trait.
    #[error("member `{shape}.{member}` has conflicting HTTP binding traits")]
    ConflictingTraits {
        /// Shape id.
        shape: String,
        /// Member name.
        member: String,
    },

    /// More than one member is bound to the payload.
    #[error("shape `{shape}` binds more than one member to the payload: {members:?}")]
    MultiplePayloads {
        /// Shape id.
        shape: String,
        /// Offending members.
        members: Vec<String>,
    },

    /// A payload member coexists with document members.
    #[error("shape `{shape}` binds `{payload}` to the payload but also has document members")]
    PayloadWithDocument {
        /// Shape id.
        shape: String,
        /// Payload member.
        payload: String,
    },

    /// A template label has no matching member.
    #[error("path template `{template}` references label `{label}` with no bound member")]
    MissingLabelMember {
        /// Template text.
        template: String,
        /// Label name.
        label: String,
    },

    /// A label member has no matching template label.
    #[error("member `{shape}.{member}` is bound to a label missing from the path template")]
    UnboundLabel {
        /// Shape id.
        shape: String,
        /// Member name.
        member: String,
    },

    /// A label member is not required.
    #[error("label member `{shape}.{member}` must be required")]
    OptionalLabel {
        /// Shape id.
        shape: String,
        /// Member name.
        member: String,
    },

    /// A location that cannot appear on this side of the exchange.
    #[error("member `{shape}.{member}` cannot be bound to {location} here")]
    UnsupportedLocation {
        /// Shape id.
        shape: String,
        /// Member name.
        member: String,
        /// Offending location.
        location: BindingLocation,
    },

    /// The member's target kind cannot be bound to the location.
    #[error("member `{shape}.{member}` targets {kind}, which cannot be bound to {location}")]
    InvalidTarget {
        /// Shape id.
        shape: String,
        /// Member name.
        member: String,
        /// Target kind.
        kind: &'static str,
        /// Location.
        location: BindingLocation,
    },

    /// The path template is malformed.
    #[error("invalid path template `{template}`: {reason}")]
    InvalidTemplate {
        /// Template text.
        template: String,
        /// What is wrong.
        reason: String,
    },
}

/// One member's binding.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBinding {
    /// Member name in the structure.
    pub member: String,
    /// Transport location.
    pub location: BindingLocation,
    /// Name on the wire (header, parameter, label or document key).
    pub wire_name: String,
    /// Target shape, used to choose formatting.
    pub target: Shape,
    /// Whether the member is required.
    pub required: bool,
    /// Explicit timestamp format, if any.
    pub timestamp_format: Option<TimestampFormat>,
    /// For labels: whether the label is greedy.
    pub greedy: bool,
}

/// All bindings of one structure.
///
/// # Example
///
/// ```
/// use hermes_core::{BindingLocation, Member, OperationBindings, PathTemplate, Shape};
///
/// let input = Shape::structure(
///     "PutInput",
///     vec![
///         Member::new("Id", Shape::string("Id")).required().label(),
///         Member::new("Trace", Shape::string("Trace")).header("x-trace"),
///         Member::new("Name", Shape::string("Name")),
///     ],
/// );
/// let template = PathTemplate::parse("/items/{Id}").unwrap();
/// let bindings = OperationBindings::resolve_input(&input, Some(&template)).unwrap();
///
/// assert_eq!(bindings.located(BindingLocation::Document).count(), 1);
/// assert_eq!(bindings.get("Trace").unwrap().wire_name, "x-trace");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OperationBindings {
    shape_id: String,
    bindings: Vec<MemberBinding>,
}

impl OperationBindings {
    /// Resolves bindings of an input structure.
    ///
    /// Every template label must have a required label member and vice versa.
    ///
    /// # Errors
    ///
    /// Returns a [`BindingError`] describing the first violation found.
    pub fn resolve_input(
        shape: &Shape,
        template: Option<&PathTemplate>,
    ) -> Result<Self, BindingError> {
        let resolved = Self::resolve(shape)?;

        for binding in resolved.located(BindingLocation::Label) {
            if !binding.required {
                return Err(BindingError::OptionalLabel {
                    shape: shape.id.clone(),
                    member: binding.member.clone(),
                });
            }
            let in_template =
                template.is_some_and(|t| t.labels().any(|l| l.name == binding.member));
            if !in_template {
                return Err(BindingError::UnboundLabel {
                    shape: shape.id.clone(),
                    member: binding.member.clone(),
                });
            }
        }

        let mut resolved = resolved;
        if let Some(template) = template {
            for label in template.labels() {
                let binding = resolved
                    .bindings
                    .iter_mut()
                    .find(|b| b.location == BindingLocation::Label && b.member == label.name)
                    .ok_or_else(|| BindingError::MissingLabelMember {
                        template: template.as_str().to_string(),
                        label: label.name.clone(),
                    })?;
                binding.greedy = label.greedy;
            }
        }

        Ok(resolved)
    }

    /// Resolves bindings of an output or error structure.
    ///
    /// # Errors
    ///
    /// Labels and query parameters cannot appear in responses and are
    /// rejected with [`BindingError::UnsupportedLocation`].
    pub fn resolve_output(shape: &Shape) -> Result<Self, BindingError> {
        let resolved = Self::resolve(shape)?;
        if let Some(binding) = resolved.bindings.iter().find(|b| {
            matches!(b.location, BindingLocation::Label | BindingLocation::Query)
        }) {
            return Err(BindingError::UnsupportedLocation {
                shape: shape.id.clone(),
                member: binding.member.clone(),
                location: binding.location,
            });
        }
        Ok(resolved)
    }

    fn resolve(shape: &Shape) -> Result<Self, BindingError> {
        let ShapeKind::Structure { members } = &shape.kind else {
            return Err(BindingError::NotAStructure {
                shape: shape.id.clone(),
                kind: shape.kind.name(),
            });
        };

        let bindings = members
            .iter()
            .map(|member| bind_member(&shape.id, member))
            .collect::<Result<Vec<_>, _>>()?;

        let payloads: Vec<_> = bindings
            .iter()
            .filter(|b| b.location == BindingLocation::Payload)
            .map(|b| b.member.clone())
            .collect();
        if payloads.len() > 1 {
            return Err(BindingError::MultiplePayloads {
                shape: shape.id.clone(),
                members: payloads,
            });
        }
        if let Some(payload) = payloads.into_iter().next() {
            if bindings
                .iter()
                .any(|b| b.location == BindingLocation::Document)
            {
                return Err(BindingError::PayloadWithDocument {
                    shape: shape.id.clone(),
                    payload,
                });
            }
        }

        Ok(Self {
            shape_id: shape.id.clone(),
            bindings,
        })
    }

    /// Returns the id of the bound structure.
    #[must_use]
    pub fn shape_id(&self) -> &str {
        &self.shape_id
    }

    /// Returns every binding in member order.
    #[must_use]
    pub fn bindings(&self) -> &[MemberBinding] {
        &self.bindings
    }

    /// Returns the bindings at one location, in member order.
    pub fn located(&self, location: BindingLocation) -> impl Iterator<Item = &MemberBinding> {
        self.bindings.iter().filter(move |b| b.location == location)
    }

    /// Looks up a binding by member name.
    #[must_use]
    pub fn get(&self, member: &str) -> Option<&MemberBinding> {
        self.bindings.iter().find(|b| b.member == member)
    }

    /// Returns the payload binding, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&MemberBinding> {
        self.located(BindingLocation::Payload).next()
    }

    /// Returns `true` if any member is bound to the document body.
    #[must_use]
    pub fn has_document_members(&self) -> bool {
        self.located(BindingLocation::Document).next().is_some()
    }
}

fn bind_member(shape_id: &str, member: &Member) -> Result<MemberBinding, BindingError> {
    let traits = &member.traits;
    let mut candidates = Vec::with_capacity(1);
    if let Some(name) = &traits.http_header {
        candidates.push((BindingLocation::Header, name.clone()));
    }
    if let Some(prefix) = &traits.http_prefix_headers {
        candidates.push((BindingLocation::PrefixHeaders, prefix.clone()));
    }
    if traits.http_label {
        candidates.push((BindingLocation::Label, member.name.clone()));
    }
    if let Some(name) = &traits.http_query {
        candidates.push((BindingLocation::Query, name.clone()));
    }
    if traits.http_query_params {
        candidates.push((BindingLocation::Query, String::new()));
    }
    if traits.http_payload {
        candidates.push((BindingLocation::Payload, member.name.clone()));
    }

    if candidates.len() > 1 {
        return Err(BindingError::ConflictingTraits {
            shape: shape_id.to_string(),
            member: member.name.clone(),
        });
    }
    let (location, wire_name) = candidates
        .pop()
        .unwrap_or_else(|| (BindingLocation::Document, member.document_name().to_string()));

    check_target(shape_id, member, location)?;

    Ok(MemberBinding {
        member: member.name.clone(),
        location,
        wire_name,
        target: member.target.clone(),
        required: traits.required,
        timestamp_format: traits.timestamp_format,
        greedy: false,
    })
}

fn check_target(
    shape_id: &str,
    member: &Member,
    location: BindingLocation,
) -> Result<(), BindingError> {
    let target = &member.target.kind;
    let scalar = |kind: &ShapeKind| {
        !matches!(
            kind,
            ShapeKind::List { .. }
                | ShapeKind::Map { .. }
                | ShapeKind::Structure { .. }
                | ShapeKind::Union { .. }
                | ShapeKind::Document
        )
    };
    let valid = match location {
        BindingLocation::Header | BindingLocation::Query => match target {
            ShapeKind::List { member: element } => scalar(&element.kind),
            ShapeKind::Map { value } if member.traits.http_query_params => match &value.kind {
                ShapeKind::List { member: element } => scalar(&element.kind),
                other => scalar(other),
            },
            other => scalar(other) && !matches!(other, ShapeKind::Blob),
        },
        BindingLocation::PrefixHeaders => {
            matches!(target, ShapeKind::Map { value } if scalar(&value.kind))
        }
        BindingLocation::Label => scalar(target) && !matches!(target, ShapeKind::Blob),
        BindingLocation::Payload => !matches!(target, ShapeKind::List { .. } | ShapeKind::Map { .. }),
        BindingLocation::Document => true,
    };

    if valid {
        Ok(())
    } else {
        Err(BindingError::InvalidTarget {
            shape: shape_id.to_string(),
            member: member.name.clone(),
            kind: target.name(),
            location,
        })
    }
}
