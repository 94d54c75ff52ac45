//! Path expressions used by waiter acceptors and paginator items.
//!
//! Supported syntax:
//!
//! | Form | Meaning |
//! |---|---|
//! | `Table.Status` | member access |
//! | `Items[0]`, `Items[-1]` | index, negative counts from the end |
//! | `Items[].Id`, `Items[*].Id` | projection; `[]` also flattens nested lists |
//! | `length(Items)` | element count of a list, map, structure or string |
//!
//! Evaluation never fails: missing members, out-of-range indices and
//! projections over non-lists yield [`Value::Null`].

use hermes_core::{Shape, ShapeKind, Value};
use std::fmt;
use thiserror::Error;

/// Failure parsing or checking a path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The text is not a valid path.
    #[error("invalid path `{path}` at offset {offset}: {message}")]
    Syntax {
        /// The path text.
        path: String,
        /// Byte offset of the problem.
        offset: usize,
        /// What went wrong.
        message: String,
    },

    /// A member does not exist on the shape the path walks.
    #[error("path `{path}` references unknown member `{member}` of `{shape}`")]
    UnknownMember {
        /// The path text.
        path: String,
        /// The missing member.
        member: String,
        /// Shape id searched.
        shape: String,
    },

    /// An index or projection is applied to a non-list shape.
    #[error("path `{path}` indexes `{shape}`, which is a {kind}")]
    NotAList {
        /// The path text.
        path: String,
        /// Shape id.
        shape: String,
        /// Shape kind name.
        kind: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Field(String),
    Index(i64),
    Project { flatten: bool },
}

/// A parsed path expression.
///
/// ```
/// use hermes_codegen::path::PathExpr;
/// use hermes_core::Value;
///
/// let path = PathExpr::parse("Tables[].Status").unwrap();
/// let output = Value::structure().with(
///     "Tables",
///     vec![
///         Value::structure().with("Status", "ACTIVE"),
///         Value::structure().with("Status", "CREATING"),
///     ],
/// );
/// assert_eq!(
///     path.evaluate(&output),
///     Value::List(vec!["ACTIVE".into(), "CREATING".into()])
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    text: String,
    steps: Vec<Step>,
    length: bool,
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PathExpr {
    /// Parses a path.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let trimmed = text.trim();
        let (inner, length, base) = match trimmed
            .strip_prefix("length(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) => (inner, true, text.len() - trimmed.len() + "length(".len()),
            None => (trimmed, false, text.len() - trimmed.len()),
        };

        let steps = Parser {
            text,
            src: inner.as_bytes(),
            pos: 0,
            base,
        }
        .steps()?;

        Ok(Self {
            text: text.to_string(),
            steps,
            length,
        })
    }

    /// Returns the path text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Evaluates the path against a value.
    #[must_use]
    pub fn evaluate(&self, root: &Value) -> Value {
        let result = walk(&self.steps, root);
        if !self.length {
            return result;
        }
        let len = match &result {
            Value::List(items) => items.len(),
            Value::Map(fields) | Value::Structure(fields) => fields.len(),
            Value::String(s) => s.chars().count(),
            _ => return Value::Null,
        };
        i64::try_from(len).map_or(Value::Null, Value::Integer)
    }

    /// Checks that every member the path names exists on `shape`.
    ///
    /// Maps accept any key and documents are not checked below their root.
    pub fn check(&self, shape: &Shape) -> Result<(), PathError> {
        let mut current = shape;
        for step in &self.steps {
            current = match (step, &current.kind) {
                (_, ShapeKind::Document) => return Ok(()),
                (Step::Field(name), ShapeKind::Structure { members } | ShapeKind::Union { members }) => {
                    &members
                        .iter()
                        .find(|m| &m.name == name)
                        .ok_or_else(|| PathError::UnknownMember {
                            path: self.text.clone(),
                            member: name.clone(),
                            shape: current.id.clone(),
                        })?
                        .target
                }
                (Step::Field(_), ShapeKind::Map { value }) => &**value,
                (Step::Field(name), _) => {
                    return Err(PathError::UnknownMember {
                        path: self.text.clone(),
                        member: name.clone(),
                        shape: current.id.clone(),
                    })
                }
                (Step::Index(_) | Step::Project { .. }, ShapeKind::List { member }) => &**member,
                (Step::Index(_) | Step::Project { .. }, kind) => {
                    return Err(PathError::NotAList {
                        path: self.text.clone(),
                        shape: current.id.clone(),
                        kind: kind.name(),
                    })
                }
            };
        }
        Ok(())
    }
}

fn walk(steps: &[Step], value: &Value) -> Value {
    let Some((step, rest)) = steps.split_first() else {
        return value.clone();
    };
    match step {
        Step::Field(name) => value.get(name).map_or(Value::Null, |inner| walk(rest, inner)),
        Step::Index(index) => {
            let Some(items) = value.as_list() else {
                return Value::Null;
            };
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let resolved = if *index < 0 { len + index } else { *index };
            usize::try_from(resolved)
                .ok()
                .and_then(|i| items.get(i))
                .map_or(Value::Null, |inner| walk(rest, inner))
        }
        Step::Project { flatten } => {
            let Some(items) = value.as_list() else {
                return Value::Null;
            };
            let mut elements = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::List(nested) if *flatten => elements.extend(nested.iter()),
                    other => elements.push(other),
                }
            }
            Value::List(
                elements
                    .into_iter()
                    .map(|item| walk(rest, item))
                    .filter(|v| !v.is_null())
                    .collect(),
            )
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    base: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> PathError {
        PathError::Syntax {
            path: self.text.to_string(),
            offset: self.base + self.pos,
            message: message.into(),
        }
    }

    fn steps(mut self) -> Result<Vec<Step>, PathError> {
        if self.src.is_empty() {
            return Err(self.error("empty path"));
        }
        let mut steps = vec![Step::Field(self.ident()?)];
        while self.pos < self.src.len() {
            match self.src[self.pos] {
                b'.' => {
                    self.pos += 1;
                    steps.push(Step::Field(self.ident()?));
                }
                b'[' => {
                    self.pos += 1;
                    steps.push(self.bracket()?);
                }
                _ => return Err(self.error("expected `.` or `[`")),
            }
        }
        Ok(steps)
    }

    fn ident(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        while self
            .src
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.pos += 1;
        }
        if start == self.pos || self.src[start].is_ascii_digit() {
            self.pos = start;
            return Err(self.error("expected identifier"));
        }
        Ok(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
    }

    fn bracket(&mut self) -> Result<Step, PathError> {
        let close = self.src[self.pos..]
            .iter()
            .position(|b| *b == b']')
            .ok_or_else(|| self.error("unclosed `[`"))?;
        let inner = std::str::from_utf8(&self.src[self.pos..self.pos + close])
            .map_err(|_| self.error("invalid index"))?
            .trim();
        let step = match inner {
            "" => Step::Project { flatten: true },
            "*" => Step::Project { flatten: false },
            number => Step::Index(
                number
                    .parse()
                    .map_err(|_| self.error(format!("invalid index `{number}`")))?,
            ),
        };
        self.pos += close + 1;
        Ok(step)
    }
}
