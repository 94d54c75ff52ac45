//! Generation-time ordering of middleware units.
//!
//! The [`SlotRegistrar`] receives per-stage [`Directive`]s and validates them
//! in the order they are registered. Validation fails closed: the first
//! rejected directive poisons the registrar and [`SlotRegistrar::build`]
//! returns the same error.
//!
//! | Directive | Effect |
//! |---|---|
//! | `Add(Before, ids)` | prepend `ids` to the stage, keeping their order |
//! | `Add(After, ids)` | append `ids` to the stage |
//! | `Insert(rel, Before, ids)` | place `ids` immediately before `rel` |
//! | `Insert(rel, After, ids)` | place `ids` immediately after `rel` |

use crate::stack::{RelativePosition, SharedUnit, Stack};
use crate::stage::Stage;
use crate::Middleware;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// One ordering instruction for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Place ids at the front or back of the stage.
    Add {
        /// Front (`Before`) or back (`After`).
        position: RelativePosition,
        /// Unit ids, in order.
        ids: Vec<String>,
    },
    /// Place ids next to an already registered unit.
    Insert {
        /// Anchor id; must be registered earlier in the same stage.
        relative_to: String,
        /// Before or after the anchor.
        position: RelativePosition,
        /// Unit ids, in order.
        ids: Vec<String>,
    },
}

impl Directive {
    /// Creates an `Add` directive.
    pub fn add<I, S>(position: RelativePosition, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Add {
            position,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an `Insert` directive.
    pub fn insert<I, S>(relative_to: impl Into<String>, position: RelativePosition, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Insert {
            relative_to: relative_to.into(),
            position,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the ids this directive registers.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        match self {
            Self::Add { ids, .. } | Self::Insert { ids, .. } => ids,
        }
    }
}

/// Rejected registration or template instantiation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrarError {
    /// A directive named no ids.
    #[error("empty directive in stage {stage}")]
    EmptyDirective {
        /// Stage being registered.
        stage: Stage,
    },

    /// An id was already registered.
    #[error("duplicate unit id `{id}` in stage {stage}")]
    Duplicate {
        /// Stage being registered.
        stage: Stage,
        /// Offending id.
        id: String,
    },

    /// An `Insert` anchor was not registered earlier in the stage.
    #[error("insert anchor `{anchor}` is not registered in stage {stage}")]
    MissingAnchor {
        /// Stage being registered.
        stage: Stage,
        /// Missing anchor id.
        anchor: String,
    },

    /// The template names a unit the registry does not provide.
    #[error("no unit registered for id `{id}` (stage {stage})")]
    UnknownUnit {
        /// Stage referencing the id.
        stage: Stage,
        /// Missing id.
        id: String,
    },
}

/// Collects and validates ordering directives.
#[derive(Debug, Default)]
pub struct SlotRegistrar {
    order: [Vec<String>; 5],
    seen: HashSet<String>,
    error: Option<RegistrarError>,
}

impl SlotRegistrar {
    /// Creates an empty registrar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies directives to a stage in order.
    ///
    /// The first rejected directive is returned and also retained, so later
    /// calls and [`build`](Self::build) fail with it.
    pub fn register<I>(&mut self, stage: Stage, directives: I) -> Result<(), RegistrarError>
    where
        I: IntoIterator<Item = Directive>,
    {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        for directive in directives {
            if let Err(err) = self.apply(stage, directive) {
                tracing::debug!(%stage, error = %err, "slot registration rejected");
                self.error = Some(err.clone());
                return Err(err);
            }
        }
        Ok(())
    }

    /// Produces the validated template.
    pub fn build(&self) -> Result<StackTemplate, RegistrarError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(StackTemplate {
            stages: self.order.clone(),
        })
    }

    fn apply(&mut self, stage: Stage, directive: Directive) -> Result<(), RegistrarError> {
        let ids = directive.ids();
        if ids.is_empty() {
            return Err(RegistrarError::EmptyDirective { stage });
        }

        let mut fresh = HashSet::with_capacity(ids.len());
        for id in ids {
            if self.seen.contains(id) || !fresh.insert(id.as_str()) {
                return Err(RegistrarError::Duplicate {
                    stage,
                    id: id.clone(),
                });
            }
        }

        let list = &mut self.order[stage.index()];
        let index = match &directive {
            Directive::Add {
                position: RelativePosition::Before,
                ..
            } => 0,
            Directive::Add {
                position: RelativePosition::After,
                ..
            } => list.len(),
            Directive::Insert {
                relative_to,
                position,
                ..
            } => {
                let anchor = list.iter().position(|id| id == relative_to).ok_or_else(|| {
                    RegistrarError::MissingAnchor {
                        stage,
                        anchor: relative_to.clone(),
                    }
                })?;
                match position {
                    RelativePosition::Before => anchor,
                    RelativePosition::After => anchor + 1,
                }
            }
        };

        let ids = match directive {
            Directive::Add { ids, .. } | Directive::Insert { ids, .. } => ids,
        };
        self.seen.extend(ids.iter().cloned());
        let tail = list.split_off(index);
        list.extend(ids);
        list.extend(tail);
        Ok(())
    }
}

/// The validated unit order of every stage.
///
/// Templates are immutable and shared; each invocation calls
/// [`instantiate`](Self::instantiate) to get its own [`Stack`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTemplate {
    stages: [Vec<String>; 5],
}

impl StackTemplate {
    /// Returns the ids of one stage in execution order.
    #[must_use]
    pub fn ids(&self, stage: Stage) -> &[String] {
        &self.stages[stage.index()]
    }

    /// Returns every `(stage, id)` pair in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &str)> {
        Stage::all().into_iter().flat_map(move |stage| {
            self.stages[stage.index()]
                .iter()
                .map(move |id| (stage, id.as_str()))
        })
    }

    /// Returns the total number of ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    /// Returns `true` if no stage holds an id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(Vec::is_empty)
    }

    /// Checks that the registry provides every id.
    pub fn verify(&self, registry: &UnitRegistry) -> Result<(), RegistrarError> {
        for (stage, id) in self.iter() {
            if !registry.contains(id) {
                return Err(RegistrarError::UnknownUnit {
                    stage,
                    id: id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Builds a fresh stack for one invocation.
    pub fn instantiate(
        &self,
        stack_id: impl Into<String>,
        registry: &UnitRegistry,
    ) -> Result<Stack, RegistrarError> {
        let mut stack = Stack::new(stack_id);
        for (stage, id) in self.iter() {
            let unit = registry
                .get(id)
                .ok_or_else(|| RegistrarError::UnknownUnit {
                    stage,
                    id: id.to_string(),
                })?;
            stack
                .add(stage, unit, RelativePosition::After)
                .map_err(|_| RegistrarError::Duplicate {
                    stage,
                    id: id.to_string(),
                })?;
        }
        Ok(stack)
    }
}

/// Unit implementations keyed by id.
#[derive(Clone, Default)]
pub struct UnitRegistry {
    units: HashMap<String, SharedUnit>,
}

impl UnitRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit under its own id, replacing any previous one.
    pub fn register<M: Middleware>(&mut self, unit: M) -> &mut Self {
        self.register_shared(Arc::new(unit))
    }

    /// Registers an already shared unit.
    pub fn register_shared(&mut self, unit: SharedUnit) -> &mut Self {
        self.units.insert(unit.id().to_string(), unit);
        self
    }

    /// Returns the unit with the id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SharedUnit> {
        self.units.get(id).cloned()
    }

    /// Returns `true` if a unit with the id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    /// Returns the number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl std::fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.units.keys().collect();
        ids.sort();
        f.debug_struct("UnitRegistry").field("units", &ids).finish()
    }
}
