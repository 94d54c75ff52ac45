//! Per-call middleware stack.
//!
//! A [`Stack`] holds one ordered [`StepList`] per [`Stage`]. Stacks are built
//! fresh for every invocation, usually from a shared
//! [`StackTemplate`](crate::StackTemplate), and may be mutated before the call
//! runs. Unit ids are unique across the whole stack.

use crate::context::CallContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stage::Stage;
use crate::types::{StageInput, StageOutput};
use hermes_core::ErrorKind;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A unit shared between the registry and stack instances.
pub type SharedUnit = Arc<dyn Middleware>;

/// Where to place units relative to an anchor or the stage boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativePosition {
    /// Before the anchor, or at the front of the stage.
    Before,
    /// After the anchor, or at the back of the stage.
    After,
}

/// A rejected stack mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// The id is already used somewhere in the stack.
    #[error("unit `{id}` already exists in stack `{stack}`")]
    Duplicate {
        /// Stack identifier.
        stack: String,
        /// Offending unit id.
        id: String,
    },

    /// The unit is not in the stack.
    #[error("unit `{id}` not found in stack `{stack}`")]
    NotFound {
        /// Stack identifier.
        stack: String,
        /// Missing unit id.
        id: String,
    },

    /// The anchor of an insertion is not in the target stage.
    #[error("anchor `{anchor}` not found in stage {stage} of stack `{stack}`")]
    MissingAnchor {
        /// Stack identifier.
        stack: String,
        /// Target stage.
        stage: Stage,
        /// Missing anchor id.
        anchor: String,
    },
}

impl StackError {
    fn stack(&self) -> &str {
        match self {
            Self::Duplicate { stack, .. }
            | Self::NotFound { stack, .. }
            | Self::MissingAnchor { stack, .. } => stack,
        }
    }
}

impl From<StackError> for ErrorKind {
    fn from(err: StackError) -> Self {
        Self::Stack {
            stack: err.stack().to_string(),
            message: err.to_string(),
        }
    }
}

/// The ordered units of one stage.
#[derive(Clone)]
pub struct StepList {
    stage: Stage,
    units: Vec<SharedUnit>,
}

impl StepList {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            units: Vec::new(),
        }
    }

    /// Returns the stage this list belongs to.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the unit ids in execution order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.units.iter().map(|unit| unit.id()).collect()
    }

    /// Returns the number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if the stage has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.units.iter().position(|unit| unit.id() == id)
    }
}

impl fmt::Debug for StepList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepList")
            .field("stage", &self.stage)
            .field("units", &self.ids())
            .finish()
    }
}

/// The five-stage stack of one invocation.
///
/// # Example
///
/// ```ignore
/// let mut stack = Stack::new("GetObject");
/// stack.add(Stage::Build, Arc::new(UserAgent::new("hermes/0.1")), RelativePosition::After)?;
/// stack.insert(Stage::Build, Arc::new(TraceHeader), "UserAgent", RelativePosition::Before)?;
/// assert_eq!(stack.ids(Stage::Build), ["TraceHeader", "UserAgent"]);
/// ```
#[derive(Debug, Clone)]
pub struct Stack {
    id: String,
    steps: [StepList; 5],
}

impl Stack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Stage::all().map(StepList::new),
        }
    }

    /// Returns the stack identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the units of one stage.
    #[must_use]
    pub const fn stage(&self, stage: Stage) -> &StepList {
        &self.steps[stage.index()]
    }

    /// Returns the unit ids of one stage in execution order.
    #[must_use]
    pub fn ids(&self, stage: Stage) -> Vec<&str> {
        self.stage(stage).ids()
    }

    /// Returns the total number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.iter().map(StepList::len).sum()
    }

    /// Returns `true` if no stage holds a unit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.iter().all(StepList::is_empty)
    }

    /// Returns the unit with the given id and the stage holding it.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<(Stage, &SharedUnit)> {
        self.steps.iter().find_map(|list| {
            list.position(id)
                .map(|index| (list.stage, &list.units[index]))
        })
    }

    /// Returns `true` if any stage holds a unit with the id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Adds a unit at the front or back of a stage.
    pub fn add(
        &mut self,
        stage: Stage,
        unit: SharedUnit,
        position: RelativePosition,
    ) -> Result<(), StackError> {
        self.ensure_unused(unit.id())?;
        let units = &mut self.steps[stage.index()].units;
        match position {
            RelativePosition::Before => units.insert(0, unit),
            RelativePosition::After => units.push(unit),
        }
        Ok(())
    }

    /// Inserts a unit immediately before or after an anchor in the same stage.
    pub fn insert(
        &mut self,
        stage: Stage,
        unit: SharedUnit,
        relative_to: &str,
        position: RelativePosition,
    ) -> Result<(), StackError> {
        self.ensure_unused(unit.id())?;
        let list = &mut self.steps[stage.index()];
        let anchor = list
            .position(relative_to)
            .ok_or_else(|| StackError::MissingAnchor {
                stack: self.id.clone(),
                stage,
                anchor: relative_to.to_string(),
            })?;
        let index = match position {
            RelativePosition::Before => anchor,
            RelativePosition::After => anchor + 1,
        };
        list.units.insert(index, unit);
        Ok(())
    }

    /// Removes a unit, returning it.
    pub fn remove(&mut self, id: &str) -> Result<SharedUnit, StackError> {
        for list in &mut self.steps {
            if let Some(index) = list.position(id) {
                return Ok(list.units.remove(index));
            }
        }
        Err(self.not_found(id))
    }

    /// Replaces a unit in place, returning the old one.
    ///
    /// The replacement may carry a different id as long as that id is not
    /// used elsewhere in the stack.
    pub fn swap(&mut self, id: &str, unit: SharedUnit) -> Result<SharedUnit, StackError> {
        if unit.id() != id {
            self.ensure_unused(unit.id())?;
        }
        for list in &mut self.steps {
            if let Some(index) = list.position(id) {
                return Ok(std::mem::replace(&mut list.units[index], unit));
            }
        }
        Err(self.not_found(id))
    }

    /// Runs the stack, ending in `terminal`.
    ///
    /// Stages run in declaration order and units within a stage in list
    /// order; the terminal handler sits below the last Deserialize unit.
    pub async fn handle<'a, T>(
        &'a self,
        ctx: &'a mut CallContext,
        input: StageInput,
        terminal: T,
    ) -> Result<StageOutput, ErrorKind>
    where
        T: FnOnce(&mut CallContext, StageInput) -> BoxFuture<'static, Result<StageOutput, ErrorKind>>
            + Send
            + 'a,
    {
        tracing::debug!(
            stack = %self.id,
            invocation_id = %ctx.invocation_id(),
            units = self.len(),
            "running middleware stack"
        );
        self.chain(terminal).run(ctx, input).await
    }

    fn chain<'a, T>(&'a self, terminal: T) -> Next<'a>
    where
        T: FnOnce(&mut CallContext, StageInput) -> BoxFuture<'static, Result<StageOutput, ErrorKind>>
            + Send
            + 'a,
    {
        let mut next = Next::terminal(terminal);
        for unit in self.steps.iter().rev().flat_map(|list| list.units.iter().rev()) {
            next = Next::new(unit.as_ref(), next);
        }
        next
    }

    fn ensure_unused(&self, id: &str) -> Result<(), StackError> {
        if self.contains(id) {
            return Err(StackError::Duplicate {
                stack: self.id.clone(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn not_found(&self, id: &str) -> StackError {
        StackError::NotFound {
            stack: self.id.clone(),
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hermes_core::{HttpResponse, Value};
    use http::StatusCode;

    struct Mark(&'static str);

    impl Middleware for Mark {
        fn id(&self) -> &str {
            self.0
        }

        fn handle<'a>(
            &'a self,
            ctx: &'a mut CallContext,
            mut input: StageInput,
            next: Next<'a>,
        ) -> BoxFuture<'a, Result<StageOutput, ErrorKind>> {
            Box::pin(async move {
                input.request.headers.append("x-trail", self.0);
                next.run(ctx, input).await
            })
        }
    }

    fn mark(id: &'static str) -> SharedUnit {
        Arc::new(Mark(id))
    }

    fn trail_terminal(
        _ctx: &mut CallContext,
        input: StageInput,
    ) -> BoxFuture<'static, Result<StageOutput, ErrorKind>> {
        Box::pin(async move {
            let trail = input.request.headers.get_all("x-trail").join(",");
            Ok(StageOutput::from_response(HttpResponse::new(
                StatusCode::OK,
                Bytes::from(trail),
            )))
        })
    }

    #[test]
    fn test_add_before_and_after() {
        let mut stack = Stack::new("Op");
        stack.add(Stage::Build, mark("B"), RelativePosition::After).unwrap();
        stack.add(Stage::Build, mark("C"), RelativePosition::After).unwrap();
        stack.add(Stage::Build, mark("A"), RelativePosition::Before).unwrap();
        assert_eq!(stack.ids(Stage::Build), ["A", "B", "C"]);
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn test_insert_relative_to_anchor() {
        let mut stack = Stack::new("Op");
        stack.add(Stage::Finalize, mark("Endpoint"), RelativePosition::After).unwrap();
        stack
            .insert(Stage::Finalize, mark("Sign"), "Endpoint", RelativePosition::After)
            .unwrap();
        stack
            .insert(Stage::Finalize, mark("Pre"), "Endpoint", RelativePosition::Before)
            .unwrap();
        assert_eq!(stack.ids(Stage::Finalize), ["Pre", "Endpoint", "Sign"]);
    }

    #[test]
    fn test_ids_are_unique_across_stages() {
        let mut stack = Stack::new("Op");
        stack.add(Stage::Initialize, mark("Log"), RelativePosition::After).unwrap();
        let err = stack
            .add(Stage::Deserialize, mark("Log"), RelativePosition::After)
            .unwrap_err();
        assert_eq!(
            err,
            StackError::Duplicate {
                stack: "Op".to_string(),
                id: "Log".to_string()
            }
        );
    }

    #[test]
    fn test_insert_requires_anchor_in_same_stage() {
        let mut stack = Stack::new("Op");
        stack.add(Stage::Build, mark("Anchor"), RelativePosition::After).unwrap();
        let err = stack
            .insert(Stage::Finalize, mark("X"), "Anchor", RelativePosition::After)
            .unwrap_err();
        assert!(matches!(err, StackError::MissingAnchor { stage: Stage::Finalize, .. }));
        assert!(!stack.contains("X"));
    }

    #[test]
    fn test_remove_and_swap() {
        let mut stack = Stack::new("Op");
        stack.add(Stage::Build, mark("A"), RelativePosition::After).unwrap();
        stack.add(Stage::Build, mark("B"), RelativePosition::After).unwrap();

        let old = stack.swap("A", mark("A2")).unwrap();
        assert_eq!(old.id(), "A");
        assert_eq!(stack.ids(Stage::Build), ["A2", "B"]);

        assert!(stack.swap("A2", mark("B")).is_err());
        assert_eq!(stack.remove("B").unwrap().id(), "B");
        assert!(matches!(stack.remove("B"), Err(StackError::NotFound { .. })));
        assert_eq!(stack.get("A2").map(|(stage, _)| stage), Some(Stage::Build));
    }

    #[test]
    fn test_stack_error_converts_to_error_kind() {
        let kind: ErrorKind = StackError::NotFound {
            stack: "Op".to_string(),
            id: "Gone".to_string(),
        }
        .into();
        assert!(matches!(kind, ErrorKind::Stack { ref stack, .. } if stack == "Op"));
    }

    #[tokio::test]
    async fn test_stages_run_in_order_regardless_of_insertion_order() {
        let mut stack = Stack::new("Op");
        stack.add(Stage::Deserialize, mark("D"), RelativePosition::After).unwrap();
        stack.add(Stage::Initialize, mark("I"), RelativePosition::After).unwrap();
        stack.add(Stage::Finalize, mark("F"), RelativePosition::After).unwrap();
        stack.add(Stage::Serialize, mark("S"), RelativePosition::After).unwrap();
        stack.add(Stage::Build, mark("B2"), RelativePosition::After).unwrap();
        stack.add(Stage::Build, mark("B1"), RelativePosition::Before).unwrap();

        let mut ctx = CallContext::new("Svc", "Op");
        let output = stack
            .handle(&mut ctx, StageInput::new(Value::Null), trail_terminal)
            .await
            .unwrap();
        assert_eq!(
            output.raw_response.unwrap().body,
            Bytes::from_static(b"I,S,B1,B2,F,D")
        );
    }
}
