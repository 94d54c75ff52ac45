//! Generator extensions.
//!
//! Extensions are passed to the generator as an explicit list. They run in
//! ascending [`priority`](GeneratorExtension::priority), ties keeping list
//! order, and each may:
//!
//! - adjust generation settings through the shared [`ConfigMap`]
//! - contribute middleware units to every operation's stack
//!
//! ```
//! use hermes_codegen::{ConfigMap, GeneratorExtension, Registration};
//! use hermes_core::Operation;
//! use hermes_middleware::{Directive, FnMiddleware, RelativePosition, Stage};
//! use std::sync::Arc;
//!
//! struct TraceHeader;
//!
//! impl GeneratorExtension for TraceHeader {
//!     fn name(&self) -> &str {
//!         "trace-header"
//!     }
//!
//!     fn configure(&self, config: &mut ConfigMap) {
//!         config.set("user_agent.suffix", "trace/1.0");
//!     }
//!
//!     fn registrations(&self, _operation: &Operation) -> Vec<Registration> {
//!         let unit = FnMiddleware::new("TraceHeader", |ctx, mut input, next| {
//!             Box::pin(async move {
//!                 input.request.headers.insert("x-trace", "on");
//!                 next.run(ctx, input).await
//!             })
//!         });
//!         vec![Registration::new(
//!             Stage::Build,
//!             Directive::add(RelativePosition::After, ["TraceHeader"]),
//!             vec![Arc::new(unit)],
//!         )]
//!     }
//! }
//! ```

use hermes_core::Operation;
use hermes_middleware::stack::SharedUnit;
use hermes_middleware::{Directive, Stage};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;

/// Generation settings shared between extensions; the last write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMap {
    entries: BTreeMap<String, Json>,
}

impl ConfigMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a key, replacing any earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Json>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Json> {
        self.entries.get(key)
    }

    /// Returns a string value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Json::as_str)
    }

    /// Returns a boolean value.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Json::as_bool)
    }

    /// Removes a key.
    pub fn remove(&mut self, key: &str) -> Option<Json> {
        self.entries.remove(key)
    }

    /// Copies every entry of `other` over this map.
    pub fn merge(&mut self, other: ConfigMap) {
        self.entries.extend(other.entries);
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Json)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Units an extension adds to one stage of an operation's stack.
#[derive(Clone)]
pub struct Registration {
    /// Target stage.
    pub stage: Stage,
    /// Where the units go.
    pub directive: Directive,
    /// Implementations of every id the directive names.
    pub units: Vec<SharedUnit>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("stage", &self.stage)
            .field("directive", &self.directive)
            .field("units", &self.units.iter().map(|u| u.id()).collect::<Vec<_>>())
            .finish()
    }
}

impl Registration {
    /// Creates a registration.
    #[must_use]
    pub fn new(stage: Stage, directive: Directive, units: Vec<SharedUnit>) -> Self {
        Self {
            stage,
            directive,
            units,
        }
    }
}

/// A plug-in to the generator.
pub trait GeneratorExtension: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Ordering key; lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Adjusts generation settings.
    fn configure(&self, _config: &mut ConfigMap) {}

    /// Contributes middleware for one operation.
    fn registrations(&self, _operation: &Operation) -> Vec<Registration> {
        Vec::new()
    }
}

/// Sorts extensions by priority, keeping list order for ties.
pub(crate) fn order(extensions: &mut [Box<dyn GeneratorExtension>]) {
    extensions.sort_by_key(|extension| extension.priority());
}
