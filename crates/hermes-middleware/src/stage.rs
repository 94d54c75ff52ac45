//! The five fixed stages.

use std::fmt;

/// Middleware stage.
///
/// Stages always execute in declaration order; the derived `Ord` reflects
/// that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Input parameter preparation and validation.
    Initialize = 0,
    /// Conversion of parameters into a request.
    Serialize = 1,
    /// Request enrichment that does not depend on the endpoint.
    Build = 2,
    /// Endpoint resolution and signing.
    Finalize = 3,
    /// Conversion of the raw response into output or error.
    Deserialize = 4,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "Initialize",
            Self::Serialize => "Serialize",
            Self::Build => "Build",
            Self::Finalize => "Finalize",
            Self::Deserialize => "Deserialize",
        }
    }

    /// Returns the zero-based execution index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns all stages in execution order.
    #[must_use]
    pub const fn all() -> [Stage; 5] {
        [
            Self::Initialize,
            Self::Serialize,
            Self::Build,
            Self::Finalize,
            Self::Deserialize,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
