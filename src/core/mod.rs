//! Core types for the factory engine
//!
//! This module forms the foundation of the crate's type system:
//!
//! - [`FabricaError`] - Enumerated error types covering all failure modes
//! - [`BuildStage`] - The lifecycle stages a build/create call moves through,
//!   used to tag where a hook failure occurred
//! - [`AttrMap`] - The JSON object mapping used for attribute and option sets
//!
//! # Design Principles
//!
//! ## Presence over truthiness
//! `false`, `0`, `null`, and `""` are all present values. Whether an
//! attribute or option "has a value" is determined by key existence in an
//! [`AttrMap`], never by truthiness, and hook replacement is expressed
//! structurally (an enum variant) rather than by inspecting the value.
//!
//! ## Error first
//! Every operation that can fail returns a [`Result`] carrying a
//! [`FabricaError`] that names the exact item involved. Nothing is silently
//! swallowed; a failure aborts the single call that triggered it and leaves
//! factory definitions untouched.

use std::fmt;

use serde_json::Value;

pub mod error;

pub use error::FabricaError;

/// Attribute and option mappings are plain JSON objects.
pub type AttrMap = serde_json::Map<String, Value>;

/// The stages a single build or create call progresses through.
///
/// A build call runs `BeforeBuild -> Resolving -> Constructing -> AfterBuild`;
/// a create call chains `BeforeCreate -> Create -> AfterCreate` after a
/// completed build. A hook raising an error moves the call directly to its
/// failed terminal state, aborting the remaining stages; the stage is carried
/// in [`FabricaError::HookFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    /// Before-build hooks running over (override attributes, options)
    BeforeBuild,
    /// Attribute resolution
    Resolving,
    /// Wrapping resolved attributes with the constructor
    Constructing,
    /// After-build hooks running over (built object, options)
    AfterBuild,
    /// Before-create hooks
    BeforeCreate,
    /// The single create handler
    Create,
    /// After-create hooks
    AfterCreate,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BeforeBuild => "before_build",
            Self::Resolving => "resolving",
            Self::Constructing => "constructing",
            Self::AfterBuild => "after_build",
            Self::BeforeCreate => "before_create",
            Self::Create => "create",
            Self::AfterCreate => "after_create",
        };
        write!(f, "{name}")
    }
}

/// JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
