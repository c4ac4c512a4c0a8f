//! Error handling for fabrica
//!
//! This module provides the typed error surface for the factory engine. The
//! error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **Descriptive messages** that name the exact item (attribute, option,
//!    factory, cycle path) that caused the failure
//!
//! # Error Categories
//!
//! - **Registry lookup**: [`FabricaError::FactoryNotDefined`]
//! - **Dependency resolution**: [`FabricaError::DependencyCycle`],
//!   [`FabricaError::UnknownAttribute`], [`FabricaError::MissingOptionDefault`]
//! - **User callables**: [`FabricaError::BuilderFailed`],
//!   [`FabricaError::ConstructorFailed`], [`FabricaError::HookFailed`]
//! - **Input shape**: [`FabricaError::InvalidOverrides`]
//!
//! User-supplied callables (attribute builders, constructors, hooks) report
//! failures as [`anyhow::Error`] so callers can surface arbitrary error types
//! through the engine; the engine wraps them in the matching variant along
//! with the name or pipeline stage where they fired.
//!
//! # Examples
//!
//! ```rust
//! use fabrica::core::FabricaError;
//! use fabrica::factory::Factory;
//! use serde_json::json;
//!
//! let factory = Factory::new();
//! factory
//!     .attr_with("fees", &["total"], |deps| Ok(deps[0].clone()))
//!     .attr_with("total", &["fees"], |deps| Ok(deps[0].clone()));
//!
//! let err = factory.attributes(json!({}), json!({})).unwrap_err();
//! match err {
//!     FabricaError::DependencyCycle { path } => {
//!         assert_eq!(path, "fees -> total -> fees");
//!     }
//!     other => panic!("unexpected error: {other}"),
//! }
//! ```

use thiserror::Error;

use super::BuildStage;

/// The main error type for factory operations.
///
/// Every failure is fatal to the single build/create call that triggered it.
/// Factory definitions and registry state are never left mutated by a failed
/// resolution; only the per-call working maps are discarded. Sequence
/// counters consumed before the failure stay consumed.
#[derive(Error, Debug)]
pub enum FabricaError {
    /// Lookup of a factory name that was never defined.
    ///
    /// Carries a nearest-name suggestion when another defined factory is a
    /// plausible match (Levenshtein distance within half the query length).
    #[error("factory '{name}' is not defined{}", format_suggestion(.suggestion))]
    FactoryNotDefined {
        /// The name that was looked up
        name: String,
        /// Closest defined factory name, if any is plausibly close
        suggestion: Option<String>,
    },

    /// The attribute or option dependency graph closed a cycle.
    ///
    /// The path enumerates the resolution stack joined by ` -> `, ending on
    /// the name that closed the cycle, e.g. `fees -> total -> fees`.
    /// Self-dependencies on attributes are legal and never produce this;
    /// self-dependencies on options do (their builders are never re-entered).
    #[error("detected a dependency cycle: {path}")]
    DependencyCycle {
        /// The full resolution path, arrow-joined
        path: String,
    },

    /// A declared option has neither a caller-supplied value nor a default
    /// builder at resolution time.
    #[error("option `{name}` has no default value and none was provided")]
    MissingOptionDefault {
        /// Name of the option
        name: String,
    },

    /// A dependency names an attribute that is not declared and was not
    /// supplied by the caller.
    #[error("attribute '{name}' is not declared and no value was provided")]
    UnknownAttribute {
        /// Name of the missing attribute
        name: String,
    },

    /// An override mapping was required but a non-object value was given.
    ///
    /// Also raised when a before-build hook replaces the working attribute
    /// map with something other than an object.
    #[error("overrides must be a JSON object, got {found}")]
    InvalidOverrides {
        /// JSON type name of the offending value
        found: &'static str,
    },

    /// An attribute or option builder returned an error.
    #[error("builder for '{name}' failed: {source}")]
    BuilderFailed {
        /// Name of the attribute or option whose builder failed
        name: String,
        /// The builder's own error
        source: anyhow::Error,
    },

    /// The factory's constructor returned an error.
    #[error("constructor failed: {source}")]
    ConstructorFailed {
        /// The constructor's own error
        source: anyhow::Error,
    },

    /// A lifecycle hook or the create handler failed.
    ///
    /// Propagates synchronously when the failure happened before the first
    /// suspension point of the pipeline, as a rejected future afterwards.
    /// Remaining pipeline stages for that call are aborted either way.
    #[error("{stage} hook failed: {source}")]
    HookFailed {
        /// The pipeline stage the hook belonged to
        stage: BuildStage,
        /// The hook's own error
        source: anyhow::Error,
    },
}

fn format_suggestion(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}
