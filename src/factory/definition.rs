//! Static schema for a kind of object.
//!
//! A [`Definition`] is everything a factory knows statically: attribute and
//! option specs in declaration order, sequence counter state, the optional
//! constructor, and the five hook slots. Factory handles wrap a definition in
//! a lock; build calls snapshot it (a cheap clone, the heavy parts are
//! `Arc`s) and evaluate against the snapshot so in-flight calls never observe
//! a torn definition.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use indexmap::IndexMap;
use serde_json::Value;

use crate::core::AttrMap;
use crate::hooks::Hook;

/// Declaration-ordered spec storage.
///
/// Resolution order is driven by the dependency graph, not declaration
/// order, but iteration order still decides which top-level attribute is
/// visited first - keeping it stable makes sequence interleaving and error
/// reporting deterministic.
pub(crate) type SpecMap<T> = IndexMap<String, T>;

/// A builder invoked with its resolved dependency values, positionally in
/// declared order. Static defaults are wrapped into constant-returning
/// builders at declaration time so the engine only ever sees this one shape.
pub type BuilderFn = Arc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Wraps final attributes into a richer object; absent means the plain
/// attribute mapping is the result.
pub type Constructor = Arc<dyn Fn(AttrMap) -> anyhow::Result<Value> + Send + Sync>;

/// One declared attribute: its dependency list (which may include the
/// attribute's own name) and its builder.
#[derive(Clone)]
pub(crate) struct AttrSpec {
    pub dependencies: Vec<String>,
    pub builder: BuilderFn,
}

/// One declared option. An option without a builder has no default and must
/// be supplied by the caller at build time.
#[derive(Clone)]
pub(crate) struct OptionSpec {
    pub dependencies: Vec<String>,
    pub builder: Option<BuilderFn>,
}

/// The static schema shared by every build call on one factory.
#[derive(Clone, Default)]
pub(crate) struct Definition {
    pub construct: Option<Constructor>,
    pub attrs: SpecMap<AttrSpec>,
    pub opts: SpecMap<OptionSpec>,
    /// Last-emitted integer per sequence attribute. Builders capture the
    /// counter by `Arc`, so specs copied to a derived factory keep advancing
    /// the defining factory's stream.
    pub sequences: HashMap<String, Arc<AtomicU64>>,
    pub before_build: Vec<Hook>,
    pub after_build: Vec<Hook>,
    pub before_create: Vec<Hook>,
    pub create_handler: Option<Hook>,
    pub after_create: Vec<Hook>,
}
