//! Dependency-resolving evaluation engine
//!
//! This module computes final attribute and option sets from declared specs,
//! caller-supplied overrides, and per-item dependency lists. It is the heart
//! of the crate; everything else (factory handles, hooks, the registry) is
//! wiring around it.
//!
//! # Resolution model
//!
//! Evaluation is demand-driven: each top-level item is resolved by resolving
//! its declared dependencies first (in declared order), then invoking its
//! builder with the resolved values positionally. Results are written back to
//! the working map, so later dependents observe them without recomputation.
//! Declaration order of the specs never affects values - the dependency
//! graph determines evaluation order - but each top-level resolution carries
//! its own [`ResolutionStack`] seeded with its own name so cycle errors can
//! report the exact path.
//!
//! # Override rules
//!
//! A caller-supplied value short-circuits resolution of that name, with one
//! exception: an attribute that lists *itself* as a dependency is always
//! re-evaluated, and the override is handed to its builder as the current
//! value of the self-reference. Presence is key existence - `false`, `0`,
//! and `null` overrides are honored.
//!
//! # Options versus attributes
//!
//! Options resolve strictly against other options; an attribute name (or any
//! undeclared name) in the option dependency graph fails with
//! [`FabricaError::MissingOptionDefault`]. Attribute dependencies look in the
//! resolved option map first, then handle self-reference, then check the
//! stack for cycles, then recurse into sibling attributes.

use serde_json::Value;

use crate::core::{AttrMap, FabricaError};
use crate::factory::definition::{AttrSpec, OptionSpec, SpecMap};

mod stack;

use stack::ResolutionStack;

/// Resolve the complete option set for one build call.
///
/// Produces a mapping covering every declared option. Caller-supplied values
/// always win; otherwise the option's default builder runs with its resolved
/// dependencies. Undeclared keys in `overrides` pass through untouched.
pub(crate) fn resolve_options(
    specs: &SpecMap<OptionSpec>,
    overrides: AttrMap,
) -> Result<AttrMap, FabricaError> {
    let mut working = overrides;
    for name in specs.keys() {
        if working.contains_key(name) {
            continue;
        }
        let mut stack = ResolutionStack::seeded(name);
        let value = resolve_option(name, specs, &mut working, &mut stack)?;
        working.insert(name.clone(), value);
    }
    Ok(working)
}

fn resolve_option(
    name: &str,
    specs: &SpecMap<OptionSpec>,
    working: &mut AttrMap,
    stack: &mut ResolutionStack,
) -> Result<Value, FabricaError> {
    if let Some(value) = working.get(name) {
        return Ok(value.clone());
    }
    // Options may only depend on other options: anything undeclared here
    // (including attribute names) has no default to fall back on.
    let spec = specs
        .get(name)
        .ok_or_else(|| FabricaError::MissingOptionDefault { name: name.to_string() })?;
    let builder = spec
        .builder
        .as_ref()
        .ok_or_else(|| FabricaError::MissingOptionDefault { name: name.to_string() })?;

    let mut args = Vec::with_capacity(spec.dependencies.len());
    for dep in &spec.dependencies {
        if let Some(value) = working.get(dep) {
            args.push(value.clone());
            continue;
        }
        if stack.contains(dep) {
            // Covers option-to-option cycles and option self-dependency:
            // an option's own builder is never re-entered.
            let path = stack.cycle_path(dep);
            tracing::debug!(option = name, %path, "option dependency cycle");
            return Err(FabricaError::DependencyCycle { path });
        }
        stack.push(dep);
        let value = resolve_option(dep, specs, working, stack)?;
        stack.pop();
        working.insert(dep.clone(), value.clone());
        args.push(value);
    }

    builder(&args).map_err(|e| FabricaError::BuilderFailed { name: name.to_string(), source: e })
}

/// Resolve the complete attribute set for one build call.
///
/// The result is `overrides ∪ computed declared attributes`: caller keys not
/// declared as attributes remain verbatim, declared attributes are resolved
/// against `options` and each other. Each top-level attribute gets an
/// independent resolution stack seeded with its own name.
pub(crate) fn resolve_attributes(
    specs: &SpecMap<AttrSpec>,
    overrides: AttrMap,
    options: &AttrMap,
) -> Result<AttrMap, FabricaError> {
    let mut working = overrides;
    for name in specs.keys() {
        let mut stack = ResolutionStack::seeded(name);
        resolve_attr(name, specs, &mut working, options, &mut stack)?;
    }
    Ok(working)
}

fn resolve_attr(
    name: &str,
    specs: &SpecMap<AttrSpec>,
    working: &mut AttrMap,
    options: &AttrMap,
    stack: &mut ResolutionStack,
) -> Result<Value, FabricaError> {
    let Some(spec) = specs.get(name) else {
        // Only reachable through dependency recursion: a declared attribute
        // depends on a name nothing declares. An override still satisfies it.
        return working
            .get(name)
            .cloned()
            .ok_or_else(|| FabricaError::UnknownAttribute { name: name.to_string() });
    };

    let self_dependent = spec.dependencies.iter().any(|dep| dep == name);
    if !self_dependent {
        if let Some(value) = working.get(name) {
            return Ok(value.clone());
        }
    }

    tracing::trace!(attr = name, self_dependent, "resolving attribute");
    let mut args = Vec::with_capacity(spec.dependencies.len());
    for dep in &spec.dependencies {
        args.push(lookup_dependency(dep, name, specs, working, options, stack)?);
    }

    let value = (spec.builder)(&args)
        .map_err(|e| FabricaError::BuilderFailed { name: name.to_string(), source: e })?;
    working.insert(name.to_string(), value.clone());
    Ok(value)
}

/// Dependency lookup in attribute context: resolved options first, then
/// self-reference, then cycle detection, then sibling recursion.
fn lookup_dependency(
    dep: &str,
    current: &str,
    specs: &SpecMap<AttrSpec>,
    working: &mut AttrMap,
    options: &AttrMap,
    stack: &mut ResolutionStack,
) -> Result<Value, FabricaError> {
    if let Some(value) = options.get(dep) {
        return Ok(value.clone());
    }
    if dep == current {
        // The current override (or a previously computed value) is exposed
        // to the builder as the current value of "self"; absent means null.
        return Ok(working.get(dep).cloned().unwrap_or(Value::Null));
    }
    if stack.contains(dep) {
        let path = stack.cycle_path(dep);
        tracing::debug!(attr = current, %path, "attribute dependency cycle");
        return Err(FabricaError::DependencyCycle { path });
    }
    stack.push(dep);
    let value = resolve_attr(dep, specs, working, options, stack);
    stack.pop();
    value
}
