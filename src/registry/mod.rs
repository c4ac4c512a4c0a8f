//! Named factory registry
//!
//! A [`Registry`] maps factory names to [`Factory`] handles and offers
//! name-based conveniences for the common "define here, build over there"
//! test-suite layout. The registry is an explicit object with an explicit
//! lifecycle - construct one, share it, and tear it down with
//! [`Registry::implode`] - rather than ambient global state.
//!
//! # Examples
//!
//! ```rust
//! use fabrica::registry::Registry;
//! use serde_json::json;
//!
//! let registry = Registry::new();
//! registry.define("user").sequence("id").attr("role", "member");
//!
//! let user = registry.build("user", json!({}), json!({})).unwrap().into_ready().unwrap();
//! assert_eq!(user, json!({"id": 1, "role": "member"}));
//!
//! registry.reset_all(); // every sequence starts over
//! registry.implode();   // forget all factories
//! assert!(registry.get("user").is_err());
//! ```

use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use serde_json::Value;

use crate::core::{AttrMap, FabricaError};
use crate::factory::Factory;
use crate::hooks::{Built, BuiltList};

/// Maximum Levenshtein distance, as a percentage of the query length, for a
/// defined name to be offered as a suggestion.
const SUGGESTION_THRESHOLD_PERCENT: usize = 50;

/// Process-wide (or test-scoped) collection of named factories.
#[derive(Default)]
pub struct Registry {
    factories: DashMap<String, Factory>,
    /// Every factory ever defined through this registry, including instances
    /// displaced by redefinition; `reset_all` reaches them all.
    all: Mutex<Vec<Factory>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a factory under `name` and return its handle for
    /// chained declaration. Redefinition replaces the name binding; the
    /// displaced instance keeps working for anyone still holding its handle.
    pub fn define(&self, name: impl Into<String>) -> Factory {
        let name = name.into();
        let factory = Factory::new();
        tracing::debug!(factory = %name, "defining factory");
        self.factories.insert(name, factory.clone());
        self.all_factories().push(factory.clone());
        factory
    }

    /// Define a factory with a constructor wrapping its resolved attributes.
    pub fn define_with<F>(&self, name: impl Into<String>, construct: F) -> Factory
    where
        F: Fn(AttrMap) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let factory = Factory::with_constructor(construct);
        tracing::debug!(factory = %name, "defining factory with constructor");
        self.factories.insert(name, factory.clone());
        self.all_factories().push(factory.clone());
        factory
    }

    /// Look up a factory by name.
    pub fn get(&self, name: &str) -> Result<Factory, FabricaError> {
        if let Some(factory) = self.factories.get(name) {
            return Ok(factory.clone());
        }
        Err(FabricaError::FactoryNotDefined {
            name: name.to_string(),
            suggestion: self.closest_name(name),
        })
    }

    /// Build one object with the named factory.
    pub fn build(&self, name: &str, overrides: Value, options: Value) -> Result<Built, FabricaError> {
        self.get(name)?.build(overrides, options)
    }

    /// Build a list of objects with the named factory.
    pub fn build_list(
        &self,
        name: &str,
        size: usize,
        overrides: Value,
        options: Value,
    ) -> Result<BuiltList, FabricaError> {
        self.get(name)?.build_list(size, overrides, options)
    }

    /// Create one object with the named factory.
    pub fn create(&self, name: &str, overrides: Value, options: Value) -> Result<Built, FabricaError> {
        self.get(name)?.create(overrides, options)
    }

    /// Create a list of objects with the named factory.
    pub fn create_list(
        &self,
        name: &str,
        size: usize,
        overrides: Value,
        options: Value,
    ) -> Result<BuiltList, FabricaError> {
        self.get(name)?.create_list(size, overrides, options)
    }

    /// Resolve the named factory's attribute mapping without building.
    pub fn attributes(&self, name: &str, overrides: Value, options: Value) -> Result<AttrMap, FabricaError> {
        self.get(name)?.attributes(overrides, options)
    }

    /// Reset the named factory's sequence counters.
    pub fn reset(&self, name: &str) -> Result<(), FabricaError> {
        self.get(name)?.reset();
        Ok(())
    }

    /// Reset sequence counters on every factory ever defined here.
    pub fn reset_all(&self) {
        for factory in self.all_factories().iter() {
            factory.reset();
        }
    }

    /// Unregister and forget all factories.
    pub fn implode(&self) {
        tracing::debug!("imploding factory registry");
        self.factories.clear();
        self.all_factories().clear();
    }

    /// Names currently defined, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.factories.iter().map(|entry| entry.key().clone()).collect()
    }

    fn all_factories(&self) -> std::sync::MutexGuard<'_, Vec<Factory>> {
        self.all.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Closest defined name by Levenshtein distance, within the threshold.
    fn closest_name(&self, target: &str) -> Option<String> {
        let limit = target.len() * SUGGESTION_THRESHOLD_PERCENT / 100;
        self.factories
            .iter()
            .map(|entry| (entry.key().clone(), strsim::levenshtein(target, entry.key())))
            .filter(|(_, distance)| *distance <= limit)
            .min_by_key(|(_, distance)| *distance)
            .map(|(name, _)| name)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("names", &self.names()).finish()
    }
}
