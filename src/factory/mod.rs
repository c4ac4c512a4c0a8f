//! Factory definition and build operations
//!
//! A [`Factory`] describes how to produce one kind of data object: default
//! attribute values, derived attributes with declared dependencies, named
//! options that influence construction without appearing in the output,
//! auto-incrementing sequences, and lifecycle hooks around the build and
//! create steps.
//!
//! # Declaring factories
//!
//! ```rust
//! use fabrica::factory::Factory;
//! use serde_json::json;
//!
//! let person = Factory::new();
//! person
//!     .sequence("id")
//!     .attr("name", "Ada")
//!     .attr_with("age", &["name"], |deps| {
//!         Ok(if deps[0] == json!("Brian") { json!(30) } else { json!(18) })
//!     });
//!
//! let built = person.attributes(json!({}), json!({})).unwrap();
//! assert_eq!(built["id"], json!(1));
//! assert_eq!(built["age"], json!(18));
//! ```
//!
//! Attributes may depend on options and on other attributes; options may only
//! depend on other options. A caller-supplied value short-circuits an
//! attribute's builder unless the attribute declares *itself* as a
//! dependency, in which case the builder always runs and receives the
//! supplied value - useful for filling in partially-specified child objects:
//!
//! ```rust
//! use fabrica::factory::Factory;
//! use serde_json::{Value, json};
//!
//! let person = Factory::new();
//! person.attr_with("address", &["address"], |deps| {
//!     let mut address = deps[0].as_object().cloned().unwrap_or_default();
//!     address.entry("city").or_insert(json!("Rotterdam"));
//!     Ok(Value::Object(address))
//! });
//!
//! let built = person.attributes(json!({"address": {"street": "Coolsingel"}}), json!({})).unwrap();
//! assert_eq!(built["address"], json!({"street": "Coolsingel", "city": "Rotterdam"}));
//! ```
//!
//! # Building versus creating
//!
//! `build` resolves options, runs before-build hooks, resolves attributes,
//! applies the optional constructor, and runs after-build hooks. `create`
//! additionally chains before-create hooks, the single create handler
//! (typically an external save), and after-create hooks. Either returns
//! [`Built`]: ready when every hook ran synchronously, pending from the
//! first asynchronous hook onward.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::core::{AttrMap, BuildStage, FabricaError, json_type_name};
use crate::hooks::{self, Built, BuiltList, HookFlow, Outcome};
use crate::resolver;

pub mod definition;

pub use definition::{BuilderFn, Constructor};

use definition::{AttrSpec, Definition, OptionSpec};

/// A handle to one factory definition.
///
/// Handles are cheap to clone and clones share the same definition (and
/// therefore the same sequence counters). Declaration methods return `&Self`
/// for chaining; build operations snapshot the definition, so concurrent or
/// re-entrant builds (an attribute builder invoking another factory) are
/// safe.
#[derive(Clone, Default)]
pub struct Factory {
    inner: Arc<RwLock<Definition>>,
}

impl Factory {
    /// A factory whose result is the plain attribute mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose resolved attributes are wrapped by `construct`.
    pub fn with_constructor<F>(construct: F) -> Self
    where
        F: Fn(AttrMap) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let factory = Self::new();
        factory.write().construct = Some(Arc::new(construct));
        factory
    }

    fn read(&self) -> RwLockReadGuard<'_, Definition> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Definition> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Definition {
        self.read().clone()
    }

    fn insert_attr(&self, name: String, dependencies: Vec<String>, builder: BuilderFn) -> &Self {
        self.write().attrs.insert(name, AttrSpec { dependencies, builder });
        self
    }

    // ---- attribute declaration ------------------------------------------

    /// Declare an attribute with a static default value.
    pub fn attr(&self, name: impl Into<String>, value: impl Into<Value>) -> &Self {
        let value = value.into();
        self.insert_attr(name.into(), Vec::new(), Arc::new(move |_| Ok(value.clone())))
    }

    /// Declare an attribute with a dynamic default and no dependencies.
    pub fn attr_fn<F>(&self, name: impl Into<String>, builder: F) -> &Self
    where
        F: Fn() -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.insert_attr(name.into(), Vec::new(), Arc::new(move |_| builder()))
    }

    /// Declare an attribute whose builder receives the resolved values of
    /// `dependencies`, positionally in the given order. Dependencies may name
    /// options, sibling attributes, or the attribute itself.
    pub fn attr_with<F>(&self, name: impl Into<String>, dependencies: &[&str], builder: F) -> &Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.insert_attr(name.into(), to_names(dependencies), Arc::new(move |deps| builder(deps)))
    }

    /// Declare a set of static attributes at once.
    ///
    /// ```rust
    /// # use fabrica::factory::Factory;
    /// # use serde_json::json;
    /// let factory = Factory::new();
    /// factory.attrs([("name", json!("Michael")), ("age", json!(18))]);
    /// ```
    pub fn attrs<K, V, I>(&self, entries: I) -> &Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in entries {
            self.attr(name, value);
        }
        self
    }

    // ---- option declaration ---------------------------------------------

    /// Declare an option with no default. A value must be supplied at build
    /// time or resolution fails naming the option.
    pub fn option(&self, name: impl Into<String>) -> &Self {
        self.write().opts.insert(name.into(), OptionSpec { dependencies: Vec::new(), builder: None });
        self
    }

    /// Declare an option with a static default value.
    pub fn option_value(&self, name: impl Into<String>, value: impl Into<Value>) -> &Self {
        let value = value.into();
        self.write().opts.insert(
            name.into(),
            OptionSpec { dependencies: Vec::new(), builder: Some(Arc::new(move |_| Ok(value.clone()))) },
        );
        self
    }

    /// Declare an option with a dynamic default and no dependencies.
    pub fn option_fn<F>(&self, name: impl Into<String>, builder: F) -> &Self
    where
        F: Fn() -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.write().opts.insert(
            name.into(),
            OptionSpec { dependencies: Vec::new(), builder: Some(Arc::new(move |_| builder())) },
        );
        self
    }

    /// Declare an option that depends on other options.
    pub fn option_with<F>(&self, name: impl Into<String>, dependencies: &[&str], builder: F) -> &Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.write().opts.insert(
            name.into(),
            OptionSpec {
                dependencies: to_names(dependencies),
                builder: Some(Arc::new(move |deps| builder(deps))),
            },
        );
        self
    }

    // ---- sequences -------------------------------------------------------

    /// Declare an auto-incrementing attribute starting at 1.
    pub fn sequence(&self, name: impl Into<String>) -> &Self {
        self.sequence_with(name, &[], |n, _| Ok(Value::from(n)))
    }

    /// Declare a sequence whose builder maps the sequence number to a value.
    ///
    /// ```rust
    /// # use fabrica::factory::Factory;
    /// # use serde_json::json;
    /// let factory = Factory::new();
    /// factory.sequence_fn("email", |n| Ok(json!(format!("user{n}@example.test"))));
    /// ```
    pub fn sequence_fn<F>(&self, name: impl Into<String>, builder: F) -> &Self
    where
        F: Fn(u64) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.sequence_with(name, &[], move |n, _| builder(n))
    }

    /// Declare a sequence whose builder also receives resolved dependencies.
    ///
    /// The counter is increment-then-use (first value 1) and is only
    /// consumed when the builder actually runs: an overridden, non-self-
    /// dependent sequence attribute does not advance. The counter lives with
    /// this factory; specs copied by [`Factory::extend`] keep advancing the
    /// same stream.
    pub fn sequence_with<F>(&self, name: impl Into<String>, dependencies: &[&str], builder: F) -> &Self
    where
        F: Fn(u64, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let counter = {
            let mut def = self.write();
            def.sequences.entry(name.clone()).or_insert_with(|| Arc::new(AtomicU64::new(0))).clone()
        };
        let wrapped: BuilderFn = Arc::new(move |deps| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            builder(n, deps)
        });
        self.insert_attr(name, to_names(dependencies), wrapped)
    }

    // ---- hooks -----------------------------------------------------------

    /// Register a hook that runs over (override attributes, options) before
    /// attribute resolution. Replacing the working object swaps the override
    /// map; the replacement must be an object.
    pub fn before_build<F>(&self, hook: F) -> &Self
    where
        F: Fn(&mut Value, &AttrMap) -> anyhow::Result<HookFlow> + Send + Sync + 'static,
    {
        self.write().before_build.push(Arc::new(hook));
        self
    }

    /// Register a hook that runs over (built object, options) after
    /// construction.
    pub fn after_build<F>(&self, hook: F) -> &Self
    where
        F: Fn(&mut Value, &AttrMap) -> anyhow::Result<HookFlow> + Send + Sync + 'static,
    {
        self.write().after_build.push(Arc::new(hook));
        self
    }

    /// Alias for [`Factory::after_build`], kept for parity with the classic
    /// factory API.
    pub fn after<F>(&self, hook: F) -> &Self
    where
        F: Fn(&mut Value, &AttrMap) -> anyhow::Result<HookFlow> + Send + Sync + 'static,
    {
        self.after_build(hook)
    }

    /// Register a hook that runs over the built object before the create
    /// handler.
    pub fn before_create<F>(&self, hook: F) -> &Self
    where
        F: Fn(&mut Value, &AttrMap) -> anyhow::Result<HookFlow> + Send + Sync + 'static,
    {
        self.write().before_create.push(Arc::new(hook));
        self
    }

    /// Set the single create handler, the external persistence step of
    /// [`Factory::create`]. The last registration wins.
    pub fn on_create<F>(&self, handler: F) -> &Self
    where
        F: Fn(&mut Value, &AttrMap) -> anyhow::Result<HookFlow> + Send + Sync + 'static,
    {
        self.write().create_handler = Some(Arc::new(handler));
        self
    }

    /// Register a hook that runs over the created object after the create
    /// handler.
    pub fn after_create<F>(&self, hook: F) -> &Self
    where
        F: Fn(&mut Value, &AttrMap) -> anyhow::Result<HookFlow> + Send + Sync + 'static,
    {
        self.write().after_create.push(Arc::new(hook));
        self
    }

    // ---- operations ------------------------------------------------------

    /// Resolve the complete option mapping for the given overrides.
    pub fn options(&self, overrides: Value) -> Result<AttrMap, FabricaError> {
        let def = self.snapshot();
        resolver::resolve_options(&def.opts, as_object(overrides)?)
    }

    /// Resolve the complete attribute mapping without running hooks or the
    /// constructor. The result is the overrides plus every declared
    /// attribute; caller keys not declared as attributes pass through
    /// verbatim.
    pub fn attributes(&self, overrides: Value, options: Value) -> Result<AttrMap, FabricaError> {
        let def = self.snapshot();
        let options = resolver::resolve_options(&def.opts, as_object(options)?)?;
        resolver::resolve_attributes(&def.attrs, as_object(overrides)?, &options)
    }

    /// Build one object: options, before-build hooks, attribute resolution,
    /// optional construction, after-build hooks.
    pub fn build(&self, overrides: Value, options: Value) -> Result<Built, FabricaError> {
        let def = self.snapshot();
        let options = resolver::resolve_options(&def.opts, as_object(options)?)?;
        let overrides = as_object(overrides)?;
        run_build(def, overrides, options)
    }

    /// Build `size` independent objects. The result is ready when every item
    /// was; otherwise a pending aggregate collecting all items in index
    /// order.
    pub fn build_list(&self, size: usize, overrides: Value, options: Value) -> Result<BuiltList, FabricaError> {
        let mut items = Vec::with_capacity(size);
        for _ in 0..size {
            items.push(self.build(overrides.clone(), options.clone())?);
        }
        Ok(Outcome::collect(items))
    }

    /// Build one object and run it through before-create hooks, the create
    /// handler, and after-create hooks.
    pub fn create(&self, overrides: Value, options: Value) -> Result<Built, FabricaError> {
        let def = self.snapshot();
        let options = resolver::resolve_options(&def.opts, as_object(options)?)?;
        let overrides = as_object(overrides)?;
        let built = run_build(def.clone(), overrides, options.clone())?;
        built.and_then(move |object| run_create(def, object, options))
    }

    /// Create `size` independent objects; aggregation as [`Factory::build_list`].
    pub fn create_list(&self, size: usize, overrides: Value, options: Value) -> Result<BuiltList, FabricaError> {
        let mut items = Vec::with_capacity(size);
        for _ in 0..size {
            items.push(self.create(overrides.clone(), options.clone())?);
        }
        Ok(Outcome::collect(items))
    }

    /// Copy `parent`'s attribute specs, option specs, and hook lists into
    /// this factory.
    ///
    /// Copies are by value: mutating the parent afterwards does not affect
    /// this factory. Same-named parent specs overwrite this factory's; the
    /// hook lists are replaced by copies of the parent's. The constructor
    /// and create handler are inherited only when this factory has none.
    /// Sequence counter state stays with the defining factory, so inherited
    /// sequences share the parent's stream.
    pub fn extend(&self, parent: &Factory) -> &Self {
        let parent_def = parent.snapshot();
        let mut def = self.write();
        if def.construct.is_none() {
            def.construct = parent_def.construct;
        }
        for (name, spec) in parent_def.attrs {
            def.attrs.insert(name, spec);
        }
        for (name, spec) in parent_def.opts {
            def.opts.insert(name, spec);
        }
        def.before_build = parent_def.before_build;
        def.after_build = parent_def.after_build;
        def.before_create = parent_def.before_create;
        if def.create_handler.is_none() {
            def.create_handler = parent_def.create_handler;
        }
        def.after_create = parent_def.after_create;
        self
    }

    /// Rewind every sequence counter this factory declared back to zero.
    /// Attribute and option specs and hooks are untouched.
    pub fn reset(&self) {
        let def = self.read();
        for counter in def.sequences.values() {
            counter.store(0, Ordering::SeqCst);
        }
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let def = self.read();
        f.debug_struct("Factory")
            .field("attrs", &def.attrs.keys().collect::<Vec<_>>())
            .field("opts", &def.opts.keys().collect::<Vec<_>>())
            .field("has_constructor", &def.construct.is_some())
            .finish()
    }
}

fn to_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn as_object(value: Value) -> Result<AttrMap, FabricaError> {
    match value {
        Value::Null => Ok(AttrMap::new()),
        Value::Object(map) => Ok(map),
        other => Err(FabricaError::InvalidOverrides { found: json_type_name(&other) }),
    }
}

fn run_build(def: Definition, overrides: AttrMap, options: AttrMap) -> Result<Built, FabricaError> {
    let before = def.before_build.clone();
    let outcome = hooks::run(before, BuildStage::BeforeBuild, Value::Object(overrides), options.clone())?;
    outcome.and_then(move |seeded| finish_build(&def, seeded, options))
}

fn finish_build(def: &Definition, seeded: Value, options: AttrMap) -> Result<Built, FabricaError> {
    let overrides = match seeded {
        Value::Object(map) => map,
        other => return Err(FabricaError::InvalidOverrides { found: json_type_name(&other) }),
    };
    tracing::trace!(stage = %BuildStage::Resolving, attrs = def.attrs.len(), "resolving attributes");
    let resolved = resolver::resolve_attributes(&def.attrs, overrides, &options)?;
    let object = match &def.construct {
        Some(construct) => {
            tracing::trace!(stage = %BuildStage::Constructing, "wrapping attributes");
            construct(resolved).map_err(|e| FabricaError::ConstructorFailed { source: e })?
        }
        None => Value::Object(resolved),
    };
    hooks::run(def.after_build.clone(), BuildStage::AfterBuild, object, options)
}

fn run_create(def: Definition, object: Value, options: AttrMap) -> Result<Built, FabricaError> {
    let handler: Vec<_> = def.create_handler.iter().cloned().collect();
    let after = def.after_create.clone();
    let handler_options = options.clone();
    let after_options = options.clone();
    let outcome = hooks::run(def.before_create.clone(), BuildStage::BeforeCreate, object, options)?;
    outcome.and_then(move |object| {
        let outcome = hooks::run(handler, BuildStage::Create, object, handler_options)?;
        outcome.and_then(move |object| {
            hooks::run(after, BuildStage::AfterCreate, object, after_options)
        })
    })
}
