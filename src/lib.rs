//! fabrica - declarative factories for test data
//!
//! A factory describes how to produce one kind of JSON-shaped object:
//! default attribute values, derived attributes with declared dependencies,
//! named options that steer construction without appearing in the output,
//! auto-incrementing sequences, and lifecycle hooks around an optional
//! asynchronous "create" (persistence) step.
//!
//! # Architecture Overview
//!
//! The crate is built around a dependency-resolving evaluation engine:
//! - Attribute and option values resolve on demand, dependencies first, with
//!   an explicit resolution stack so cycles fail with the exact path
//!   (`fees -> total -> fees`).
//! - Caller-supplied values win over builders, except for attributes that
//!   declare themselves as a dependency - those always re-evaluate and see
//!   the supplied value as the current value of "self".
//! - Hook chains preserve "sync stays sync": a build with only synchronous
//!   hooks yields an immediate value, and the first asynchronous hook turns
//!   the rest of that call into a future.
//!
//! # Core Modules
//!
//! - [`core`] - error taxonomy ([`core::FabricaError`]), build stages, and
//!   the [`core::AttrMap`] mapping type
//! - [`factory`] - factory definitions, the fluent declaration API, and the
//!   build/create operations
//! - [`hooks`] - lifecycle hook types and the sync-or-async pipeline
//!   evaluator ([`hooks::Outcome`])
//! - [`registry`] - explicit named-factory registry with global reset and
//!   teardown
//!
//! # Example
//!
//! ```rust
//! use fabrica::registry::Registry;
//! use serde_json::json;
//!
//! let registry = Registry::new();
//! registry
//!     .define("player")
//!     .sequence("id")
//!     .attr("health", 100)
//!     .option_value("hardcore", false)
//!     .attr_with("lives", &["hardcore"], |deps| {
//!         Ok(if deps[0] == json!(true) { json!(1) } else { json!(3) })
//!     });
//!
//! let player = registry
//!     .build("player", json!({}), json!({"hardcore": true}))
//!     .unwrap()
//!     .into_ready()
//!     .unwrap();
//! assert_eq!(player, json!({"id": 1, "health": 100, "lives": 1}));
//! ```
//!
//! Options influence builders but never appear in results; overrides for
//! declared attributes replace their defaults; unknown override keys pass
//! through verbatim.

// Core functionality
pub mod core;
pub mod factory;
pub mod hooks;
pub mod registry;

// The dependency-resolving evaluation engine
mod resolver;
