//! Lifecycle hook pipeline
//!
//! Factories carry five hook slots: ordered `before_build`, `after_build`,
//! `before_create`, and `after_create` lists, plus a single optional create
//! handler. This module defines the hook callable shape and the evaluator
//! that runs a hook list over a working object.
//!
//! # Pipeline semantics
//!
//! - Hooks run strictly in registration order. Each receives the working
//!   object (mutably, for in-place edits) and the resolved option map.
//! - A hook decides what happens next with [`HookFlow`]:
//!   [`HookFlow::Continue`] keeps the working object (including any in-place
//!   mutation), [`HookFlow::Replace`] swaps it for all subsequent hooks and
//!   the final result, [`HookFlow::Pending`] suspends the pipeline until the
//!   returned future settles.
//! - The pipeline's result is synchronous exactly when every hook it invoked
//!   was synchronous. The first suspension makes the rest of the chain - and
//!   the caller-visible result - asynchronous ([`Outcome::Pending`]).
//! - Replacement is decided by presence, not truthiness: a pending hook
//!   resolving to `Some(value)` replaces even when `value` is `false`, `0`,
//!   or `null`; `None` keeps the working object.
//! - A failing hook aborts the remaining stages of that one call. The error
//!   surfaces synchronously before the first suspension point, as a rejected
//!   future after it. Cancellation is not supported.
//!
//! # Writing hooks
//!
//! ```rust
//! use fabrica::factory::Factory;
//! use fabrica::hooks::HookFlow;
//! use serde_json::json;
//!
//! let factory = Factory::new();
//! factory.attr("name", "sprocket").after_build(|object, _options| {
//!     object["tagged"] = json!(true);
//!     Ok(HookFlow::Continue)
//! });
//!
//! let built = factory.build(json!({}), json!({})).unwrap().into_ready().unwrap();
//! assert_eq!(built["tagged"], json!(true));
//! ```
//!
//! An asynchronous hook moves whatever it needs into the future and resolves
//! to an optional replacement:
//!
//! ```rust
//! use fabrica::factory::Factory;
//! use fabrica::hooks::HookFlow;
//! use serde_json::json;
//!
//! let factory = Factory::new();
//! factory.attr("id", 7).on_create(|object, _options| {
//!     let mut saved = object.clone();
//!     Ok(HookFlow::pending(async move {
//!         saved["persisted"] = json!(true); // e.g. an external save
//!         Ok(Some(saved))
//!     }))
//! });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::core::{AttrMap, BuildStage, FabricaError};

pub mod outcome;

pub use outcome::{Built, BuiltList, Outcome};

/// What a hook hands back to the pipeline.
pub enum HookFlow {
    /// Keep the current working object (in-place mutation included).
    Continue,
    /// Replace the working object for all subsequent hooks and the result.
    Replace(Value),
    /// Suspend; the future resolves to `Some(replacement)` or `None` to keep
    /// the current working object.
    Pending(BoxFuture<'static, anyhow::Result<Option<Value>>>),
}

impl HookFlow {
    /// Replacement from anything JSON-convertible.
    pub fn replace(value: impl Into<Value>) -> Self {
        Self::Replace(value.into())
    }

    /// Suspension from any future of the right shape.
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
    {
        Self::Pending(Box::pin(fut))
    }
}

impl fmt::Debug for HookFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// A registered lifecycle hook.
///
/// Receives `(working object, resolved options)`. Errors abort the pipeline;
/// see [`HookFlow`] for the success cases.
pub type Hook = Arc<dyn Fn(&mut Value, &AttrMap) -> anyhow::Result<HookFlow> + Send + Sync>;

/// Run a hook list over a working object.
///
/// Returns `Ok(Outcome::Ready)` when every hook completed synchronously,
/// `Ok(Outcome::Pending)` from the first suspension onward, and `Err` for a
/// failure before the first suspension.
pub(crate) fn run(
    hooks: Vec<Hook>,
    stage: BuildStage,
    object: Value,
    options: AttrMap,
) -> Result<Outcome<Value>, FabricaError> {
    run_from(Arc::from(hooks), 0, stage, object, options)
}

fn run_from(
    hooks: Arc<[Hook]>,
    mut index: usize,
    stage: BuildStage,
    mut object: Value,
    options: AttrMap,
) -> Result<Outcome<Value>, FabricaError> {
    while index < hooks.len() {
        let hook = &hooks[index];
        index += 1;
        let flow =
            hook(&mut object, &options).map_err(|e| FabricaError::HookFailed { stage, source: e })?;
        match flow {
            HookFlow::Continue => {}
            HookFlow::Replace(replacement) => object = replacement,
            HookFlow::Pending(fut) => {
                tracing::trace!(%stage, index, "hook suspended, chain continues asynchronously");
                let hooks = hooks.clone();
                return Ok(Outcome::Pending(Box::pin(async move {
                    let replacement =
                        fut.await.map_err(|e| FabricaError::HookFailed { stage, source: e })?;
                    if let Some(value) = replacement {
                        object = value;
                    }
                    match run_from(hooks, index, stage, object, options)? {
                        Outcome::Ready(value) => Ok(value),
                        Outcome::Pending(rest) => rest.await,
                    }
                })));
            }
        }
    }
    Ok(Outcome::Ready(object))
}
