//! Immediate-or-deferred results
//!
//! The hook pipeline promises that a build stays synchronous as long as every
//! hook it ran was synchronous, and becomes asynchronous from the first
//! suspension onward. [`Outcome`] is the caller-visible encoding of that
//! promise: [`Outcome::Ready`] is an immediate value, [`Outcome::Pending`]
//! a boxed future that resolves to it.
//!
//! `Outcome` implements [`IntoFuture`], so both shapes can be awaited
//! uniformly:
//!
//! ```rust
//! # async fn demo() -> Result<(), fabrica::core::FabricaError> {
//! use fabrica::factory::Factory;
//! use serde_json::json;
//!
//! let factory = Factory::new();
//! factory.attr("name", "nexus");
//!
//! // No async hooks registered, so this is Ready - but .await works anyway.
//! let object = factory.build(json!({}), json!({}))?.await?;
//! assert_eq!(object["name"], "nexus");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::IntoFuture;

use futures::future::{self, BoxFuture};
use serde_json::Value;

use crate::core::FabricaError;

/// A value that is either immediately available or still being produced.
///
/// Produced by every build/create entry point. Callers that know their
/// factory has no asynchronous hooks can match on [`Outcome::Ready`];
/// everyone else just `.await`s the outcome.
pub enum Outcome<T> {
    /// Every step ran synchronously; the value is final.
    Ready(T),
    /// At least one step suspended; the future yields the final value.
    Pending(BoxFuture<'static, Result<T, FabricaError>>),
}

/// Result of a single build or create call.
pub type Built = Outcome<Value>;

/// Result of a `build_list`/`create_list` call.
pub type BuiltList = Outcome<Vec<Value>>;

impl<T> Outcome<T>
where
    T: Send + 'static,
{
    /// Whether the value is immediately available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The immediate value, or `None` if the outcome is pending.
    pub fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }

    /// Chain a fallible continuation over the outcome.
    ///
    /// Runs `next` immediately when the outcome is ready (errors propagate
    /// synchronously), otherwise inside the pending future (errors become the
    /// future's rejection). This is what keeps "sync stays sync" transitive
    /// across pipeline stages.
    pub(crate) fn and_then<F>(self, next: F) -> Result<Self, FabricaError>
    where
        F: FnOnce(T) -> Result<Self, FabricaError> + Send + 'static,
    {
        match self {
            Self::Ready(value) => next(value),
            Self::Pending(fut) => Ok(Self::Pending(Box::pin(async move {
                let value = fut.await?;
                match next(value)? {
                    Self::Ready(value) => Ok(value),
                    Self::Pending(rest) => rest.await,
                }
            }))),
        }
    }
}

impl Outcome<Vec<Value>> {
    /// Aggregate per-item outcomes into one list outcome, preserving index
    /// order.
    ///
    /// All-ready input stays ready. Otherwise every item (ready or not) is
    /// driven to completion via `join_all` - already-issued items are not
    /// cancelled when a sibling fails - and the first error in index order
    /// propagates.
    pub(crate) fn collect(items: Vec<Outcome<Value>>) -> Self {
        if items.iter().all(Outcome::is_ready) {
            let values = items.into_iter().filter_map(Outcome::into_ready).collect();
            return Self::Ready(values);
        }
        Self::Pending(Box::pin(async move {
            let settled = future::join_all(items.into_iter().map(IntoFuture::into_future)).await;
            settled.into_iter().collect()
        }))
    }
}

impl<T> IntoFuture for Outcome<T>
where
    T: Send + 'static,
{
    type Output = Result<T, FabricaError>;
    type IntoFuture = BoxFuture<'static, Result<T, FabricaError>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Ready(value) => Box::pin(future::ready(Ok(value))),
            Self::Pending(fut) => fut,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(_) => f.debug_tuple("Pending").finish(),
        }
    }
}
