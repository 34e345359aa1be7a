//! Deferred results.
//!
//! Every operation returns a [`Deferred`], whether it ran on the caller's
//! thread or on the worker, so callers never branch on where it ran.

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::Result;

/// A value or failure delivered when awaited.
pub type Deferred<T> = BoxFuture<'static, Result<T>>;

/// Run `f` now, on the calling thread, and hand back its outcome as an
/// already-completed [`Deferred`].
pub fn execute<T, F>(f: F) -> Deferred<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T>,
{
    future::ready(f()).boxed()
}

/// A [`Deferred`] that is already resolved or rejected.
pub fn settled<T: Send + 'static>(result: Result<T>) -> Deferred<T> {
    future::ready(result).boxed()
}
