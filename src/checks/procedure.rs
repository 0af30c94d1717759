//! Caller-supplied health procedures.
//!
//! A procedure receives a [`Promise`] and must complete it exactly once.
//! Convenience constructors cover the common shapes: async closures
//! returning `Result<Status, E>`, blocking closures run on the blocking pool,
//! and constant verdicts.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::checks::promise::{panic_message, Promise};
use crate::checks::status::Status;

type ProcedureFn = dyn Fn(Promise) -> BoxFuture<'static, ()> + Send + Sync;

/// A registered unit of health-check work. Cheap to clone.
#[derive(Clone)]
pub struct Procedure {
    inner: Arc<ProcedureFn>,
}

impl Procedure {
    /// Build a procedure from a closure that completes the promise itself.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Promise) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |promise| f(promise).boxed()),
        }
    }

    /// Build a procedure from an async closure. `Err` is reported as a
    /// procedure failure, not as a DOWN status.
    pub fn from_async<F, Fut, E>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Status, E>> + Send + 'static,
        E: fmt::Display,
    {
        Self::new(move |promise: Promise| {
            let fut = f();
            async move {
                match fut.await {
                    Ok(status) => promise.complete(status),
                    Err(e) => promise.fail(e),
                };
            }
        })
    }

    /// Build a procedure from a synchronous closure, run on the blocking pool.
    pub fn blocking<F, E>(f: F) -> Self
    where
        F: Fn() -> Result<Status, E> + Send + Sync + 'static,
        E: fmt::Display + Send + 'static,
    {
        let f = Arc::new(f);
        Self::new(move |promise: Promise| {
            let f = f.clone();
            async move {
                match tokio::task::spawn_blocking(move || f()).await {
                    Ok(Ok(status)) => promise.complete(status),
                    Ok(Err(e)) => promise.fail(e),
                    Err(join) if join.is_panic() => {
                        promise.panicked(panic_message(join.into_panic().as_ref()))
                    }
                    Err(join) => promise.fail(join),
                };
            }
        })
    }

    /// A procedure that always reports `status`.
    pub fn constant(status: Status) -> Self {
        Self::new(move |promise: Promise| {
            promise.complete(status.clone());
            async {}
        })
    }

    pub(crate) fn call(&self, promise: Promise) -> BoxFuture<'static, ()> {
        (self.inner)(promise)
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Procedure")
    }
}
