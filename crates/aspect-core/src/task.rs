//! The asynchronous return-value form.
//!
//! An async executor produces a [`Task`]: a shared future every advice on
//! the chain (and finally the trampoline) can await. The underlying body
//! runs exactly once; later joins observe the memoized outcome. Typed
//! completion is a monomorphized generic per result type.
use crate::{
    error::{AspectError, UnsupportedOperation, UserError},
    value::SharedValue,
};
use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use std::future::Future;

/// What an asynchronous body produced: a shared result value, nothing (for
/// unit-returning methods), or a failure.
pub type TaskOutcome = Result<Option<SharedValue>, UserError>;

/// The boxed future an async executor returns.
pub type TaskFuture = BoxFuture<'static, TaskOutcome>;

#[derive(Clone)]
pub struct Task {
    inner: Shared<TaskFuture>,
}

impl Task {
    pub fn new(fut: impl Future<Output = TaskOutcome> + Send + 'static) -> Self {
        Self {
            inner: fut.boxed().shared(),
        }
    }

    pub fn from_boxed(fut: TaskFuture) -> Self {
        Self {
            inner: fut.shared(),
        }
    }

    /// Awaits the underlying body; repeated joins yield the memoized outcome.
    pub async fn join(&self) -> TaskOutcome {
        self.inner.clone().await
    }

    /// Awaits and extracts a typed result.
    pub async fn join_typed<R>(&self) -> Result<R, AspectError>
    where
        R: Send + Sync + Clone + 'static,
    {
        let mismatch = || UnsupportedOperation::TypeMismatch {
            expected: std::any::type_name::<R>(),
        };
        let value = self
            .join()
            .await
            .map_err(AspectError::User)?
            .ok_or_else(mismatch)?;
        let value = value.downcast::<R>().map_err(|_| mismatch())?;
        Ok((*value).clone())
    }

    /// Awaits a task whose method returns nothing.
    pub async fn join_unit(&self) -> Result<(), AspectError> {
        self.join().await.map_err(AspectError::User)?;
        Ok(())
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Task")
    }
}
