//! The per-call state threaded through an advice chain.
use crate::{
    descriptor::MethodDescriptor,
    error::{AspectError, UnsupportedOperation, UserError},
    task::{Task, TaskFuture},
    value::{ArgValue, BoxedValue, SharedValue},
};
use std::{any::Any, collections::HashMap, sync::Arc};

/// Re-enters the original synchronous method body, bypassing interception.
pub type SyncExecutor = Arc<
    dyn Fn(&(dyn Any + Send + Sync), &[ArgValue]) -> Result<Option<BoxedValue>, UserError>
        + Send
        + Sync,
>;

/// Re-enters the original asynchronous method body. The produced future must
/// own everything it needs (receiver and arguments are cloned in).
pub type AsyncExecutor = Arc<dyn Fn(&SharedValue, &[ArgValue]) -> TaskFuture + Send + Sync>;

#[derive(Clone)]
pub enum Executor {
    Sync(SyncExecutor),
    Async(AsyncExecutor),
}

impl Executor {
    pub fn sync(
        f: impl Fn(&(dyn Any + Send + Sync), &[ArgValue]) -> Result<Option<BoxedValue>, UserError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Executor::Sync(Arc::new(f))
    }

    pub fn asynchronous(
        f: impl Fn(&SharedValue, &[ArgValue]) -> TaskFuture + Send + Sync + 'static,
    ) -> Self {
        Executor::Async(Arc::new(f))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Executor::Async(_))
    }
}

/// Mutable invocation record for a single intercepted call.
///
/// Single-threaded per invocation: only one logical activation advances the
/// record at a time, though it may migrate threads across an await point.
/// The receiver and method key are immutable; everything else is open to any
/// advice on the chain.
pub struct Invocation {
    target: SharedValue,
    method: MethodDescriptor,
    executor: Executor,
    pub arguments: Vec<ArgValue>,
    return_value: Option<BoxedValue>,
    exception: Option<AspectError>,
    data: HashMap<String, BoxedValue>,
    before_await: Option<Box<dyn FnOnce() + Send>>,
}

impl Invocation {
    pub fn new(
        target: SharedValue,
        method: MethodDescriptor,
        arguments: Vec<ArgValue>,
        executor: Executor,
    ) -> Self {
        Self {
            target,
            method,
            executor,
            arguments,
            return_value: None,
            exception: None,
            data: HashMap::new(),
            before_await: None,
        }
    }

    pub fn target(&self) -> &SharedValue {
        &self.target
    }

    pub fn target_as<T: Any>(&self) -> Option<&T> {
        self.target.downcast_ref()
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Invokes the original method body and assigns the return slot.
    ///
    /// On an asynchronous method this materializes the task into the return
    /// slot without awaiting it; the caller decides when to join.
    pub fn proceed(&mut self) -> Result<(), AspectError> {
        match self.executor.clone() {
            Executor::Sync(run) => {
                let value = (*run)(self.target.as_ref(), &self.arguments)
                    .map_err(AspectError::User)?;
                self.return_value = value;
                Ok(())
            }
            Executor::Async(run) => {
                let task = Task::from_boxed((*run)(&self.target, &self.arguments));
                self.return_value = Some(Box::new(task));
                Ok(())
            }
        }
    }

    /// Invokes the original asynchronous body, stores its task in the return
    /// slot, and drives it to completion.
    pub async fn proceed_async(&mut self) -> Result<(), AspectError> {
        let run = match &self.executor {
            Executor::Async(run) => run.clone(),
            Executor::Sync(_) => {
                return Err(
                    UnsupportedOperation::AsyncAdviceOnSyncMethod(self.method.display_name())
                        .into(),
                )
            }
        };
        let task = Task::from_boxed((*run)(&self.target, &self.arguments));
        self.return_value = Some(Box::new(task.clone()));
        task.join().await.map_err(AspectError::User)?;
        Ok(())
    }

    /// The task currently sitting in the return slot.
    pub fn task(&self) -> Result<Task, AspectError> {
        self.return_value
            .as_ref()
            .and_then(|v| v.downcast_ref::<Task>())
            .cloned()
            .ok_or_else(|| UnsupportedOperation::NotATask(self.method.display_name()).into())
    }

    pub fn return_value(&self) -> Option<&BoxedValue> {
        self.return_value.as_ref()
    }

    pub fn return_ref<T: Any>(&self) -> Option<&T> {
        self.return_value.as_ref().and_then(|v| v.downcast_ref())
    }

    pub fn set_return<T: Any + Send>(&mut self, value: T) {
        self.return_value = Some(Box::new(value));
    }

    pub fn set_return_boxed(&mut self, value: Option<BoxedValue>) {
        self.return_value = value;
    }

    /// Takes the return slot and casts it back to the declared return type.
    pub fn take_return<R: Any>(&mut self) -> Result<R, AspectError> {
        let mismatch = || UnsupportedOperation::TypeMismatch {
            expected: std::any::type_name::<R>(),
        };
        let value = self.return_value.take().ok_or_else(mismatch)?;
        match value.downcast::<R>() {
            Ok(v) => Ok(*v),
            Err(_) => Err(mismatch().into()),
        }
    }

    pub fn exception(&self) -> Option<&AspectError> {
        self.exception.as_ref()
    }

    pub(crate) fn record_exception(&mut self, err: &AspectError) {
        self.exception = Some(err.clone());
    }

    pub fn data(&self) -> &HashMap<String, BoxedValue> {
        &self.data
    }

    pub fn insert_data<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.data.insert(key.into(), Box::new(value));
    }

    pub fn data_ref<T: Any>(&self, key: &str) -> Option<&T> {
        self.data.get(key).and_then(|v| v.downcast_ref())
    }

    /// Installs the one-shot hook fired the first time the invocation is
    /// about to suspend for an asynchronous continuation.
    pub fn on_before_await(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.before_await = Some(Box::new(hook));
    }

    /// Fires the suspension hook. At most once per record; later calls are
    /// no-ops.
    pub fn initialize_await(&mut self) {
        if let Some(hook) = self.before_await.take() {
            hook();
        }
    }
}
