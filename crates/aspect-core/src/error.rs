use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum AspectError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperation),

    #[error(transparent)]
    User(#[from] UserError),
}

/// Structural problems in annotations or registration, discovered at proxy
/// synthesis or on first dispatch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("method {0} is not overridable and cannot carry a pointcut")]
    MethodNotOverridable(String),

    #[error("{0} is an open generic type and cannot be proxied")]
    OpenGenericTarget(String),

    #[error("method {0} mixes direct advice annotations with an advice type list")]
    ConflictingAnnotationForms(String),

    #[error("no instance provider installed while resolving advices for {0}")]
    MissingInstanceProvider(String),

    #[error("advice type {0} is not known to the instance provider")]
    UnresolvableAdviceType(String),

    #[error("type {0} did not resolve to an advice")]
    NotAnAdvice(String),

    #[error("type {0} did not resolve to an advice type bundle")]
    NotABundle(String),

    #[error("the advice annotation on {0} flattens to an empty chain")]
    EmptyAdviceChain(String),

    #[error("an advice instance appears more than once in the chain for {0}")]
    DuplicateAdvice(String),

    #[error("{0} is already registered")]
    DuplicateRegistration(String),

    #[error("{0} is not registered")]
    MissingRegistration(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnsupportedOperation {
    #[error("async advice applied to synchronous method {0}")]
    AsyncAdviceOnSyncMethod(String),

    #[error("the chain for {0} mixes synchronous and asynchronous advices")]
    MixedChain(String),

    #[error("the return slot of {0} does not hold a task")]
    NotATask(String),

    #[error("value does not have the expected type {expected}")]
    TypeMismatch { expected: &'static str },
}

/// A failure raised by an original method body or by an advice.
///
/// Cheaply cloneable so it can sit in the invocation's exception slot while
/// also propagating up the chain.
#[derive(Debug, Clone)]
pub struct UserError(Arc<dyn std::error::Error + Send + Sync>);

impl UserError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }

    pub fn msg(msg: impl Into<String>) -> Self {
        Self(Arc::new(Message(msg.into())))
    }

    pub fn get(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref()
    }
}

impl Display for UserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for UserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);
