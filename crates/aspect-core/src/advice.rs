//! The advice traits.
//!
//! An advice runs around an intercepted call and decides whether, and how
//! often, the call proceeds down the chain. Advice instances may be container
//! singletons shared across chains and threads, so both traits require
//! `Send + Sync`.
use crate::{
    chain::{AsyncProceed, Proceed},
    error::AspectError,
    invocation::Invocation,
};
use async_trait::async_trait;
use std::sync::Arc;

/// A synchronous advice.
///
/// Call `chain.proceed(inv)` zero, one, or several times; each call re-runs
/// only the tail of the chain from this advice and overwrites the return
/// slot. Assigning a return value and returning without proceeding
/// short-circuits the rest of the chain.
pub trait Advice: Send + Sync {
    fn apply(&self, chain: Proceed<'_>, inv: &mut Invocation) -> Result<(), AspectError>;
}

/// An asynchronous advice, applied to methods that return a task.
#[async_trait]
pub trait AsyncAdvice: Send + Sync {
    async fn apply(&self, chain: AsyncProceed<'_>, inv: &mut Invocation)
        -> Result<(), AspectError>;
}

#[derive(Clone)]
pub enum AdviceKind {
    Sync(Arc<dyn Advice>),
    Async(Arc<dyn AsyncAdvice>),
}

impl AdviceKind {
    pub fn is_async(&self) -> bool {
        matches!(self, AdviceKind::Async(_))
    }

    /// Instance identity, used to reject the same advice appearing twice in
    /// one chain.
    pub(crate) fn instance_ptr(&self) -> *const () {
        match self {
            AdviceKind::Sync(a) => Arc::as_ptr(a) as *const (),
            AdviceKind::Async(a) => Arc::as_ptr(a) as *const (),
        }
    }
}

pub fn advice<A: Advice + 'static>(advice: A) -> AdviceKind {
    AdviceKind::Sync(Arc::new(advice))
}

pub fn async_advice<A: AsyncAdvice + 'static>(advice: A) -> AdviceKind {
    AdviceKind::Async(Arc::new(advice))
}
