//! Advice chains: ordered, immutably linked lists of advices.
//!
//! Links are set at build time and never mutated, which makes traversal
//! lock-free even when the chain is shared across concurrent dispatches.
use crate::{
    advice::AdviceKind,
    aspects::{AdviceBinding, AdviceSource},
    descriptor::{MethodDescriptor, MethodKind},
    error::{AspectError, ConfigurationError, UnsupportedOperation},
    invocation::Invocation,
};
use futures::future::BoxFuture;
use std::sync::Arc;

pub struct ChainNode {
    advice: AdviceKind,
    order: i32,
    swallow_errors: bool,
    next: Option<Arc<ChainNode>>,
}

impl std::fmt::Debug for ChainNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainNode")
            .field("order", &self.order)
            .field("swallow_errors", &self.swallow_errors)
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

impl ChainNode {
    pub fn advice(&self) -> &AdviceKind {
        &self.advice
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn swallow_errors(&self) -> bool {
        self.swallow_errors
    }

    pub fn next(&self) -> Option<&Arc<ChainNode>> {
        self.next.as_ref()
    }

    /// Runs this advice synchronously.
    pub fn apply(&self, inv: &mut Invocation) -> Result<(), AspectError> {
        match &self.advice {
            AdviceKind::Sync(advice) => advice.apply(Proceed { node: self }, inv),
            AdviceKind::Async(_) => Err(UnsupportedOperation::AsyncAdviceOnSyncMethod(
                inv.method().display_name(),
            )
            .into()),
        }
    }

    /// Runs this advice on the asynchronous path.
    ///
    /// Entering an async advice is the first point the invocation may
    /// suspend, so the one-shot suspension hook fires here.
    pub fn apply_async<'a>(
        &'a self,
        inv: &'a mut Invocation,
    ) -> BoxFuture<'a, Result<(), AspectError>> {
        Box::pin(async move {
            match &self.advice {
                AdviceKind::Async(advice) => {
                    inv.initialize_await();
                    advice.apply(AsyncProceed { node: self }, inv).await
                }
                AdviceKind::Sync(advice) => advice.apply(Proceed { node: self }, inv),
            }
        })
    }
}

/// The proceed helper handed to a synchronous advice.
#[derive(Clone, Copy)]
pub struct Proceed<'c> {
    node: &'c ChainNode,
}

impl Proceed<'_> {
    /// Applies the next advice, or the original body when this is the tail.
    pub fn proceed(&self, inv: &mut Invocation) -> Result<(), AspectError> {
        let outcome = match &self.node.next {
            Some(next) => next.apply(inv),
            None => inv.proceed(),
        };
        guard(self.node, inv, outcome)
    }
}

/// The proceed helper handed to an asynchronous advice.
#[derive(Clone, Copy)]
pub struct AsyncProceed<'c> {
    node: &'c ChainNode,
}

impl AsyncProceed<'_> {
    pub async fn proceed(&self, inv: &mut Invocation) -> Result<(), AspectError> {
        let outcome = match &self.node.next {
            Some(next) => next.apply_async(inv).await,
            None => inv.proceed_async().await,
        };
        guard(self.node, inv, outcome)
    }
}

/// Exception guard around a downstream call: record the failure, then
/// rethrow unless the current advice swallows.
fn guard(
    node: &ChainNode,
    inv: &mut Invocation,
    outcome: Result<(), AspectError>,
) -> Result<(), AspectError> {
    match outcome {
        Ok(()) => Ok(()),
        Err(err) => {
            inv.record_exception(&err);
            if node.swallow_errors {
                tracing::debug!(
                    "proceed: swallowed failure in {}: {}",
                    inv.method().display_name(),
                    err
                );
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

/// Builds the linked chain for one method from its flattened advice sources.
pub fn build_chain(
    method: &MethodDescriptor,
    sources: Vec<AdviceSource>,
    kind: MethodKind,
) -> Result<Arc<ChainNode>, AspectError> {
    let mut flat = Vec::new();
    flatten(sources, &mut flat);

    if flat.is_empty() {
        return Err(ConfigurationError::EmptyAdviceChain(method.display_name()).into());
    }

    for i in 0..flat.len() {
        for j in (i + 1)..flat.len() {
            if flat[i].advice.instance_ptr() == flat[j].advice.instance_ptr() {
                return Err(ConfigurationError::DuplicateAdvice(method.display_name()).into());
            }
        }
    }

    let has_async = flat.iter().any(|b| b.advice.is_async());
    let has_sync = flat.iter().any(|b| !b.advice.is_async());
    if has_async && has_sync {
        return Err(UnsupportedOperation::MixedChain(method.display_name()).into());
    }
    if has_async && kind == MethodKind::Sync {
        return Err(
            UnsupportedOperation::AsyncAdviceOnSyncMethod(method.display_name()).into(),
        );
    }

    tracing::trace!(
        "build_chain: linking {} advice(s) for {}",
        flat.len(),
        method.display_name()
    );

    let mut head: Option<Arc<ChainNode>> = None;
    for binding in flat.into_iter().rev() {
        head = Some(Arc::new(ChainNode {
            advice: binding.advice,
            order: binding.order,
            swallow_errors: binding.swallow_errors,
            next: head,
        }));
    }
    match head {
        Some(head) => Ok(head),
        None => Err(ConfigurationError::EmptyAdviceChain(method.display_name()).into()),
    }
}

/// Stable-sorts sources by order (ties keep declaration order) and expands
/// bundles depth-first at their annotation position.
fn flatten(mut sources: Vec<AdviceSource>, out: &mut Vec<AdviceBinding>) {
    sources.sort_by_key(AdviceSource::order);
    for source in sources {
        match source {
            AdviceSource::Single(binding) => out.push(binding),
            AdviceSource::Bundle { sources, .. } => flatten(sources, out),
        }
    }
}
