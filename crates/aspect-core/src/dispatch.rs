//! The invocation dispatcher.
//!
//! Given an invocation record, the dispatcher locates (or builds, at most
//! once per method descriptor) the advice chain for the method and applies
//! its head, or proceeds straight to the original body when the method
//! carries no annotation. Chain lookups are lock-free after the first
//! dispatch; the descriptor-to-chain mapping is monotonic over the process
//! lifetime, so nothing is ever evicted.
use crate::{
    aspects::{Annotation, MethodBinding, PointcutForm, PointcutSpec},
    chain::{build_chain, ChainNode},
    descriptor::{MethodDescriptor, MethodKind},
    error::{AspectError, ConfigurationError},
    invocation::Invocation,
    provider::{resolve_refs, InstanceProvider},
    slot::ProxySlot,
    value::SharedValue,
};
use dashmap::{mapref::entry::Entry, DashMap};
use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

/// The proxy back-reference handed to the secondary dispatch entry points:
/// the target's slot plus the proxy to publish into it.
pub struct ProxyBackref<'a> {
    pub slot: &'a ProxySlot,
    pub proxy: SharedValue,
}

#[derive(Default)]
pub struct Dispatcher {
    aspects: DashMap<MethodDescriptor, PointcutSpec>,
    chains: DashMap<MethodDescriptor, Option<Arc<ChainNode>>>,
    provider: OnceLock<InstanceProvider>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the advice instance provider. Install-once; a second call is
    /// a configuration error.
    pub fn install_provider(&self, provider: InstanceProvider) -> Result<(), ConfigurationError> {
        self.provider
            .set(provider)
            .map_err(|_| ConfigurationError::DuplicateRegistration("instance provider".into()))
    }

    pub fn has_provider(&self) -> bool {
        self.provider.get().is_some()
    }

    /// Attaches one annotation to a declared method, merging with any
    /// already present. Direct and deferred forms are mutually exclusive.
    pub fn annotate(
        &self,
        method: &MethodDescriptor,
        kind: MethodKind,
        annotation: Annotation,
    ) -> Result<(), ConfigurationError> {
        // Validate before touching the table: a rejected annotation must not
        // leave an empty pointcut entry behind.
        match &annotation {
            Annotation::Bundle { sources, .. } if sources.is_empty() => {
                return Err(ConfigurationError::EmptyAdviceChain(method.display_name()));
            }
            Annotation::TypeList(refs) if refs.is_empty() => {
                return Err(ConfigurationError::EmptyAdviceChain(method.display_name()));
            }
            _ => {}
        }

        let key = method.erased();
        let mut entry = self.aspects.entry(key).or_insert_with(|| PointcutSpec {
            kind,
            form: PointcutForm::Sources(Vec::new()),
        });
        match annotation {
            Annotation::Single(binding) => match &mut entry.form {
                PointcutForm::Sources(sources) => {
                    sources.push(crate::aspects::AdviceSource::Single(binding));
                    Ok(())
                }
                PointcutForm::Types(_) => Err(ConfigurationError::ConflictingAnnotationForms(
                    method.display_name(),
                )),
            },
            Annotation::Bundle { order, sources } => match &mut entry.form {
                PointcutForm::Sources(existing) => {
                    existing.push(crate::aspects::AdviceSource::Bundle { order, sources });
                    Ok(())
                }
                PointcutForm::Types(_) => Err(ConfigurationError::ConflictingAnnotationForms(
                    method.display_name(),
                )),
            },
            Annotation::TypeList(refs) => match &entry.form {
                PointcutForm::Sources(sources) if sources.is_empty() => {
                    entry.form = PointcutForm::Types(refs);
                    Ok(())
                }
                _ => Err(ConfigurationError::ConflictingAnnotationForms(
                    method.display_name(),
                )),
            },
        }
    }

    /// Installs a batch of manifest bindings. The batch is validated as a
    /// whole first, so a rejected batch leaves the annotation table
    /// untouched.
    pub fn install(&self, bindings: Vec<MethodBinding>) -> Result<(), ConfigurationError> {
        self.stage(&bindings)?;
        for binding in bindings {
            self.annotate(&binding.method, binding.kind, binding.annotation)?;
        }
        Ok(())
    }

    /// Dry-runs the merge rules for a binding batch against the current
    /// table without committing anything.
    fn stage(&self, bindings: &[MethodBinding]) -> Result<(), ConfigurationError> {
        #[derive(Clone, Copy)]
        enum Staged {
            Sources(usize),
            Types,
        }

        let mut staged: HashMap<MethodDescriptor, Staged> = HashMap::new();
        for binding in bindings {
            let key = binding.method.erased();
            let state = staged.entry(key.clone()).or_insert_with(|| {
                match self.aspects.get(&key).map(|spec| spec.value().clone()) {
                    Some(PointcutSpec {
                        form: PointcutForm::Sources(sources),
                        ..
                    }) => Staged::Sources(sources.len()),
                    Some(PointcutSpec {
                        form: PointcutForm::Types(_),
                        ..
                    }) => Staged::Types,
                    None => Staged::Sources(0),
                }
            });
            let current = *state;
            match (&binding.annotation, current) {
                (Annotation::Bundle { sources, .. }, _) if sources.is_empty() => {
                    return Err(ConfigurationError::EmptyAdviceChain(
                        binding.method.display_name(),
                    ));
                }
                (Annotation::TypeList(refs), _) if refs.is_empty() => {
                    return Err(ConfigurationError::EmptyAdviceChain(
                        binding.method.display_name(),
                    ));
                }
                (Annotation::Single(_) | Annotation::Bundle { .. }, Staged::Sources(n)) => {
                    *state = Staged::Sources(n + 1);
                }
                (Annotation::TypeList(_), Staged::Sources(0)) => {
                    *state = Staged::Types;
                }
                _ => {
                    return Err(ConfigurationError::ConflictingAnnotationForms(
                        binding.method.display_name(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Whether the declared method carries at least one advice annotation.
    pub fn is_pointcut(&self, method: &MethodDescriptor) -> bool {
        self.aspects.contains_key(&method.erased())
    }

    /// Executes the advice chain for the invocation's method, or the
    /// original body when no annotation exists.
    pub fn dispatch(&self, inv: &mut Invocation) -> Result<(), AspectError> {
        tracing::debug!("dispatch: method={:?}", inv.method());
        match self.chain_for(inv.method())? {
            Some(head) => head.apply(inv),
            None => inv.proceed(),
        }
    }

    /// The asynchronous dispatch path. A fully synchronous chain over an
    /// async method applies synchronously and sees the task opaquely.
    pub async fn dispatch_async(&self, inv: &mut Invocation) -> Result<(), AspectError> {
        tracing::debug!("dispatch_async: method={:?}", inv.method());
        match self.chain_for(inv.method())? {
            Some(head) if head.advice().is_async() => head.apply_async(inv).await,
            Some(head) => head.apply(inv),
            None => inv.proceed(),
        }
    }

    /// Secondary entry point: publishes the proxy back-reference into the
    /// target's slot (write-once) before dispatching.
    pub fn dispatch_with_proxy(
        &self,
        inv: &mut Invocation,
        backref: Option<ProxyBackref<'_>>,
    ) -> Result<(), AspectError> {
        publish_backref(backref);
        self.dispatch(inv)
    }

    pub async fn dispatch_async_with_proxy(
        &self,
        inv: &mut Invocation,
        backref: Option<ProxyBackref<'_>>,
    ) -> Result<(), AspectError> {
        publish_backref(backref);
        self.dispatch_async(inv).await
    }

    /// Memoized descriptor-to-chain lookup. Concurrent first callers for the
    /// same key block on the entry and observe the one constructed chain.
    fn chain_for(&self, method: &MethodDescriptor) -> Result<Option<Arc<ChainNode>>, AspectError> {
        if let Some(cached) = self.chains.get(method) {
            return Ok(cached.value().clone());
        }
        match self.chains.entry(method.clone()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let chain = self.build_for(method)?;
                entry.insert(chain.clone());
                Ok(chain)
            }
        }
    }

    fn build_for(&self, method: &MethodDescriptor) -> Result<Option<Arc<ChainNode>>, AspectError> {
        let spec = match self.aspects.get(&method.erased()) {
            Some(spec) => spec.value().clone(),
            None => return Ok(None),
        };
        let sources = match spec.form {
            PointcutForm::Sources(sources) => sources,
            PointcutForm::Types(refs) => {
                let provider = self.provider.get().ok_or_else(|| {
                    ConfigurationError::MissingInstanceProvider(method.display_name())
                })?;
                resolve_refs(&refs, provider)?
            }
        };
        tracing::debug!(
            "build_for: {} advice source(s) for {:?}",
            sources.len(),
            method
        );
        build_chain(method, sources, spec.kind).map(Some)
    }
}

fn publish_backref(backref: Option<ProxyBackref<'_>>) {
    if let Some(backref) = backref {
        if backref.slot.publish(backref.proxy) {
            tracing::trace!("dispatch: proxy back-reference published");
        }
    }
}
