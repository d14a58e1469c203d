//! The seam between generated proxies and the runtime.
use crate::{manifest::ClassManifest, registry::ProxyRegistry};
use aspect_core::{ConfigurationError, Dispatcher, MethodBinding};
use std::sync::Arc;

/// Implemented (normally by `#[interceptable]`) for every class that can be
/// woven into a proxy.
///
/// `Proxy` is the generated type standing in for the target: it exposes the
/// target's public surface, routing pointcut methods through the dispatcher
/// and forwarding everything else unchanged.
pub trait AspectTarget: Send + Sync + Sized + 'static {
    type Proxy: Send + Sync + 'static;

    /// The class's declared interceptable surface.
    fn manifest() -> ClassManifest;

    /// The advice annotations carried by the class's methods.
    fn bindings() -> Vec<MethodBinding>;

    /// Wraps an already-built target in its proxy.
    fn weave(target: Arc<Self>, dispatcher: Arc<Dispatcher>) -> Arc<Self::Proxy>;
}

/// Synthesizes (at most once) the proxy type for `T` and weaves `target`
/// into a proxy instance.
pub fn weave<T: AspectTarget>(
    target: T,
    dispatcher: Arc<Dispatcher>,
    registry: &ProxyRegistry,
) -> Result<Arc<T::Proxy>, ConfigurationError> {
    registry.get_or_synthesize(&T::manifest(), &T::bindings(), &dispatcher)?;
    Ok(T::weave(Arc::new(target), dispatcher))
}
