//! # aspect-container
//!
//! A thin container wrapping the interception runtime: registering a target
//! type substitutes its synthesized proxy, so resolving the type yields an
//! object whose pointcut methods run their advice chains transparently.
//! Advice types registered here back the dispatcher's instance provider for
//! the deferred (type-list) annotation form.
use aspect_core::{
    advice, async_advice, Advice, AspectError, AsyncAdvice, ConfigurationError, Dispatcher,
    InstanceProvider, Provided, TypeDescriptor, TypeRef, UnsupportedOperation,
};
use aspect_weave::{AspectTarget, ProxyRegistry};
use dashmap::{mapref::entry::Entry, DashMap};
use std::{
    any::{Any, TypeId},
    sync::{Arc, OnceLock},
};

type SharedInstance = Arc<dyn Any + Send + Sync>;
type InstanceFactory = Box<dyn Fn() -> SharedInstance + Send + Sync>;

enum Registration {
    Singleton(Provided),
    Factory(Box<dyn Fn() -> Provided + Send + Sync>),
}

/// The advice-type table backing the instance provider.
#[derive(Default)]
struct AdviceTable {
    entries: DashMap<TypeId, Registration>,
}

impl AdviceTable {
    fn insert(&self, ty: TypeDescriptor, registration: Registration) -> Result<(), ConfigurationError> {
        match self.entries.entry(ty.id()) {
            Entry::Occupied(_) => Err(ConfigurationError::DuplicateRegistration(
                ty.name().to_string(),
            )),
            Entry::Vacant(entry) => {
                entry.insert(registration);
                Ok(())
            }
        }
    }

    fn lookup(&self, ty: &TypeDescriptor) -> Option<Provided> {
        self.entries.get(&ty.id()).map(|reg| match reg.value() {
            Registration::Singleton(provided) => provided.clone(),
            Registration::Factory(factory) => factory(),
        })
    }
}

/// Build-once, resolve-many container with singleton lifestyle.
pub struct Container {
    dispatcher: Arc<Dispatcher>,
    registry: ProxyRegistry,
    factories: DashMap<TypeId, InstanceFactory>,
    singletons: DashMap<TypeId, SharedInstance>,
    advices: Arc<AdviceTable>,
    provider_installed: OnceLock<()>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new()),
            registry: ProxyRegistry::new(),
            factories: DashMap::new(),
            singletons: DashMap::new(),
            advices: Arc::new(AdviceTable::default()),
            provider_installed: OnceLock::new(),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn registry(&self) -> &ProxyRegistry {
        &self.registry
    }

    /// Registers an aspect target. The proxy type is synthesized and
    /// validated here, so structural problems fail registration and nothing
    /// is published.
    pub fn register<T: AspectTarget>(
        &self,
        factory: impl Fn() -> T + Send + Sync + 'static,
    ) -> Result<(), AspectError> {
        let descriptor = TypeDescriptor::of::<T>();
        self.registry
            .get_or_synthesize(&T::manifest(), &T::bindings(), &self.dispatcher)?;
        let dispatcher = self.dispatcher.clone();
        self.insert_factory(
            descriptor,
            Box::new(move || {
                T::weave(Arc::new(factory()), dispatcher.clone()) as SharedInstance
            }),
        )?;
        tracing::debug!("register: {:?} substituted with its proxy", descriptor);
        Ok(())
    }

    /// Resolves a registered aspect target as its proxy. Singleton
    /// lifestyle: the factory runs once, later resolves return the same
    /// instance.
    pub fn resolve<T: AspectTarget>(&self) -> Result<Arc<T::Proxy>, AspectError> {
        let instance = self.resolve_instance(TypeDescriptor::of::<T>())?;
        instance.downcast::<T::Proxy>().map_err(|_| {
            UnsupportedOperation::TypeMismatch {
                expected: std::any::type_name::<T::Proxy>(),
            }
            .into()
        })
    }

    /// Registers a plain (non-aspect) type, resolved without a proxy.
    pub fn register_raw<T: Send + Sync + 'static>(
        &self,
        factory: impl Fn() -> T + Send + Sync + 'static,
    ) -> Result<(), AspectError> {
        self.insert_factory(
            TypeDescriptor::of::<T>(),
            Box::new(move || Arc::new(factory()) as SharedInstance),
        )?;
        Ok(())
    }

    pub fn resolve_raw<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, AspectError> {
        let instance = self.resolve_instance(TypeDescriptor::of::<T>())?;
        instance.downcast::<T>().map_err(|_| {
            UnsupportedOperation::TypeMismatch {
                expected: std::any::type_name::<T>(),
            }
            .into()
        })
    }

    /// Registers a singleton advice instance for the deferred annotation
    /// form. The first advice registration wires this container in as the
    /// dispatcher's instance provider.
    pub fn register_advice<A: Advice + 'static>(&self, instance: A) -> Result<(), AspectError> {
        self.ensure_provider();
        self.advices.insert(
            TypeDescriptor::of::<A>(),
            Registration::Singleton(Provided::Advice(advice(instance))),
        )?;
        Ok(())
    }

    pub fn register_async_advice<A: AsyncAdvice + 'static>(
        &self,
        instance: A,
    ) -> Result<(), AspectError> {
        self.ensure_provider();
        self.advices.insert(
            TypeDescriptor::of::<A>(),
            Registration::Singleton(Provided::Advice(async_advice(instance))),
        )?;
        Ok(())
    }

    /// Registers a transient advice: every chain build gets a fresh
    /// instance.
    pub fn register_advice_factory<A: Advice + 'static>(
        &self,
        factory: impl Fn() -> A + Send + Sync + 'static,
    ) -> Result<(), AspectError> {
        self.ensure_provider();
        self.advices.insert(
            TypeDescriptor::of::<A>(),
            Registration::Factory(Box::new(move || Provided::Advice(advice(factory())))),
        )?;
        Ok(())
    }

    /// Registers a bundle type that expands into further advice types.
    pub fn register_advice_bundle<B: 'static>(
        &self,
        refs: Vec<TypeRef>,
    ) -> Result<(), AspectError> {
        self.ensure_provider();
        self.advices.insert(
            TypeDescriptor::of::<B>(),
            Registration::Singleton(Provided::Bundle(refs)),
        )?;
        Ok(())
    }

    fn insert_factory(
        &self,
        descriptor: TypeDescriptor,
        factory: InstanceFactory,
    ) -> Result<(), ConfigurationError> {
        match self.factories.entry(descriptor.id()) {
            Entry::Occupied(_) => Err(ConfigurationError::DuplicateRegistration(
                descriptor.name().to_string(),
            )),
            Entry::Vacant(entry) => {
                entry.insert(factory);
                Ok(())
            }
        }
    }

    /// Singleton lookup. Concurrent first resolvers block on the entry, so
    /// the registered factory runs at most once.
    fn resolve_instance(&self, descriptor: TypeDescriptor) -> Result<SharedInstance, AspectError> {
        if let Some(hit) = self.singletons.get(&descriptor.id()) {
            return Ok(hit.value().clone());
        }
        match self.singletons.entry(descriptor.id()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let built = {
                    let factory = self.factories.get(&descriptor.id()).ok_or_else(|| {
                        ConfigurationError::MissingRegistration(descriptor.name().to_string())
                    })?;
                    factory.value()()
                };
                entry.insert(built.clone());
                Ok(built)
            }
        }
    }

    fn ensure_provider(&self) {
        self.provider_installed.get_or_init(|| {
            let table = self.advices.clone();
            let provider: InstanceProvider = Arc::new(move |ty| table.lookup(ty));
            let _ = self.dispatcher.install_provider(provider);
        });
    }
}

#[cfg(test)]
mod container_tests;
