//! The proxy-type registry.
//!
//! Synthesis validates a class manifest against its advice bindings and
//! publishes one [`ProxyType`] per class. Publication is build-once,
//! read-many: synthesis is serialized under a registry-wide lock, reads are
//! lock-free after publication, and a failed validation publishes nothing.
use crate::manifest::ClassManifest;
use aspect_core::{ConfigurationError, Dispatcher, MethodBinding, MethodDescriptor, MethodKind, TypeDescriptor};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

/// One intercepted method of a synthesized proxy type.
#[derive(Clone)]
pub struct MethodSite {
    pub method: MethodDescriptor,
    /// Uniquified name of the non-virtual re-entry helper, keyed on the
    /// method's declaration index so overloaded simple names stay distinct.
    pub executor_name: String,
    pub kind: MethodKind,
}

/// The published record of one synthesized proxy type.
pub struct ProxyType {
    class: TypeDescriptor,
    name: String,
    methods: Vec<MethodSite>,
}

impl ProxyType {
    pub fn class(&self) -> TypeDescriptor {
        self.class
    }

    /// The disambiguated proxy type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The intercepted methods, in declaration order.
    pub fn intercepted(&self) -> &[MethodSite] {
        &self.methods
    }
}

#[derive(Default)]
pub struct ProxyRegistry {
    types: DashMap<TypeDescriptor, Arc<ProxyType>>,
    /// Serializes synthesis and tracks simple-name collisions.
    synthesis: Mutex<HashMap<&'static str, usize>>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class: &TypeDescriptor) -> Option<Arc<ProxyType>> {
        self.types.get(class).map(|t| t.value().clone())
    }

    /// Whether the class declares at least one pointcut.
    pub fn is_aspect_target(bindings: &[MethodBinding]) -> bool {
        !bindings.is_empty()
    }

    /// Returns the published proxy type for the class, synthesizing it on
    /// first use. Concurrent callers observe at-most-once synthesis and the
    /// identical result.
    pub fn get_or_synthesize(
        &self,
        manifest: &ClassManifest,
        bindings: &[MethodBinding],
        dispatcher: &Dispatcher,
    ) -> Result<Arc<ProxyType>, ConfigurationError> {
        if let Some(existing) = self.get(&manifest.class) {
            return Ok(existing);
        }

        let mut names = self.synthesis.lock();
        if let Some(existing) = self.get(&manifest.class) {
            return Ok(existing);
        }

        self.validate(manifest, bindings)?;
        dispatcher.install(bindings.to_vec())?;

        let simple = manifest.class.simple_name();
        let count = names.entry(simple).or_insert(0);
        *count += 1;
        let name = if *count == 1 {
            format!("{simple}Proxy")
        } else {
            format!("{simple}Proxy{count}")
        };

        let pointcuts: Vec<MethodDescriptor> =
            bindings.iter().map(|b| b.method.erased()).collect();
        let methods = manifest
            .methods
            .iter()
            .filter(|entry| pointcuts.contains(&entry.method))
            .map(|entry| MethodSite {
                method: entry.method.clone(),
                executor_name: format!("exec_{}_{}", entry.method.name(), entry.method.index()),
                kind: entry.kind,
            })
            .collect();

        let proxy = Arc::new(ProxyType {
            class: manifest.class,
            name,
            methods,
        });
        self.types.insert(manifest.class, proxy.clone());
        tracing::debug!(
            "get_or_synthesize: published {} for {:?}",
            proxy.name,
            manifest.class
        );
        Ok(proxy)
    }

    fn validate(
        &self,
        manifest: &ClassManifest,
        bindings: &[MethodBinding],
    ) -> Result<(), ConfigurationError> {
        if manifest.open_generic {
            return Err(ConfigurationError::OpenGenericTarget(
                manifest.class.name().to_string(),
            ));
        }
        for binding in bindings {
            let entry = manifest.entry_for(&binding.method).ok_or_else(|| {
                ConfigurationError::MissingRegistration(binding.method.display_name())
            })?;
            if !entry.overridable {
                return Err(ConfigurationError::MethodNotOverridable(
                    binding.method.display_name(),
                ));
            }
        }
        Ok(())
    }
}
