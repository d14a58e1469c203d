//! Type and method descriptors used as interception lookup keys.
//!
//! A [`MethodDescriptor`] identifies the logical method being intercepted:
//! the method as declared on the user type, not on the generated proxy.
//! Descriptors are never invoked; they only key annotation tables and chain
//! caches.
use std::{
    any::TypeId,
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Identity of a concrete Rust type, carried alongside its display name.
///
/// Equality and hashing use only the [`TypeId`]; the name is diagnostic.
#[derive(Clone, Copy, Eq)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name with module path and generic arguments stripped.
    pub fn simple_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Whether a method completes synchronously or returns an asynchronous task.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MethodKind {
    Sync,
    Task,
}

/// Key for one declared method, optionally specialized with call-site
/// generic arguments.
///
/// The declaration index keeps same-name methods distinct and stable across
/// lookups. Specialized descriptors key their own chain cache entries, while
/// annotation lookups go through [`MethodDescriptor::erased`] so one declared
/// method serves every specialization.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    owner: TypeDescriptor,
    name: &'static str,
    index: u16,
    generics: Arc<[TypeDescriptor]>,
}

impl MethodDescriptor {
    pub fn new(owner: TypeDescriptor, name: &'static str, index: u16) -> Self {
        Self {
            owner,
            name,
            index,
            generics: Arc::new([]),
        }
    }

    pub fn owner(&self) -> TypeDescriptor {
        self.owner
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn generics(&self) -> &[TypeDescriptor] {
        &self.generics
    }

    pub fn is_specialized(&self) -> bool {
        !self.generics.is_empty()
    }

    /// Specializes this descriptor with call-site type arguments.
    pub fn specialize(&self, args: Vec<TypeDescriptor>) -> Self {
        Self {
            generics: args.into(),
            ..self.clone()
        }
    }

    /// Drops any call-site specialization, yielding the declared method key.
    pub fn erased(&self) -> Self {
        if self.generics.is_empty() {
            return self.clone();
        }
        Self {
            generics: Arc::new([]),
            ..self.clone()
        }
    }

    pub fn display_name(&self) -> String {
        if self.generics.is_empty() {
            format!("{}::{}", self.owner.simple_name(), self.name)
        } else {
            let args: Vec<_> = self.generics.iter().map(|g| g.simple_name()).collect();
            format!(
                "{}::{}<{}>",
                self.owner.simple_name(),
                self.name,
                args.join(", ")
            )
        }
    }
}

impl Debug for MethodDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
