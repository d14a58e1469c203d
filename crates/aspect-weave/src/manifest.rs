//! Class manifests: the ahead-of-time description of an interceptable class.
//!
//! Where the original runtime emitted subtypes at run time, this port
//! declares each class's interceptable surface up front (usually through
//! the `#[interceptable]` macro, occasionally by hand) and validates it at
//! synthesis time.
use aspect_core::{MethodDescriptor, MethodKind, TypeDescriptor};

/// One method of the target class.
#[derive(Clone)]
pub struct MethodEntry {
    pub method: MethodDescriptor,
    pub kind: MethodKind,
    /// Whether a trampoline can take the place of this method. Methods that
    /// consume or exclusively borrow the receiver cannot be intercepted.
    pub overridable: bool,
}

/// The interceptable surface of one target class, in declaration order.
#[derive(Clone)]
pub struct ClassManifest {
    pub class: TypeDescriptor,
    /// Set when the manifest describes a generic type that was never
    /// closed over concrete arguments; such a class cannot be proxied.
    pub open_generic: bool,
    pub methods: Vec<MethodEntry>,
}

impl ClassManifest {
    pub fn new(class: TypeDescriptor) -> Self {
        Self {
            class,
            open_generic: false,
            methods: Vec::new(),
        }
    }

    pub fn open_generic(mut self) -> Self {
        self.open_generic = true;
        self
    }

    pub fn method(mut self, entry: MethodEntry) -> Self {
        self.methods.push(entry);
        self
    }

    pub fn entry_for(&self, method: &MethodDescriptor) -> Option<&MethodEntry> {
        let key = method.erased();
        self.methods.iter().find(|e| e.method == key)
    }
}
