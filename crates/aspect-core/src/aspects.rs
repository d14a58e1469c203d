//! The declarative annotation surface.
//!
//! Attribute-style annotations translate to a registration table: for each
//! declared method, an ordered list of advice sources (direct form) or a
//! list of advice types resolved through the instance provider on first
//! dispatch (deferred form). The two forms are mutually exclusive per
//! method.
use crate::{
    advice::AdviceKind,
    descriptor::{MethodDescriptor, MethodKind, TypeDescriptor},
};

/// One attached advice: the instance plus its ordering and error policy.
#[derive(Clone)]
pub struct AdviceBinding {
    pub advice: AdviceKind,
    pub order: i32,
    pub swallow_errors: bool,
}

impl AdviceBinding {
    pub fn new(advice: AdviceKind) -> Self {
        Self {
            advice,
            order: 0,
            swallow_errors: false,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_swallow_errors(mut self, swallow: bool) -> Self {
        self.swallow_errors = swallow;
        self
    }
}

/// A chain-construction input: a single advice, or a composite that is
/// always flattened into its children (never applied directly).
#[derive(Clone)]
pub enum AdviceSource {
    Single(AdviceBinding),
    Bundle {
        order: i32,
        sources: Vec<AdviceSource>,
    },
}

impl AdviceSource {
    pub fn order(&self) -> i32 {
        match self {
            AdviceSource::Single(binding) => binding.order,
            AdviceSource::Bundle { order, .. } => *order,
        }
    }
}

/// Reference to an advice type resolved later through the instance provider.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TypeRef {
    Advice(TypeDescriptor),
    Bundle(TypeDescriptor),
}

impl TypeRef {
    pub fn descriptor(&self) -> TypeDescriptor {
        match self {
            TypeRef::Advice(ty) | TypeRef::Bundle(ty) => *ty,
        }
    }
}

/// One annotation applied to a method.
#[derive(Clone)]
pub enum Annotation {
    Single(AdviceBinding),
    Bundle {
        order: i32,
        sources: Vec<AdviceSource>,
    },
    TypeList(Vec<TypeRef>),
}

/// One method's annotation, as produced by a proxy manifest.
#[derive(Clone)]
pub struct MethodBinding {
    pub method: MethodDescriptor,
    pub kind: MethodKind,
    pub annotation: Annotation,
}

/// The merged annotation state for one declared method.
#[derive(Clone)]
pub(crate) enum PointcutForm {
    Sources(Vec<AdviceSource>),
    Types(Vec<TypeRef>),
}

#[derive(Clone)]
pub(crate) struct PointcutSpec {
    pub kind: MethodKind,
    pub form: PointcutForm,
}
