//! The external instance provider.
//!
//! When the deferred annotation form is used, advice types are resolved
//! through a provider installed by the embedding container. Resolution is
//! postponed until the first dispatch of the annotated method, so the
//! provider may be wired after class registration.
use crate::{
    advice::AdviceKind,
    aspects::{AdviceBinding, AdviceSource, TypeRef},
    descriptor::TypeDescriptor,
    error::ConfigurationError,
};
use std::sync::Arc;

/// What a provider hands back for one advice type descriptor.
#[derive(Clone)]
pub enum Provided {
    Advice(AdviceKind),
    Bundle(Vec<TypeRef>),
}

pub type InstanceProvider = Arc<dyn Fn(&TypeDescriptor) -> Option<Provided> + Send + Sync>;

/// Resolves type references into advice sources, expanding bundle types
/// depth-first.
pub(crate) fn resolve_refs(
    refs: &[TypeRef],
    provider: &InstanceProvider,
) -> Result<Vec<AdviceSource>, ConfigurationError> {
    let mut out = Vec::with_capacity(refs.len());
    for r in refs {
        match r {
            TypeRef::Advice(ty) => match (**provider)(ty) {
                Some(Provided::Advice(kind)) => {
                    out.push(AdviceSource::Single(AdviceBinding::new(kind)));
                }
                Some(Provided::Bundle(_)) => {
                    return Err(ConfigurationError::NotAnAdvice(ty.name().to_string()));
                }
                None => {
                    return Err(ConfigurationError::UnresolvableAdviceType(
                        ty.name().to_string(),
                    ));
                }
            },
            TypeRef::Bundle(ty) => match (**provider)(ty) {
                Some(Provided::Bundle(inner)) => {
                    let sources = resolve_refs(&inner, provider)?;
                    out.push(AdviceSource::Bundle { order: 0, sources });
                }
                Some(Provided::Advice(_)) => {
                    return Err(ConfigurationError::NotABundle(ty.name().to_string()));
                }
                None => {
                    return Err(ConfigurationError::UnresolvableAdviceType(
                        ty.name().to_string(),
                    ));
                }
            },
        }
    }
    Ok(out)
}
