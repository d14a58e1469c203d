//! # aspect-weave
//!
//! Proxy-type synthesis for the interception runtime. Generated subclasses
//! of the original design become ahead-of-time trampoline tables: a class
//! declares its interceptable surface in a [`ClassManifest`], the
//! [`ProxyRegistry`] validates and publishes one [`ProxyType`] per class,
//! and [`AspectTarget::weave`] wraps a built target in its proxy.
pub mod manifest;
pub mod proxy;
pub mod registry;

pub use manifest::{ClassManifest, MethodEntry};
pub use proxy::{weave, AspectTarget};
pub use registry::{MethodSite, ProxyRegistry, ProxyType};

pub use aspect_core::{ProxyAware, ProxySlot};

#[cfg(test)]
mod registry_tests;
