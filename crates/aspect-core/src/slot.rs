//! The proxy back-reference slot.
//!
//! A target struct may expose a write-once cell the dispatcher fills with
//! the proxy on first dispatch. Method bodies can then re-enter their own
//! pointcuts through the proxy instead of bypassing interception with a
//! direct call.
use crate::value::SharedValue;
use std::{
    any::Any,
    sync::{Arc, OnceLock},
};

/// Write-once holder for the proxy back-reference.
///
/// Readers may observe either nothing or the published proxy; publication
/// happens at most once and later attempts are no-ops.
#[derive(Default)]
pub struct ProxySlot {
    cell: OnceLock<SharedValue>,
}

impl ProxySlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> Option<&SharedValue> {
        self.cell.get()
    }

    pub fn get_as<P: Any + Send + Sync>(&self) -> Option<Arc<P>> {
        self.cell.get().and_then(|v| v.clone().downcast::<P>().ok())
    }

    /// Publishes the proxy. Returns whether this call performed the write.
    pub fn publish(&self, proxy: SharedValue) -> bool {
        self.cell.set(proxy).is_ok()
    }
}

impl std::fmt::Debug for ProxySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_set() {
            f.write_str("ProxySlot(set)")
        } else {
            f.write_str("ProxySlot(unset)")
        }
    }
}

/// Exposes a target's back-reference slot to the dispatcher.
pub trait ProxyAware {
    fn proxy_slot(&self) -> &ProxySlot;
}
