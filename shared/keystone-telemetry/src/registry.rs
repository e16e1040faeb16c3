//! Instrumentation source registry
//!
//! Named producers of trace/metric/log signals. Registration is idempotent:
//! only the first registration of a key reports `true`, letting composition
//! logic skip re-initializing an already-active source.

use parking_lot::Mutex;

/// Well-known instrumentation source keys.
pub mod sources {
    pub const HTTP_SERVER: &str = "http-server";
    pub const HTTP_CLIENT: &str = "http-client";
    pub const DATASTORE: &str = "datastore";
}

/// Ordered, deduplicating set of instrumentation source keys.
///
/// Check-and-insert is atomic under the lock, so concurrent registration
/// from multiple initialization paths cannot double-register a source.
#[derive(Debug, Default)]
pub struct InstrumentationRegistry {
    keys: Mutex<Vec<String>>,
}

impl InstrumentationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether this is the first registration of `key`.
    /// Repeated registration is a no-op.
    pub fn register(&self, key: &str) -> bool {
        let mut keys = self.keys.lock();
        if keys.iter().any(|k| k == key) {
            return false;
        }
        keys.push(key.to_string());
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.lock().iter().any(|k| k == key)
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_wins() {
        let registry = InstrumentationRegistry::new();
        assert!(registry.register(sources::HTTP_SERVER));
        assert!(!registry.register(sources::HTTP_SERVER));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn keys_keep_registration_order() {
        let registry = InstrumentationRegistry::new();
        registry.register(sources::DATASTORE);
        registry.register(sources::HTTP_SERVER);
        registry.register(sources::DATASTORE);
        assert_eq!(registry.keys(), vec!["datastore", "http-server"]);
    }
}
