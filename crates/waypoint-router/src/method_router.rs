//! Per-path method dispatch.
//!
//! [`MethodRouter`] maps HTTP methods to handlers for a single route
//! pattern. Each method can be registered at most once.

use http::Method;
use waypoint_core::BoxHandler;

/// Maps HTTP methods to handlers for one route pattern.
///
/// Methods keep their registration order, which is also the order reported
/// in `Allow` headers.
#[derive(Clone, Default)]
pub struct MethodRouter {
    handlers: Vec<(Method, BoxHandler)>,
}

impl MethodRouter {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `method`.
    ///
    /// Returns `false` and leaves the router unchanged if the method already
    /// has a handler.
    pub fn insert(&mut self, method: Method, handler: BoxHandler) -> bool {
        if self.contains(&method) {
            return false;
        }
        self.handlers.push((method, handler));
        true
    }

    /// Returns the handler for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&BoxHandler> {
        self.handlers
            .iter()
            .find(|(registered, _)| registered == method)
            .map(|(_, handler)| handler)
    }

    /// Returns `true` if `method` has a handler.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.get(method).is_some()
    }

    /// Returns true if any methods are registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Returns the registered methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.handlers.iter().map(|(method, _)| method.clone()).collect()
    }
}

impl std::fmt::Debug for MethodRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRouter")
            .field("methods", &self.allowed_methods())
            .finish()
    }
}

/// Formats methods as an `Allow` header value.
#[must_use]
pub fn allow_header_value(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::{boxed, sync_handler};

    fn noop() -> BoxHandler {
        boxed(sync_handler(|_, _| Ok(())))
    }

    #[test]
    fn test_method_router_new() {
        let router = MethodRouter::new();
        assert!(!router.has_any_method());
        assert!(router.get(&Method::GET).is_none());
    }

    #[test]
    fn test_insert_and_get() {
        let mut router = MethodRouter::new();
        assert!(router.insert(Method::GET, noop()));
        assert!(router.insert(Method::POST, noop()));

        assert!(router.get(&Method::GET).is_some());
        assert!(router.get(&Method::POST).is_some());
        assert!(router.get(&Method::DELETE).is_none());
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let first = noop();
        let mut router = MethodRouter::new();
        assert!(router.insert(Method::GET, first.clone()));
        assert!(!router.insert(Method::GET, noop()));

        let kept = router.get(&Method::GET).unwrap();
        assert!(std::sync::Arc::ptr_eq(kept, &first));
    }

    #[test]
    fn test_extension_methods() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let mut router = MethodRouter::new();
        assert!(router.insert(purge.clone(), noop()));
        assert!(router.contains(&purge));
    }

    #[test]
    fn test_allowed_methods_in_registration_order() {
        let mut router = MethodRouter::new();
        router.insert(Method::POST, noop());
        router.insert(Method::GET, noop());
        router.insert(Method::DELETE, noop());

        let allowed = router.allowed_methods();
        assert_eq!(allowed, vec![Method::POST, Method::GET, Method::DELETE]);
        assert_eq!(allow_header_value(&allowed), "POST, GET, DELETE");
    }
}
