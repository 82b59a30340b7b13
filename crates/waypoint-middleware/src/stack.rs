//! Ordered middleware stacks.
//!
//! A [`Stack`] is a list of middleware applied to a handler in one step.
//! The first middleware in the list is the outermost layer:
//!
//! ```text
//! Stack [A, B] applied to H  =  A(B(H))
//!
//! request  → A(pre) → B(pre) → H
//! response ← A(post) ← B(post) ←┘
//! ```
//!
//! Composition happens once, when [`Stack::apply`] is called. The resulting
//! handler is immutable and shared by every request.

use std::sync::Arc;

use waypoint_core::{boxed, BoxHandler, Handler};

use crate::middleware::{layer, BoxedMiddleware, Middleware};

/// An ordered list of middleware, outermost first.
///
/// # Example
///
/// ```
/// use waypoint_core::sync_handler;
/// use waypoint_middleware::{RequestId, RequestTracing, Stack};
///
/// let stack = Stack::new().push(RequestId::new()).push(RequestTracing::new());
/// assert_eq!(stack.names(), vec!["request_id", "request_tracing"]);
///
/// let handler = stack.apply(sync_handler(|writer, _| {
///     writer.write_str("ok")?;
///     Ok(())
/// }));
/// # let _ = handler;
/// ```
#[derive(Clone, Default)]
pub struct Stack {
    layers: Vec<BoxedMiddleware>,
}

impl Stack {
    /// Creates an empty stack. Applying it returns the handler unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `middleware` inside every layer already in the stack.
    #[must_use]
    pub fn push<M: Middleware>(self, middleware: M) -> Self {
        self.push_shared(Arc::new(middleware))
    }

    /// Adds an already shared middleware.
    #[must_use]
    pub fn push_shared(mut self, middleware: BoxedMiddleware) -> Self {
        self.layers.push(middleware);
        self
    }

    /// Appends every layer of `other` inside this stack's layers.
    ///
    /// `a.append(b).apply(h)` behaves like `a.apply(b.apply(h))`.
    #[must_use]
    pub fn append(mut self, other: Stack) -> Self {
        self.layers.extend(other.layers);
        self
    }

    /// Composes the stack around `handler`.
    pub fn apply<H: Handler>(&self, handler: H) -> BoxHandler {
        self.apply_boxed(boxed(handler))
    }

    /// Composes the stack around an already type-erased handler.
    #[must_use]
    pub fn apply_boxed(&self, handler: BoxHandler) -> BoxHandler {
        // Build the chain from back to front
        self.layers
            .iter()
            .rev()
            .fold(handler, |inner, middleware| layer(Arc::clone(middleware), inner))
    }

    /// Returns the names of all middleware in order, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|middleware| middleware.name()).collect()
    }

    /// Returns the number of middleware in the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if the stack has no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack").field("layers", &self.names()).finish()
    }
}
