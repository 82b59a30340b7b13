//! Resource lifecycle management.
//!
//! Long-lived resources (persistence handles, outbound mail connections)
//! are acquired at startup through a [`ResourceScope`] and released when
//! the scope ends.
//!
//! # Execution Order
//!
//! - **Acquisition**: in call order; each `acquire` either returns a fully
//!   usable resource or fails
//! - **Release**: reverse acquisition order (LIFO), each resource exactly
//!   once, on [`ResourceScope::release_all`] or when the scope is dropped
//!
//! If an acquisition fails, everything already acquired is released before
//! the [`Setup`](ErrorKind::Setup) error is returned, so a failed startup
//! leaves nothing open.
//!
//! # Example
//!
//! ```rust
//! use waypoint_core::Error;
//! use waypoint_server::{Resource, ResourceScope};
//!
//! struct Pool;
//!
//! impl Resource for Pool {
//!     fn release(&self) -> Result<(), Error> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mut scope = ResourceScope::new();
//! let pool = scope
//!     .acquire("pool", || async { Ok::<_, Error>(Pool) })
//!     .await
//!     .unwrap();
//! assert_eq!(scope.len(), 1);
//! # drop(pool);
//! scope.release_all();
//! assert!(scope.is_empty());
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use waypoint_core::{BoxError, Error, ErrorKind};

/// A resource that must be released when no longer needed.
pub trait Resource: Send + Sync + 'static {
    /// Returns a name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Releases the resource.
    ///
    /// Called at most once by the owning scope or guard. Failures are
    /// logged by the caller and never propagated.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource could not be released cleanly.
    fn release(&self) -> Result<(), Error>;
}

struct Entry {
    name: String,
    resource: Arc<dyn Resource>,
}

/// Owns acquired resources and releases them in reverse order.
#[derive(Default)]
pub struct ResourceScope {
    entries: Vec<Entry>,
}

impl fmt::Debug for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceScope")
            .field("resources", &self.names())
            .finish()
    }
}

impl ResourceScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a resource with an async constructor.
    ///
    /// # Errors
    ///
    /// Returns a [`Setup`](ErrorKind::Setup) error wrapping the
    /// constructor's failure. Every resource already in the scope has been
    /// released, in reverse order, by the time the error is returned.
    pub async fn acquire<R, F, Fut, E>(&mut self, name: &str, acquire: F) -> Result<Arc<R>, Error>
    where
        R: Resource,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Into<BoxError>,
    {
        tracing::debug!(resource = name, "acquiring resource");
        let outcome = acquire().await;
        self.settle(name, outcome)
    }

    /// Acquires a resource with a synchronous constructor.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceScope::acquire`].
    pub fn acquire_blocking<R, F, E>(&mut self, name: &str, acquire: F) -> Result<Arc<R>, Error>
    where
        R: Resource,
        F: FnOnce() -> Result<R, E>,
        E: Into<BoxError>,
    {
        tracing::debug!(resource = name, "acquiring resource");
        let outcome = acquire();
        self.settle(name, outcome)
    }

    /// Takes ownership of a resource that was constructed elsewhere.
    pub fn adopt<R: Resource>(&mut self, name: &str, resource: Arc<R>) {
        self.entries.push(Entry {
            name: name.to_string(),
            resource,
        });
    }

    fn settle<R, E>(&mut self, name: &str, outcome: Result<R, E>) -> Result<Arc<R>, Error>
    where
        R: Resource,
        E: Into<BoxError>,
    {
        match outcome {
            Ok(resource) => {
                let resource = Arc::new(resource);
                self.adopt(name, Arc::clone(&resource));
                tracing::info!(resource = name, "resource acquired");
                Ok(resource)
            }
            Err(cause) => {
                let error = Error::wrap(cause, format!("failed to acquire {name}"), ErrorKind::Setup);
                tracing::error!(
                    resource = name,
                    error = %error.render(),
                    acquired = self.entries.len(),
                    "resource acquisition failed, releasing acquired resources"
                );
                self.release_all();
                Err(error)
            }
        }
    }

    /// Releases every held resource in reverse acquisition order.
    ///
    /// Repeated calls are no-ops. Release failures are logged and skipped.
    pub fn release_all(&mut self) {
        // Run in reverse order (LIFO)
        while let Some(entry) = self.entries.pop() {
            release_logged(&entry.name, entry.resource.as_ref());
        }
    }

    /// Returns the names of held resources in acquisition order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Returns the number of held resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        self.release_all();
    }
}

fn release_logged(name: &str, resource: &dyn Resource) {
    match resource.release() {
        Ok(()) => tracing::debug!(resource = name, "resource released"),
        Err(e) => tracing::warn!(
            resource = name,
            error = %e.render(),
            "resource release failed"
        ),
    }
}

/// A single request-scoped resource, released when the guard drops.
///
/// Dropping happens on every exit path, including a request abandoned at
/// its deadline, because the abandoned future is dropped.
pub struct ResourceGuard<R: Resource> {
    resource: R,
    released: bool,
}

impl<R: Resource> ResourceGuard<R> {
    /// Guards `resource`.
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            released: false,
        }
    }

    /// Releases now instead of at drop, returning the release result.
    ///
    /// # Errors
    ///
    /// Returns the resource's release error.
    pub fn release(mut self) -> Result<(), Error> {
        self.released = true;
        self.resource.release()
    }
}

impl<R: Resource> Deref for ResourceGuard<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<R: Resource> Drop for ResourceGuard<R> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            let name = self.resource.name().to_string();
            release_logged(&name, &self.resource);
        }
    }
}

impl<R: Resource + fmt::Debug> fmt::Debug for ResourceGuard<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("resource", &self.resource)
            .field("released", &self.released)
            .finish()
    }
}
