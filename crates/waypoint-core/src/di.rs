//! Shared dependency container.
//!
//! The server keeps its shared dependency handles (a persistence handle, an
//! outbound-mail capability, ...) in a [`Container`] keyed by type. Handles
//! are registered once at startup and only read afterwards; the container
//! itself has no interior mutability.
//!
//! Trait objects are first-class: register an `Arc<dyn Mailer>` and resolve
//! it back as `Arc<dyn Mailer>`.
//!
//! # Example
//!
//! ```rust
//! use waypoint_core::di::Container;
//! use std::sync::Arc;
//!
//! trait Mailer: Send + Sync {
//!     fn send(&self, to: &str);
//! }
//!
//! struct NullMailer;
//!
//! impl Mailer for NullMailer {
//!     fn send(&self, _to: &str) {}
//! }
//!
//! let mut container = Container::new();
//! let mailer: Arc<dyn Mailer> = Arc::new(NullMailer);
//! container.register(mailer);
//!
//! let resolved: Arc<dyn Mailer> = container.resolve().unwrap();
//! resolved.send("bob@example.com");
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;

/// A type-keyed collection of shared handles.
///
/// Every entry is an `Arc<T>` for some `T: ?Sized + Send + Sync`.
#[derive(Default)]
pub struct Container {
    services: HashMap<TypeId, Entry>,
}

struct Entry {
    type_name: &'static str,
    handle: Box<dyn Any + Send + Sync>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Registers a handle, replacing any previous handle of the same type.
    pub fn register<T>(&mut self, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services.insert(
            TypeId::of::<T>(),
            Entry {
                type_name: std::any::type_name::<T>(),
                handle: Box::new(service),
            },
        );
    }

    /// Resolves a handle.
    ///
    /// Returns `None` if no handle of type `T` is registered.
    #[must_use]
    pub fn resolve<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.handle.downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// Resolves a handle or returns a configuration error.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Config`](crate::ErrorKind::Config) error if the
    /// handle is not registered.
    pub fn resolve_required<T>(&self) -> Result<Arc<T>, Error>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve().ok_or_else(|| {
            Error::config(format!(
                "missing dependency `{}`: not registered",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Checks if a handle of type `T` is registered.
    #[must_use]
    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.contains_id(TypeId::of::<T>())
    }

    /// Checks if a handle with the given type id is registered.
    #[must_use]
    pub fn contains_id(&self, id: TypeId) -> bool {
        self.services.contains_key(&id)
    }

    /// Returns the type names of all registered handles.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.services.values().map(|entry| entry.type_name)
    }

    /// Returns the number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no handles are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.type_names().collect::<Vec<_>>())
            .finish()
    }
}
