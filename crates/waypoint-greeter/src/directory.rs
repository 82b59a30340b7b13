//! Name to email lookup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use waypoint::core::{Error, ErrorKind};
use waypoint::server::Resource;

use crate::error::GreeterError;

/// Looks up a person's mail address by name.
pub trait Directory: Send + Sync + 'static {
    /// Returns the address registered for `name`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`Request`](ErrorKind::Request) error if the lookup
    /// itself fails.
    fn email_for(&self, name: &str) -> Result<Option<String>, Error>;
}

/// An in-memory [`Directory`].
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: RwLock<HashMap<String, String>>,
    closed: AtomicBool,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, builder style.
    #[must_use]
    pub fn with_entry(self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.insert(name, email);
        self
    }

    /// Adds or replaces an entry.
    pub fn insert(&self, name: impl Into<String>, email: impl Into<String>) {
        self.entries.write().insert(name.into(), email.into());
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the directory has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Directory for MemoryDirectory {
    fn email_for(&self, name: &str) -> Result<Option<String>, Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::wrap(
                GreeterError::DirectoryClosed,
                format!("lookup of {name} failed"),
                ErrorKind::Request,
            ));
        }
        Ok(self.entries.read().get(name).cloned())
    }
}

impl Resource for MemoryDirectory {
    fn name(&self) -> &str {
        "directory"
    }

    fn release(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::Release);
        tracing::debug!(entries = self.len(), "directory closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let directory = MemoryDirectory::new().with_entry("Bob", "bob@example.com");
        assert_eq!(directory.email_for("Bob").unwrap().as_deref(), Some("bob@example.com"));
        assert_eq!(directory.email_for("Eve").unwrap(), None);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_lookup_after_release_fails() {
        let directory = MemoryDirectory::new().with_entry("Bob", "bob@example.com");
        directory.release().unwrap();

        let err = directory.email_for("Bob").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
        assert_eq!(err.render(), "lookup of Bob failed: directory is closed");
    }
}
