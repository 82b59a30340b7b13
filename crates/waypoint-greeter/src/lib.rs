//! A small greeting service.
//!
//! `POST /greet` with form field `name` answers `Hello, <name>!` and mails
//! the same text to the address the [`Directory`] holds for that name.
//!
//! ```rust
//! use std::sync::Arc;
//! use waypoint::server::ServerConfig;
//! use waypoint_greeter::{build_server, MemoryDirectory, Outbox};
//!
//! let directory = Arc::new(MemoryDirectory::new().with_entry("Bob", "bob@example.com"));
//! let outbox = Arc::new(Outbox::new());
//! let server = build_server(directory, outbox, ServerConfig::default()).unwrap();
//! assert_eq!(server.routes().len(), 2);
//! ```

#![warn(missing_docs)]

pub mod directory;
pub mod error;
pub mod greet;
pub mod mailer;

use std::sync::Arc;

use waypoint::core::{sync_handler, Error};
use waypoint::middleware::{RequestId, RequestTracing};
use waypoint::router::Router;
use waypoint::server::{Server, ServerConfig};

pub use directory::{Directory, MemoryDirectory};
pub use error::GreeterError;
pub use greet::{Greet, GREETING_SUBJECT, MISSING_NAME_CODE};
pub use mailer::{Mail, Mailer, Outbox, MAIL_RELAY_ENV};

/// Service name used in logs.
pub const SERVICE_NAME: &str = "greeter";

/// Registers the greeter's routes.
///
/// # Errors
///
/// Returns a [`Config`](waypoint::core::ErrorKind::Config) error if a
/// route is rejected.
pub fn build_router(directory: Arc<dyn Directory>, mailer: Arc<dyn Mailer>) -> Result<Router, Error> {
    let mut router = Router::new();
    router.post("/greet", Greet::new(directory, mailer))?;
    router.get(
        "/healthz",
        sync_handler(|writer, _| {
            writer.write_str("ok")?;
            Ok(())
        }),
    )?;
    Ok(router)
}

/// Assembles the greeter server around the given resources.
///
/// # Errors
///
/// Returns a [`Config`](waypoint::core::ErrorKind::Config) error if the
/// server cannot be built.
pub fn build_server<D, M>(directory: Arc<D>, mailer: Arc<M>, config: ServerConfig) -> Result<Server, Error>
where
    D: Directory,
    M: Mailer,
{
    let directory: Arc<dyn Directory> = directory;
    let mailer: Arc<dyn Mailer> = mailer;

    Server::builder()
        .router(build_router(Arc::clone(&directory), Arc::clone(&mailer))?)
        .middleware(RequestId::new())
        .middleware(RequestTracing::new().with_service_name(SERVICE_NAME))
        .dependency(directory)
        .dependency(mailer)
        .require::<dyn Directory>()
        .require::<dyn Mailer>()
        .config(config)
        .build()
}
