//! # Waypoint Server
//!
//! The request-serving aggregate for Waypoint.
//!
//! This crate ties the other pieces together:
//!
//! - [`Server`] - router + middleware + shared dependencies + config, and
//!   the recovery boundary that turns every failure into a response
//! - [`ServerConfig`] - request deadline, body limit, error detail exposure
//! - [`ResourceScope`] - ordered acquisition and reverse-order release of
//!   long-lived resources
//!
//! The transport is out of scope: [`Server::serve`] takes an
//! `http::Request<Bytes>` and returns an `http::Response`, so any HTTP
//! front end can drive it.
//!
//! ## Example
//!
//! ```rust
//! use waypoint_core::sync_handler;
//! use waypoint_middleware::RequestId;
//! use waypoint_router::Router;
//! use waypoint_server::{Server, ServerConfig};
//!
//! let mut router = Router::new();
//! router
//!     .get("/ping", sync_handler(|writer, _| {
//!         writer.write_str("pong")?;
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! let server = Server::builder()
//!     .router(router)
//!     .middleware(RequestId::new())
//!     .config(ServerConfig::default())
//!     .build()
//!     .unwrap();
//!
//! # tokio_test::block_on(async {
//! let response = server
//!     .serve(http::Request::get("/ping").body(bytes::Bytes::new()).unwrap())
//!     .await;
//! assert!(response.headers().contains_key("x-request-id"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/waypoint-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod lifecycle;
pub mod server;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use lifecycle::{Resource, ResourceGuard, ResourceScope};
pub use server::{Server, ServerBuilder, HANDLER_TIMEOUT_CODE, INTERNAL_ERROR_CODE};
