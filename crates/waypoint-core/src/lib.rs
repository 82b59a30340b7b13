//! # Waypoint Core
//!
//! Core types and traits for the Waypoint request-serving core.
//!
//! This crate provides the foundational types used throughout Waypoint:
//!
//! - [`Handler`] - The single-operation request handler capability
//! - [`Request`] - Read-only view of a decoded request
//! - [`ResponseWriter`] - Append-only response sink, with [`BufferedWriter`]
//! - [`Error`] - Context-preserving error chain with an [`ErrorKind`]
//! - [`ErrorEnvelope`] - JSON body for framework-generated error responses
//! - [`di::Container`] - Type-keyed shared dependency handles

#![doc(html_root_url = "https://docs.rs/waypoint-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod di;
mod envelope;
mod error;
mod handler;
mod request;
mod writer;

pub use envelope::{ErrorDetail, ErrorEnvelope};
pub use error::{BoxError, Chain, Error, ErrorKind, Result, ResultExt};
pub use handler::{
    boxed, handler_fn, sync_handler, BoxFuture, BoxHandler, Handler, HandlerFn, HandlerFuture,
    SyncHandler,
};
pub use request::{Params, Request, RequestBuilder, FORM_URLENCODED};
pub use writer::{BufferedWriter, ResponseWriter};
