//! The greeting handler.

use std::sync::Arc;

use http::StatusCode;
use waypoint::core::{
    ErrorEnvelope, ErrorKind, Handler, HandlerFuture, Request, ResponseWriter, ResultExt,
};

use crate::directory::Directory;
use crate::mailer::Mailer;

/// Subject line of greeting mail.
pub const GREETING_SUBJECT: &str = "Greetings!";

/// Error code for a request without a `name` field.
pub const MISSING_NAME_CODE: &str = "MISSING_NAME";

/// Greets the person named by the `name` form field and mails them a copy
/// when the directory knows their address.
pub struct Greet {
    directory: Arc<dyn Directory>,
    mailer: Arc<dyn Mailer>,
}

impl Greet {
    /// Creates the handler from its two collaborators.
    #[must_use]
    pub fn new(directory: Arc<dyn Directory>, mailer: Arc<dyn Mailer>) -> Self {
        Self { directory, mailer }
    }
}

impl Handler for Greet {
    fn handle<'a>(&'a self, writer: &'a mut dyn ResponseWriter, request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move {
            let Some(name) = request.form_value("name").filter(|name| !name.is_empty()) else {
                return ErrorEnvelope::new(MISSING_NAME_CODE, "form field `name` is required")
                    .write_to(writer, StatusCode::BAD_REQUEST);
            };

            let greeting = format!("Hello, {name}!");
            let address = self.directory.email_for(name)?;
            writer.write_str(&greeting)?;

            match address {
                Some(address) => self
                    .mailer
                    .send(&address, GREETING_SUBJECT, &greeting)
                    .wrap_err_with(ErrorKind::Request, || format!("failed to notify {name}"))?,
                None => tracing::debug!(name, "no address on file, skipping mail"),
            }
            Ok(())
        })
    }
}
