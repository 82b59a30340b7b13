//! Outbound mail.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use waypoint::core::{Error, ErrorKind};
use waypoint::server::Resource;

use crate::error::GreeterError;

/// One sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Sends mail.
pub trait Mailer: Send + Sync + 'static {
    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns a [`Request`](ErrorKind::Request) error if the message could
    /// not be handed off.
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error>;
}

/// Environment variable naming the relay the outbox hands mail to.
pub const MAIL_RELAY_ENV: &str = "GREETER_MAIL_RELAY";

/// A [`Mailer`] that keeps every message in memory.
#[derive(Debug, Default)]
pub struct Outbox {
    relay: Option<String>,
    sent: Mutex<Vec<Mail>>,
    closed: AtomicBool,
}

impl Outbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an outbox bound to `relay`, given as `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`GreeterError::InvalidRelay`] if the relay has no host or
    /// its port is not a number.
    pub fn connect(relay: &str) -> Result<Self, GreeterError> {
        let valid = relay
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid {
            return Err(GreeterError::InvalidRelay(relay.to_string()));
        }
        Ok(Self {
            relay: Some(relay.to_string()),
            ..Self::default()
        })
    }

    /// Opens an outbox from [`MAIL_RELAY_ENV`], or an unbound one if unset.
    ///
    /// # Errors
    ///
    /// Same as [`Outbox::connect`].
    pub fn from_env() -> Result<Self, GreeterError> {
        match std::env::var(MAIL_RELAY_ENV) {
            Ok(relay) => Self::connect(&relay),
            Err(_) => Ok(Self::new()),
        }
    }

    /// Returns the relay this outbox is bound to.
    #[must_use]
    pub fn relay(&self) -> Option<&str> {
        self.relay.as_deref()
    }

    /// Returns a copy of every message sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().clone()
    }
}

impl Mailer for Outbox {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::wrap(GreeterError::OutboxClosed, "failed to send mail", ErrorKind::Request));
        }
        if !to.contains('@') {
            return Err(Error::wrap(
                GreeterError::InvalidAddress(to.to_string()),
                "failed to send mail",
                ErrorKind::Request,
            ));
        }

        self.sent.lock().push(Mail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        tracing::info!(to, subject, relay = self.relay.as_deref(), "mail sent");
        Ok(())
    }
}

impl Resource for Outbox {
    fn name(&self) -> &str {
        "outbox"
    }

    fn release(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::Release);
        tracing::info!(delivered = self.sent.lock().len(), "outbox closed");
        Ok(())
    }
}
