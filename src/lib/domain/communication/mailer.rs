//! Mailer module

use async_trait::async_trait;

use crate::domain::communication::message::Message;

mod config;
mod dispatcher;
mod errors;
mod factory;

pub use config::{ApiKey, DispatcherConfig, DEFAULT_BASE_URL};
pub use dispatcher::Dispatcher;
pub use errors::MailerError;
pub use factory::{DefaultMessageFactory, MessageDefaults, MessageFactory};

/// Something that can send a [`Message`]
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Sends a message
    ///
    /// # Arguments
    /// * `message` - The [`Message`] to send.
    ///
    /// # Returns
    /// - [`Ok`] with `true` if every recipient was accepted, `false` if any
    ///   recipient was rejected or invalid, or the delivery service failed.
    /// - [`Err`] containing a [`MailerError`] for failures that are not
    ///   delivery failures.
    async fn send(&self, message: &Message) -> Result<bool, MailerError>;
}
