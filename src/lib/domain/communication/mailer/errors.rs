//! Mailer errors

use thiserror::Error;
use tracing::debug;

use crate::domain::communication::email_address::EmailAddressError;

/// Mailer errors
#[derive(Debug, Error)]
pub enum MailerError {
    /// The dispatcher configuration is missing or invalid
    #[error("invalid mailer configuration: {0}")]
    Configuration(String),

    /// An argument passed to the mailer is invalid
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The delivery service client could not be created.
    ///
    /// The cause is logged, never carried, so credentials cannot leak through it.
    #[error("the email service could not be initialised")]
    ServiceInitialization,

    /// Unknown error
    #[error(transparent)]
    UnknownError(anyhow::Error),
}

impl MailerError {
    /// The HTTP-style status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            MailerError::InvalidArgument(_) => 400,
            MailerError::Configuration(_)
            | MailerError::ServiceInitialization
            | MailerError::UnknownError(_) => 500,
        }
    }
}

impl From<anyhow::Error> for MailerError {
    fn from(err: anyhow::Error) -> Self {
        MailerError::UnknownError(err)
    }
}

impl From<EmailAddressError> for MailerError {
    fn from(err: EmailAddressError) -> Self {
        debug!("EmailAddressError -> MailerError");

        MailerError::Configuration(err.to_string())
    }
}
