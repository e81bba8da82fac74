//! The delivery API boundary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::{
    delivery::DeliveryOutcome,
    message::{ApiMessage, Message, TemplateRegion},
};

/// Format used by the API for scheduled delivery times, always in UTC
pub const SEND_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An error reported by the delivery service or its transport.
///
/// This is the only error a send treats as an ordinary delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteServiceError {
    /// The error class, e.g. `Invalid_Key` or `HttpError`
    pub kind: String,

    /// Human readable detail
    pub message: String,
}

impl RemoteServiceError {
    /// Creates a new remote service error
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Errors raised across the API boundary
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service or transport reported a failure
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),

    /// Anything else
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Options shared by both send variants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryOptions {
    /// Queue the message on the service side and return immediately
    #[serde(rename = "async")]
    pub async_send: bool,

    /// The dedicated IP pool to send from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_pool: Option<String>,

    /// Deferred delivery time, in [`SEND_AT_FORMAT`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_at: Option<String>,
}

impl DeliveryOptions {
    /// Builds the options for `message` from the dispatcher settings
    pub fn for_message(message: &Message, async_send: bool, ip_pool: Option<String>) -> Self {
        Self {
            async_send,
            ip_pool,
            send_at: message.scheduled_at().as_ref().map(format_send_at),
        }
    }
}

/// Formats a delivery time the way the API expects it
pub fn format_send_at(at: &DateTime<Utc>) -> String {
    at.format(SEND_AT_FORMAT).to_string()
}

/// A raw content send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendRequest {
    /// The normalized message
    pub message: ApiMessage,

    /// Async, IP pool and scheduling options
    #[serde(flatten)]
    pub options: DeliveryOptions,
}

/// A send rendered from a stored template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendTemplateRequest {
    /// The stored template's name
    pub template_name: String,

    /// Content for the template's editable regions
    pub template_content: Vec<TemplateRegion>,

    /// The normalized message
    pub message: ApiMessage,

    /// Async, IP pool and scheduling options
    #[serde(flatten)]
    pub options: DeliveryOptions,
}

/// The delivery API
#[async_trait]
pub trait MandrillApi: Send + Sync + 'static {
    /// Sends a message with inline content
    ///
    /// # Returns
    /// One [`DeliveryOutcome`] per recipient, in the order reported by the service.
    async fn send(&self, request: &SendRequest) -> Result<Vec<DeliveryOutcome>, ApiError>;

    /// Sends a message rendered from a stored template
    ///
    /// # Returns
    /// One [`DeliveryOutcome`] per recipient, in the order reported by the service.
    async fn send_template(
        &self,
        request: &SendTemplateRequest,
    ) -> Result<Vec<DeliveryOutcome>, ApiError>;
}

#[cfg(test)]
mock! {
    pub MandrillApi {}

    #[async_trait]
    impl MandrillApi for MandrillApi {
        async fn send(&self, request: &SendRequest) -> Result<Vec<DeliveryOutcome>, ApiError>;
        async fn send_template(&self, request: &SendTemplateRequest) -> Result<Vec<DeliveryOutcome>, ApiError>;
    }
}
