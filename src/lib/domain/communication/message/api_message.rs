//! The message shape expected by the delivery API

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Attachment, MergeVar, Recipient};
use crate::domain::communication::email_address::EmailAddress;

/// Merge variables for a single recipient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientMergeVars {
    /// The recipient the variables apply to
    pub rcpt: EmailAddress,

    /// The variables, in insertion order
    pub vars: Vec<MergeVar>,
}

/// A [`Message`](super::Message) normalized into the API's `message` object.
///
/// Scheduling, async and IP pool options are not part of this structure; they
/// travel alongside it in the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiMessage {
    /// HTML body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// Plain text body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Subject line
    pub subject: String,

    /// Sender address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_email: Option<EmailAddress>,

    /// Sender display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,

    /// Every recipient, whatever their type
    pub to: Vec<Recipient>,

    /// Extra headers such as `Reply-To`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Flag the message as important
    pub important: bool,

    /// Override open tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_opens: Option<bool>,

    /// Override click tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_clicks: Option<bool>,

    /// Expose all recipients in the `To` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_recipients: Option<bool>,

    /// Tags used for reporting
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Whether the API should process merge tags
    pub merge: bool,

    /// Merge variables applied to every recipient
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub global_merge_vars: Vec<MergeVar>,

    /// Per-recipient merge variables
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merge_vars: Vec<RecipientMergeVars>,

    /// Attached files
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}
