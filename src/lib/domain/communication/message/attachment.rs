//! Message attachments

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

/// A file attached to a message, with base64 encoded content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// MIME type, e.g. `application/pdf`
    #[serde(rename = "type")]
    pub mime_type: String,

    /// The file name shown to the recipient
    #[serde(rename = "name")]
    pub filename: String,

    /// Base64 encoded file content
    pub content: String,
}

impl Attachment {
    /// Creates an attachment from content that is already base64 encoded
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            mime_type: mime_type.into(),
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Creates an attachment from raw bytes
    pub fn from_bytes(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl AsRef<[u8]>,
    ) -> Self {
        Self::new(filename, mime_type, STANDARD.encode(bytes))
    }
}
