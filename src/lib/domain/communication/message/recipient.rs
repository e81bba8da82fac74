//! Message recipients

use std::fmt;

use serde::Serialize;

use crate::domain::communication::email_address::EmailAddress;

/// How a recipient receives the message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    /// Primary recipient
    #[default]
    To,

    /// Carbon copy
    Cc,

    /// Blind carbon copy
    Bcc,
}

/// A single recipient of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    /// The recipient's address
    pub email: EmailAddress,

    /// Optional display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The header the recipient is listed under
    #[serde(rename = "type")]
    pub kind: RecipientType,
}

impl Recipient {
    /// A primary recipient without a display name
    pub fn new(email: EmailAddress) -> Self {
        Self {
            email,
            name: None,
            kind: RecipientType::To,
        }
    }

    /// Sets the display name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the recipient type
    pub fn kind(mut self, kind: RecipientType) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => write!(f, "{}", self.email),
        }
    }
}
