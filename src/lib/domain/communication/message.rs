//! Email message
//!
//! A [`Message`] is a value: every builder method consumes the message and
//! returns an updated copy, so a message handed to a
//! [`Dispatcher`](crate::domain::communication::mailer::Dispatcher) cannot
//! change while it is being sent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::communication::email_address::EmailAddress;

mod api_message;
mod attachment;
mod recipient;

pub use api_message::{ApiMessage, RecipientMergeVars};
pub use attachment::Attachment;
pub use recipient::{Recipient, RecipientType};

/// A named merge variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeVar {
    /// The variable name, as used in the template's merge tags
    pub name: String,

    /// The value substituted for the merge tag
    pub content: Value,
}

impl MergeVar {
    /// Creates a new merge variable
    pub fn new(name: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Content injected into an editable region of a stored template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRegion {
    /// The `mc:edit` region name
    pub name: String,

    /// HTML content for the region
    pub content: String,
}

impl TemplateRegion {
    /// Creates a new template region
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Email message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    recipients: Vec<Recipient>,
    subject: String,
    text: Option<String>,
    html: Option<String>,
    from_email: Option<EmailAddress>,
    from_name: Option<String>,
    headers: BTreeMap<String, String>,
    attachments: Vec<Attachment>,
    global_merge_vars: Vec<MergeVar>,
    merge_vars: BTreeMap<EmailAddress, Vec<MergeVar>>,
    tags: Vec<String>,
    important: bool,
    track_opens: Option<bool>,
    track_clicks: Option<bool>,
    preserve_recipients: Option<bool>,
    send_at: Option<DateTime<Utc>>,
    template_name: Option<String>,
    template_content: Vec<TemplateRegion>,
}

impl Message {
    /// Creates an empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recipient
    pub fn recipient(mut self, recipient: Recipient) -> Self {
        self.recipients.push(recipient);
        self
    }

    /// Adds a primary recipient
    pub fn to(self, email: EmailAddress) -> Self {
        self.recipient(Recipient::new(email))
    }

    /// Adds a carbon copy recipient
    pub fn cc(self, email: EmailAddress) -> Self {
        self.recipient(Recipient::new(email).kind(RecipientType::Cc))
    }

    /// Adds a blind carbon copy recipient
    pub fn bcc(self, email: EmailAddress) -> Self {
        self.recipient(Recipient::new(email).kind(RecipientType::Bcc))
    }

    /// Sets the subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the plain text body
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the HTML body
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the sender
    pub fn with_from(mut self, email: EmailAddress, name: Option<String>) -> Self {
        self.from_email = Some(email);
        self.from_name = name;
        self
    }

    /// Adds a custom header, replacing any previous value
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attaches a file
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Sets a merge variable for every recipient
    pub fn with_global_merge_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        upsert(&mut self.global_merge_vars, MergeVar::new(name, value));
        self
    }

    /// Sets a merge variable for a single recipient
    pub fn with_merge_var(
        mut self,
        rcpt: &EmailAddress,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let vars = self.merge_vars.entry(rcpt.clone()).or_default();
        upsert(vars, MergeVar::new(name, value));
        self
    }

    /// Adds a reporting tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Flags the message as important
    pub fn important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    /// Overrides open and click tracking
    pub fn with_tracking(mut self, opens: bool, clicks: bool) -> Self {
        self.track_opens = Some(opens);
        self.track_clicks = Some(clicks);
        self
    }

    /// Whether every recipient should see the others in the `To` header
    pub fn preserve_recipients(mut self, preserve: bool) -> Self {
        self.preserve_recipients = Some(preserve);
        self
    }

    /// Requests delivery at a later time
    pub fn send_at(mut self, at: DateTime<Utc>) -> Self {
        self.send_at = Some(at);
        self
    }

    /// Stamps the message with a stored template; only the dispatcher composes templates
    pub(crate) fn with_template(mut self, name: String, content: Vec<TemplateRegion>) -> Self {
        self.template_name = Some(name);
        self.template_content = content;
        self
    }

    /// The message recipients, in the order they were added
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// The recipient addresses joined with commas
    pub fn recipient_list(&self) -> String {
        self.recipients
            .iter()
            .map(|r| r.email.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The subject line
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The plain text body
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The HTML body
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// The requested delivery time, if the message is scheduled
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.send_at
    }

    /// The stored template this message is rendered from
    pub fn template_name(&self) -> Option<&str> {
        self.template_name.as_deref()
    }

    /// Content for the template's editable regions
    pub fn template_content(&self) -> &[TemplateRegion] {
        &self.template_content
    }

    /// Normalizes the message into the API's `message` object
    pub fn to_api_message(&self) -> ApiMessage {
        let merge_vars = self
            .merge_vars
            .iter()
            .filter(|(_, vars)| !vars.is_empty())
            .map(|(rcpt, vars)| RecipientMergeVars {
                rcpt: rcpt.clone(),
                vars: vars.clone(),
            })
            .collect::<Vec<_>>();

        ApiMessage {
            html: self.html.clone(),
            text: self.text.clone(),
            subject: self.subject.clone(),
            from_email: self.from_email.clone(),
            from_name: self.from_name.clone(),
            to: self.recipients.clone(),
            headers: self.headers.clone(),
            important: self.important,
            track_opens: self.track_opens,
            track_clicks: self.track_clicks,
            preserve_recipients: self.preserve_recipients,
            tags: self.tags.clone(),
            merge: !self.global_merge_vars.is_empty() || !merge_vars.is_empty(),
            global_merge_vars: self.global_merge_vars.clone(),
            merge_vars,
            attachments: self.attachments.clone(),
        }
    }
}

fn upsert(vars: &mut Vec<MergeVar>, var: MergeVar) {
    match vars.iter_mut().find(|v| v.name == var.name) {
        Some(existing) => existing.content = var.content,
        None => vars.push(var),
    }
}
