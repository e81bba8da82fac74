//! Per-recipient delivery outcomes and the aggregate verdict

use serde::Deserialize;

use crate::domain::communication::log::{DeliveryLog, LOG_CATEGORY};

/// The delivery status reported for one recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Delivered to the recipient's mail server
    Sent,

    /// Accepted and waiting to be sent
    Queued,

    /// Accepted for delivery at the requested `send_at` time
    Scheduled,

    /// Refused, see [`DeliveryOutcome::reject_reason`]
    Rejected,

    /// The recipient address is not deliverable
    Invalid,

    /// A status this client does not know about
    #[serde(other)]
    Unrecognized,
}

/// The outcome of a send for one recipient
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeliveryOutcome {
    /// The recipient's address
    pub email: String,

    /// The delivery status
    pub status: DeliveryStatus,

    /// Why the message was rejected, when it was
    #[serde(default)]
    pub reject_reason: Option<String>,

    /// The message id assigned by the API
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
}

impl DeliveryOutcome {
    /// Creates an outcome without a reject reason or id
    pub fn new(email: impl Into<String>, status: DeliveryStatus) -> Self {
        Self {
            email: email.into(),
            status,
            reject_reason: None,
            id: None,
        }
    }

    /// Creates a rejected outcome
    pub fn rejected(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            reject_reason: Some(reason.into()),
            ..Self::new(email, DeliveryStatus::Rejected)
        }
    }

    /// Whether this outcome fails the aggregate verdict
    pub fn is_failure(&self) -> bool {
        matches!(
            self.status,
            DeliveryStatus::Rejected | DeliveryStatus::Invalid
        )
    }
}

/// Reduces a batch of outcomes to a single verdict.
///
/// Every recognized outcome is logged, in order, whatever the verdict. The
/// verdict is `false` as soon as any recipient is rejected or invalid, and
/// `true` otherwise, including for an empty batch.
pub fn classify_outcomes(outcomes: &[DeliveryOutcome], log: &impl DeliveryLog) -> bool {
    let mut verdict = true;

    for outcome in outcomes {
        let email = &outcome.email;

        match outcome.status {
            DeliveryStatus::Sent => {
                log.info(LOG_CATEGORY, &format!("email for {email} has been sent"));
            }
            DeliveryStatus::Queued => {
                log.info(LOG_CATEGORY, &format!("email for {email} is now queued"));
            }
            DeliveryStatus::Scheduled => {
                log.info(
                    LOG_CATEGORY,
                    &format!("submission for {email} has been scheduled"),
                );
            }
            DeliveryStatus::Invalid => {
                log.warning(
                    LOG_CATEGORY,
                    &format!("email for {email} not sent: status invalid"),
                );
            }
            DeliveryStatus::Rejected => {
                let reason = outcome.reject_reason.as_deref().unwrap_or("unknown");
                log.warning(
                    LOG_CATEGORY,
                    &format!("email for {email} rejected: reason {reason}"),
                );
            }
            DeliveryStatus::Unrecognized => {}
        }

        if outcome.is_failure() {
            verdict = false;
        }
    }

    verdict
}
