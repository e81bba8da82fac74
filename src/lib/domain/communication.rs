//! Transactional email: messages, delivery and the send pipeline.

pub mod delivery;
pub mod email_address;
pub mod log;
pub mod mailer;
pub mod message;
pub mod remote;
