//! Message factories

use crate::domain::communication::{email_address::EmailAddress, message::Message};

use super::{DispatcherConfig, MailerError};

/// Creates the blank messages handed out by a dispatcher
pub trait MessageFactory: Send + Sync + 'static {
    /// Creates a new message
    fn create(&self) -> Message;
}

impl<F> MessageFactory for F
where
    F: Fn() -> Message + Send + Sync + 'static,
{
    fn create(&self) -> Message {
        self()
    }
}

/// Fields every new message starts with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageDefaults {
    /// Default sender address
    pub from_email: Option<EmailAddress>,

    /// Default sender name, only used with `from_email`
    pub from_name: Option<String>,

    /// Tags added to every message
    pub tags: Vec<String>,
}

impl MessageDefaults {
    /// Reads the defaults from the dispatcher configuration
    pub fn from_config(config: &DispatcherConfig) -> Result<Self, MailerError> {
        let from_email = config
            .from_email
            .as_deref()
            .map(EmailAddress::new)
            .transpose()?;

        Ok(Self {
            from_email,
            from_name: config.from_name.clone(),
            tags: Vec::new(),
        })
    }
}

/// Factory applying [`MessageDefaults`]
#[derive(Debug, Clone, Default)]
pub struct DefaultMessageFactory {
    defaults: MessageDefaults,
}

impl DefaultMessageFactory {
    /// Creates a new factory
    pub fn new(defaults: MessageDefaults) -> Self {
        Self { defaults }
    }
}

impl MessageFactory for DefaultMessageFactory {
    fn create(&self) -> Message {
        let mut message = Message::new();

        if let Some(email) = &self.defaults.from_email {
            message = message.with_from(email.clone(), self.defaults.from_name.clone());
        }

        self.defaults
            .tags
            .iter()
            .fold(message, |message, tag| message.with_tag(tag.clone()))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_defaults_from_config() -> TestResult {
        let config = DispatcherConfig {
            from_email: Some("noreply@example.com".to_string()),
            from_name: Some("Example".to_string()),
            ..Default::default()
        };

        let defaults = MessageDefaults::from_config(&config)?;

        assert_eq!(defaults.from_email, Some(EmailAddress::new("noreply@example.com")?));
        assert_eq!(defaults.from_name.as_deref(), Some("Example"));

        Ok(())
    }

    #[test]
    fn test_invalid_default_sender_is_configuration_error() {
        let config = DispatcherConfig {
            from_email: Some("not-an-address".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            MessageDefaults::from_config(&config),
            Err(MailerError::Configuration(_))
        ));
    }

    #[test]
    fn test_default_factory_applies_sender_and_tags() -> TestResult {
        let factory = DefaultMessageFactory::new(MessageDefaults {
            from_email: Some(EmailAddress::new("noreply@example.com")?),
            from_name: None,
            tags: vec!["transactional".to_string()],
        });

        let api = factory.create().to_api_message();

        assert_eq!(api.from_email, Some(EmailAddress::new("noreply@example.com")?));
        assert_eq!(api.tags, vec!["transactional".to_string()]);

        Ok(())
    }

    #[test]
    fn test_closure_factory() {
        let factory = || Message::new().with_subject("Default subject");

        assert_eq!(factory.create().subject(), "Default subject");
    }
}
