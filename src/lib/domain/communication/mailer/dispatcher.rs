//! Dispatcher

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::domain::communication::{
    delivery::classify_outcomes,
    log::{DeliveryLog, LOG_CATEGORY},
    message::{Message, TemplateRegion},
    remote::{ApiError, DeliveryOptions, MandrillApi, SendRequest, SendTemplateRequest},
};

use super::{
    ApiKey, DefaultMessageFactory, DispatcherConfig, Mailer, MailerError, MessageDefaults,
    MessageFactory,
};

/// Sends messages through the delivery API and reduces the per-recipient
/// outcomes to a single verdict.
pub struct Dispatcher<A, L, F = DefaultMessageFactory>
where
    A: MandrillApi,
    L: DeliveryLog,
    F: MessageFactory,
{
    api: Arc<A>,
    log: Arc<L>,
    factory: F,
    async_send: bool,
    ip_pool: Option<String>,
}

impl<A, L> Dispatcher<A, L>
where
    A: MandrillApi,
    L: DeliveryLog,
{
    /// Validates `config` and creates the API client.
    ///
    /// `connect` is called once, and only after the API key has been
    /// validated. If it fails, the cause is logged and
    /// [`MailerError::ServiceInitialization`] is returned in its place.
    ///
    /// # Errors
    /// - [`MailerError::Configuration`] if the API key is missing or blank, or
    ///   the default sender is not a valid address.
    /// - [`MailerError::ServiceInitialization`] if `connect` fails.
    pub fn initialize<C>(config: &DispatcherConfig, log: L, connect: C) -> Result<Self, MailerError>
    where
        C: FnOnce(&ApiKey, &DispatcherConfig) -> anyhow::Result<A>,
    {
        let key = ApiKey::parse(config.api_key.as_deref())?;
        let defaults = MessageDefaults::from_config(config)?;

        let api = match connect(&key, config) {
            Ok(api) => api,
            Err(e) => {
                log.error(
                    LOG_CATEGORY,
                    &format!("could not initialise the email service: {e:#}"),
                );

                return Err(MailerError::ServiceInitialization);
            }
        };

        Ok(Self {
            api: Arc::new(api),
            log: Arc::new(log),
            factory: DefaultMessageFactory::new(defaults),
            async_send: config.async_send,
            ip_pool: config.ip_pool.clone(),
        })
    }
}

impl<A, L, F> Dispatcher<A, L, F>
where
    A: MandrillApi,
    L: DeliveryLog,
    F: MessageFactory,
{
    /// Replaces the factory used by [`Dispatcher::create_message`]
    pub fn with_factory<G: MessageFactory>(self, factory: G) -> Dispatcher<A, L, G> {
        Dispatcher {
            api: self.api,
            log: self.log,
            factory,
            async_send: self.async_send,
            ip_pool: self.ip_pool,
        }
    }

    /// Creates a new message from the configured factory
    pub fn create_message(&self) -> Message {
        self.factory.create()
    }

    /// Creates a new message rendered from a stored template.
    ///
    /// The caller fills in recipients and merge variables before sending.
    ///
    /// # Errors
    /// [`MailerError::InvalidArgument`] if `template_name` is blank.
    pub fn compose_template(
        &self,
        template_name: &str,
        template_content: Vec<TemplateRegion>,
    ) -> Result<Message, MailerError> {
        let template_name = template_name.trim();

        if template_name.is_empty() {
            return Err(MailerError::InvalidArgument(
                "a template name is required".into(),
            ));
        }

        Ok(self
            .create_message()
            .with_template(template_name.to_string(), template_content))
    }

    fn options(&self, message: &Message) -> DeliveryOptions {
        DeliveryOptions::for_message(message, self.async_send, self.ip_pool.clone())
    }
}

#[async_trait]
impl<A, L, F> Mailer for Dispatcher<A, L, F>
where
    A: MandrillApi,
    L: DeliveryLog,
    F: MessageFactory,
{
    async fn send(&self, message: &Message) -> Result<bool, MailerError> {
        self.log.info(
            LOG_CATEGORY,
            &format!(
                "sending email \"{}\" to {}",
                message.subject(),
                message.recipient_list()
            ),
        );

        let result = match message.template_name() {
            Some(template_name) => {
                let request = SendTemplateRequest {
                    template_name: template_name.to_string(),
                    template_content: message.template_content().to_vec(),
                    message: message.to_api_message(),
                    options: self.options(message),
                };

                self.api.send_template(&request).await
            }
            None => {
                let request = SendRequest {
                    message: message.to_api_message(),
                    options: self.options(message),
                };

                self.api.send(&request).await
            }
        };

        match result {
            Ok(outcomes) => Ok(classify_outcomes(&outcomes, self.log.as_ref())),
            Err(ApiError::Remote(e)) => {
                self.log.error(
                    LOG_CATEGORY,
                    &format!("a mandrill error occurred: {} - {}", e.kind, e.message),
                );

                Ok(false)
            }
            Err(ApiError::UnknownError(e)) => Err(MailerError::UnknownError(e)),
        }
    }
}

impl<A, L, F> fmt::Debug for Dispatcher<A, L, F>
where
    A: MandrillApi,
    L: DeliveryLog,
    F: MessageFactory,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("async_send", &self.async_send)
            .field("ip_pool", &self.ip_pool)
            .finish_non_exhaustive()
    }
}
