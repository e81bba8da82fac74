//! Dispatcher configuration

use std::fmt;

use clap::Parser;

use super::MailerError;

/// The public API endpoint
pub const DEFAULT_BASE_URL: &str = "https://mandrillapp.com/api/1.0";

/// Dispatcher configuration
#[derive(Clone, Parser)]
pub struct DispatcherConfig {
    /// The API key
    #[clap(long, env = "MANDRILL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Ask the service to queue messages and respond immediately
    #[clap(long = "async", env = "MANDRILL_ASYNC", default_value = "false")]
    pub async_send: bool,

    /// The dedicated IP pool to send from
    #[clap(long, env = "MANDRILL_IP_POOL")]
    pub ip_pool: Option<String>,

    /// The API base URL
    #[clap(long, env = "MANDRILL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Transport timeout, in seconds
    #[clap(long, env = "MANDRILL_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Default sender address for new messages
    #[clap(long, env = "MANDRILL_FROM_EMAIL")]
    pub from_email: Option<String>,

    /// Default sender name for new messages
    #[clap(long, env = "MANDRILL_FROM_NAME")]
    pub from_name: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            async_send: false,
            ip_pool: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            from_email: None,
            from_name: None,
        }
    }
}

impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "********"))
            .field("async_send", &self.async_send)
            .field("ip_pool", &self.ip_pool)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// A validated API key
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validates a configured key, which must be present and not blank
    pub fn parse(raw: Option<&str>) -> Result<Self, MailerError> {
        let raw = raw.ok_or_else(|| MailerError::Configuration("an API key is required".into()))?;

        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(MailerError::Configuration(
                "the API key must not be blank".into(),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The key itself
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            ApiKey::parse(None),
            Err(MailerError::Configuration(_))
        ));
    }

    #[test]
    fn test_blank_api_keys() {
        for raw in ["", " ", "\t\n  "] {
            assert!(matches!(
                ApiKey::parse(Some(raw)),
                Err(MailerError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_api_key_is_trimmed() -> TestResult {
        let key = ApiKey::parse(Some("  abc123 "))?;

        assert_eq!(key.expose(), "abc123");

        Ok(())
    }

    #[test]
    fn test_api_key_is_obfuscated() -> TestResult {
        let key = ApiKey::parse(Some("abc123"))?;

        assert_eq!(format!("{key}"), "********");
        assert_eq!(format!("{key:?}"), "********");

        Ok(())
    }

    #[test]
    fn test_config_debug_hides_api_key() {
        let config = DispatcherConfig {
            api_key: Some("abc123".to_string()),
            ..Default::default()
        };

        assert!(!format!("{config:?}").contains("abc123"));
    }

    #[test]
    fn test_config_from_args() {
        let config = DispatcherConfig::parse_from([
            "mandrill",
            "--api-key",
            "abc123",
            "--async",
            "--ip-pool",
            "main",
        ]);

        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert!(config.async_send);
        assert_eq!(config.ip_pool.as_deref(), Some("main"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }
}
