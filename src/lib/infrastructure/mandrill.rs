//! HTTP client for the Mandrill messages API

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::communication::{
    delivery::DeliveryOutcome,
    log::TracingDeliveryLog,
    mailer::{ApiKey, Dispatcher, DispatcherConfig, MailerError},
    remote::{ApiError, MandrillApi, RemoteServiceError, SendRequest, SendTemplateRequest},
};

const SEND_PATH: &str = "messages/send.json";
const SEND_TEMPLATE_PATH: &str = "messages/send-template.json";

/// Error kind for transport failures and unreadable error responses
pub const HTTP_ERROR: &str = "HttpError";

/// Error kind for successful responses that cannot be decoded
pub const DECODE_ERROR: &str = "DecodeError";

/// A request body with the API key added
#[derive(Serialize)]
struct Authenticated<'a, B: Serialize> {
    key: &'a str,

    #[serde(flatten)]
    body: &'a B,
}

/// The body of a failed call
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    name: String,
    message: String,
}

/// Mandrill API client
#[derive(Debug, Clone)]
pub struct MandrillClient {
    http: Client,
    base_url: String,
    key: ApiKey,
}

impl MandrillClient {
    /// Creates a new client for `config.base_url`
    pub fn new(key: &ApiKey, config: &DispatcherConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("mandrill-dispatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build the HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key: key.clone(),
        })
    }

    async fn call<B>(&self, path: &str, body: &B) -> Result<Vec<DeliveryOutcome>, ApiError>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}/{}", self.base_url, path);

        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(&Authenticated {
                key: self.key.expose(),
                body,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(error_response(status, &bytes).into());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            RemoteServiceError::new(
                DECODE_ERROR,
                format!("unable to decode the response: {e}"),
            )
            .into()
        })
    }
}

fn transport_error(err: reqwest::Error) -> RemoteServiceError {
    debug!("reqwest::Error -> RemoteServiceError");

    RemoteServiceError::new(HTTP_ERROR, err.to_string())
}

fn error_response(status: StatusCode, body: &[u8]) -> RemoteServiceError {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(err) => RemoteServiceError::new(err.name, err.message),
        Err(_) => RemoteServiceError::new(
            HTTP_ERROR,
            format!(
                "unexpected response ({status}): {}",
                String::from_utf8_lossy(body)
            ),
        ),
    }
}

#[async_trait]
impl MandrillApi for MandrillClient {
    async fn send(&self, request: &SendRequest) -> Result<Vec<DeliveryOutcome>, ApiError> {
        self.call(SEND_PATH, request).await
    }

    async fn send_template(
        &self,
        request: &SendTemplateRequest,
    ) -> Result<Vec<DeliveryOutcome>, ApiError> {
        self.call(SEND_TEMPLATE_PATH, request).await
    }
}

impl Dispatcher<MandrillClient, TracingDeliveryLog> {
    /// Creates a dispatcher talking to the API over HTTP and logging through `tracing`
    pub fn from_config(config: &DispatcherConfig) -> Result<Self, MailerError> {
        Self::initialize(config, TracingDeliveryLog, MandrillClient::new)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use testresult::TestResult;
    use tokio::net::TcpListener;

    use crate::domain::communication::{
        delivery::DeliveryStatus,
        email_address::EmailAddress,
        mailer::Mailer,
        message::{Message, TemplateRegion},
        remote::DeliveryOptions,
    };

    use super::*;

    type Captured = Arc<Mutex<Option<Value>>>;

    async fn serve(path: &'static str, status: StatusCode, response: &'static str) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let sink = captured.clone();

        let router = Router::new().route(
            path,
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    (status, response)
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        (format!("http://{address}/api/1.0/"), captured)
    }

    fn client(base_url: &str) -> MandrillClient {
        let config = DispatcherConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..Default::default()
        };

        MandrillClient::new(&ApiKey::parse(Some("abc123")).unwrap(), &config).unwrap()
    }

    fn request() -> SendRequest {
        let message = Message::new()
            .to(EmailAddress::new("a@example.com").unwrap())
            .with_subject("Hello")
            .with_text("Hi");

        SendRequest {
            message: message.to_api_message(),
            options: DeliveryOptions::for_message(&message, false, Some("main".to_string())),
        }
    }

    #[tokio::test]
    async fn test_send_posts_key_and_message() -> TestResult {
        let (base_url, captured) = serve(
            "/api/1.0/messages/send.json",
            StatusCode::OK,
            r#"[{"email":"a@example.com","status":"sent","_id":"abc","reject_reason":null}]"#,
        )
        .await;

        let outcomes = client(&base_url).send(&request()).await?;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, DeliveryStatus::Sent);

        let body = captured.lock().unwrap().take().unwrap();
        assert_eq!(body["key"], json!("abc123"));
        assert_eq!(body["async"], json!(false));
        assert_eq!(body["ip_pool"], json!("main"));
        assert_eq!(body["message"]["subject"], json!("Hello"));
        assert_eq!(body["message"]["to"][0]["email"], json!("a@example.com"));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_template_posts_template_fields() -> TestResult {
        let (base_url, captured) = serve(
            "/api/1.0/messages/send-template.json",
            StatusCode::OK,
            r#"[{"email":"a@example.com","status":"queued"}]"#,
        )
        .await;

        let request = request();
        let template = SendTemplateRequest {
            template_name: "welcome".to_string(),
            template_content: vec![TemplateRegion::new("main", "<p>Hi</p>")],
            message: request.message,
            options: request.options,
        };

        let outcomes = client(&base_url).send_template(&template).await?;

        assert_eq!(outcomes[0].status, DeliveryStatus::Queued);

        let body = captured.lock().unwrap().take().unwrap();
        assert_eq!(body["template_name"], json!("welcome"));
        assert_eq!(
            body["template_content"],
            json!([{ "name": "main", "content": "<p>Hi</p>" }])
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_error_response_becomes_remote_error() {
        let (base_url, _) = serve(
            "/api/1.0/messages/send.json",
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"status":"error","code":-1,"name":"Invalid_Key","message":"Invalid API key"}"#,
        )
        .await;

        let result = client(&base_url).send(&request()).await;

        assert!(matches!(
            result,
            Err(ApiError::Remote(RemoteServiceError { kind, message }))
                if kind == "Invalid_Key" && message == "Invalid API key"
        ));
    }

    #[tokio::test]
    async fn test_unreadable_error_response() {
        let (base_url, _) = serve(
            "/api/1.0/messages/send.json",
            StatusCode::BAD_GATEWAY,
            "upstream unavailable",
        )
        .await;

        let result = client(&base_url).send(&request()).await;

        assert!(matches!(
            result,
            Err(ApiError::Remote(RemoteServiceError { kind, message }))
                if kind == HTTP_ERROR && message.contains("502")
        ));
    }

    #[tokio::test]
    async fn test_undecodable_success_response() {
        let (base_url, _) = serve("/api/1.0/messages/send.json", StatusCode::OK, "{}").await;

        let result = client(&base_url).send(&request()).await;

        assert!(matches!(
            result,
            Err(ApiError::Remote(RemoteServiceError { kind, .. })) if kind == DECODE_ERROR
        ));
    }

    #[tokio::test]
    async fn test_connection_failure_is_remote_error() -> TestResult {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        drop(listener);

        let result = client(&format!("http://{address}")).send(&request()).await;

        assert!(matches!(
            result,
            Err(ApiError::Remote(RemoteServiceError { kind, .. })) if kind == HTTP_ERROR
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_dispatcher_from_config_end_to_end() -> TestResult {
        let (base_url, captured) = serve(
            "/api/1.0/messages/send.json",
            StatusCode::OK,
            r#"[{"email":"a@example.com","status":"sent"},{"email":"b@example.com","status":"invalid"}]"#,
        )
        .await;

        let config = DispatcherConfig {
            api_key: Some("abc123".to_string()),
            base_url,
            from_email: Some("noreply@example.com".to_string()),
            ..Default::default()
        };

        let dispatcher = Dispatcher::from_config(&config)?;

        let message = dispatcher
            .create_message()
            .to(EmailAddress::new("a@example.com")?)
            .to(EmailAddress::new("b@example.com")?)
            .with_subject("Hello")
            .with_text("Hi");

        assert!(!dispatcher.send(&message).await?);

        let body = captured.lock().unwrap().take().unwrap();
        assert_eq!(body["message"]["from_email"], json!("noreply@example.com"));

        Ok(())
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let result = Dispatcher::from_config(&DispatcherConfig::default());

        assert!(matches!(result, Err(MailerError::Configuration(_))));
    }
}
