#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Command-line sender for transactional email

use std::{path::PathBuf, process::ExitCode};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use mandrill_dispatch::{
    domain::communication::{
        email_address::EmailAddress,
        log::TracingDeliveryLog,
        mailer::{Dispatcher, DispatcherConfig, Mailer},
        message::{Attachment, Message, TemplateRegion},
    },
    infrastructure::mandrill::MandrillClient,
};
use serde_json::Value;
use tracing::debug;

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
#[command(name = "mandrill-send", about = "Send a transactional email")]
pub struct Args {
    /// Recipient address, may be repeated
    #[clap(long, required = true)]
    pub to: Vec<String>,

    /// Carbon copy address, may be repeated
    #[clap(long)]
    pub cc: Vec<String>,

    /// Blind carbon copy address, may be repeated
    #[clap(long)]
    pub bcc: Vec<String>,

    /// The subject line
    #[clap(long, default_value = "")]
    pub subject: String,

    /// Plain text body
    #[clap(long)]
    pub text: Option<String>,

    /// HTML body
    #[clap(long)]
    pub html: Option<String>,

    /// Send using a stored template
    #[clap(long)]
    pub template: Option<String>,

    /// Template region content as `name=content`, may be repeated
    #[clap(long = "region", value_parser = parse_pair)]
    pub regions: Vec<(String, String)>,

    /// Merge variable for every recipient as `name=value`, may be repeated
    #[clap(long = "global-var", value_parser = parse_pair)]
    pub global_vars: Vec<(String, String)>,

    /// Merge variable for one recipient as `rcpt:name=value`, may be repeated
    #[clap(long = "merge-var", value_parser = parse_merge_var)]
    pub merge_vars: Vec<(String, String, String)>,

    /// Reporting tag, may be repeated
    #[clap(long = "tag")]
    pub tags: Vec<String>,

    /// Deliver later, as an RFC 3339 timestamp
    #[clap(long)]
    pub send_at: Option<DateTime<Utc>>,

    /// File to attach, may be repeated
    #[clap(long = "attach")]
    pub attachments: Vec<PathBuf>,

    /// The Mandrill configuration
    #[clap(flatten)]
    pub mandrill: DispatcherConfig,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let dispatcher = Dispatcher::from_config(&args.mandrill)?;
    let message = build_message(&dispatcher, &args)?;

    if dispatcher.send(&message).await? {
        println!("delivered to {}", message.recipient_list());

        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("delivery failed, see the log for details");

        Ok(ExitCode::FAILURE)
    }
}

fn build_message(
    dispatcher: &Dispatcher<MandrillClient, TracingDeliveryLog>,
    args: &Args,
) -> Result<Message> {
    let mut message = match &args.template {
        Some(name) => {
            let regions = args
                .regions
                .iter()
                .map(|(name, content)| TemplateRegion::new(name, content))
                .collect();

            dispatcher.compose_template(name, regions)?
        }
        None => dispatcher.create_message(),
    };

    for to in &args.to {
        message = message.to(EmailAddress::new(to)?);
    }
    for cc in &args.cc {
        message = message.cc(EmailAddress::new(cc)?);
    }
    for bcc in &args.bcc {
        message = message.bcc(EmailAddress::new(bcc)?);
    }

    message = message.with_subject(&args.subject);

    if let Some(text) = &args.text {
        message = message.with_text(text);
    }
    if let Some(html) = &args.html {
        message = message.with_html(html);
    }

    for (name, value) in &args.global_vars {
        message = message.with_global_merge_var(name, merge_value(value));
    }
    for (rcpt, name, value) in &args.merge_vars {
        message = message.with_merge_var(&EmailAddress::new(rcpt)?, name, merge_value(value));
    }

    for tag in &args.tags {
        message = message.with_tag(tag);
    }

    if let Some(at) = args.send_at {
        message = message.send_at(at);
    }

    for path in &args.attachments {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read attachment {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;

        debug!("attaching {} ({} bytes)", filename, bytes.len());

        message = message.with_attachment(Attachment::from_bytes(
            filename,
            "application/octet-stream",
            bytes,
        ));
    }

    Ok(message)
}

/// JSON values are passed through, anything else is sent as a string
fn merge_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

fn parse_merge_var(raw: &str) -> Result<(String, String, String), String> {
    let (rcpt, pair) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected rcpt:name=value, got `{raw}`"))?;
    let (name, value) = parse_pair(pair)?;

    Ok((rcpt.to_string(), name, value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("main=<p>a=b</p>"),
            Ok(("main".to_string(), "<p>a=b</p>".to_string()))
        );
        assert!(parse_pair("main").is_err());
    }

    #[test]
    fn test_parse_merge_var() {
        assert_eq!(
            parse_merge_var("a@example.com:NAME=Ada"),
            Ok((
                "a@example.com".to_string(),
                "NAME".to_string(),
                "Ada".to_string()
            ))
        );
        assert!(parse_merge_var("NAME=Ada").is_err());
    }

    #[test]
    fn test_merge_value() {
        assert_eq!(merge_value("42"), json!(42));
        assert_eq!(merge_value("Ada"), json!("Ada"));
    }

    #[test]
    fn test_args_accept_template_send() {
        let args = Args::parse_from([
            "mandrill-send",
            "--to",
            "a@example.com",
            "--template",
            "welcome",
            "--region",
            "main=Hi",
            "--api-key",
            "abc123",
        ]);

        assert_eq!(args.template.as_deref(), Some("welcome"));
        assert_eq!(args.regions, vec![("main".to_string(), "Hi".to_string())]);
        assert_eq!(args.mandrill.api_key.as_deref(), Some("abc123"));
    }
}
