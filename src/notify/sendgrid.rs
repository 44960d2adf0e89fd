//! Email delivery through the SendGrid v3 mail send API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::notify::{Notifier, format_report};
use crate::pipeline::NoveltyResult;

pub const API_KEY_VAR: &str = "SENDGRID_API_KEY";
pub const EMAIL_FROM_VAR: &str = "SENDGRID_EMAIL_FROM";
pub const EMAIL_TO_VAR: &str = "SENDGRID_EMAIL_TO";
pub const EMAIL_SUBJECT_VAR: &str = "SENDGRID_EMAIL_SUBJECT";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Credentials and addressing for SendGrid.
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    pub endpoint: String,
    pub api_key: String,
    pub from: String,
    pub to: String,
    pub subject: String,
}

impl SendGridConfig {
    /// Read settings through `lookup`. Every variable must be present and
    /// non-empty; the error names all that are missing.
    pub fn from_lookup<F>(endpoint: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut get = |key: &'static str| match lookup(key) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(key);
                String::new()
            }
        };

        let api_key = get(API_KEY_VAR);
        let from = get(EMAIL_FROM_VAR);
        let to = get(EMAIL_TO_VAR);
        let subject = get(EMAIL_SUBJECT_VAR);

        if !missing.is_empty() {
            return Err(AppError::config(format!(
                "Necessary environment variables are not set: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key,
            from,
            to,
            subject,
        })
    }
}

#[derive(Debug, Serialize)]
struct MailSendBody<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

/// Sends the report as one plain-text email.
pub struct SendGridNotifier {
    config: SendGridConfig,
    client: Client,
}

impl SendGridNotifier {
    pub fn new(config: SendGridConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { config, client })
    }

    /// Send `text` to the configured recipient.
    pub async fn send(&self, text: &str) -> Result<()> {
        let body = MailSendBody {
            personalizations: [Personalization {
                to: [Address {
                    email: &self.config.to,
                }],
            }],
            from: Address {
                email: &self.config.from,
            },
            subject: &self.config.subject,
            content: [Content {
                kind: "text/plain",
                value: text,
            }],
        };

        let res = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::notify(
                self.channel(),
                format!("status {status}: {text}"),
            ));
        }

        log::info!("Email sent successfully to {}", self.config.to);
        Ok(())
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    fn channel(&self) -> &'static str {
        "sendgrid"
    }

    async fn deliver(&self, result: &NoveltyResult) -> Result<()> {
        self.send(&format_report(result)).await
    }
}
