use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// An HTML email on its way to the configured recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub subject: String,
    pub html_body: String,
}

/// Sends emails through a transactional provider, returning the provider's status code
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<u16>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendGridConfig {
    #[serde(default = "default_sendgrid_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

impl Default for SendGridConfig {
    fn default() -> Self {
        Self {
            host: default_sendgrid_host(),
            api_key: None,
            from: String::new(),
            to: String::new(),
        }
    }
}

fn default_sendgrid_host() -> String {
    "https://api.sendgrid.com".to_string()
}

pub struct SendGridMailer {
    client: Client,
    config: SendGridConfig,
}

impl SendGridMailer {
    pub fn new(config: SendGridConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, email: &Email) -> Result<u16> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("SENDGRID_API_KEY is not set"))?;
        if self.config.from.is_empty() || self.config.to.is_empty() {
            return Err(anyhow!("Email sender and recipient must both be configured"));
        }

        let payload = json!({
            "personalizations": [{"to": [{"email": self.config.to}]}],
            "from": {"email": self.config.from},
            "subject": email.subject,
            "content": [{"type": "text/html", "value": email.html_body}]
        });

        let response = self
            .client
            .post(format!(
                "{}/v3/mail/send",
                self.config.host.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(to = %self.config.to, code = status.as_u16(), "email sent");
            Ok(status.as_u16())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!("Email rejected with {}: {}", status, body))
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<Email>>,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<u16> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(202)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(host: String, api_key: Option<&str>) -> SendGridConfig {
        SendGridConfig {
            host,
            api_key: api_key.map(String::from),
            from: "reports@example.com".to_string(),
            to: "reader@example.com".to_string(),
        }
    }

    fn email() -> Email {
        Email {
            subject: "Weekly report".to_string(),
            html_body: "<h1>Report</h1>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_returns_status_code() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(header("Authorization", "Bearer sg-key"))
            .and(body_partial_json(json!({
                "from": {"email": "reports@example.com"},
                "subject": "Weekly report",
                "content": [{"type": "text/html", "value": "<h1>Report</h1>"}]
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = SendGridMailer::new(config(server.uri(), Some("sg-key")));
        assert_eq!(mailer.send(&email()).await?, 202);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let mailer = SendGridMailer::new(config(server.uri(), Some("sg-key")));
        let err = mailer.send(&email()).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_send_without_recipient() {
        let mailer = SendGridMailer::new(SendGridConfig {
            api_key: Some("sg-key".to_string()),
            ..Default::default()
        });
        let err = mailer.send(&email()).await.unwrap_err();
        assert!(err.to_string().contains("recipient"));
    }

    #[tokio::test]
    async fn test_send_without_key() {
        let mailer = SendGridMailer::new(config("http://127.0.0.1:9".to_string(), None));
        assert!(mailer.send(&email()).await.is_err());
    }
}
