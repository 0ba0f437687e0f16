use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// A push notification for the operator's phone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: Option<String>,
    pub message: String,
}

impl Notification {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            title: None,
            message: message.into(),
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Delivers notifications. Delivery never fails loudly: the returned string says
/// whether the message went out.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn push(&self, notification: Notification) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushoverConfig {
    #[serde(default = "default_pushover_url")]
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

impl Default for PushoverConfig {
    fn default() -> Self {
        Self {
            url: default_pushover_url(),
            token: None,
            user: None,
        }
    }
}

fn default_pushover_url() -> String {
    PUSHOVER_URL.to_string()
}

pub struct PushoverNotifier {
    client: Client,
    config: PushoverConfig,
}

impl PushoverNotifier {
    pub fn new(config: PushoverConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn push(&self, notification: Notification) -> String {
        let (Some(token), Some(user)) = (&self.config.token, &self.config.user) else {
            tracing::warn!("pushover credentials are not configured");
            return "Failed to send: PUSHOVER_TOKEN and PUSHOVER_USER must be set".to_string();
        };

        let mut form = vec![
            ("token", token.as_str()),
            ("user", user.as_str()),
            ("message", notification.message.as_str()),
        ];
        if let Some(title) = &notification.title {
            form.push(("title", title.as_str()));
        }

        match self.client.post(&self.config.url).form(&form).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                tracing::info!("notification sent");
                "Notification sent!".to_string()
            }
            Ok(response) => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%body, "notification rejected");
                format!("Failed to send: {}", body)
            }
            Err(e) => {
                tracing::warn!(error = %e, "notification request failed");
                format!("Failed to send: {}", e)
            }
        }
    }
}

/// Keeps every notification in memory instead of delivering it
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    sent: std::sync::Mutex<Vec<Notification>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn push(&self, notification: Notification) -> String {
        self.sent.lock().unwrap().push(notification);
        "Notification sent!".to_string()
    }
}
