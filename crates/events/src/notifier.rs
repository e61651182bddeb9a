use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Notify;

/// A single outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid notification endpoint '{endpoint}': {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("notification transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("notification rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Posts `{to, subject, body}` as JSON to a mail relay.
pub struct HttpNotifier {
    client: Client,
    endpoint: Url,
}

impl HttpNotifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let endpoint = Url::parse(endpoint).map_err(|source| NotifyError::Endpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Used when notifications are disabled.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::debug!(to = %notification.to, subject = %notification.subject, "notifications disabled; dropping message");
        Ok(())
    }
}

/// Records every attempted send; optionally fails each one after recording it.
#[derive(Default)]
pub struct MemoryNotifier {
    attempts: Mutex<Vec<Notification>>,
    changed: Notify,
    failing: bool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<Notification> {
        self.attempts
            .lock()
            .map(|attempts| attempts.clone())
            .unwrap_or_default()
    }

    /// Wait until at least `count` sends were attempted or `timeout` elapses,
    /// then return what was recorded.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Notification> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let changed = self.changed.notified();
            let attempts = self.attempts();
            if attempts.len() >= count {
                return attempts;
            }
            if tokio::time::timeout_at(deadline, changed).await.is_err() {
                return self.attempts();
            }
        }
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(notification.clone());
        }
        self.changed.notify_waiters();

        if self.failing {
            return Err(NotifyError::Rejected(format!(
                "refusing message to {}",
                notification.to
            )));
        }
        Ok(())
    }
}
