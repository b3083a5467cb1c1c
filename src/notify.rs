//! Best-effort push notifications for new comments, delivered through Bark.
//!
//! Request handlers only enqueue; a single managed worker owns the HTTP
//! client. Delivery is at most once and failures are logged, never retried.

use std::time::Duration;

use log::{debug, warn};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::entity::comment;

pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);
pub const MAX_CONTENT_PREVIEW: usize = 100;
const QUEUE_CAPACITY: usize = 128;
const NOTIFY_GROUP: &str = "iComment";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("bark request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("bark API returned status {0}")]
    Status(u16),
}

#[derive(Clone, Debug)]
pub struct BarkConfig {
    pub server: String,
    pub device_key: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarkMessage {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group: String,
}

impl BarkMessage {
    pub fn for_comment(comment: &comment::Model) -> Self {
        let title = if comment.parent_id.is_some() {
            "New reply"
        } else {
            "New comment"
        };
        Self {
            title: title.to_string(),
            body: format!("From {}:\n{}", comment.nickname, preview(&comment.content)),
            url: comment.article_url.clone(),
            group: NOTIFY_GROUP.to_string(),
        }
    }
}

/// Truncates by character so multi-byte text is never split.
fn preview(content: &str) -> String {
    if content.chars().count() <= MAX_CONTENT_PREVIEW {
        return content.to_string();
    }
    let head: String = content.chars().take(MAX_CONTENT_PREVIEW).collect();
    format!("{}...", head)
}

struct BarkClient {
    client: Client,
    endpoint: String,
}

impl BarkClient {
    fn new(config: &BarkConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(NOTIFICATION_TIMEOUT).build()?;
        let endpoint = format!("{}/{}", config.server.trim_end_matches('/'), config.device_key);
        Ok(Self { client, endpoint })
    }

    async fn send(&self, message: &BarkMessage) -> Result<(), NotifyError> {
        let resp = self.client.post(&self.endpoint).json(message).send().await?;
        if !resp.status().is_success() {
            return Err(NotifyError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}

/// Cheap handle shared with the request handlers.
#[derive(Clone)]
pub struct Notifier {
    sender: Option<mpsc::Sender<BarkMessage>>,
}

impl Notifier {
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Never blocks. A full or closed queue drops the notification.
    pub fn notify(&self, comment: &comment::Model) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(BarkMessage::for_comment(comment)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("notification queue full, dropping notice for comment {}", comment.id)
            }
            Err(TrySendError::Closed(_)) => {
                warn!("notification worker stopped, dropping notice for comment {}", comment.id)
            }
        }
    }
}

/// Owns the worker task so shutdown can wait for it with a bound.
pub struct NotifierWorker {
    handle: JoinHandle<()>,
}

impl NotifierWorker {
    /// Waits for queued pushes to drain, at most `grace`. The queue closes
    /// once every `Notifier` clone has been dropped.
    pub async fn shutdown(self, grace: Duration) {
        match tokio::time::timeout(grace, self.handle).await {
            Ok(_) => debug!("notification worker stopped"),
            Err(_) => warn!("notification worker still busy after {:?}, abandoning", grace),
        }
    }
}

pub fn spawn_notifier(config: Option<BarkConfig>) -> (Notifier, Option<NotifierWorker>) {
    let Some(config) = config else {
        debug!("bark notifications disabled");
        return (Notifier::disabled(), None);
    };
    let client = match BarkClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            warn!("bark client init failed, notifications disabled: {}", e);
            return (Notifier::disabled(), None);
        }
    };

    let (sender, mut receiver) = mpsc::channel::<BarkMessage>(QUEUE_CAPACITY);
    let handle = tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            if let Err(e) = client.send(&message).await {
                warn!("failed to send bark notification: {}", e);
            }
        }
    });
    debug!("bark worker started");
    (
        Notifier {
            sender: Some(sender),
        },
        Some(NotifierWorker { handle }),
    )
}
