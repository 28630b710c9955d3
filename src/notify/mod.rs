//! Run notifications
//!
//! One notification per process run: a summary on success, the error chain
//! on failure.

use crate::engine::RunSummary;
use crate::error::{error_chain, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

/// Job name attached to every notification
pub const JOB_NAME: &str = "overgrad-sync";

/// Body of a notification
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Notification {
    Success {
        job: String,
        summary: RunSummary,
    },
    Failure {
        job: String,
        error: String,
    },
}

impl Notification {
    /// Success notification carrying the run summary
    pub fn success(summary: RunSummary) -> Self {
        Self::Success {
            job: JOB_NAME.to_string(),
            summary,
        }
    }

    /// Failure notification carrying the error and its causes
    pub fn failure(error: &Error) -> Self {
        Self::Failure {
            job: JOB_NAME.to_string(),
            error: error.chain(),
        }
    }

    /// Whether this reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// Receives the outcome of a run
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Logs the outcome and sends nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        match notification {
            Notification::Success { job, summary } => info!(
                job = %job,
                records = summary.total_records(),
                deleted = summary.total_deleted(),
                "Run succeeded"
            ),
            Notification::Failure { job, error } => error!(job = %job, "Run failed: {}", error),
        }
        Ok(())
    }
}

/// POSTs the notification as JSON to a webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a webhook notifier
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Webhook URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| Error::notify(format!("Failed to reach {}: {}", self.url, error_chain(&e))))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::notify(format!(
                "{} answered {}: {}",
                self.url,
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}
