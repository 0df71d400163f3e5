use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

/// Summary of a coordinator or worker run, posted as a Slack digest (§6:
/// "contents summarize sources processed, events scraped/inserted/
/// duplicated/failed, and failure list").
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sources_processed: usize,
    pub events_scraped: usize,
    pub events_inserted: usize,
    pub events_duplicated: usize,
    pub events_failed: usize,
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.events_failed == 0
    }
}

/// Pluggable notification backend. Absence of `SLACK_WEBHOOK_URL` degrades
/// to `NoopNotify` (§6) rather than an error — mirrors the supervisor's
/// `NotifyBackend`/`SlackWebhook`/`NoopBackend` split.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    async fn send_summary(&self, summary: &RunSummary) -> anyhow::Result<()>;
    async fn send_alert(&self, message: &str) -> anyhow::Result<()>;
}

pub struct SlackWebhook {
    webhook_url: String,
    http: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn post(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        let resp = self.http.post(&self.webhook_url).json(&payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Slack webhook returned non-success");
            anyhow::bail!("Slack webhook returned {status}");
        }
        Ok(())
    }
}

#[async_trait]
impl NotifyBackend for SlackWebhook {
    async fn send_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        let color = if summary.is_success() { "good" } else { "danger" };
        let mut lines = vec![format!(
            "*Pipeline run* — sources={} scraped={} inserted={} duplicated={} failed={}",
            summary.sources_processed,
            summary.events_scraped,
            summary.events_inserted,
            summary.events_duplicated,
            summary.events_failed,
        )];
        if !summary.failures.is_empty() {
            lines.push("*Failures:*".to_string());
            for f in &summary.failures {
                lines.push(format!("  - {f}"));
            }
        }

        let payload = json!({
            "attachments": [{
                "color": color,
                "text": lines.join("\n"),
            }]
        });
        self.post(payload).await
    }

    async fn send_alert(&self, message: &str) -> anyhow::Result<()> {
        self.post(json!({ "text": format!(":rotating_light: {message}") })).await
    }
}

pub struct NoopNotify;

#[async_trait]
impl NotifyBackend for NoopNotify {
    async fn send_summary(&self, _summary: &RunSummary) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_alert(&self, _message: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Builds the appropriate backend for the configured webhook, if any.
pub fn notifier_from_config(webhook_url: Option<&str>) -> Box<dyn NotifyBackend> {
    match webhook_url {
        Some(url) if !url.is_empty() => Box::new(SlackWebhook::new(url)),
        _ => Box::new(NoopNotify),
    }
}
