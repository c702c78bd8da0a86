use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::dispatcher::{AlertSink, OperatorAlert};

const MESSAGE_LIMIT: usize = 1900;

/// Posts alerts to a chat incoming-webhook. The body carries both `content`
/// (Discord) and `text` (Slack) so either service accepts it.
pub(crate) struct ChatWebhookSink {
    webhook_url: Url,
    client: Client,
}

impl ChatWebhookSink {
    pub(crate) fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(3)).build()?;
        Ok(Self {
            webhook_url,
            client,
        })
    }
}

pub(crate) fn render(alert: &OperatorAlert) -> String {
    let mut out = format!(
        "[{}] {} / {} / {}\n{} {}\n{}",
        alert.level,
        alert.service_name,
        alert.stage,
        alert.component,
        alert.at.to_rfc3339_opts(SecondsFormat::Secs, true),
        alert.target,
        alert.message,
    );

    for (key, value) in &alert.fields {
        out.push_str(&format!("\n  {key} = {value}"));
    }

    if out.chars().count() > MESSAGE_LIMIT {
        out = out.chars().take(MESSAGE_LIMIT).collect();
        out.push_str("\n(truncated)");
    }

    out
}

#[async_trait]
impl AlertSink for ChatWebhookSink {
    async fn deliver(&self, alert: &OperatorAlert) -> Result<()> {
        let text = render(alert);

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": text, "text": text }))
            .send()
            .await
            // reqwest errors print the URL, which holds the webhook token.
            .map_err(|err| anyhow!("alert webhook unreachable (timeout: {})", err.is_timeout()))?;

        if !response.status().is_success() {
            return Err(anyhow!("alert webhook answered {}", response.status()));
        }

        Ok(())
    }
}
