// src/notify/feishu.rs
//! Feishu (Lark) webhook delivery.
//!
//! Feishu bots answer `200 OK` even when they reject a message, reporting the
//! real outcome in a JSON body (`code`/`StatusCode` plus a message field), so
//! acceptance is decided from the body rather than the HTTP status alone.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::Notifier;

const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Posts plain-text messages to a Feishu incoming webhook.
///
/// Constructed with `webhook_url: None` it is a no-op sink, so callers never
/// need to branch on whether notifications are configured.
pub struct FeishuNotifier {
    webhook_url: Option<String>,
    client: Client,
}

impl FeishuNotifier {
    pub fn new(webhook_url: Option<String>, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("building webhook HTTP client")?;
        Ok(Self {
            webhook_url,
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// POST `body` to the webhook, retrying on 429 (honouring `Retry-After`)
    /// and on transport errors. Any other HTTP status is returned as-is for
    /// the caller to interpret.
    async fn post_with_retry(&self, url: &str, body: &Value) -> Result<(u16, String)> {
        let mut last_err = None;
        for attempt in 0..DEFAULT_MAX_ATTEMPTS {
            match self.client.post(url).json(body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.as_u16() == 429 && attempt + 1 < DEFAULT_MAX_ATTEMPTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok());
                        let delay = rate_limit_delay(retry_after, attempt);
                        warn!(delay_secs = delay.as_secs(), "webhook rate limited, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    let text = resp.text().await.unwrap_or_default();
                    return Ok((status.as_u16(), text));
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "webhook post failed");
                    last_err = Some(e);
                    if attempt + 1 < DEFAULT_MAX_ATTEMPTS {
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        }
        Err(last_err.expect("at least one attempt ran"))
            .context("posting webhook notification")
    }
}

/// Delay before re-posting after a 429: the server's `Retry-After` seconds
/// when the header is a plain number, else a backoff growing with the
/// attempt index.
fn rate_limit_delay(retry_after: Option<&str>, attempt: u32) -> Duration {
    let secs = retry_after
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(2 * (attempt as u64 + 1));
    Duration::from_secs(secs)
}

/// Inspect a Feishu response body and return `Some(reason)` when the service
/// rejected the message. Bodies that are not JSON, or that carry no
/// `code`/`StatusCode` field, count as accepted.
fn rejection_reason(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let code = value.get("code").or_else(|| value.get("StatusCode"))?;
    let accepted = match code {
        Value::Null => true,
        Value::Number(n) => n.as_i64() == Some(0),
        Value::String(s) => s == "0",
        _ => false,
    };
    if accepted {
        return None;
    }
    let msg = value
        .get("msg")
        .or_else(|| value.get("StatusMessage"))
        .and_then(Value::as_str)
        .unwrap_or("");
    Some(format!("code={code}, msg={msg}"))
}

#[async_trait]
impl Notifier for FeishuNotifier {
    async fn send_text(&self, text: &str) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            debug!("notifications disabled (no webhook URL)");
            return Ok(());
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let payload = serde_json::json!({
            "msg_type": "text",
            "content": { "text": trimmed },
        });
        let (status, body) = self.post_with_retry(url, &payload).await?;
        if !(200..300).contains(&status) {
            bail!("webhook returned HTTP {status}");
        }
        if let Some(reason) = rejection_reason(&body) {
            bail!("webhook rejected message ({reason})");
        }
        info!("notification sent");
        Ok(())
    }
}
