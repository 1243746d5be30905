// src/notify/mod.rs
//! Best-effort "new papers" notifications.
//!
//! After a publish that added entries, a short text summary is pushed to a
//! chat webhook. Delivery is fire-and-forget: failures are logged and never
//! affect the already-written output.

pub mod feishu;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::abbrev::abbreviate;
use crate::ingest::types::Entry;

pub use feishu::FeishuNotifier;

/// Hard cap on outbound message text, in characters.
pub const MESSAGE_CHAR_CAP: usize = 3500;

/// Outbound text sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;
}

/// Build the summary message: a header with the new-entry count, one
/// `- [<abbr>] <title>` line plus an indented link per shown entry, and an
/// `... and K more` trailer when `max_items` cuts the list short.
pub fn build_message(new_entries: &[Entry], max_items: usize) -> String {
    let shown = &new_entries[..new_entries.len().min(max_items)];

    let mut lines = vec![format!(
        "Paper-Feed updated: +{} new items",
        new_entries.len()
    )];
    for entry in shown {
        let title = entry.title.trim();
        if !title.is_empty() {
            lines.push(format!("- [{}] {}", abbreviate(&entry.source_name), title));
        }
        let link = entry.link.trim();
        if !link.is_empty() {
            lines.push(format!("  {link}"));
        }
    }
    if new_entries.len() > shown.len() {
        lines.push(format!("... and {} more", new_entries.len() - shown.len()));
    }

    let message = lines.join("\n");
    if message.chars().count() > MESSAGE_CHAR_CAP {
        message.chars().take(MESSAGE_CHAR_CAP).collect()
    } else {
        message
    }
}

/// Send the summary for a batch of new entries. No-op for an empty batch;
/// delivery failures are logged, not propagated.
pub async fn notify_new_entries(notifier: &dyn Notifier, new_entries: &[Entry], max_items: usize) {
    if new_entries.is_empty() {
        return;
    }
    let message = build_message(new_entries, max_items);
    if let Err(e) = notifier.send_text(&message).await {
        warn!(error = %e, "notification delivery failed");
    }
}
