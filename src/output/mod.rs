// src/output/mod.rs
pub mod existing;
pub mod feed_xml;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::ingest::types::Entry;

pub use existing::load_existing;
pub use feed_xml::{render_feed, ChannelMeta};

/// Outcome of one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Items in the written document.
    pub written: usize,
    /// Items dropped by the size cap.
    pub truncated: usize,
}

/// Merge carried-over and new entries, sort newest-first, cap at
/// `max_items`, render and write the output document.
///
/// The write goes through a sibling temp file and a rename, so readers of
/// the output never observe a half-written document.
pub fn publish(
    existing: Vec<Entry>,
    new_entries: Vec<Entry>,
    max_items: usize,
    meta: &ChannelMeta,
    output_path: &Path,
) -> Result<PublishReport> {
    let mut combined = existing;
    combined.extend(new_entries);

    // Stable sort: same-timestamp entries (a DBLP volume's papers) keep
    // their relative order.
    combined.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    let truncated = combined.len().saturating_sub(max_items);
    combined.truncate(max_items);

    let last_build = combined
        .first()
        .map(|e| e.published_at)
        .unwrap_or_else(Utc::now);

    let xml = feed_xml::render_feed(&combined, meta, last_build)?;
    write_via_rename(output_path, xml.as_bytes())
        .with_context(|| format!("writing {}", output_path.display()))?;

    info!(
        path = %output_path.display(),
        items = combined.len(),
        truncated,
        "published feed"
    );
    Ok(PublishReport {
        written: combined.len(),
        truncated,
    })
}

fn write_via_rename(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("xml.tmp");
    std::fs::write(&tmp, bytes)
        .with_context(|| format!("writing temp file {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("renaming {} into place", tmp.display()));
    }
    Ok(())
}
