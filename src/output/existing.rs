// src/output/existing.rs
//! Loader for the previously published output file.
//!
//! The prior output is the only persisted state: its entry ids seed the
//! dedup set and its entries are carried into the next render. Loading is
//! deliberately forgiving; a missing or broken file never stops a run.

use std::path::Path;

use chrono::Utc;
use feed_rs::parser;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::ingest::types::Entry;
use crate::sanitize::clean_text;

/// Display prefix added at render time, e.g. `[arXiv-CR 2024] `. Stripped on
/// reload so re-rendering does not stack prefixes.
static DISPLAY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[^\]]* \d{4}\] ").expect("valid regex"));

/// Load the previous output. Missing file → empty. Unreadable or
/// unparsable file → warning + empty (after one recovery attempt that
/// strips XML-illegal control characters). Never fails the run.
pub fn load_existing(path: &Path) -> Vec<Entry> {
    if !path.exists() {
        return Vec::new();
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read previous output; starting fresh");
            return Vec::new();
        }
    };

    let feed = match parser::parse(bytes.as_slice()) {
        Ok(feed) => feed,
        Err(first_err) => {
            // Control bytes smuggled in by upstream feeds are the known
            // corruption mode; scrub and retry once before giving up.
            let scrubbed = clean_text(&String::from_utf8_lossy(&bytes));
            match parser::parse(scrubbed.as_bytes()) {
                Ok(feed) => {
                    warn!(
                        path = %path.display(),
                        error = %first_err,
                        "previous output was corrupted; recovered after scrubbing"
                    );
                    feed
                }
                Err(_) => {
                    warn!(
                        path = %path.display(),
                        error = %first_err,
                        "previous output is unparsable; starting fresh"
                    );
                    return Vec::new();
                }
            }
        }
    };

    let entries: Vec<Entry> = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let raw_title = entry.title.map(|t| t.content).unwrap_or_default();
            let title = DISPLAY_PREFIX.replace(&raw_title, "").into_owned();
            let id = if entry.id.trim().is_empty() {
                link.clone()
            } else {
                entry.id
            };

            Entry {
                title,
                link,
                published_at: entry.published.unwrap_or_else(Utc::now),
                summary: entry.summary.map(|s| s.content).unwrap_or_default(),
                // RSS `author` is an email-address field, so the decoder
                // surfaces the stored venue as `Person::email` under a
                // placeholder name.
                source_name: entry
                    .authors
                    .first()
                    .map(|p| p.email.clone().unwrap_or_else(|| p.name.clone()))
                    .unwrap_or_default(),
                id,
                is_existing: true,
            }
        })
        .collect();

    info!(path = %path.display(), count = entries.len(), "loaded previous output");
    entries
}
