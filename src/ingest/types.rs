// src/ingest/types.rs
use chrono::{DateTime, Utc};

/// One normalized feed item, regardless of where it came from (plain RSS,
/// Atom, arXiv, or an expanded DBLP volume record).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Entry {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    /// Abstract or description; empty when the source has none.
    pub summary: String,
    /// Feed/venue display name, input to abbreviation.
    pub source_name: String,
    /// Dedup key: native entry id, else `dblp:<key>`, else the link.
    pub id: String,
    /// True for entries reloaded from the previously published output.
    #[serde(default)]
    pub is_existing: bool,
}

/// A decoded feed: its display title plus the normalized entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub source_name: String,
    pub entries: Vec<Entry>,
}
