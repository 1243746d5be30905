//! Keyword-query matching over entry text.
//!
//! Each configured line is one query: keywords joined by the literal token
//! `AND`, all of which must appear (case-insensitive substring) in an entry's
//! title + summary. A set of queries matches when any single query does.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::Entry;

/// `AND` only splits as a standalone token, so keywords like "android"
/// survive intact.
static AND_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+AND\s+").expect("valid regex"));

/// One conjunctive query: every keyword must match.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    keywords: Vec<String>,
}

impl Query {
    /// Parse a single query line. Keywords are trimmed and lowercased;
    /// whitespace-only keywords are dropped. Returns `None` when nothing
    /// usable remains (an empty query would match everything).
    pub fn parse(line: &str) -> Option<Self> {
        let keywords: Vec<String> = AND_SPLIT
            .split(line)
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            None
        } else {
            Some(Self { keywords })
        }
    }

    fn matches_text(&self, haystack: &str) -> bool {
        self.keywords.iter().all(|k| haystack.contains(k.as_str()))
    }
}

/// Disjunction of queries: the set matches when any query matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySet {
    queries: Vec<Query>,
}

impl QuerySet {
    /// Build a set from configured lines, skipping lines that parse to
    /// nothing.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queries = lines
            .into_iter()
            .filter_map(|l| Query::parse(l.as_ref()))
            .collect();
        Self { queries }
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// True when any query's keywords all occur in the entry's lowercased
    /// title + summary.
    pub fn matches(&self, entry: &Entry) -> bool {
        let haystack = format!("{} {}", entry.title, entry.summary).to_lowercase();
        self.queries.iter().any(|q| q.matches_text(&haystack))
    }
}
