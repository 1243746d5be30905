// src/config.rs
//! Environment-driven runtime configuration.
//!
//! Everything is read once in `main` into an [`AppConfig`] and passed down by
//! reference. `.env` files are honoured because `dotenvy::dotenv()` runs
//! before this module is consulted.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::output::ChannelMeta;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Runtime knobs, all overridable via `RSS_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Source-list file, one feed URL per line (`RSS_SOURCES_FILE`).
    pub sources_file: PathBuf,
    /// Query-list file, one AND-joined keyword query per line (`RSS_QUERIES_FILE`).
    pub queries_file: PathBuf,
    /// Published feed location (`RSS_OUTPUT_FILE`).
    pub output_file: PathBuf,
    /// Cap on items kept in the published feed (`RSS_MAX_ITEMS`).
    pub max_items: usize,
    /// Volumes expanded per DBLP stream feed (`RSS_DBLP_MAX_VOLUMES`).
    pub dblp_max_volumes: usize,
    /// Delay inserted after every fetch (`RSS_REQUEST_SLEEP_SEC`, seconds).
    pub request_sleep: Duration,
    /// Attempts per HTTP request (`RSS_MAX_RETRIES`).
    pub max_retries: u32,
    /// User-Agent header for all outbound requests (`RSS_USER_AGENT`).
    pub user_agent: String,
    /// Feishu webhook; unset disables notifications (`RSS_WEBHOOK_URL`).
    pub webhook_url: Option<String>,
    /// Entries listed per notification message (`RSS_NOTIFY_MAX_ITEMS`).
    pub notify_max_items: usize,
    /// Oldest publication year accepted for new entries (`RSS_MIN_YEAR`).
    pub min_year: i32,
    /// Channel metadata of the published feed (`RSS_FEED_TITLE` etc.).
    pub channel: ChannelMeta,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let channel_defaults = ChannelMeta::default();
        Self {
            sources_file: PathBuf::from(env_string("RSS_SOURCES_FILE", "sources.dat")),
            queries_file: PathBuf::from(env_string("RSS_QUERIES_FILE", "queries.dat")),
            output_file: PathBuf::from(env_string("RSS_OUTPUT_FILE", "filtered_feed.xml")),
            max_items: env_parse("RSS_MAX_ITEMS", 1000),
            dblp_max_volumes: env_parse("RSS_DBLP_MAX_VOLUMES", 1),
            request_sleep: sleep_duration(env_parse("RSS_REQUEST_SLEEP_SEC", 0.5_f64)),
            max_retries: env_parse("RSS_MAX_RETRIES", 3),
            user_agent: env_string("RSS_USER_AGENT", DEFAULT_USER_AGENT),
            webhook_url: env_opt("RSS_WEBHOOK_URL"),
            notify_max_items: env_parse("RSS_NOTIFY_MAX_ITEMS", 20),
            min_year: env_parse("RSS_MIN_YEAR", 2022),
            channel: ChannelMeta {
                title: env_string("RSS_FEED_TITLE", &channel_defaults.title),
                link: env_string("RSS_FEED_LINK", &channel_defaults.link),
                description: env_string("RSS_FEED_DESCRIPTION", &channel_defaults.description),
                language: env_string("RSS_FEED_LANGUAGE", &channel_defaults.language),
            },
        }
    }

    /// Source URLs to fetch. `RSS_SOURCES` env content beats the file; lines
    /// that do not parse as absolute URLs are skipped with a warning.
    pub fn load_sources(&self) -> Vec<String> {
        self.load_list("RSS_SOURCES", &self.sources_file)
            .into_iter()
            .filter(|line| match Url::parse(line) {
                Ok(_) => true,
                Err(e) => {
                    warn!("skipping invalid source URL {line:?}: {e}");
                    false
                }
            })
            .collect()
    }

    /// Raw query lines; keyword splitting happens in `QuerySet::parse`.
    pub fn load_queries(&self) -> Vec<String> {
        self.load_list("RSS_QUERIES", &self.queries_file)
    }

    fn load_list(&self, env_var: &str, path: &Path) -> Vec<String> {
        if let Some(content) = env_opt(env_var) {
            info!("loading list from environment variable {env_var}");
            return split_env_content(&content);
        }
        load_list_file(path)
    }
}

/// Env-var list content: newline-separated when it contains a newline,
/// otherwise semicolon-separated.
fn split_env_content(content: &str) -> Vec<String> {
    let sep = if content.contains('\n') { '\n' } else { ';' };
    content
        .split(sep)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn load_list_file(path: &Path) -> Vec<String> {
    if !path.exists() {
        return Vec::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => {
            info!("loading list from {}", path.display());
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect()
        }
        Err(e) => {
            warn!("reading {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Trimmed env value, `None` when unset or blank.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_string(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

/// Negative sleeps clamp to zero; non-finite or oversized values warn and
/// fall back (`Duration::from_secs_f64` panics on those).
fn sleep_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or_else(|_| {
        warn!("invalid value in RSS_REQUEST_SLEEP_SEC={secs}; using default 0.5");
        Duration::from_millis(500)
    })
}

/// Parse a numeric env var; blank or unset means the default, and malformed
/// values warn and fall back rather than abort the run.
fn env_parse<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + Display,
{
    match env_opt(name) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("invalid value in {name}={raw:?}; using default {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    const ALL_VARS: &[&str] = &[
        "RSS_SOURCES_FILE",
        "RSS_QUERIES_FILE",
        "RSS_OUTPUT_FILE",
        "RSS_MAX_ITEMS",
        "RSS_DBLP_MAX_VOLUMES",
        "RSS_REQUEST_SLEEP_SEC",
        "RSS_MAX_RETRIES",
        "RSS_USER_AGENT",
        "RSS_WEBHOOK_URL",
        "RSS_NOTIFY_MAX_ITEMS",
        "RSS_MIN_YEAR",
        "RSS_FEED_TITLE",
        "RSS_FEED_LINK",
        "RSS_FEED_DESCRIPTION",
        "RSS_FEED_LANGUAGE",
        "RSS_SOURCES",
        "RSS_QUERIES",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    #[serial_test::serial]
    #[test]
    fn defaults_apply_when_env_is_unset() {
        clear_env();
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.sources_file, PathBuf::from("sources.dat"));
        assert_eq!(cfg.queries_file, PathBuf::from("queries.dat"));
        assert_eq!(cfg.output_file, PathBuf::from("filtered_feed.xml"));
        assert_eq!(cfg.max_items, 1000);
        assert_eq!(cfg.dblp_max_volumes, 1);
        assert_eq!(cfg.request_sleep, Duration::from_millis(500));
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.min_year, 2022);
        assert_eq!(cfg.notify_max_items, 20);
        assert!(cfg.webhook_url.is_none());
        assert!(cfg.user_agent.starts_with("Mozilla/5.0"));
    }

    #[serial_test::serial]
    #[test]
    fn invalid_numbers_warn_and_fall_back() {
        clear_env();
        env::set_var("RSS_MAX_ITEMS", "lots");
        env::set_var("RSS_REQUEST_SLEEP_SEC", "soon");
        env::set_var("RSS_MIN_YEAR", "20x2");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.max_items, 1000);
        assert_eq!(cfg.request_sleep, Duration::from_millis(500));
        assert_eq!(cfg.min_year, 2022);
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn blank_values_mean_unset() {
        clear_env();
        env::set_var("RSS_USER_AGENT", "   ");
        env::set_var("RSS_WEBHOOK_URL", "");
        let cfg = AppConfig::from_env();
        assert!(cfg.user_agent.starts_with("Mozilla/5.0"));
        assert!(cfg.webhook_url.is_none());
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn negative_sleep_is_clamped_to_zero() {
        clear_env();
        env::set_var("RSS_REQUEST_SLEEP_SEC", "-2");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.request_sleep, Duration::ZERO);
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn non_finite_or_huge_sleeps_fall_back_to_the_default() {
        clear_env();
        env::set_var("RSS_REQUEST_SLEEP_SEC", "inf");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.request_sleep, Duration::from_millis(500));

        // Finite but far beyond what a Duration can hold.
        env::set_var("RSS_REQUEST_SLEEP_SEC", "1e300");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.request_sleep, Duration::from_millis(500));
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn env_content_overrides_the_sources_file() {
        clear_env();
        env::set_var(
            "RSS_SOURCES",
            "https://a.example/feed ; https://b.example/feed;",
        );
        let cfg = AppConfig::from_env();
        assert_eq!(
            cfg.load_sources(),
            vec![
                "https://a.example/feed".to_string(),
                "https://b.example/feed".to_string(),
            ]
        );
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn newline_env_content_splits_on_newlines_only() {
        clear_env();
        // The semicolon stays part of the query once a newline is present.
        env::set_var("RSS_QUERIES", "fuzzing AND kernel\nsymbolic; execution\n");
        let cfg = AppConfig::from_env();
        assert_eq!(
            cfg.load_queries(),
            vec![
                "fuzzing AND kernel".to_string(),
                "symbolic; execution".to_string(),
            ]
        );
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn list_files_skip_comments_and_blanks() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# seed sources").unwrap();
        writeln!(file, "https://rss.example/feed.xml").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  https://other.example/atom  ").unwrap();
        file.flush().unwrap();

        env::set_var("RSS_SOURCES_FILE", file.path());
        let cfg = AppConfig::from_env();
        assert_eq!(
            cfg.load_sources(),
            vec![
                "https://rss.example/feed.xml".to_string(),
                "https://other.example/atom".to_string(),
            ]
        );
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn invalid_source_urls_are_skipped() {
        clear_env();
        env::set_var(
            "RSS_SOURCES",
            "not a url;https://ok.example/feed;dblp.org/feed/streams/conf/pldi.rss",
        );
        let cfg = AppConfig::from_env();
        // The schemeless DBLP line is relative, hence rejected too.
        assert_eq!(cfg.load_sources(), vec!["https://ok.example/feed".to_string()]);
        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn missing_list_file_yields_an_empty_list() {
        clear_env();
        env::set_var("RSS_QUERIES_FILE", "/nonexistent/queries.dat");
        let cfg = AppConfig::from_env();
        assert!(cfg.load_queries().is_empty());
        clear_env();
    }
}
