// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod abbrev;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod notify;
pub mod output;
pub mod query;
pub mod sanitize;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::fetch::{FeedTransport, FetchError, Fetcher, ReqwestTransport};
pub use crate::ingest::types::Entry;
pub use crate::ingest::{run_once, RunOptions, RunReport};
pub use crate::notify::{notify_new_entries, FeishuNotifier, Notifier};
pub use crate::output::{load_existing, publish, ChannelMeta, PublishReport};
pub use crate::query::QuerySet;
