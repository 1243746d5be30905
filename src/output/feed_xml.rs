// src/output/feed_xml.rs
//! RSS 2.0 rendering of the merged entry list.
//!
//! Field mapping per item: `title` carries a `[<abbr> <year>]` display
//! prefix, `author` carries the source name, `guid` carries the dedup id.
//! All free text passes through the sanitizer before writing.

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::abbrev::abbreviate;
use crate::ingest::types::Entry;
use crate::sanitize::clean_text;

/// Channel-level metadata for the published feed.
#[derive(Debug, Clone)]
pub struct ChannelMeta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
}

impl Default for ChannelMeta {
    fn default() -> Self {
        Self {
            title: "Filtered Papers".to_string(),
            link: "https://example.org/filtered-papers".to_string(),
            description: "Aggregated research papers matching configured queries".to_string(),
            language: "en-US".to_string(),
        }
    }
}

fn text_element<W: std::io::Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Render the full RSS document. `entries` must already be sorted and
/// capped; `last_build` is the channel's `lastBuildDate`.
pub fn render_feed(
    entries: &[Entry],
    meta: &ChannelMeta,
    last_build: DateTime<Utc>,
) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss_start = BytesStart::new("rss");
    rss_start.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss_start))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &meta.title)?;
    text_element(&mut writer, "link", &meta.link)?;
    text_element(&mut writer, "description", &meta.description)?;
    text_element(&mut writer, "language", &meta.language)?;
    text_element(&mut writer, "lastBuildDate", &last_build.to_rfc2822())?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("item")))?;

        let abbr = abbreviate(&entry.source_name);
        let display_title = format!("[{} {}] {}", abbr, entry.published_at.year(), entry.title);
        text_element(&mut writer, "title", &clean_text(&display_title))?;
        text_element(&mut writer, "link", &entry.link)?;
        text_element(&mut writer, "description", &clean_text(&entry.summary))?;
        text_element(&mut writer, "author", &clean_text(&entry.source_name))?;

        // Non-URL ids (dblp keys, OAI ids) must not be read as permalinks.
        let mut guid = BytesStart::new("guid");
        let is_permalink =
            entry.id.starts_with("http://") || entry.id.starts_with("https://");
        guid.push_attribute(("isPermaLink", if is_permalink { "true" } else { "false" }));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&entry.id)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        text_element(&mut writer, "pubDate", &entry.published_at.to_rfc2822())?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}
