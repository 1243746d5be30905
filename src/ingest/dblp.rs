// src/ingest/dblp.rs
//! # DBLP Stream Expander
//!
//! DBLP's stream feeds (`https://dblp.org/feed/streams/...`) announce whole
//! *volumes*, not papers. This module turns each announced volume into its
//! publication list:
//!
//! 1. Classify the source URL (`conf` vs. `journals` stream).
//! 2. For at most `max_volumes` announced volumes, derive the volume's
//!    data-only `.xml` URL from its page link and fetch it.
//! 3. Decode the DBLP XML dialect and emit one [`Entry`] per publication,
//!    stamped with the volume's publication time.
//!
//! A `#nr<digits>` fragment on a journal volume link narrows the result to
//! one issue. Fetch or decode failures skip the affected volume only.

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, warn};

use crate::fetch::Fetcher;
use crate::ingest::types::{Entry, ParsedFeed};
use crate::ingest::ParseError;

/// Which DBLP namespace a stream feed lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Conference,
    Journal,
}

/// A classified DBLP stream feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRef {
    pub kind: StreamKind,
    pub id: String,
}

static STREAM_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://dblp\.org/feed/streams/(?P<kind>conf|journals)/(?P<id>[A-Za-z0-9_-]+)\.rss$")
        .expect("valid regex")
});

static ISSUE_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^nr(?P<num>[0-9]+)$").expect("valid regex"));

/// Decide whether `url` is a DBLP stream feed. `None` means "treat as a
/// plain syndication feed".
pub fn classify_stream_url(url: &str) -> Option<StreamRef> {
    let caps = STREAM_URL.captures(url.trim())?;
    let kind = match &caps["kind"] {
        "conf" => StreamKind::Conference,
        _ => StreamKind::Journal,
    };
    Some(StreamRef {
        kind,
        id: caps["id"].to_string(),
    })
}

/// Derive the data-only `.xml` URL for a volume page link, splitting off the
/// URL fragment first. `.html`/`.htm` suffixes are swapped for `.xml`;
/// suffix-less URLs get `.xml` appended after trailing slashes are dropped.
pub fn volume_xml_url(page_url: &str) -> (String, Option<String>) {
    let (base, fragment) = match page_url.split_once('#') {
        Some((base, frag)) => (base, Some(frag.to_string())),
        None => (page_url, None),
    };

    let xml = if base.ends_with(".xml") {
        base.to_string()
    } else if let Some(stem) = base.strip_suffix(".html") {
        format!("{stem}.xml")
    } else if let Some(stem) = base.strip_suffix(".htm") {
        format!("{stem}.xml")
    } else {
        format!("{}.xml", base.trim_end_matches('/'))
    };

    (xml, fragment)
}

/// `#nr7` on a journal volume link means "issue 7 only".
fn issue_from_fragment(fragment: Option<&str>) -> Option<String> {
    let caps = ISSUE_FRAGMENT.captures(fragment?)?;
    Some(caps["num"].to_string())
}

/// One publication record pulled out of a volume's XML, before filtering.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct VolumeRecord {
    pub key: Option<String>,
    pub title: Option<String>,
    pub ee: Option<String>,
    pub url: Option<String>,
    pub number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Ee,
    Url,
    Number,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"ee" => Some(Field::Ee),
            b"url" => Some(Field::Url),
            b"number" => Some(Field::Number),
            _ => None,
        }
    }
}

fn is_record_tag(name: &[u8], kind: StreamKind) -> bool {
    match kind {
        StreamKind::Conference => name == b"inproceedings" || name == b"incollection",
        StreamKind::Journal => name == b"article",
    }
}

fn field_slot<'a>(record: &'a mut VolumeRecord, field: Field) -> &'a mut Option<String> {
    match field {
        Field::Title => &mut record.title,
        Field::Ee => &mut record.ee,
        Field::Url => &mut record.url,
        Field::Number => &mut record.number,
    }
}

/// Decode a volume's XML into raw publication records. Conference volumes
/// contribute `inproceedings`/`incollection` elements, journal volumes
/// `article` elements; the first occurrence of each field wins, and text
/// nested in markup (`<i>`, `<sub>`, ...) is flattened into the field value.
pub(crate) fn parse_volume_records(
    bytes: &[u8],
    kind: StreamKind,
) -> Result<Vec<VolumeRecord>, ParseError> {
    let xml = String::from_utf8_lossy(bytes);
    let mut reader = Reader::from_str(&xml);

    let mut records = Vec::new();
    let mut current: Option<VolumeRecord> = None;
    let mut open_field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if is_record_tag(name, kind) {
                    let key = e
                        .try_get_attribute("key")
                        .map_err(|err| ParseError::DblpXml(err.to_string()))?
                        .and_then(|a| a.unescape_value().ok())
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty());
                    current = Some(VolumeRecord {
                        key,
                        ..VolumeRecord::default()
                    });
                    open_field = None;
                } else if let Some(record) = current.as_mut() {
                    if open_field.is_none() {
                        if let Some(field) = Field::from_tag(name) {
                            // First occurrence wins; later duplicates (extra
                            // <ee> mirrors, say) are skipped.
                            if field_slot(record, field).is_none() {
                                open_field = Some(field);
                                text.clear();
                            }
                        }
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if open_field.is_some() {
                    let piece = t
                        .unescape()
                        .map_err(|err| ParseError::DblpXml(err.to_string()))?;
                    text.push_str(&piece);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if is_record_tag(name, kind) {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                    open_field = None;
                } else if let (Some(field), Some(record)) = (open_field, current.as_mut()) {
                    if Field::from_tag(name) == Some(field) {
                        *field_slot(record, field) = Some(text.trim().to_string());
                        open_field = None;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(ParseError::DblpXml(err.to_string())),
        }
    }

    Ok(records)
}

/// Expand a classified stream feed into per-publication entries. Processes
/// at most `max_volumes` announced volumes, in feed order; an empty result
/// tells the caller to fall back to the volume-level entries.
pub async fn expand_stream(
    fetcher: &Fetcher,
    stream: &StreamRef,
    feed: &ParsedFeed,
    max_volumes: usize,
) -> Vec<Entry> {
    let mut expanded = Vec::new();

    for volume in feed.entries.iter().take(max_volumes) {
        if volume.link.is_empty() {
            continue;
        }

        let (xml_url, fragment) = volume_xml_url(&volume.link);
        let issue = match stream.kind {
            StreamKind::Journal => issue_from_fragment(fragment.as_deref()),
            StreamKind::Conference => None,
        };

        let fetched = fetcher.fetch_bytes(&xml_url).await;
        fetcher.pace().await;
        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url = %xml_url, error = %e, "skipping DBLP volume; fetch failed");
                continue;
            }
        };

        let records = match parse_volume_records(&bytes, stream.kind) {
            Ok(records) => records,
            Err(e) => {
                warn!(url = %xml_url, error = %e, "skipping DBLP volume; XML decode failed");
                continue;
            }
        };

        let before = expanded.len();
        for record in records {
            if let Some(issue) = &issue {
                if record.number.as_deref().unwrap_or("") != issue {
                    continue;
                }
            }

            let title = match record.title.as_deref() {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => continue,
            };

            let link = match (&record.ee, &record.url) {
                (Some(ee), _) if !ee.is_empty() => ee.clone(),
                (_, Some(rel)) if !rel.is_empty() => format!("https://dblp.org/{rel}"),
                _ => volume.link.clone(),
            };
            let id = match &record.key {
                Some(key) => format!("dblp:{key}"),
                None => link.clone(),
            };

            expanded.push(Entry {
                title,
                link,
                published_at: volume.published_at,
                summary: String::new(),
                source_name: feed.source_name.clone(),
                id,
                is_existing: false,
            });
        }
        debug!(
            stream = %stream.id,
            volume = %volume.link,
            publications = expanded.len() - before,
            issue = ?issue,
            "expanded DBLP volume"
        );
    }

    expanded
}
