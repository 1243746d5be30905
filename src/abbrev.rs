//! # Abbreviation Resolver
//!
//! Maps verbose feed/venue names ("ScienceDirect Publication: Computers &
//! Security", "dblp: new issues for streams/journals/tse", "cs.CR updates on
//! arXiv.org") to short display tags for rendered item titles and
//! notification lines.
//!
//! Resolution order:
//! 1. Normalize whitespace, drop the " - new TOC" suffix.
//! 2. Exact lookup in the curated venue table.
//! 3. DBLP stream announcement titles → stream table, else uppercased id.
//! 4. arXiv category titles → `arXiv-<suffix>`.
//! 5. Strip publisher prefixes and "Table of Contents" boilerplate.
//! 6. Stopword-filtered first-letter acronym when it lands in 2..=8 chars.
//! 7. Otherwise the first 15 characters of the cleaned name.
//!
//! The function is total: any input yields a non-empty tag (`"UNK"` for
//! blank input).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Curated exact-name table for venues whose derived acronym would be wrong
/// or ambiguous.
static VENUE_ABBR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // ScienceDirect (Elsevier)
    for (k, v) in [
        ("ScienceDirect Publication: Computers & Security", "C&S"),
        ("ScienceDirect Publication: Information and Software Technology", "IST"),
        ("ScienceDirect Publication: Journal of Systems and Software", "JSS"),
        ("ScienceDirect Publication: SoftwareX", "SoftwareX"),
        ("ScienceDirect Publication: Science of Computer Programming", "SCP"),
    ] {
        m.insert(k, v);
    }

    // ACM tables of contents
    for (k, v) in [
        (
            "Association for Computing Machinery: ACM Transactions on Software Engineering and Methodology: Table of Contents",
            "TOSEM",
        ),
        (
            "Association for Computing Machinery: ACM Transactions on Programming Languages and Systems: Table of Contents",
            "TOPLAS",
        ),
        (
            "Association for Computing Machinery: ACM Transactions on Privacy and Security: Table of Contents",
            "TOPS",
        ),
        (
            "Association for Computing Machinery: ACM Computing Surveys: Table of Contents",
            "CSUR",
        ),
        (
            "Association for Computing Machinery: Proceedings of the ACM on Programming Languages: Table of Contents",
            "PACMPL",
        ),
        (
            "Association for Computing Machinery: Proceedings of the ACM on Software Engineering: Table of Contents",
            "PACMSE",
        ),
    ] {
        m.insert(k, v);
    }

    // arXiv category feeds
    for (k, v) in [
        ("cs.CR updates on arXiv.org", "arXiv-CR"),
        ("cs.SE updates on arXiv.org", "arXiv-SE"),
        ("cs.PL updates on arXiv.org", "arXiv-PL"),
        ("cs.AI updates on arXiv.org", "arXiv-AI"),
        ("cs.LG updates on arXiv.org", "arXiv-LG"),
        ("cs.CL updates on arXiv.org", "arXiv-CL"),
        ("cs.IR updates on arXiv.org", "arXiv-IR"),
        ("stat.ML updates on arXiv.org", "arXiv-statML"),
    ] {
        m.insert(k, v);
    }

    m
});

/// DBLP stream id → venue tag. Ids not listed here fall back to the
/// uppercased id.
static DBLP_STREAM_ABBR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // SE / PL / systems conferences
    for (k, v) in [
        ("pldi", "PLDI"),
        ("popl", "POPL"),
        ("fse", "FSE"),
        ("sosp", "SOSP"),
        ("oopsla", "OOPSLA"),
        ("kbse", "ASE"),
        ("icse", "ICSE"),
        ("issta", "ISSTA"),
        ("osdi", "OSDI"),
        ("fm", "FM"),
    ] {
        m.insert(k, v);
    }

    // AI conferences
    for (k, v) in [
        ("aaai", "AAAI"),
        ("neurips", "NeurIPS"),
        ("nips", "NeurIPS"),
        ("acl", "ACL"),
        ("icml", "ICML"),
        ("ijcai", "IJCAI"),
    ] {
        m.insert(k, v);
    }

    // Security venues
    for (k, v) in [
        ("sp", "S&P"),
        ("ccs", "CCS"),
        ("uss", "USENIXSec"),
        ("ndss", "NDSS"),
        ("eurosp", "EuroS&P"),
        ("raid", "RAID"),
        ("acsac", "ACSAC"),
    ] {
        m.insert(k, v);
    }

    // SE / security journals
    for (k, v) in [
        ("tse", "TSE"),
        ("tsc", "TSC"),
        ("ase", "ASE"),
        ("ese", "ESE"),
        ("tdsc", "TDSC"),
        ("tifs", "TIFS"),
        ("ieeesp", "IEEE S&P"),
        ("compsec", "C&S"),
    ] {
        m.insert(k, v);
    }

    m
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// "dblp: new issues for streams/journals/tse" and the "new volumes" variant.
static DBLP_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^dblp:\s+new\s+(?:issues|volumes)\s+for\s+streams/(?:conf|journals)/(?P<stream>[A-Za-z0-9_-]+)$")
        .expect("valid regex")
});

/// "cs.CR updates on arXiv.org", "stat.ML updates on arXiv.org", ...
static ARXIV_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<cat>[A-Za-z]+\.[A-Za-z0-9]+) updates on arXiv\.org$").expect("valid regex")
});

static WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").expect("valid regex"));

const PUBLISHER_PREFIXES: [&str; 5] = [
    "ScienceDirect Publication: ",
    "Association for Computing Machinery: ",
    "Wiley: ",
    "IEEE Transactions on ",
    "IEEE Journal of ",
];

const ACRONYM_STOPWORDS: [&str; 9] = ["of", "and", "the", "on", "for", "in", "to", "a", "an"];

/// Derive a short display tag for a feed/venue name. Total: never returns an
/// empty string.
pub fn abbreviate(source_name: &str) -> String {
    let trimmed = source_name.trim();
    if trimmed.is_empty() {
        return "UNK".to_string();
    }

    // 1) Normalize whitespace and drop the aggregator's "- new TOC" marker.
    let normalized = WHITESPACE.replace_all(trimmed, " ").replace(" - new TOC", "");

    // 2) Curated table wins.
    if let Some(abbr) = VENUE_ABBR.get(normalized.as_str()) {
        return (*abbr).to_string();
    }

    // 3) DBLP stream announcement titles.
    if let Some(caps) = DBLP_TITLE.captures(&normalized) {
        let stream = &caps["stream"];
        return DBLP_STREAM_ABBR
            .get(stream)
            .map(|s| (*s).to_string())
            .unwrap_or_else(|| stream.to_uppercase());
    }

    // 4) arXiv category titles: "cs.XX" keeps the bare suffix, anything else
    //    keeps the category with the dot removed.
    if let Some(caps) = ARXIV_TITLE.captures(&normalized) {
        let cat = &caps["cat"];
        let suffix = match cat.strip_prefix("cs.") {
            Some(rest) => rest.to_string(),
            None => cat.replace('.', ""),
        };
        return format!("arXiv-{suffix}");
    }

    // 5) Strip the first matching publisher prefix and ToC boilerplate.
    let mut cleaned = normalized.as_str();
    for prefix in PUBLISHER_PREFIXES {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest;
            break;
        }
    }
    let cleaned = cleaned
        .replace(": Table of Contents", "")
        .replace("Table of Contents", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return "UNK".to_string();
    }

    // 6) First-letter acronym over non-stopword tokens.
    let acronym: String = WORDS
        .find_iter(cleaned)
        .map(|m| m.as_str())
        .filter(|w| !ACRONYM_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .filter_map(|w| w.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect();
    if (2..=8).contains(&acronym.chars().count()) {
        return acronym;
    }

    // 7) Short names pass through, long ones are truncated.
    cleaned.chars().take(15).collect()
}
