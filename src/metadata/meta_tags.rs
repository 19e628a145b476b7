//! HTML Meta Tag Extraction
//!
//! Reads `<meta>` and `<link>` tags from the document once into [`HeadTags`],
//! then fills metadata fields tier by tier: Open Graph, Twitter Card, and
//! standard tags. Each tier only fills fields still missing, so calling
//! them in order yields the per-field priority.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dom_query::{Document, Selection};

use crate::dom;
use crate::error::Error;
use crate::result::Metadata;

/// Every head tag relevant to metadata, keyed by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct HeadTags {
    /// `og:*` and `article:*` properties, first occurrence wins.
    pub open_graph: BTreeMap<String, String>,
    /// `twitter:*` tags, first occurrence wins.
    pub twitter: BTreeMap<String, String>,
    /// Other `name` / `http-equiv` / `itemprop` tags, first occurrence wins.
    pub named: BTreeMap<String, String>,
    /// Every `article:tag` value, in document order.
    pub article_tags: Vec<String>,
    /// `<link rel="canonical">` target.
    pub canonical_link: Option<String>,
    /// `<title>` text.
    pub title_element: Option<String>,
}

/// Collect head tags in one pass over the document.
#[must_use]
pub fn collect_head_tags(doc: &Document) -> HeadTags {
    let mut tags = HeadTags::default();

    for node in doc.select("meta").nodes() {
        let meta = Selection::from(*node);

        let key = dom::get_attribute(&meta, "property")
            .or_else(|| dom::get_attribute(&meta, "name"))
            .or_else(|| dom::get_attribute(&meta, "http-equiv"))
            .or_else(|| dom::get_attribute(&meta, "itemprop"))
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let content = dom::get_attribute(&meta, "content").unwrap_or_default();
        let content = content.trim();

        if key.is_empty() || content.is_empty() {
            continue;
        }

        if key == "article:tag" {
            tags.article_tags.push(content.to_string());
        }

        let map = if key.starts_with("og:") || key.starts_with("article:") {
            &mut tags.open_graph
        } else if key.starts_with("twitter:") {
            &mut tags.twitter
        } else {
            &mut tags.named
        };
        map.entry(key).or_insert_with(|| content.to_string());
    }

    tags.canonical_link = doc
        .select("link[rel='canonical']")
        .nodes()
        .first()
        .and_then(|n| n.attr("href"))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());

    tags.title_element = doc
        .select("head title, title")
        .nodes()
        .first()
        .map(|n| dom::normalize_whitespace(&n.text()))
        .filter(|t| !t.is_empty());

    tags
}

/// Fill missing fields from Open Graph properties.
#[must_use]
pub fn apply_open_graph(tags: &HeadTags, original: Metadata, issues: &mut Vec<Error>) -> Metadata {
    let mut result = original;
    let og = &tags.open_graph;

    fill(&mut result.title, og.get("og:title"));
    fill(&mut result.description, og.get("og:description"));
    if let Some(author) = og.get("article:author").filter(|a| validate_metadata_name(a)) {
        fill(&mut result.author, Some(author));
    }
    fill(&mut result.site_name, og.get("og:site_name"));
    fill(&mut result.canonical_url, og.get("og:url"));
    fill(&mut result.image, og.get("og:image").or_else(|| og.get("og:image:url")));

    if let Some(locale) = og.get("og:locale") {
        fill_language(&mut result, locale, "og:locale", issues);
    }

    fill_date(&mut result.published_date, og.get("article:published_time"), "published_date", issues);
    fill_date(
        &mut result.modified_date,
        og.get("article:modified_time").or_else(|| og.get("og:updated_time")),
        "modified_date",
        issues,
    );

    if result.keywords.is_empty() {
        result.keywords = dedupe(tags.article_tags.iter().flat_map(|t| parse_tag_list(t)));
    }

    result
}

/// Fill missing fields from Twitter Card tags.
#[must_use]
pub fn apply_twitter_card(tags: &HeadTags, original: Metadata) -> Metadata {
    let mut result = original;
    let tw = &tags.twitter;

    fill(&mut result.title, tw.get("twitter:title"));
    fill(&mut result.description, tw.get("twitter:description"));
    if let Some(creator) = tw.get("twitter:creator").filter(|c| validate_metadata_name(c)) {
        fill(&mut result.author, Some(creator));
    }
    fill(&mut result.canonical_url, tw.get("twitter:url"));
    fill(&mut result.image, tw.get("twitter:image").or_else(|| tw.get("twitter:image:src")));

    result
}

/// Fill missing fields from standard meta tags, `<title>` and the canonical link.
#[must_use]
pub fn apply_standard_meta(tags: &HeadTags, original: Metadata, issues: &mut Vec<Error>) -> Metadata {
    let mut result = original;
    let named = &tags.named;

    fill(&mut result.title, tags.title_element.as_ref().or_else(|| named.get("title")));
    fill(&mut result.description, named.get("description").or_else(|| named.get("dc.description")));
    if let Some(author) = first_of(named, &["author", "dc.creator", "byl", "parsely-author"])
        .filter(|a| validate_metadata_name(a))
    {
        fill(&mut result.author, Some(author));
    }
    fill(&mut result.site_name, first_of(named, &["application-name", "publisher", "dc.publisher"]));
    fill(&mut result.canonical_url, tags.canonical_link.as_ref());

    if let Some(lang) = first_of(named, &["content-language", "language", "dc.language"]) {
        fill_language(&mut result, lang, "content-language", issues);
    }

    fill_date(
        &mut result.published_date,
        first_of(
            named,
            &[
                "date", "pubdate", "publish_date", "publishdate", "datepublished",
                "dc.date", "dc.date.issued", "dcterms.created", "dcterms.date",
                "parsely-pub-date", "sailthru.date",
            ],
        ),
        "published_date",
        issues,
    );
    fill_date(
        &mut result.modified_date,
        first_of(named, &["last-modified", "datemodified", "dcterms.modified", "revised"]),
        "modified_date",
        issues,
    );

    if result.keywords.is_empty() {
        if let Some(keywords) = first_of(named, &["keywords", "news_keywords", "parsely-tags"]) {
            result.keywords = dedupe(parse_tag_list(keywords));
        }
    }

    result
}

/// First present key of `keys`.
fn first_of<'a>(map: &'a BTreeMap<String, String>, keys: &[&str]) -> Option<&'a String> {
    keys.iter().find_map(|k| map.get(*k))
}

/// Set `slot` from `value` if the slot is still empty.
fn fill(slot: &mut Option<String>, value: Option<&String>) {
    if slot.is_none() {
        if let Some(v) = value.map(|v| dom::normalize_whitespace(v)).filter(|v| !v.is_empty()) {
            *slot = Some(v);
        }
    }
}

/// Parse and set a date slot; unparseable values are reported and skipped.
pub(crate) fn fill_date(
    slot: &mut Option<DateTime<Utc>>,
    value: Option<&String>,
    field: &'static str,
    issues: &mut Vec<Error>,
) {
    if slot.is_some() {
        return;
    }
    let Some(raw) = value else {
        return;
    };
    match parse_meta_date(raw) {
        Some(date) => *slot = Some(date),
        None => issues.push(Error::MetadataField {
            field,
            reason: format!("unparseable date {raw:?}"),
        }),
    }
}

/// Set the language if no earlier source did.
///
/// During extraction an empty `language` means unset; the default is applied
/// once every source has been tried.
pub(crate) fn fill_language(result: &mut Metadata, raw: &str, source: &str, issues: &mut Vec<Error>) {
    if !result.language.is_empty() {
        return;
    }
    match normalize_language(raw) {
        Some(lang) => result.language = lang,
        None => issues.push(Error::MetadataField {
            field: "language",
            reason: format!("invalid {source} value {raw:?}"),
        }),
    }
}

/// Lowercase primary subtag of a language tag (`en-US`, `pt_BR` → `en`, `pt`).
#[must_use]
pub fn normalize_language(raw: &str) -> Option<String> {
    let primary = raw
        .trim()
        .split(['-', '_', ',', ';', ' '])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let valid = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    valid.then_some(primary)
}

/// Validate that a metadata name looks like a real author name.
///
/// Filters out:
/// - Empty or very short names
/// - Names that look like URLs
/// - Names with too many special characters
/// - Names that look like JSON
#[must_use]
pub fn validate_metadata_name(name: &str) -> bool {
    let name = name.trim();

    if name.len() < 2 || name.len() > 120 {
        return false;
    }

    if name.len() > 20 && !name.contains(' ') {
        return false;
    }

    if name.starts_with("http://") || name.starts_with("https://") || name.starts_with("www.") {
        return false;
    }

    if name.contains(".com") || name.contains(".org") || name.contains(".net") {
        return false;
    }

    if name.starts_with('{') || name.starts_with('[') {
        return false;
    }

    let digit_count = name.chars().filter(char::is_ascii_digit).count();
    if digit_count > 3 {
        return false;
    }

    let special_count = name
        .chars()
        .filter(|c| {
            !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '-' | '\'' | '.' | '@' | '_')
        })
        .count();

    special_count <= 2
}

/// Parse a date string from meta tags or DOM elements.
///
/// Supports ISO 8601, RFC 3339, RFC 2822, and common date formats.
#[must_use]
pub fn parse_meta_date(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    // Offsets without a colon, e.g. `2024-03-15T10:30:00+0000`
    if let Ok(dt) = DateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date_str, fmt) {
            return Some(dt.and_utc());
        }
    }

    let formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%B %d, %Y",  // January 15, 2024
        "%b %d, %Y",  // Jan 15, 2024
        "%d %B %Y",   // 15 January 2024
    ];

    for fmt in formats {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(date_str, fmt) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

/// Parse a comma or semicolon-separated list of tags.
pub(crate) fn parse_tag_list(content: &str) -> Vec<String> {
    content
        .split([',', ';'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Trim and drop duplicates, keeping first occurrences in order.
pub(crate) fn dedupe(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_all(html: &str) -> (Metadata, Vec<Error>) {
        let doc = Document::from(html);
        let tags = collect_head_tags(&doc);
        let mut issues = Vec::new();
        let unset = Metadata {
            language: String::new(),
            ..Metadata::default()
        };
        let m = apply_open_graph(&tags, unset, &mut issues);
        let m = apply_twitter_card(&tags, m);
        let m = apply_standard_meta(&tags, m, &mut issues);
        (m, issues)
    }

    #[test]
    fn test_standard_meta_tags() {
        let (metadata, _) = run_all(
            r#"<html><head>
            <meta name="author" content="John Smith">
            <meta name="description" content="A test article.">
            <meta name="keywords" content="test, article, example, Test">
        </head><body></body></html>"#,
        );

        assert_eq!(metadata.author, Some("John Smith".to_string()));
        assert_eq!(metadata.description, Some("A test article.".to_string()));
        assert_eq!(metadata.keywords, vec!["test", "article", "example"]);
    }

    #[test]
    fn open_graph_beats_twitter_and_standard() {
        let (metadata, _) = run_all(
            r#"<html><head>
            <title>Element Title</title>
            <meta name="twitter:title" content="Twitter Title">
            <meta property="og:title" content="OG Title">
            <meta name="twitter:description" content="Twitter Description">
            <meta name="description" content="Plain Description">
        </head></html>"#,
        );

        assert_eq!(metadata.title, Some("OG Title".to_string()));
        assert_eq!(metadata.description, Some("Twitter Description".to_string()));
    }

    #[test]
    fn maps_collect_every_property() {
        let doc = Document::from(
            r#"<head>
            <meta property="og:type" content="article">
            <meta property="og:type" content="website">
            <meta property="article:section" content="Tech">
            <meta name="twitter:card" content="summary">
            <meta property="article:tag" content="rust">
            <meta property="article:tag" content="web">
        </head>"#,
        );
        let tags = collect_head_tags(&doc);

        assert_eq!(tags.open_graph.get("og:type").map(String::as_str), Some("article"));
        assert_eq!(tags.open_graph.get("article:section").map(String::as_str), Some("Tech"));
        assert_eq!(tags.twitter.get("twitter:card").map(String::as_str), Some("summary"));
        assert_eq!(tags.article_tags, vec!["rust", "web"]);
    }

    #[test]
    fn article_tags_win_over_keywords() {
        let (metadata, _) = run_all(
            r#"<head>
            <meta name="keywords" content="a, b">
            <meta property="article:tag" content="rust">
            <meta property="article:tag" content="web">
        </head>"#,
        );
        assert_eq!(metadata.keywords, vec!["rust", "web"]);
    }

    #[test]
    fn language_from_locale_and_http_equiv() {
        let (metadata, _) = run_all(r#"<head><meta property="og:locale" content="pt_BR"></head>"#);
        assert_eq!(metadata.language, "pt");

        let (metadata, _) =
            run_all(r#"<head><meta http-equiv="content-language" content="de-AT"></head>"#);
        assert_eq!(metadata.language, "de");
    }

    #[test]
    fn bad_date_is_reported_and_skipped() {
        let (metadata, issues) = run_all(
            r#"<head>
            <meta property="article:published_time" content="yesterday-ish">
            <meta name="date" content="2024-03-15">
        </head>"#,
        );
        // The OG tier fails; the standard tier still fills the date.
        assert!(metadata.published_date.is_some());
        assert!(matches!(issues.first(), Some(Error::MetadataField { field: "published_date", .. })));
    }

    #[test]
    fn canonical_link_is_collected() {
        let (metadata, _) = run_all(r#"<head><link rel="canonical" href="/a/b"></head>"#);
        assert_eq!(metadata.canonical_url, Some("/a/b".to_string()));
    }

    #[test]
    fn test_validate_metadata_name_invalid() {
        assert!(validate_metadata_name("John Smith"));
        assert!(validate_metadata_name("O'Connor"));
        assert!(!validate_metadata_name(""));
        assert!(!validate_metadata_name("https://example.com/author/x"));
        assert!(!validate_metadata_name("{\"name\": \"test\"}"));
        assert!(!validate_metadata_name("1234567890"));
    }

    #[test]
    fn test_date_parsing_formats() {
        assert!(parse_meta_date("2024-03-15").is_some());
        assert!(parse_meta_date("2024-03-15T10:30:00Z").is_some());
        assert!(parse_meta_date("2024-03-15T10:30:00+0000").is_some());
        assert!(parse_meta_date("Fri, 15 Mar 2024 10:30:00 GMT").is_some());
        assert!(parse_meta_date("March 15, 2024").is_some());
        assert!(parse_meta_date("invalid date").is_none());
    }

    #[test]
    fn normalize_language_primary_subtag() {
        assert_eq!(normalize_language("en-US").as_deref(), Some("en"));
        assert_eq!(normalize_language("FR").as_deref(), Some("fr"));
        assert_eq!(normalize_language("123"), None);
        assert_eq!(normalize_language(""), None);
    }
}
