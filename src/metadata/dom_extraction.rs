//! DOM-based Metadata Extraction
//!
//! Last-resort sources searched in the document body when head tags and
//! structured data are silent: the first `<h1>`, the first substantial
//! paragraph, byline elements, `<html lang>` and `<time datetime>`.

use std::sync::LazyLock;

use dom_query::{Document, Selection};
use regex::Regex;

use crate::dom;
use crate::error::Error;
use crate::options::Thresholds;
use crate::patterns::AUTHOR_SELECTOR;
use crate::result::Metadata;

use super::meta_tags::{fill_date, fill_language, validate_metadata_name};

/// Regex pattern for email addresses
#[allow(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid regex"));

/// Regex pattern for Twitter handles
#[allow(clippy::expect_used)]
static TWITTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("valid regex"));

/// Regex pattern for "and X more" patterns
#[allow(clippy::expect_used)]
static MORE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+\d+\s+more.*$").expect("valid regex"));

/// Byline prefixes stripped from author text.
#[allow(clippy::expect_used)]
static BYLINE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:written\s+by|posted\s+by|by)\s*:?\s+").expect("valid regex"));

// ============================================================
// TITLE
// ============================================================

/// Title from the first non-empty `<h1>`.
#[must_use]
pub fn extract_dom_title(doc: &Document, original: Metadata) -> Metadata {
    let mut result = original;

    if result.title.is_some() {
        return result;
    }

    result.title = doc
        .select("h1")
        .nodes()
        .iter()
        .map(|h1| dom::normalize_whitespace(&h1.text()))
        .find(|text| !text.is_empty());

    result
}

// ============================================================
// DESCRIPTION
// ============================================================

/// Description from the first paragraph long enough to summarize the page.
#[must_use]
pub fn extract_dom_description(doc: &Document, original: Metadata, thresholds: &Thresholds) -> Metadata {
    let mut result = original;

    if result.description.is_some() {
        return result;
    }

    result.description = doc
        .select("p")
        .nodes()
        .iter()
        .map(|p| dom::normalize_whitespace(&p.text()))
        .find(|text| text.chars().count() >= thresholds.description_min_chars)
        .map(|text| truncate_at_word(&text, thresholds.description_max_chars));

    result
}

/// Cut `text` to at most `max_chars` characters at a word boundary,
/// appending an ellipsis when anything was dropped.
#[must_use]
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text.char_indices().nth(max_chars).map_or(text.len(), |(i, _)| i);
    let head = &text[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 => &head[..space],
        _ => head,
    };

    format!("{}...", head.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == ';'))
}

// ============================================================
// AUTHOR
// ============================================================

/// Author from a byline element.
#[must_use]
pub fn extract_dom_author(doc: &Document, original: Metadata) -> Metadata {
    let mut result = original;

    if result.author.is_some() {
        return result;
    }

    for node in doc.select(AUTHOR_SELECTOR).nodes() {
        let elem = Selection::from(*node);

        // <meta itemprop="author" content="..."> inside the body
        let text = dom::get_attribute(&elem, "content")
            .unwrap_or_else(|| dom::normalize_whitespace(&dom::text_content(&elem)));

        if let Some(name) = normalize_author(&text).filter(|n| validate_metadata_name(n)) {
            result.author = Some(name);
            break;
        }
    }

    result
}

/// Normalize author names: strip byline prefixes, emails, handles and
/// "and N more" suffixes.
fn normalize_author(name: &str) -> Option<String> {
    let name = BYLINE_PREFIX.replace(name.trim(), "");

    // Remove email addresses
    let name = EMAIL_PATTERN.replace_all(&name, "").trim().to_string();

    // Remove Twitter handles
    let name = TWITTER_PATTERN.replace_all(&name, "").trim().to_string();

    // Remove "and X more" patterns
    let name = MORE_PATTERN.replace(&name, "").trim().to_string();

    if name.chars().count() < 2 {
        None
    } else {
        Some(name)
    }
}

// ============================================================
// LANGUAGE AND DATES
// ============================================================

/// Language from `<html lang>`.
#[must_use]
pub fn extract_dom_language(doc: &Document, original: Metadata, issues: &mut Vec<Error>) -> Metadata {
    let mut result = original;

    if let Some(lang) = doc.select("html").attr("lang") {
        if !lang.trim().is_empty() {
            fill_language(&mut result, &lang, "html lang", issues);
        }
    }

    result
}

/// Dates from `<time datetime>` elements.
///
/// The first `<time>` fills the published date; a second one, or one marked
/// as an update, fills the modified date.
#[must_use]
pub fn extract_dom_dates(doc: &Document, original: Metadata, issues: &mut Vec<Error>) -> Metadata {
    let mut result = original;

    let mut published: Option<String> = None;
    let mut modified: Option<String> = None;

    for node in doc.select("time[datetime]").nodes() {
        let elem = Selection::from(*node);
        let Some(value) = dom::get_attribute(&elem, "datetime").filter(|v| !v.trim().is_empty()) else {
            continue;
        };

        let hint = format!(
            "{} {}",
            dom::class_and_id(&elem),
            dom::get_attribute(&elem, "itemprop").unwrap_or_default()
        )
        .to_lowercase();

        if hint.contains("modified") || hint.contains("updated") {
            modified.get_or_insert(value);
        } else if published.is_none() {
            published = Some(value);
        } else {
            modified.get_or_insert(value);
        }
    }

    fill_date(&mut result.published_date, published.as_ref(), "published_date", issues);
    fill_date(&mut result.modified_date, modified.as_ref(), "modified_date", issues);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unset() -> Metadata {
        Metadata {
            language: String::new(),
            ..Metadata::default()
        }
    }

    #[test]
    fn test_extract_dom_title_h1() {
        let doc = Document::from("<body><h1>  </h1><h1>Real  Headline</h1></body>");
        let metadata = extract_dom_title(&doc, unset());
        assert_eq!(metadata.title, Some("Real Headline".to_string()));
    }

    #[test]
    fn test_description_needs_substantial_paragraph() {
        let long = "word ".repeat(30);
        let html = format!("<body><p>Short intro.</p><p>{long}</p></body>");
        let doc = Document::from(html.as_str());

        let metadata = extract_dom_description(&doc, unset(), &Thresholds::default());
        let description = metadata.description.unwrap_or_default();
        assert!(description.starts_with("word word"));
        assert!(!description.contains("Short intro"));
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        assert_eq!(truncate_at_word("short text", 50), "short text");
        assert_eq!(truncate_at_word("alpha beta gamma delta", 13), "alpha beta...");
        assert!(truncate_at_word(&"é".repeat(400), 300).chars().count() <= 303);
    }

    #[test]
    fn test_byline_author() {
        let doc = Document::from(r#"<body><span class="byline">By Jane Doe</span></body>"#);
        let metadata = extract_dom_author(&doc, unset());
        assert_eq!(metadata.author, Some("Jane Doe".to_string()));
    }

    #[test]
    fn test_normalize_author() {
        assert_eq!(normalize_author("Written by Ann Lee"), Some("Ann Lee".to_string()));
        assert_eq!(normalize_author("John Smith @jsmith"), Some("John Smith".to_string()));
        assert_eq!(normalize_author("Ann Lee and 3 more"), Some("Ann Lee".to_string()));
        assert_eq!(normalize_author("x"), None);
    }

    #[test]
    fn test_html_lang() {
        let doc = Document::from(r#"<html lang="de-AT"><body></body></html>"#);
        let metadata = extract_dom_language(&doc, unset(), &mut Vec::new());
        assert_eq!(metadata.language, "de");
    }

    #[test]
    fn test_time_elements() {
        let doc = Document::from(
            r#"<body>
            <time class="updated" datetime="2024-02-01T00:00:00Z">Feb 1</time>
            <time datetime="2024-01-15">Jan 15</time>
            </body>"#,
        );
        let metadata = extract_dom_dates(&doc, unset(), &mut Vec::new());
        assert_eq!(
            metadata.published_date.map(|d| d.format("%Y-%m-%d").to_string()),
            Some("2024-01-15".to_string())
        );
        assert_eq!(
            metadata.modified_date.map(|d| d.format("%Y-%m-%d").to_string()),
            Some("2024-02-01".to_string())
        );
    }
}
