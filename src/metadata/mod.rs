//! Metadata extraction module.
//!
//! Reads page metadata from the full input document, independently of
//! content extraction. Sources are tried per field in priority order:
//! Open Graph, Twitter Card, standard meta tags, JSON-LD, then DOM
//! heuristics. The first non-empty value wins.

pub mod dom_extraction;
pub mod json_ld;
pub mod meta_tags;

use tracing::debug;

use crate::document::RawDocument;
use crate::error::Error;
use crate::result::{Metadata, DEFAULT_LANGUAGE};
use crate::url_utils;
use crate::Options;

pub use json_ld::extract_json_ld;
pub use meta_tags::{normalize_language, parse_meta_date, validate_metadata_name};

/// Extract all metadata from a document.
///
/// Never fails; malformed fields are skipped. Use
/// [`extract_metadata_with_issues`] to learn which fields were skipped.
///
/// # Examples
///
/// ```
/// use clipmark::{extract_metadata, Options, RawDocument};
///
/// let raw = RawDocument::parse(
///     r#"<html lang="fr"><head><meta property="og:title" content="Bonjour"></head></html>"#,
///     None,
/// );
/// let metadata = extract_metadata(&raw, &Options::default());
/// assert_eq!(metadata.title.as_deref(), Some("Bonjour"));
/// assert_eq!(metadata.language, "fr");
/// ```
#[must_use]
pub fn extract_metadata(raw: &RawDocument, opts: &Options) -> Metadata {
    let mut issues = Vec::new();
    extract_metadata_with_issues(raw, opts, &mut issues)
}

/// Extract all metadata, recording every skipped field in `issues`.
pub fn extract_metadata_with_issues(raw: &RawDocument, opts: &Options, issues: &mut Vec<Error>) -> Metadata {
    let doc = raw.document();
    let start = issues.len();

    // Empty language means "not found yet" until post-processing.
    let mut metadata = Metadata {
        language: String::new(),
        ..Metadata::default()
    };

    let tags = meta_tags::collect_head_tags(doc);
    let structured = json_ld::parse_scripts(doc);

    // 1. Open Graph
    metadata = meta_tags::apply_open_graph(&tags, metadata, issues);

    // 2. Twitter Card
    metadata = meta_tags::apply_twitter_card(&tags, metadata);

    // 3. Standard meta tags, <title>, canonical link
    metadata = meta_tags::apply_standard_meta(&tags, metadata, issues);

    // 4. JSON-LD
    metadata = json_ld::extract_json_ld(&structured, metadata, issues);

    // 5. DOM heuristics
    metadata = dom_extraction::extract_dom_title(doc, metadata);
    metadata = dom_extraction::extract_dom_description(doc, metadata, &opts.thresholds);
    metadata = dom_extraction::extract_dom_author(doc, metadata);
    metadata = dom_extraction::extract_dom_language(doc, metadata, issues);
    metadata = dom_extraction::extract_dom_dates(doc, metadata, issues);

    metadata.open_graph = tags.open_graph;
    metadata.twitter_card = tags.twitter;
    metadata.structured_data = structured;

    for issue in &issues[start..] {
        debug!(%issue, "skipped metadata field");
    }

    post_process_metadata(metadata, raw)
}

/// Apply defaults, resolve URLs against the base and derive the hostname.
fn post_process_metadata(mut metadata: Metadata, raw: &RawDocument) -> Metadata {
    for field in [
        &mut metadata.title,
        &mut metadata.description,
        &mut metadata.author,
        &mut metadata.site_name,
        &mut metadata.canonical_url,
        &mut metadata.image,
    ] {
        if let Some(value) = field.as_mut() {
            *value = value.trim().to_string();
        }
        if field.as_deref().is_some_and(str::is_empty) {
            *field = None;
        }
    }

    if metadata.language.is_empty() {
        metadata.language = DEFAULT_LANGUAGE.to_string();
    }

    let base = raw.base_url();
    metadata.canonical_url = metadata.canonical_url.map(|u| url_utils::resolve_url(&u, base));
    metadata.image = metadata.image.map(|u| url_utils::resolve_url(&u, base));

    metadata.hostname = base
        .and_then(|b| url_utils::extract_hostname(b.as_str()))
        .or_else(|| metadata.canonical_url.as_deref().and_then(url_utils::extract_hostname));

    metadata
}
