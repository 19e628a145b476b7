//! Result types for conversion output.
//!
//! This module defines the structured output of a conversion: the Markdown
//! body, the separately returned frontmatter, page metadata, collected
//! assets and the statistics used for downstream triage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An image found in the converted content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageAsset {
    /// Absolute image URL, or the original string when it cannot be resolved.
    pub src: String,

    /// Alt text (empty when missing).
    pub alt: String,

    /// Title attribute (empty when missing).
    pub title: String,

    /// Declared width, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Declared height, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A hyperlink found in the converted content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkRef {
    /// Absolute link target, or the original string when it cannot be resolved.
    pub href: String,

    /// Link text.
    pub text: String,

    /// Title attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Content counts feeding the quality score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    /// Non-empty paragraphs in the sanitized content.
    pub paragraphs: usize,
    /// Headings in the sanitized content.
    pub headings: usize,
    /// Images collected from the content.
    pub images: usize,
    /// Links collected from the content.
    pub links: usize,
}

/// Which engine rendered the Markdown body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Tree-walking engine.
    #[default]
    Dom,
    /// String/regex engine.
    Regex,
}

/// Result of converting an HTML document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionResult {
    /// Markdown body.
    pub markdown: String,

    /// YAML frontmatter block (empty when disabled).
    ///
    /// Returned separately so the caller controls final file assembly.
    pub frontmatter: String,

    /// Page metadata.
    pub metadata: Metadata,

    /// Images found in the content.
    pub images: Vec<ImageAsset>,

    /// Links found in the content.
    pub links: Vec<LinkRef>,

    /// Words in the final Markdown.
    pub word_count: usize,

    /// Estimated reading time in minutes.
    pub reading_time_minutes: usize,

    /// Heuristic substantiveness score in `0..=100`.
    pub quality_score: u8,

    /// Counts behind the quality score.
    pub stats: ContentStats,

    /// Engine that rendered the body.
    pub engine: EngineKind,

    /// Non-fatal degradations encountered during conversion.
    pub warnings: Vec<String>,
}

impl ConversionResult {
    /// An empty but valid result, used for empty input.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            metadata: Metadata::default(),
            ..Self::default()
        }
    }
}

/// Metadata extracted from an HTML document.
///
/// All fields are optional except `language`, which defaults to `"en"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Page title.
    pub title: Option<String>,

    /// Page description.
    pub description: Option<String>,

    /// Author name.
    pub author: Option<String>,

    /// Primary language subtag, lowercase.
    pub language: String,

    /// Publication date.
    pub published_date: Option<DateTime<Utc>>,

    /// Last modification date.
    pub modified_date: Option<DateTime<Utc>>,

    /// Canonical URL.
    pub canonical_url: Option<String>,

    /// Keywords, in source order without duplicates.
    pub keywords: Vec<String>,

    /// Every Open Graph (`og:*`, `article:*`) property.
    pub open_graph: BTreeMap<String, String>,

    /// Every Twitter Card (`twitter:*`) property.
    pub twitter_card: BTreeMap<String, String>,

    /// Site name.
    pub site_name: Option<String>,

    /// Main image URL.
    pub image: Option<String>,

    /// Hostname of the canonical or base URL.
    pub hostname: Option<String>,

    /// Raw JSON-LD objects that parsed successfully.
    pub structured_data: Vec<serde_json::Value>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            author: None,
            language: DEFAULT_LANGUAGE.to_string(),
            published_date: None,
            modified_date: None,
            canonical_url: None,
            keywords: Vec::new(),
            open_graph: BTreeMap::new(),
            twitter_card: BTreeMap::new(),
            site_name: None,
            image: None,
            hostname: None,
            structured_data: Vec::new(),
        }
    }
}

/// Language reported when the document declares none.
pub const DEFAULT_LANGUAGE: &str = "en";
