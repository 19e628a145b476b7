//! YAML frontmatter generation.
//!
//! The block is built only from extracted metadata and computed statistics,
//! never from the clock, so the same input always yields the same bytes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::result::Metadata;

/// Frontmatter fields, in output order.
#[derive(Debug, Serialize)]
struct Frontmatter<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<DateTime<Utc>>,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    site_name: Option<&'a str>,
    #[serde(skip_serializing_if = "no_keywords")]
    keywords: &'a [String],
    word_count: usize,
    reading_time_minutes: usize,
    quality_score: u8,
}

#[allow(clippy::ref_option_ref, clippy::trivially_copy_pass_by_ref)]
fn no_keywords(keywords: &&[String]) -> bool {
    keywords.is_empty()
}

/// Document statistics written alongside the metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterStats {
    /// Words in the Markdown body.
    pub word_count: usize,
    /// Estimated reading time.
    pub reading_time_minutes: usize,
    /// Quality score.
    pub quality_score: u8,
}

/// Render a `---` delimited YAML block, ending with a newline.
pub fn render(metadata: &Metadata, stats: FrontmatterStats) -> Result<String> {
    let data = Frontmatter {
        title: metadata.title.as_deref(),
        description: metadata.description.as_deref(),
        author: metadata.author.as_deref(),
        published: metadata.published_date,
        modified: metadata.modified_date,
        language: &metadata.language,
        url: metadata.canonical_url.as_deref(),
        site_name: metadata.site_name.as_deref(),
        keywords: &metadata.keywords,
        word_count: stats.word_count,
        reading_time_minutes: stats.reading_time_minutes,
        quality_score: stats.quality_score,
    };

    let yaml = serde_yaml::to_string(&data).map_err(|e| Error::Frontmatter(e.to_string()))?;
    // Older serde_yaml versions emit their own document marker.
    let body = yaml.strip_prefix("---\n").unwrap_or(&yaml);

    Ok(format!("---\n{}\n---\n", body.trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_present_fields_only() {
        let metadata = Metadata {
            title: Some("Hello: World".to_string()),
            keywords: vec!["rust".to_string(), "html".to_string()],
            ..Metadata::default()
        };
        let stats = FrontmatterStats {
            word_count: 120,
            reading_time_minutes: 1,
            quality_score: 40,
        };

        let out = render(&metadata, stats).unwrap();
        assert!(out.starts_with("---\n"));
        assert!(out.ends_with("\n---\n"));
        assert!(out.contains("title:") && out.contains("Hello: World"));
        assert!(out.contains("language: en"));
        assert!(out.contains("- rust\n- html"));
        assert!(out.contains("word_count: 120"));
        assert!(!out.contains("author"));
        assert!(!out.contains("description"));
    }

    #[test]
    fn dates_are_rfc3339() {
        let metadata = Metadata {
            published_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single(),
            ..Metadata::default()
        };
        let out = render(&metadata, FrontmatterStats::default()).unwrap();
        assert!(out.contains("published:") && out.contains("2024-03-01T12:00:00Z"));
    }

    #[test]
    fn output_is_stable() {
        let metadata = Metadata {
            title: Some("Same".to_string()),
            ..Metadata::default()
        };
        let a = render(&metadata, FrontmatterStats::default()).unwrap();
        let b = render(&metadata, FrontmatterStats::default()).unwrap();
        assert_eq!(a, b);
    }
}
