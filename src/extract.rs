//! Conversion pipeline.
//!
//! Sequences the stages of a conversion: locate the main content, sanitize a
//! clone of it, render Markdown, normalize, score. Metadata is read from the
//! full document independently and merged into the result.

use tracing::{debug, info};

use crate::converter;
use crate::document::RawDocument;
use crate::dom;
use crate::error::{Error, Result};
use crate::extractor::{collect_images, collect_links, content_stats, locate, sanitize};
use crate::frontmatter::{self, FrontmatterStats};
use crate::markdown;
use crate::metadata;
use crate::options::Options;
use crate::result::{ConversionResult, Metadata};
use crate::scoring;

/// Reject inputs beyond the configured size limit.
pub(crate) fn check_input_len(len: usize, options: &Options) -> Result<()> {
    if len > options.max_input_len {
        return Err(Error::InputTooLarge {
            len,
            max: options.max_input_len,
        });
    }
    Ok(())
}

/// Run the whole pipeline on a parsed document.
///
/// Every stage degrades instead of failing; anything lost along the way is
/// reported in [`ConversionResult::warnings`].
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn convert(raw: &RawDocument, options: &Options) -> Result<ConversionResult> {
    let mut warnings = Vec::new();

    // Metadata works on the full document, before any content selection
    let metadata = if options.include_metadata {
        let mut issues = Vec::new();
        let metadata = metadata::extract_metadata_with_issues(raw, options, &mut issues);
        warnings.extend(issues.iter().map(ToString::to_string));
        metadata
    } else {
        Metadata::default()
    };

    let candidate = locate(raw, options);
    let tree = sanitize(&candidate, raw.base_url(), options);
    debug!(removed_noise = tree.removed_noise(), "content ready for rendering");

    let (output, engine) = converter::render_markdown(&tree, options);
    warnings.extend(output.warnings);

    let markdown = markdown::normalize_markdown(&output.markdown);
    let word_count = dom::word_count(&markdown);

    let images = collect_images(&tree);
    let links = collect_links(&tree);
    let stats = content_stats(&tree, &images, &links);
    let report = scoring::score(word_count, &stats, &options.quality_weights);

    let frontmatter = if options.include_metadata && options.generate_frontmatter {
        let stats = FrontmatterStats {
            word_count,
            reading_time_minutes: report.reading_time_minutes,
            quality_score: report.quality_score,
        };
        frontmatter::render(&metadata, stats).unwrap_or_else(|err| {
            warnings.push(err.to_string());
            String::new()
        })
    } else {
        String::new()
    };

    info!(
        word_count,
        quality_score = report.quality_score,
        ?engine,
        warnings = warnings.len(),
        "converted document"
    );

    Ok(ConversionResult {
        markdown,
        frontmatter,
        metadata,
        images,
        links,
        word_count,
        reading_time_minutes: report.reading_time_minutes,
        quality_score: report.quality_score,
        stats,
        engine,
        warnings,
    })
}
