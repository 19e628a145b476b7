//! # clipmark
//!
//! Turns captured, already-rendered web pages into clean Markdown.
//!
//! A conversion locates the main content of the page, strips navigation,
//! advertisements and other noise from a copy of it, renders the result as
//! Markdown and scores how substantive it is. Page metadata is extracted
//! alongside and can be emitted as a YAML frontmatter block.
//!
//! ## Quick Start
//!
//! ```rust
//! use clipmark::{convert_html, Options};
//!
//! let html = r#"<html><head><title>My Article</title></head>
//! <body><nav><a href="/">Home</a></nav>
//! <article><h1>Hello</h1><p>Main content here.</p></article></body></html>"#;
//!
//! let result = convert_html(html, Some("https://example.com/post"), &Options::default())?;
//! assert_eq!(result.markdown, "# Hello\n\nMain content here.");
//! assert_eq!(result.metadata.title.as_deref(), Some("My Article"));
//! # Ok::<(), clipmark::Error>(())
//! ```
//!
//! ## Features
//!
//! - **Content Location**: Custom selectors, built-in semantic selectors, then container scoring
//! - **Sanitization**: Removes boilerplate while preserving substantive comment threads and the like
//! - **Two Engines**: A DOM tree walker and a regex fallback sharing one rule set
//! - **Metadata**: Open Graph, Twitter Card, meta tags, JSON-LD and DOM heuristics
//! - **Quality Score**: Bounded 0-100 substantiveness score and reading time
//!
//! Conversions are pure: the input document is never modified and the same
//! input always yields the same result.

mod error;
mod extract;
mod options;
mod patterns;
mod result;

/// Parsed input document.
pub mod document;

/// DOM helpers over `dom_query`.
pub mod dom;

/// Selector rules for content finding and noise detection.
pub mod selector;

/// Main content location, sanitization and asset collection.
pub mod extractor;

/// Markdown rendering engines and conversion rules.
pub mod converter;

/// Metadata extraction (JSON-LD, HTML meta tags, Open Graph).
pub mod metadata;

/// URL resolution and normalization.
pub mod url_utils;

/// Character encoding detection and transcoding.
pub mod encoding;

/// Quality score and reading time.
pub mod scoring;

/// Link density testing for boilerplate detection.
pub mod link_density;

/// Markdown escaping and normalization.
pub mod markdown;

/// YAML frontmatter generation.
pub mod frontmatter;

// Public API - re-exports
pub use converter::CustomRule;
pub use document::RawDocument;
pub use error::{Error, Result};
pub use metadata::extract_metadata;
pub use options::{BulletMarker, CodeBlockStyle, EnginePreference, HeadingStyle, LinkStyle, Options, Thresholds};
pub use result::{ContentStats, ConversionResult, EngineKind, ImageAsset, LinkRef, Metadata};

/// Converts a parsed document to Markdown.
///
/// # Arguments
///
/// * `raw` - The parsed document; it is read, never modified
/// * `options` - Rendering style and extraction behavior
///
/// # Returns
///
/// Returns `Ok(ConversionResult)` holding the Markdown body, frontmatter,
/// metadata, assets and quality stats. Degradations along the way are
/// reported in `warnings` rather than as errors.
///
/// # Example
///
/// ```rust
/// use clipmark::{convert_to_markdown, Options, RawDocument};
///
/// let raw = RawDocument::parse("<article><h2>Notes</h2><p>Short.</p></article>", None);
/// let result = convert_to_markdown(&raw, &Options::default())?;
/// assert_eq!(result.markdown, "## Notes\n\nShort.");
/// # Ok::<(), clipmark::Error>(())
/// ```
#[allow(clippy::missing_errors_doc)]
pub fn convert_to_markdown(raw: &RawDocument, options: &Options) -> Result<ConversionResult> {
    extract::convert(raw, options)
}

/// Parses an HTML string and converts it to Markdown.
///
/// # Arguments
///
/// * `html` - The HTML document as a string slice
/// * `base_url` - URL the page was captured from, used to resolve relative links
/// * `options` - Rendering style and extraction behavior
///
/// # Returns
///
/// Returns an empty result for empty or whitespace-only input, and
/// `Error::InputTooLarge` when `html` exceeds `options.max_input_len`.
///
/// # Example
///
/// ```rust
/// use clipmark::{convert_html, Options};
///
/// let html = r#"<pre><code class="language-javascript">function f(){return 1;}</code></pre>"#;
/// let result = convert_html(html, None, &Options::default())?;
/// assert_eq!(result.markdown, "```javascript\nfunction f(){return 1;}\n```");
/// # Ok::<(), clipmark::Error>(())
/// ```
#[allow(clippy::missing_errors_doc)]
pub fn convert_html(html: &str, base_url: Option<&str>, options: &Options) -> Result<ConversionResult> {
    extract::check_input_len(html.len(), options)?;
    if html.trim().is_empty() {
        return Ok(ConversionResult::empty());
    }

    let raw = RawDocument::parse(html, base_url);
    convert_to_markdown(&raw, options)
}

/// Converts HTML bytes with automatic encoding detection.
///
/// This function accepts HTML as raw bytes, detects the character encoding
/// and converts to UTF-8 before conversion.
///
/// # Character Encoding
///
/// The function detects encoding from:
/// - A UTF-8 or UTF-16 byte-order mark
/// - `<meta charset="...">`
/// - `<meta http-equiv="Content-Type" content="...; charset=...">`
/// - Defaults to UTF-8 if no declaration found
///
/// Invalid characters are replaced with � (Unicode replacement character)
/// rather than causing errors. Replacements and unknown charset labels are
/// listed in [`ConversionResult::warnings`].
///
/// # Example
///
/// ```rust
/// use clipmark::{convert_bytes, Options};
///
/// // ISO-8859-1 encoded HTML with charset declaration
/// let html = b"<html><head><meta charset=\"ISO-8859-1\"></head><body><article><p>Caf\xE9</p></article></body></html>";
/// let result = convert_bytes(html, None, &Options::default())?;
/// assert!(result.markdown.contains("Café"));
/// # Ok::<(), clipmark::Error>(())
/// ```
#[allow(clippy::missing_errors_doc)]
pub fn convert_bytes(html: &[u8], base_url: Option<&str>, options: &Options) -> Result<ConversionResult> {
    extract::check_input_len(html.len(), options)?;
    let decoded = encoding::decode(html);
    let mut result = convert_html(&decoded.text, base_url, options)?;
    result.warnings.splice(0..0, decoded.warnings);
    Ok(result)
}
