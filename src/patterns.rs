//! Compiled regex patterns and CSS selectors for content extraction.
//!
//! All patterns are compiled once at startup using `LazyLock` for efficiency.
//! Patterns are organized by their purpose in the pipeline.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Noise Detection Patterns
// =============================================================================

/// Matches class/id names indicating navigation elements.
///
/// "nav" is anchored to a token edge so layout containers like
/// `in-page-nav-container` are not matched.
pub static NAVIGATION_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(^nav$|^nav[-_]|[-_]nav$|\bnav\b|navbar|navigation|top[-_]?nav|main[-_]?menu|site[-_]?nav|\bmenu\b|site[-_]?footer|site[-_]?header|page[-_]?footer|breadcrumbs?|pagination|\bpager\b|skip[-_]?link)",
    )
    .expect("NAVIGATION_CLASS regex")
});

/// Matches a single class token (or id) naming an advertisement.
pub static ADVERTISEMENT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(ad|ads|adv|advert|adverts|advertisement|advertising|ad[-_]?(?:slot|unit|container|wrapper|banner|box)|banner[-_]?ad|google[-_]?ads?|dfp[-_].*|sponsor|sponsored|sponsored[-_]content|promo|promoted|promotion)$",
    )
    .expect("ADVERTISEMENT_TOKEN regex")
});

/// Matches class/id names of non-substantive page chrome.
///
/// Comments, related rails and social widgets are noise by default; the
/// preserve override can still keep them when they carry real prose.
pub static NOISE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\bcomments?\b|comment[-_]?(?:list|section|area)|disqus|\bshar(?:e|ing)\b|share[-_]?(?:buttons?|bar|links)|social|\bsidebar\b|\bwidget\b|popup|pop[-_]up|\bmodal\b|overlay|lightbox|newsletter|\bsubscribe\b|subscription|sign[-_]?up[-_]?form|cookie|consent|gdpr|related|recommend(?:ed|ations)?|you[-_]?may[-_]?like|more[-_]?stories|read[-_]?next|trending|most[-_]?(?:read|popular)|taboola|outbrain|\bbanner\b|\btoolbar\b|\bfollow[-_]?us\b)",
    )
    .expect("NOISE_CLASS regex")
});

// =============================================================================
// Content Identification Patterns
// =============================================================================

/// Matches class/id names likely to contain main content.
pub static CONTENT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(article|content|post|entry|story|text|body|main|prose|markdown)")
        .expect("CONTENT_CLASS regex")
});

// =============================================================================
// Semantic Hint Patterns (class tokens that survive sanitization)
// =============================================================================

/// Matches class names naming a code language.
///
/// Capture group 1 is the language. Covers `language-x`, `lang-x`,
/// `brush-x`, `brush: x`, `highlight-x` and `highlight-source-x`.
pub static CODE_LANGUAGE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s;])(?:language|lang|brush|highlight-source|highlight)(?:-|:\s*)([a-z0-9+#]+)",
    )
    .expect("CODE_LANGUAGE_CLASS regex")
});

/// Matches class tokens marking a block of code.
pub static CODE_BLOCK_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(^|\s)(code|code[-_]?block|codehilite|highlight|snippet|source[-_]?code|syntax|prettyprint|hljs)(\s|$)",
    )
    .expect("CODE_BLOCK_CLASS regex")
});

/// Matches class tokens marking a quotation.
pub static QUOTE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|\s)(quote|blockquote|pull[-_]?quote|testimonial)(\s|$)")
        .expect("QUOTE_CLASS regex")
});

/// Matches class tokens marking a quote attribution.
pub static ATTRIBUTION_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|\s)(attribution|quote[-_]?(?:author|source|cite)|cite)(\s|$)")
        .expect("ATTRIBUTION_CLASS regex")
});

/// Matches class tokens marking an image caption.
pub static CAPTION_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|\s)(caption|wp-caption-text|image[-_]?caption|figure[-_]?caption|img[-_]?caption)(\s|$)")
        .expect("CAPTION_CLASS regex")
});

/// Matches class tokens marking a definition term.
pub static TERM_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|\s)(term|glossary[-_]?term|definition[-_]?term|dt)(\s|$)")
        .expect("TERM_CLASS regex")
});

/// Matches class tokens marking a definition body.
pub static DEFINITION_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|\s)(definition|glossary[-_]?definition|description|dd)(\s|$)")
        .expect("DEFINITION_CLASS regex")
});

/// Matches a class token naming a callout, e.g. `warning`, `callout-tip`,
/// `admonition`.
///
/// Capture group 1 is the callout type, absent for bare container tokens.
pub static CALLOUT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:callout|admonition|alert|notice|message)[-_]?)?(warning|caution|danger|info|information|note|tip|hint|important)$|^(?:callout|admonition)$",
    )
    .expect("CALLOUT_CLASS regex")
});

/// Matches a callout keyword opening a block, e.g. `Warning:`.
///
/// Capture group 1 is the keyword.
pub static CALLOUT_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(warning|caution|danger|info|information|note|tip|hint|important)\s*:")
        .expect("CALLOUT_LEAD regex")
});

/// Matches a `text-align` declaration inside a style attribute.
pub static TEXT_ALIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)text-align\s*:\s*(left|right|center|start|end)")
        .expect("TEXT_ALIGN regex")
});

// =============================================================================
// Text Cleaning Patterns
// =============================================================================

/// Matches multiple whitespace characters for normalization.
pub static WHITESPACE_NORMALIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_NORMALIZE regex"));

/// Matches runs of three or more newlines (optionally with blank-space lines).
pub static MULTIPLE_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("MULTIPLE_NEWLINES regex"));

// =============================================================================
// CSS Selectors
// =============================================================================

/// Selector for author bylines in the DOM.
pub const AUTHOR_SELECTOR: &str = "[rel='author'], [itemprop='author'], .author, .byline";

/// Tags that always leave the sanitized tree, regardless of content.
pub const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "object", "embed", "svg", "canvas",
    "link", "meta", "input", "button", "select", "textarea", "option", "label",
    "dialog", "frame", "frameset", "applet", "audio", "video", "source", "track", "map", "area",
];

/// Tags whose presence marks a block as carrying real content.
pub const SEMANTIC_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "dl", "table", "blockquote", "pre",
    "code", "figure",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_class_matches_nav_elements() {
        assert!(NAVIGATION_CLASS.is_match("main-nav"));
        assert!(NAVIGATION_CLASS.is_match("sidebar-menu"));
        assert!(NAVIGATION_CLASS.is_match("site-footer"));
        assert!(!NAVIGATION_CLASS.is_match("article-content"));
    }

    #[test]
    fn advertisement_token_is_whole_token() {
        assert!(ADVERTISEMENT_TOKEN.is_match("advertisement"));
        assert!(ADVERTISEMENT_TOKEN.is_match("ad-slot"));
        assert!(!ADVERTISEMENT_TOKEN.is_match("heading"));
        assert!(!ADVERTISEMENT_TOKEN.is_match("shadow"));
    }

    #[test]
    fn noise_class_covers_widgets() {
        for name in ["comments", "share-buttons", "cookie-banner", "newsletter-signup", "related-posts"] {
            assert!(NOISE_CLASS.is_match(name), "{name}");
        }
        assert!(!NOISE_CLASS.is_match("post-body"));
    }

    #[test]
    fn code_language_class_variants() {
        let lang = |class: &str| {
            CODE_LANGUAGE_CLASS
                .captures(class)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };
        assert_eq!(lang("language-python").as_deref(), Some("python"));
        assert_eq!(lang("hljs lang-rust").as_deref(), Some("rust"));
        assert_eq!(lang("brush: js").as_deref(), Some("js"));
        assert_eq!(lang("highlight-source-go").as_deref(), Some("go"));
        assert_eq!(lang("prettyprint"), None);
    }

    #[test]
    fn callout_class_tokens() {
        let kind = |token: &str| {
            CALLOUT_CLASS
                .captures(token)
                .map(|c| c.get(1).map(|m| m.as_str().to_lowercase()))
        };
        assert_eq!(kind("warning"), Some(Some("warning".to_string())));
        assert_eq!(kind("callout-Tip"), Some(Some("tip".to_string())));
        assert_eq!(kind("admonition"), Some(None));
        assert_eq!(kind("notes-list"), None);
    }

    #[test]
    fn text_align_reads_style() {
        let caps = TEXT_ALIGN.captures("color: red; text-align: right");
        assert_eq!(caps.and_then(|c| c.get(1)).map(|m| m.as_str()), Some("right"));
    }

    #[test]
    fn whitespace_normalize_collapses_spaces() {
        let result = WHITESPACE_NORMALIZE.replace_all("hello   world", " ");
        assert_eq!(result, "hello world");
    }
}
