//! Main content location.
//!
//! Picks the single subtree most likely to hold the article body: caller
//! selectors first, then the built-in selector list, then a scoring pass
//! over block containers, then `<body>`.

use std::fmt;

use dom_query::{Document, Selection};
use tracing::debug;

use crate::document::RawDocument;
use crate::dom;
use crate::link_density::link_density;
use crate::options::Thresholds;
use crate::selector::content::{has_significant_content, is_content_like, is_semantic_container, CONTENT_SELECTORS};
use crate::selector::discard::{is_navigation, is_page_chrome};
use crate::selector::select_css;
use crate::Options;

/// How a content candidate was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateStrategy {
    /// Matched a caller-supplied selector.
    CustomSelector(String),
    /// Matched a built-in selector.
    Builtin(&'static str),
    /// Highest-scoring block container.
    Scored,
    /// Nothing better found; the whole body.
    Body,
}

impl fmt::Display for CandidateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CustomSelector(sel) => write!(f, "custom selector `{sel}`"),
            Self::Builtin(sel) => write!(f, "built-in selector `{sel}`"),
            Self::Scored => f.write_str("scored container"),
            Self::Body => f.write_str("body"),
        }
    }
}

/// The subtree chosen as main content.
#[derive(Debug, Clone)]
pub struct ContentCandidate<'a> {
    /// Selected element in the source document.
    pub node: Selection<'a>,
    /// Container score (word count for selector matches).
    pub score: f64,
    /// Strategy that produced the candidate.
    pub strategy: CandidateStrategy,
}

/// Locate the main content of a document. Never fails.
///
/// # Examples
///
/// ```
/// use clipmark::extractor::{locate, CandidateStrategy};
/// use clipmark::{Options, RawDocument};
///
/// let words = "word ".repeat(60);
/// let html = format!("<body><nav>Home</nav><article><p>{words}</p></article></body>");
/// let raw = RawDocument::parse(&html, None);
///
/// let candidate = locate(&raw, &Options::default());
/// assert_eq!(candidate.strategy, CandidateStrategy::Builtin("article"));
/// ```
#[must_use]
pub fn locate<'a>(raw: &'a RawDocument, options: &Options) -> ContentCandidate<'a> {
    let doc = raw.document();
    let root = document_root(doc);
    let thresholds = &options.thresholds;

    let candidate = find_by_custom_selectors(&root, &options.custom_selectors, thresholds)
        .or_else(|| find_by_builtin_selectors(&root, thresholds))
        .or_else(|| find_by_score(&root, options))
        .unwrap_or_else(|| body_candidate(doc));

    debug!(strategy = %candidate.strategy, score = candidate.score, "selected content candidate");

    candidate
}

/// Document node, so selectors can match `<html>` itself.
fn document_root(doc: &Document) -> Selection<'_> {
    Selection::from(doc.root())
}

fn find_by_custom_selectors<'a>(
    root: &Selection<'a>,
    selectors: &[String],
    thresholds: &Thresholds,
) -> Option<ContentCandidate<'a>> {
    selectors.iter().find_map(|css| {
        first_significant(root, css, thresholds).map(|node| ContentCandidate {
            score: dom::element_word_count(&node) as f64,
            node,
            strategy: CandidateStrategy::CustomSelector(css.clone()),
        })
    })
}

fn find_by_builtin_selectors<'a>(root: &Selection<'a>, thresholds: &Thresholds) -> Option<ContentCandidate<'a>> {
    CONTENT_SELECTORS.iter().find_map(|css| {
        first_significant(root, css, thresholds).map(|node| ContentCandidate {
            score: dom::element_word_count(&node) as f64,
            node,
            strategy: CandidateStrategy::Builtin(*css),
        })
    })
}

/// First match of `css`, in document order, with significant content.
fn first_significant<'a>(root: &Selection<'a>, css: &str, thresholds: &Thresholds) -> Option<Selection<'a>> {
    select_css(root, css)
        .into_iter()
        .find(|node| has_significant_content(node, thresholds))
}

/// Highest-scoring `div`, `section` or `article` with significant content.
///
/// Ties keep the earliest element in document order.
fn find_by_score<'a>(root: &Selection<'a>, options: &Options) -> Option<ContentCandidate<'a>> {
    let mut best: Option<ContentCandidate<'a>> = None;

    for node in root.select("div, section, article").nodes() {
        let sel = Selection::from(*node);
        if !has_significant_content(&sel, &options.thresholds) {
            continue;
        }

        let score = score_container(&sel, options);
        if best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(ContentCandidate {
                node: sel,
                score,
                strategy: CandidateStrategy::Scored,
            });
        }
    }

    best
}

/// Container score: words plus weighted children, adjusted for link density
/// and class names when enhanced scoring is on.
#[must_use]
pub fn score_container(sel: &Selection, options: &Options) -> f64 {
    let thresholds = &options.thresholds;
    let words = dom::element_word_count(sel) as f64;
    let children = dom::child_element_count(sel) as f64;

    let mut score = words + children * thresholds.child_weight;

    if options.enhanced_scoring {
        score -= link_density(sel) * words;

        if is_semantic_container(sel) {
            score += thresholds.semantic_tag_bonus;
        }
        if is_content_like(sel) {
            score += thresholds.content_class_bonus;
        }
        if is_navigation(sel) || is_page_chrome(sel) {
            score -= thresholds.navigation_class_penalty;
        }
    }

    score
}

fn body_candidate(doc: &Document) -> ContentCandidate<'_> {
    let body = doc.select("body");
    let node = if body.exists() { body } else { document_root(doc) };

    ContentCandidate {
        score: dom::element_word_count(&node) as f64,
        node,
        strategy: CandidateStrategy::Body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(word: &str, n: usize) -> String {
        vec![word; n].join(" ")
    }

    #[test]
    fn test_custom_selector_beats_builtin() {
        let html = format!(
            r#"<body><article><p>{}</p></article><div class="mine"><p>{}</p></div></body>"#,
            words("builtin", 80),
            words("custom", 60)
        );
        let raw = RawDocument::parse(&html, None);
        let options = Options {
            custom_selectors: vec![".mine".to_string()],
            ..Options::default()
        };

        let candidate = locate(&raw, &options);
        assert_eq!(candidate.strategy, CandidateStrategy::CustomSelector(".mine".to_string()));
        assert!(dom::text_content(&candidate.node).contains("custom"));
    }

    #[test]
    fn test_custom_selector_without_content_is_skipped() {
        let html = format!(
            r#"<body><div class="mine"><p>tiny</p></div><main><p>{}</p></main></body>"#,
            words("main", 60)
        );
        let raw = RawDocument::parse(&html, None);
        let options = Options {
            custom_selectors: vec!["p[[".to_string(), ".mine".to_string()],
            ..Options::default()
        };

        assert_eq!(locate(&raw, &options).strategy, CandidateStrategy::Builtin("main"));
    }

    #[test]
    fn test_builtin_priority_order() {
        let html = format!(
            r#"<body><div class="content"><p>{}</p></div><main><p>{}</p></main></body>"#,
            words("content", 60),
            words("main", 60)
        );
        let raw = RawDocument::parse(&html, None);
        assert_eq!(locate(&raw, &Options::default()).strategy, CandidateStrategy::Builtin("main"));
    }

    #[test]
    fn test_scoring_prefers_prose_over_links() {
        let links: String = (0..40).map(|i| format!(r##"<a href="#{i}">link {i} here</a> "##)).collect();
        let html = format!(
            r#"<body><div id="links"><p>{links}</p></div><div id="story"><p>{}</p><p>{}</p></div></body>"#,
            words("prose", 60),
            words("more", 40)
        );
        let raw = RawDocument::parse(&html, None);

        let candidate = locate(&raw, &Options::default());
        assert_eq!(candidate.strategy, CandidateStrategy::Scored);
        assert_eq!(dom::id(&candidate.node).as_deref(), Some("story"));
    }

    #[test]
    fn test_scoring_tie_keeps_earliest() {
        let html = format!(
            r#"<body><div id="first"><p>{0}</p></div><div id="second"><p>{0}</p></div></body>"#,
            words("same", 60)
        );
        let raw = RawDocument::parse(&html, None);
        let options = Options {
            enhanced_scoring: false,
            ..Options::default()
        };

        let candidate = locate(&raw, &options);
        assert_eq!(dom::id(&candidate.node).as_deref(), Some("first"));
    }

    #[test]
    fn test_falls_back_to_body() {
        let raw = RawDocument::parse("<body><p>Just a line.</p></body>", None);
        let candidate = locate(&raw, &Options::default());
        assert_eq!(candidate.strategy, CandidateStrategy::Body);
        assert_eq!(dom::tag_name(&candidate.node).as_deref(), Some("body"));
    }
}
