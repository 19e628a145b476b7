//! Content selector rules
//!
//! Recognizes the main content container of a page: a fixed, ordered list
//! of selectors tried before any scoring, and the content-volume tests a
//! match must pass to be accepted.

use dom_query::Selection;

use crate::dom;
use crate::options::Thresholds;
use crate::patterns::{CONTENT_CLASS, SEMANTIC_TAGS};
use crate::selector::utils::{id_class, is_one_of_tags};

/// Built-in content selectors, in priority order.
///
/// Semantic elements come first, then common CMS class and id names.
pub static CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    "[itemprop='articleBody']",
    ".post-content",
    ".entry-content",
    ".article-body",
    ".article-content",
    ".story-body",
    "#content",
    ".content",
    "#main",
];

/// Whether an element holds enough content to be the article body.
///
/// Requires `significant_min_words` words and `significant_min_children`
/// child elements.
#[must_use]
pub fn has_significant_content(sel: &Selection, thresholds: &Thresholds) -> bool {
    dom::child_element_count(sel) >= thresholds.significant_min_children
        && dom::element_word_count(sel) >= thresholds.significant_min_words
}

/// Relaxed content test used to rescue noise-classed blocks.
///
/// True when the element has more than `relaxed_min_words` words, or holds a
/// semantic descendant and at least `relaxed_semantic_min_words` words.
#[must_use]
pub fn has_relaxed_content(sel: &Selection, thresholds: &Thresholds) -> bool {
    let words = dom::element_word_count(sel);
    if words > thresholds.relaxed_min_words {
        return true;
    }
    words >= thresholds.relaxed_semantic_min_words && has_semantic_descendant(sel)
}

/// Whether any descendant is a heading, paragraph, list, table, quote,
/// code block or figure.
#[must_use]
pub fn has_semantic_descendant(sel: &Selection) -> bool {
    sel.nodes().first().is_some_and(|node| {
        node.descendants()
            .iter()
            .filter_map(dom::node_tag)
            .any(|tag| SEMANTIC_TAGS.contains(&tag.as_str()))
    })
}

/// Rule: sectioning elements that earn the semantic bonus when scored.
#[must_use]
pub fn is_semantic_container(sel: &Selection) -> bool {
    is_one_of_tags(sel, &["article", "section"])
}

/// Rule: class or id names typical of article bodies.
#[must_use]
pub fn is_content_like(sel: &Selection) -> bool {
    CONTENT_CLASS.is_match(&id_class(sel))
}
