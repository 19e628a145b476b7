//! Selector Infrastructure
//!
//! Rules are plain predicate functions over a `Selection`, used by the
//! locator to recognize content containers and by the sanitizer to recognize
//! boilerplate. CSS selectors supplied by callers go through [`select_css`],
//! which treats an invalid selector as matching nothing.

use dom_query::{Matcher, Selection};
use tracing::debug;

pub mod content;
pub mod discard;
pub mod utils;

/// A selector rule that tests if a selection matches certain criteria
pub type Rule = fn(&Selection) -> bool;

/// Query for all elements matching the rule, in document order
///
/// # Example
///
/// ```rust
/// use clipmark::selector::{self, utils};
/// use clipmark::dom;
///
/// let doc = dom::parse(r#"<div><p class="content">a</p><p>b</p><p class="content">c</p></div>"#);
/// let root = doc.select("div");
///
/// fn has_content_class(sel: &dom_query::Selection) -> bool {
///     utils::class(sel).contains("content")
/// }
///
/// assert_eq!(selector::query_all(&root, has_content_class).len(), 2);
/// ```
#[must_use]
pub fn query_all<'a>(root: &Selection<'a>, rule: Rule) -> Vec<Selection<'a>> {
    root.select("*")
        .nodes()
        .iter()
        .map(|node| Selection::from(*node))
        .filter(|sel| rule(sel))
        .collect()
}

/// Elements under `root` matching the CSS selector, in document order.
///
/// An invalid selector matches nothing.
#[must_use]
pub fn select_css<'a>(root: &Selection<'a>, css: &str) -> Vec<Selection<'a>> {
    match Matcher::new(css) {
        Ok(matcher) => root
            .select_matcher(&matcher)
            .nodes()
            .iter()
            .map(|node| Selection::from(*node))
            .collect(),
        Err(_) => {
            debug!(selector = css, "ignoring invalid CSS selector");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;

    #[test]
    fn test_query_all_preserves_document_order() {
        let doc = dom::parse(
            r#"
            <div>
                <p class="item">1</p>
                <section>
                    <p class="item">2</p>
                </section>
                <p class="item">3</p>
            </div>
        "#,
        );
        let root = doc.select("div");

        fn is_item(sel: &Selection) -> bool {
            utils::class(sel).contains("item")
        }

        let results = query_all(&root, is_item);
        let texts: Vec<String> = results.iter().map(|s| dom::text_content(s).to_string()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_select_css_invalid_selector_matches_nothing() {
        let doc = dom::parse("<div><p>content</p></div>");
        let root = doc.select("html");
        assert!(select_css(&root, "p[[").is_empty());
        assert_eq!(select_css(&root, "div > p").len(), 1);
    }
}
