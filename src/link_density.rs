//! Link Density
//!
//! Share of an element's text that sits inside links. Navigation menus,
//! tag clouds and "related" rails are mostly link text, while prose is not.

use dom_query::Selection;

use crate::dom;

/// Collect heuristics on link text.
///
/// Returns (total_link_length, num_non_empty_links)
fn collect_link_info(links: &Selection) -> (usize, usize) {
    let mut link_length = 0;
    let mut n_non_empty_links = 0;

    for link in links.iter() {
        let text = link.text();
        let text_length = text.trim().chars().count();

        if text_length == 0 {
            continue;
        }

        link_length += text_length;
        n_non_empty_links += 1;
    }

    (link_length, n_non_empty_links)
}

/// Ratio of link text to total text, in `0.0..=1.0`.
///
/// Elements without text have density `0.0`.
#[must_use]
pub fn link_density(element: &Selection) -> f64 {
    let text_tendril = dom::text_content(element);
    let text_length = text_tendril.trim().chars().count();
    if text_length == 0 {
        return 0.0;
    }

    let (link_length, _) = collect_link_info(&element.select("a"));
    (link_length as f64 / text_length as f64).min(1.0)
}

/// Whether the element is dominated by links.
///
/// True when link density exceeds `max_density`, or when the element holds
/// several links and nothing but link text.
#[must_use]
pub fn is_link_dense(element: &Selection, max_density: f64) -> bool {
    let links = element.select("a");
    if links.length() == 0 {
        return false;
    }

    let (_, n_non_empty_links) = collect_link_info(&links);
    if n_non_empty_links == 0 {
        // Only image or empty links: treat as chrome.
        return dom::element_word_count(element) < 5;
    }

    link_density(element) > max_density
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_query::Document;

    #[test]
    fn prose_has_low_density() {
        let doc = Document::from(
            "<div>Some long explanatory text with a single <a href='/x'>link</a> inside it.</div>",
        );
        let div = doc.select("div");
        assert!(link_density(&div) < 0.2);
        assert!(!is_link_dense(&div, 0.5));
    }

    #[test]
    fn navigation_is_link_dense() {
        let doc = Document::from(
            "<nav><a href='/'>Home</a> <a href='/about'>About</a> <a href='/blog'>Blog</a></nav>",
        );
        let nav = doc.select("nav");
        assert!(link_density(&nav) > 0.8);
        assert!(is_link_dense(&nav, 0.5));
    }

    #[test]
    fn empty_element_has_zero_density() {
        let doc = Document::from("<div></div>");
        assert_eq!(link_density(&doc.select("div")), 0.0);
    }

    #[test]
    fn no_links_is_never_dense() {
        let doc = Document::from("<div>just words</div>");
        assert!(!is_link_dense(&doc.select("div"), 0.0));
    }
}
