//! DOM Operations Adapter
//!
//! Thin helpers over the `dom_query` crate shared by the locator, the
//! sanitizer and the DOM conversion engine. Helpers taking a `Selection`
//! look at its first node; helpers taking a `NodeRef` are used by tree walks.

pub use dom_query::{Document, NodeRef, Selection};

pub use tendril::StrTendril;

use crate::patterns::WHITESPACE_NORMALIZE;

// === Attribute Operations ===

/// Get element ID attribute
#[inline]
#[must_use]
pub fn id(sel: &Selection) -> Option<String> {
    sel.attr("id").map(|s| s.to_string())
}

/// Get element class attribute
#[inline]
#[must_use]
pub fn class_name(sel: &Selection) -> Option<String> {
    sel.attr("class").map(|s| s.to_string())
}

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Class and id joined by a space, for pattern matching.
#[must_use]
pub fn class_and_id(sel: &Selection) -> String {
    let mut out = class_name(sel).unwrap_or_default();
    if let Some(id) = id(sel) {
        out.push(' ');
        out.push_str(&id);
    }
    out
}

/// Get all attributes as key-value pairs
///
/// Returns empty vector if node has no attributes or if selection is empty.
#[must_use]
pub fn get_all_attributes(sel: &Selection) -> Vec<(String, String)> {
    sel.nodes()
        .first()
        .map(|node| {
            node.attrs()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes().first().and_then(node_tag)
}

/// Lowercase tag name of an element node, `None` for text and other nodes.
#[must_use]
pub fn node_tag(node: &NodeRef) -> Option<String> {
    if !node.is_element() {
        return None;
    }
    node.node_name().map(|t| t.to_ascii_lowercase())
}

/// Whether the tag is a heading (`h1`..`h6`).
#[must_use]
pub fn is_heading_tag(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

// === Text Content ===

/// Get all text content of node and descendants
#[inline]
#[must_use]
pub fn text_content(sel: &Selection) -> StrTendril {
    sel.text()
}

/// Get outer HTML content
#[inline]
#[must_use]
pub fn outer_html(sel: &Selection) -> StrTendril {
    sel.html()
}

/// Collapse all whitespace runs to single spaces and trim.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_NORMALIZE.replace_all(text, " ").trim().to_string()
}

/// Count words: whitespace-separated tokens with at least one alphanumeric
/// character.
///
/// Markdown syntax tokens (`#`, `>`, `-`, `|`, fences) are not words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .count()
}

/// Words in the text content of the selection.
#[must_use]
pub fn element_word_count(sel: &Selection) -> usize {
    word_count(&sel.text())
}

/// Leading text of a node in document order, stopping once `max_chars`
/// non-whitespace characters are collected or `max_nodes` nodes visited.
///
/// Unlike [`text_content`], the cost does not depend on the subtree size.
#[must_use]
pub fn leading_text(node: &NodeRef, max_chars: usize, max_nodes: usize) -> String {
    let mut lead = String::new();
    let mut collected = 0;
    let mut stack = vec![*node];
    let mut visited = 0;

    while let Some(current) = stack.pop() {
        visited += 1;
        if visited > max_nodes {
            break;
        }
        if current.is_text() {
            let text = current.text();
            lead.push_str(&text);
            collected += text.chars().filter(|c| !c.is_whitespace()).count();
            if collected >= max_chars {
                break;
            }
        } else if current.is_element() {
            stack.extend(current.children().into_iter().rev());
        }
    }
    lead
}

// === Tree Navigation ===

/// Number of direct element children.
#[must_use]
pub fn child_element_count(sel: &Selection) -> usize {
    sel.nodes()
        .first()
        .map_or(0, |node| node.children().iter().filter(|c| c.is_element()).count())
}

/// Get next element sibling (skipping text nodes)
#[must_use]
pub fn next_element_sibling<'a>(sel: &Selection<'a>) -> Option<Selection<'a>> {
    sel.nodes().first().and_then(|node| {
        let mut sibling = node.next_sibling();
        while let Some(s) = sibling {
            if s.is_element() {
                return Some(Selection::from(s));
            }
            sibling = s.next_sibling();
        }
        None
    })
}

/// Deepest element nesting below `node` (the node itself counts as 1).
///
/// Iterative so pathological documents cannot overflow the stack here.
#[must_use]
pub fn tree_depth(node: &NodeRef) -> usize {
    let mut max_depth = 0;
    let mut stack = vec![(*node, 1usize)];
    while let Some((current, depth)) = stack.pop() {
        max_depth = max_depth.max(depth);
        for child in current.children() {
            if child.is_element() {
                stack.push((child, depth + 1));
            }
        }
    }
    max_depth
}

// === Cloning ===

/// Deep-clone an element into a new, independent document.
///
/// The clone is re-parsed from the element's outer HTML, so mutations on it
/// never reach the source document.
#[must_use]
pub fn clone_element(sel: &Selection) -> Document {
    Document::from(outer_html(sel))
}

// === Parsing ===

/// Parse HTML string into document
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_select() {
        let doc = parse(r#"<div id="main" class="container">content</div>"#);
        let div = doc.select("div");

        assert_eq!(id(&div), Some("main".to_string()));
        assert_eq!(class_name(&div), Some("container".to_string()));
        assert_eq!(class_and_id(&div), "container main");
    }

    #[test]
    fn test_missing_attributes_return_none() {
        let doc = parse(r#"<div>no attributes</div>"#);
        let div = doc.select("div");

        assert_eq!(id(&div), None);
        assert_eq!(class_name(&div), None);
        assert_eq!(get_attribute(&div, "data-test"), None);
        assert!(get_all_attributes(&div).is_empty());
    }

    #[test]
    fn test_tag_name() {
        let doc = parse(r#"<article><section>content</section></article>"#);
        assert_eq!(tag_name(&doc.select("article")), Some("article".to_string()));
        assert_eq!(tag_name(&doc.select("section")), Some("section".to_string()));
        assert_eq!(tag_name(&doc.select("span")), None);
    }

    #[test]
    fn word_count_ignores_markdown_syntax() {
        assert_eq!(word_count("# Title\n\n> quoted - text | cell"), 4);
        assert_eq!(word_count("```\n---\n```"), 0);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("it's 2024, *really*"), 3);
    }

    #[test]
    fn leading_text_stops_early() {
        let doc = parse("<div>\n  <p><strong>Note</strong>: first</p><p>second paragraph</p></div>");
        let node = doc.select("div").nodes().first().copied();

        let lead = node.map(|n| leading_text(&n, 8, 64)).unwrap_or_default();
        assert_eq!(lead, "\n  Note: first");

        let capped = node.map(|n| leading_text(&n, 1000, 3)).unwrap_or_default();
        assert_eq!(capped, "\n  ");
    }

    #[test]
    fn child_element_count_skips_text() {
        let doc = parse("<div>text <p>a</p> more <p>b</p></div>");
        assert_eq!(child_element_count(&doc.select("div")), 2);
    }

    #[test]
    fn test_next_element_sibling() {
        let doc = parse(r#"<div><p id="first">First</p>  <span id="second">Second</span></div>"#);

        let next = next_element_sibling(&doc.select("#first"));
        assert_eq!(next.and_then(|s| tag_name(&s)), Some("span".to_string()));

        assert!(next_element_sibling(&doc.select("#second")).is_none());
    }

    #[test]
    fn tree_depth_counts_nesting() {
        let doc = parse("<div id='root'><div><div><span>x</span></div></div><p>y</p></div>");
        let root = doc.select("#root");
        let node = root.nodes().first().copied();
        assert_eq!(node.map(|n| tree_depth(&n)), Some(4));
    }

    #[test]
    fn clone_element_is_independent() {
        let doc = parse(r#"<div id="original"><p>content</p></div>"#);
        let cloned = clone_element(&doc.select("#original"));

        cloned.select("p").remove();
        assert!(doc.select("#original p").exists());
        assert!(cloned.select("#original").exists());
    }

    #[test]
    fn normalize_whitespace_collapses_runs() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }
}
