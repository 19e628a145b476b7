//! Utility functions for selector pattern matching
//!
//! Attribute accessors returning empty strings instead of `Option`, so rules
//! read as plain boolean expressions.

use dom_query::Selection;

use crate::dom;

// === Element Attribute Helpers ===

/// Get element ID attribute (empty string if missing)
#[inline]
#[must_use]
pub fn id(sel: &Selection) -> String {
    dom::id(sel).unwrap_or_default()
}

/// Get element class attribute (empty string if missing)
#[inline]
#[must_use]
pub fn class(sel: &Selection) -> String {
    dom::class_name(sel).unwrap_or_default()
}

/// Get any attribute (empty string if missing)
#[inline]
#[must_use]
pub fn attr(sel: &Selection, name: &str) -> String {
    dom::get_attribute(sel, name).unwrap_or_default()
}

/// Get tag name (empty string if missing)
#[inline]
#[must_use]
pub fn tag(sel: &Selection) -> String {
    dom::tag_name(sel).unwrap_or_default()
}

/// Class and id joined by a space (empty string if both missing)
#[inline]
#[must_use]
pub fn id_class(sel: &Selection) -> String {
    dom::class_and_id(sel)
}

/// Whether the element has the given (lowercase) tag name
#[inline]
#[must_use]
pub fn is_tag(sel: &Selection, expected: &str) -> bool {
    tag(sel) == expected
}

/// Whether the element's tag is one of `tags`
#[must_use]
pub fn is_one_of_tags(sel: &Selection, tags: &[&str]) -> bool {
    let tag = tag(sel);
    tags.iter().any(|t| *t == tag)
}

/// Whitespace-separated class tokens, lowercased.
#[must_use]
pub fn class_tokens(sel: &Selection) -> Vec<String> {
    class(sel).split_whitespace().map(str::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attributes_are_empty() {
        let doc = dom::parse("<p>text</p>");
        let p = doc.select("p");
        assert_eq!(id(&p), "");
        assert_eq!(class(&p), "");
        assert_eq!(attr(&p, "role"), "");
        assert_eq!(tag(&p), "p");
    }

    #[test]
    fn test_is_one_of_tags() {
        let doc = dom::parse("<section>x</section>");
        let section = doc.select("section");
        assert!(is_one_of_tags(&section, &["article", "section"]));
        assert!(!is_tag(&section, "div"));
    }

    #[test]
    fn test_class_tokens() {
        let doc = dom::parse(r#"<div class="Note  callout-Warning">x</div>"#);
        assert_eq!(class_tokens(&doc.select("div")), vec!["note", "callout-warning"]);
    }
}
