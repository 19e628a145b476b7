//! Noise Discard Patterns
//!
//! Identifies boilerplate elements (navigation, ads, social widgets, popups,
//! comment sections, newsletter prompts, cookie banners, related-content
//! rails) that the sanitizer removes, and the override that keeps such an
//! element when it carries real prose.

use dom_query::Selection;

use crate::link_density::is_link_dense;
use crate::options::Thresholds;
use crate::patterns::{ADVERTISEMENT_TOKEN, NAVIGATION_CLASS, NOISE_CLASS};
use crate::selector::content::has_relaxed_content;
use crate::selector::utils::{attr, class_tokens, id, id_class, tag};
use crate::selector::Rule;

/// Noise rules; an element matching any of them is a removal candidate.
pub static NOISE_RULES: &[Rule] = &[is_navigation, is_advertisement, is_page_chrome];

/// Rule: navigation menus, breadcrumbs, pagination and site headers/footers.
#[must_use]
pub fn is_navigation(sel: &Selection) -> bool {
    let tag = tag(sel);
    let role = attr(sel, "role").to_lowercase();

    tag == "nav"
        || matches!(role.as_str(), "navigation" | "menubar" | "banner" | "contentinfo")
        || (tag != "body" && NAVIGATION_CLASS.is_match(&id_class(sel)))
}

/// Rule: advertisements, matched on whole class tokens or the id.
///
/// Token matching keeps `shadow` or `heading` from looking like `ad`.
#[must_use]
pub fn is_advertisement(sel: &Selection) -> bool {
    class_tokens(sel).iter().any(|t| ADVERTISEMENT_TOKEN.is_match(t))
        || ADVERTISEMENT_TOKEN.is_match(&id(sel))
        || !attr(sel, "data-ad-slot").is_empty()
}

/// Rule: sidebars, social widgets, popups, comments, newsletter and cookie
/// prompts, related-content rails.
#[must_use]
pub fn is_page_chrome(sel: &Selection) -> bool {
    let tag = tag(sel);
    let role = attr(sel, "role").to_lowercase();

    tag == "aside"
        || matches!(role.as_str(), "complementary" | "dialog" | "alertdialog")
        || attr(sel, "aria-modal") == "true"
        || (tag != "body" && NOISE_CLASS.is_match(&id_class(sel)))
}

/// Whether the element matches any noise rule.
#[must_use]
pub fn is_noise_element(sel: &Selection) -> bool {
    NOISE_RULES.iter().any(|rule| rule(sel))
}

/// Whether an element is hidden from readers.
#[must_use]
pub fn is_hidden(sel: &Selection) -> bool {
    if sel.attr("hidden").is_some() || attr(sel, "aria-hidden").eq_ignore_ascii_case("true") {
        return true;
    }
    let style = attr(sel, "style").to_lowercase().replace(' ', "");
    style.contains("display:none") || style.contains("visibility:hidden")
}

/// Whether a noise-classed element should be kept anyway.
///
/// Link-dense blocks are never kept; otherwise the relaxed content test
/// decides, so a comment thread with real prose survives.
#[must_use]
pub fn should_preserve_element(sel: &Selection, thresholds: &Thresholds) -> bool {
    if is_link_dense(sel, thresholds.max_link_density) {
        return false;
    }
    has_relaxed_content(sel, thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;

    #[test]
    fn test_navigation() {
        let doc = dom::parse(
            r#"<nav id="n">x</nav><div id="m" class="main-menu">x</div><div id="p" class="post-body">x</div>"#,
        );
        assert!(is_navigation(&doc.select("#n")));
        assert!(is_navigation(&doc.select("#m")));
        assert!(!is_navigation(&doc.select("#p")));
    }

    #[test]
    fn test_advertisement_tokens() {
        let doc = dom::parse(
            r#"<div id="a" class="advertisement">Buy now</div><div id="b" class="shadow heading">x</div>"#,
        );
        assert!(is_advertisement(&doc.select("#a")));
        assert!(!is_advertisement(&doc.select("#b")));
    }

    #[test]
    fn test_page_chrome() {
        let doc = dom::parse(
            r#"<aside id="s">x</aside><div id="c" class="cookie-consent">x</div><div id="t" class="article">x</div>"#,
        );
        assert!(is_page_chrome(&doc.select("#s")));
        assert!(is_page_chrome(&doc.select("#c")));
        assert!(!is_noise_element(&doc.select("#t")));
    }

    #[test]
    fn test_hidden() {
        let doc = dom::parse(
            r#"<div id="a" hidden>x</div><div id="b" aria-hidden="true">x</div><div id="c" style="display: none">x</div><div id="d">x</div>"#,
        );
        assert!(is_hidden(&doc.select("#a")));
        assert!(is_hidden(&doc.select("#b")));
        assert!(is_hidden(&doc.select("#c")));
        assert!(!is_hidden(&doc.select("#d")));
    }

    #[test]
    fn test_preserve_prose_comments() {
        let thresholds = Thresholds::default();
        let prose = "This thoughtful reply explains in detail why the benchmark numbers differ \
                     between the two machines and what the author could change to make the \
                     comparison fair for everyone reading along.";
        let doc = dom::parse(&format!(r#"<div class="comments"><p>{prose}</p></div>"#));
        assert!(should_preserve_element(&doc.select(".comments"), &thresholds));
    }

    #[test]
    fn test_link_dense_never_preserved() {
        let thresholds = Thresholds::default();
        let links: String = (0..15).map(|i| format!(r##"<a href="#{i}">Section link {i}</a> "##)).collect();
        let doc = dom::parse(&format!("<nav>{links}</nav>"));
        assert!(!should_preserve_element(&doc.select("nav"), &thresholds));
    }
}
