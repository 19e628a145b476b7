//! Images, links and content counts gathered from the sanitized tree.

use dom_query::Selection;

use crate::dom;
use crate::result::{ContentStats, ImageAsset, LinkRef};

use super::sanitizer::SanitizedTree;

/// Every image with a source, in document order.
#[must_use]
pub fn collect_images(tree: &SanitizedTree) -> Vec<ImageAsset> {
    tree.root()
        .select("img")
        .nodes()
        .iter()
        .map(|n| Selection::from(*n))
        .filter_map(|img| {
            let src = dom::get_attribute(&img, "src")?.trim().to_string();
            if src.is_empty() {
                return None;
            }
            Some(ImageAsset {
                src,
                alt: dom::get_attribute(&img, "alt").unwrap_or_default().trim().to_string(),
                title: dom::get_attribute(&img, "title").unwrap_or_default().trim().to_string(),
                width: dimension(&img, "width"),
                height: dimension(&img, "height"),
            })
        })
        .collect()
}

/// Parse a `width`/`height` attribute such as `640` or `640px`.
fn dimension(img: &Selection, name: &str) -> Option<u32> {
    let raw = dom::get_attribute(img, name)?;
    let digits: String = raw.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|v| *v > 0)
}

/// Every followable link, in document order.
///
/// `javascript:` links and links without a target are skipped.
#[must_use]
pub fn collect_links(tree: &SanitizedTree) -> Vec<LinkRef> {
    tree.root()
        .select("a[href]")
        .nodes()
        .iter()
        .map(|n| Selection::from(*n))
        .filter_map(|a| {
            let href = dom::get_attribute(&a, "href")?.trim().to_string();
            if href.is_empty() || href.to_ascii_lowercase().starts_with("javascript:") {
                return None;
            }
            Some(LinkRef {
                href,
                text: dom::normalize_whitespace(&dom::text_content(&a)),
                title: dom::get_attribute(&a, "title")
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
            })
        })
        .collect()
}

/// Paragraph and heading counts from the tree, image and link counts from
/// the collected assets.
#[must_use]
pub fn content_stats(tree: &SanitizedTree, images: &[ImageAsset], links: &[LinkRef]) -> ContentStats {
    let root = tree.root();

    let paragraphs = root
        .select("p")
        .nodes()
        .iter()
        .filter(|p| dom::word_count(&p.text()) > 0)
        .count();

    let headings = root
        .select("h1, h2, h3, h4, h5, h6")
        .nodes()
        .iter()
        .filter(|h| !h.text().trim().is_empty())
        .count();

    ContentStats {
        paragraphs,
        headings,
        images: images.len(),
        links: links.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_images() {
        let tree = SanitizedTree::from_html(
            r#"<img src="https://e.com/a.png" alt=" A " width="640px" height="x"><img alt="no src">"#,
        );
        let images = collect_images(&tree);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].alt, "A");
        assert_eq!(images[0].width, Some(640));
        assert_eq!(images[0].height, None);
    }

    #[test]
    fn test_collect_links_skips_javascript() {
        let tree = SanitizedTree::from_html(
            r##"<a href="https://e.com" title="Home">Home  page</a><a href="javascript:void(0)">x</a><a href="#top">Top</a>"##,
        );
        let links = collect_links(&tree);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "Home page");
        assert_eq!(links[0].title.as_deref(), Some("Home"));
        assert_eq!(links[1].href, "#top");
    }

    #[test]
    fn test_content_stats() {
        let tree = SanitizedTree::from_html("<h1>T</h1><h2> </h2><p>One</p><p> </p><p>Two</p>");
        let stats = content_stats(&tree, &[], &[]);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.headings, 1);
    }
}
