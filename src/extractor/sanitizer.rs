//! Sanitization and semantic normalization of the located content.
//!
//! Works on a clone of the candidate, so the source document is never
//! touched. Passes run in order: drop non-content tags and hidden elements,
//! remove noise unless it passes the preserve check, restructure
//! class-hinted markup into semantic tags, then reduce attributes to the
//! allow-list (resolving URLs on the way).

use dom_query::{Document, NodeId, NodeRef, Selection};
use tracing::debug;
use url::Url;

use crate::dom;
use crate::patterns::{
    ATTRIBUTION_CLASS, CALLOUT_CLASS, CAPTION_CLASS, CODE_BLOCK_CLASS, CODE_LANGUAGE_CLASS,
    DEFINITION_CLASS, NON_CONTENT_TAGS, QUOTE_CLASS, TERM_CLASS, TEXT_ALIGN,
};
use crate::selector::discard::{is_hidden, is_noise_element, should_preserve_element};
use crate::selector::{query_all, utils};
use crate::url_utils;
use crate::Options;

use super::locator::ContentCandidate;

/// Attributes kept on every element.
const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href", "src", "alt", "title", "lang", "dir", "colspan", "rowspan", "scope", "datetime",
    "cite", "data-lang", "data-language", "data-callout",
];

/// Lazy-loading attributes holding the real image source.
const LAZY_SOURCE_ATTRIBUTES: &[&str] = &["data-src", "data-lazy-src", "data-original", "data-url"];

/// Role values downstream rules look at.
const KEPT_ROLES: &[&str] = &["note", "alert", "presentation", "none"];

/// Cleaned, owned copy of the main content.
///
/// The content sits under the `<body>` of its own document; [`root`]
/// returns that body.
///
/// [`root`]: SanitizedTree::root
pub struct SanitizedTree {
    doc: Document,
    base_url: Option<Url>,
    removed_noise: usize,
}

impl SanitizedTree {
    /// Wrap already clean HTML without sanitizing it.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        Self {
            doc: Document::from(html),
            base_url: None,
            removed_noise: 0,
        }
    }

    /// The owned document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The `<body>` holding the content.
    #[must_use]
    pub fn root(&self) -> Selection<'_> {
        let body = self.doc.select("body");
        if body.exists() {
            body
        } else {
            Selection::from(self.doc.root())
        }
    }

    /// Inner HTML of the content root.
    #[must_use]
    pub fn inner_html(&self) -> String {
        self.root().inner_html().to_string()
    }

    /// Base URL used to resolve links and images.
    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Number of noise elements removed.
    #[must_use]
    pub fn removed_noise(&self) -> usize {
        self.removed_noise
    }
}

impl std::fmt::Debug for SanitizedTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanitizedTree")
            .field("html", &self.inner_html())
            .field("removed_noise", &self.removed_noise)
            .finish_non_exhaustive()
    }
}

/// Clone and clean the candidate. Never fails on malformed markup.
///
/// # Examples
///
/// ```
/// use clipmark::extractor::{locate, sanitize};
/// use clipmark::{Options, RawDocument};
///
/// let raw = RawDocument::parse(
///     r#"<body><p>Text</p><div class="advertisement">Buy now</div><script>x()</script></body>"#,
///     None,
/// );
/// let options = Options::default();
/// let tree = sanitize(&locate(&raw, &options), raw.base_url(), &options);
///
/// assert_eq!(tree.inner_html(), "<p>Text</p>");
/// ```
#[must_use]
pub fn sanitize(candidate: &ContentCandidate<'_>, base_url: Option<&Url>, options: &Options) -> SanitizedTree {
    let doc = dom::clone_element(&candidate.node);
    let root = content_root(&doc);

    // The candidate itself is never removed as noise.
    let exempt = if utils::is_one_of_tags(&candidate.node, &["body", "html"]) {
        None
    } else {
        root.nodes()
            .first()
            .and_then(|body| body.children().into_iter().find(NodeRef::is_element))
            .map(|n| n.id)
    };

    remove_non_content(&root);
    let removed_noise = remove_noise(&root, exempt, options);

    promote_class_hinted_divs(&root);
    wrap_captioned_images(&root);
    build_definition_lists(&root);

    normalize_attributes(&root, base_url);

    debug!(removed_noise, "sanitized content");

    SanitizedTree {
        doc,
        base_url: base_url.cloned(),
        removed_noise,
    }
}

fn content_root(doc: &Document) -> Selection<'_> {
    let body = doc.select("body");
    if body.exists() {
        body
    } else {
        Selection::from(doc.root())
    }
}

// === Removal ===

/// Drop non-content tags, comments and hidden elements.
fn remove_non_content(root: &Selection) {
    root.select(&NON_CONTENT_TAGS.join(", ")).remove();

    for hidden in query_all(root, is_hidden) {
        hidden.remove();
    }

    if let Some(body) = root.nodes().first() {
        let comments: Vec<NodeRef> = body.descendants().into_iter().filter(NodeRef::is_comment).collect();
        for comment in comments {
            comment.remove_from_parent();
        }
    }
}

/// Remove noise elements that fail the preserve check.
///
/// Returns the number of removed elements.
fn remove_noise(root: &Selection, exempt: Option<NodeId>, options: &Options) -> usize {
    let Some(root_id) = root.nodes().first().map(|n| n.id) else {
        return 0;
    };

    let mut removed = 0;
    for node in query_all(root, is_noise_element) {
        let Some(node_ref) = node.nodes().first().copied() else {
            continue;
        };
        if Some(node_ref.id) == exempt || !is_attached(&node_ref, root_id) {
            continue;
        }
        if should_preserve_element(&node, &options.thresholds) {
            continue;
        }
        node.remove();
        removed += 1;
    }

    removed
}

/// Whether `node` still hangs below the root (an ancestor may have been removed).
fn is_attached(node: &NodeRef, root_id: NodeId) -> bool {
    node.ancestors(None).iter().any(|a| a.id == root_id)
}

// === Restructuring ===

/// Promote class-hinted `<div>`s to `<blockquote>` or `<pre><code>`.
fn promote_class_hinted_divs(root: &Selection) {
    for node in root.select("div").nodes() {
        let div = Selection::from(*node);
        let class = utils::class(&div);
        if class.is_empty() {
            continue;
        }

        if CODE_BLOCK_CLASS.is_match(&class) || CODE_LANGUAGE_CLASS.is_match(&class) {
            let language = code_language(&class);
            let inner = div.select("pre");
            if inner.exists() {
                // Wrapper around a real <pre>: hand the language down.
                if let Some(lang) = language {
                    let code = inner.select("code");
                    let target = if code.exists() { code } else { inner };
                    if code_language(&utils::class(&target)).is_none() {
                        target.set_attr("class", &format!("language-{lang}"));
                    }
                }
                continue;
            }

            let text = text_with_breaks(node);
            let class_attr = language.map(|l| format!(r#" class="language-{l}""#)).unwrap_or_default();
            div.replace_with_html(format!(
                "<pre><code{class_attr}>{}</code></pre>",
                htmlescape::encode_minimal(&text)
            ));
        } else if QUOTE_CLASS.is_match(&class) {
            div.rename("blockquote");
        }
    }
}

/// Language named by a class attribute.
fn code_language(class: &str) -> Option<String> {
    CODE_LANGUAGE_CLASS
        .captures(class)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Text of a node with line structure kept: block children and `<br>`
/// start new lines.
fn text_with_breaks(node: &NodeRef) -> String {
    fn walk(node: &NodeRef, out: &mut String) {
        for child in node.children() {
            if child.is_text() {
                out.push_str(&child.text());
                continue;
            }
            match dom::node_tag(&child).as_deref() {
                Some("br") => out.push('\n'),
                Some("div" | "p" | "li") => {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    walk(&child, out);
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                Some(_) => walk(&child, out),
                None => {}
            }
        }
    }

    let mut out = String::new();
    walk(node, &mut out);
    out.trim_matches('\n').to_string()
}

/// Wrap an image followed by a caption sibling into `<figure>`.
fn wrap_captioned_images(root: &Selection) {
    for node in root.select("img").nodes() {
        let mut img = Selection::from(*node);

        // An image alone in a link or paragraph moves up with its wrapper.
        if let Some(parent) = node.parent() {
            let parent_sel = Selection::from(parent);
            if utils::is_one_of_tags(&parent_sel, &["a", "p", "span"])
                && dom::child_element_count(&parent_sel) == 1
                && dom::text_content(&parent_sel).trim().is_empty()
            {
                img = parent_sel;
            }
        }

        let in_figure = node
            .ancestors(None)
            .iter()
            .any(|a| dom::node_tag(a).as_deref() == Some("figure"));
        if in_figure {
            continue;
        }

        let Some(caption) = dom::next_element_sibling(&img) else {
            continue;
        };
        if !CAPTION_CLASS.is_match(&utils::class(&caption)) && !utils::is_tag(&caption, "figcaption") {
            continue;
        }

        let figure = format!(
            "<figure>{}<figcaption>{}</figcaption></figure>",
            dom::outer_html(&img),
            caption.inner_html()
        );
        caption.remove();
        img.replace_with_html(figure);
    }
}

/// Convert runs of term/definition `<div>` siblings into `<dl>`.
fn build_definition_lists(root: &Selection) {
    loop {
        let Some(first) = root
            .select("div")
            .nodes()
            .iter()
            .map(|n| Selection::from(*n))
            .find(|div| TERM_CLASS.is_match(&utils::class(div)) && next_is_definition(div))
        else {
            break;
        };

        let mut items = String::new();
        let mut run: Vec<Selection> = Vec::new();
        let mut current = Some(first.clone());

        while let Some(sel) = current {
            let class = utils::class(&sel);
            let tag = if !utils::is_tag(&sel, "div") {
                None
            } else if TERM_CLASS.is_match(&class) {
                Some("dt")
            } else if DEFINITION_CLASS.is_match(&class) {
                Some("dd")
            } else {
                None
            };
            let Some(tag) = tag else {
                break;
            };

            items.push_str(&format!("<{tag}>{}</{tag}>", sel.inner_html()));
            current = dom::next_element_sibling(&sel);
            run.push(sel);
        }

        for sel in run.iter().skip(1) {
            sel.remove();
        }
        first.replace_with_html(format!("<dl>{items}</dl>"));
    }
}

fn next_is_definition(div: &Selection) -> bool {
    dom::next_element_sibling(div)
        .is_some_and(|next| utils::is_tag(&next, "div") && DEFINITION_CLASS.is_match(&utils::class(&next)))
}

// === Attributes ===

/// Reduce every element's attributes to the allow-list.
fn normalize_attributes(root: &Selection, base_url: Option<&Url>) {
    for node in root.select("*").nodes() {
        let sel = Selection::from(*node);
        let tag = utils::tag(&sel);
        let attrs = dom::get_all_attributes(&sel);

        // Lazy images carry the real source in a data attribute.
        if tag == "img" {
            let src = utils::attr(&sel, "src");
            if src.trim().is_empty() || src.starts_with("data:") {
                if let Some((_, lazy)) = attrs
                    .iter()
                    .find(|(name, value)| LAZY_SOURCE_ATTRIBUTES.contains(&name.as_str()) && !value.trim().is_empty())
                {
                    sel.set_attr("src", lazy);
                }
            }
        }

        for (name, value) in &attrs {
            if !keeps_attribute(&tag, name, value) {
                sel.remove_attr(name);
            }
        }

        if let Some(class) = attrs.iter().find(|(n, _)| n == "class").map(|(_, v)| v) {
            match semantic_classes(class) {
                Some(kept) => sel.set_attr("class", &kept),
                None => sel.remove_attr("class"),
            }
        }

        if matches!(tag.as_str(), "td" | "th") {
            let align = attrs
                .iter()
                .find(|(n, _)| n == "style")
                .and_then(|(_, style)| TEXT_ALIGN.captures(style))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_lowercase());
            match align {
                Some(align) => sel.set_attr("style", &format!("text-align: {align}")),
                None => sel.remove_attr("style"),
            }
        }

        for name in ["href", "src"] {
            if let Some(value) = sel.attr(name) {
                sel.set_attr(name, &url_utils::resolve_url(&value, base_url));
            }
        }
    }
}

/// Whether an attribute survives on an element with tag `tag`.
///
/// `class` and cell `style` are handled separately.
fn keeps_attribute(tag: &str, name: &str, value: &str) -> bool {
    if ALLOWED_ATTRIBUTES.contains(&name) || name.starts_with("data-lang") {
        return true;
    }
    match name {
        "class" => true,
        "width" | "height" => tag == "img",
        "start" => tag == "ol",
        "align" => matches!(tag, "td" | "th"),
        "style" => matches!(tag, "td" | "th"),
        "role" => KEPT_ROLES.contains(&value.trim().to_lowercase().as_str()),
        _ => false,
    }
}

/// Semantic class tokens of `class`, with code languages canonicalized to
/// `language-x`. `None` when nothing semantic remains.
fn semantic_classes(class: &str) -> Option<String> {
    let mut kept: Vec<String> = Vec::new();

    if let Some(lang) = code_language(class) {
        kept.push(format!("language-{lang}"));
    }

    for token in class.split_whitespace() {
        let semantic = CALLOUT_CLASS.is_match(token)
            || CODE_BLOCK_CLASS.is_match(token)
            || QUOTE_CLASS.is_match(token)
            || ATTRIBUTION_CLASS.is_match(token)
            || CAPTION_CLASS.is_match(token)
            || TERM_CLASS.is_match(token)
            || DEFINITION_CLASS.is_match(token);
        let token = token.to_lowercase();
        if semantic && !kept.contains(&token) {
            kept.push(token);
        }
    }

    (!kept.is_empty()).then(|| kept.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawDocument;
    use crate::extractor::locate;

    fn clean(html: &str) -> String {
        let raw = RawDocument::parse(html, Some("https://example.com/blog/"));
        let options = Options::default();
        sanitize(&locate(&raw, &options), raw.base_url(), &options).inner_html()
    }

    #[test]
    fn test_drops_non_content_and_hidden() {
        let out = clean(
            r#"<body><p>Keep</p><script>x()</script><style>p{}</style><div hidden>secret</div><span aria-hidden="true">icon</span><!-- note --></body>"#,
        );
        assert_eq!(out, "<p>Keep</p>");
    }

    #[test]
    fn test_removes_noise_but_preserves_prose() {
        let prose = "word ".repeat(30);
        let out = clean(&format!(
            r#"<body><p>Body</p><div class="advertisement">Buy now</div><div class="comments"><p>{prose}</p></div></body>"#
        ));
        assert!(!out.contains("Buy now"));
        assert!(out.contains("word word"));
    }

    #[test]
    fn test_candidate_is_exempt() {
        let words = "word ".repeat(60);
        let html = format!(r#"<body><div class="content sidebar-layout"><p>{words}</p></div></body>"#);
        let raw = RawDocument::parse(&html, None);
        let options = Options::default();
        let tree = sanitize(&locate(&raw, &options), None, &options);
        assert!(tree.inner_html().contains("word word"));
    }

    #[test]
    fn test_source_document_untouched() {
        let raw = RawDocument::parse(r#"<body><p>a</p><script>x()</script></body>"#, None);
        let options = Options::default();
        let _ = sanitize(&locate(&raw, &options), None, &options);
        assert_eq!(raw.document().select("script").length(), 1);
    }

    #[test]
    fn test_attributes_reduced_and_resolved() {
        let out = clean(
            r#"<body><p style="color:red" onclick="x()" class="lead">See <a href="/about" target="_blank" rel="nofollow">about</a></p><img data-src="pics/a.png" src="data:image/gif;base64,R0" width="10" alt="A"></body>"#,
        );
        assert!(out.contains(r#"<p>See <a href="https://example.com/about">about</a></p>"#));
        assert!(out.contains(r#"src="https://example.com/blog/pics/a.png""#));
        assert!(out.contains(r#"width="10""#));
        assert!(!out.contains("data-src"));
    }

    #[test]
    fn test_cell_alignment_kept() {
        let out = clean(r#"<body><table><tr><th style="color: red; text-align:right" class="x">A</th></tr></table></body>"#);
        assert!(out.contains(r#"<th style="text-align: right">A</th>"#));
    }

    #[test]
    fn test_semantic_classes() {
        assert_eq!(semantic_classes("brush: js"), Some("language-js".to_string()));
        assert_eq!(semantic_classes("box Warning wide"), Some("warning".to_string()));
        assert_eq!(semantic_classes("grid col-6"), None);
    }

    #[test]
    fn test_div_promotions() {
        let out = clean(
            r#"<body><div class="pull-quote">Quoted</div><div class="code language-rust"><div>fn main() {</div><div>}</div></div></body>"#,
        );
        assert!(out.contains("<blockquote"));
        assert!(out.contains(r#"<pre><code class="language-rust">fn main() {"#));
        assert!(out.contains("{\n}"));
    }

    #[test]
    fn test_highlight_wrapper_passes_language_down() {
        let out = clean(r#"<body><div class="highlight highlight-source-python"><pre>x = 1</pre></div></body>"#);
        assert!(out.contains(r#"<pre class="language-python">x = 1</pre>"#));
    }

    #[test]
    fn test_image_caption_becomes_figure() {
        let out = clean(r#"<body><img src="/a.png" alt="A"><p class="wp-caption-text">A caption</p></body>"#);
        assert!(out.contains("<figure><img"));
        assert!(out.contains("<figcaption>A caption</figcaption></figure>"));
    }

    #[test]
    fn test_definition_divs_become_dl() {
        let out = clean(
            r#"<body><div class="term">Rust</div><div class="definition">A language.</div><div class="term">Cargo</div><div class="definition">Its build tool.</div></body>"#,
        );
        assert_eq!(
            out,
            "<dl><dt>Rust</dt><dd>A language.</dd><dt>Cargo</dt><dd>Its build tool.</dd></dl>"
        );
    }
}
