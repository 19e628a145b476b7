//! The conversion rule set.
//!
//! [`Rule`] classifies an element into exactly one rule, tried in
//! [`RULES`] order. The Markdown shape of each rule lives here as plain
//! string builders so both engines emit identical syntax; the engines only
//! differ in how they gather the inputs.

#![allow(clippy::expect_used)]

use std::fmt;
use std::sync::LazyLock;

use dom_query::Selection;
use regex::Regex;

use crate::error::{Error, Result};
use crate::options::{BulletMarker, HeadingStyle, LinkStyle};
use crate::patterns::{ATTRIBUTION_CLASS, CALLOUT_CLASS, CALLOUT_LEAD, MULTIPLE_NEWLINES};
use crate::selector::utils;

/// Callout keyword at the start of rendered Markdown, possibly emphasized:
/// `Warning:`, `**Note:**`, `*Tip*:`.
static CALLOUT_LEAD_MARKDOWN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:\*\*|\*|__|_)?\s*(?:warning|caution|danger|info|information|note|tip|hint|important)\s*(?:\*\*|\*|__|_)?\s*:\s*(?:\*\*|\*|__|_)?\s*",
    )
    .expect("CALLOUT_LEAD_MARKDOWN regex")
});

// =============================================================================
// Tag tables
// =============================================================================

/// Elements that produce no output at all.
const SKIP_TAGS: &[&str] = &[
    "head", "title", "script", "style", "noscript", "template", "meta", "link", "svg", "iframe",
    "object", "embed", "canvas", "button", "input", "select", "textarea", "option",
];

const INLINE_CODE_TAGS: &[&str] = &["code", "kbd", "samp", "tt"];
const RAW_INLINE_TAGS: &[&str] = &["sub", "sup", "small"];
const STRIKE_TAGS: &[&str] = &["del", "s", "strike"];
const STRONG_TAGS: &[&str] = &["strong", "b"];
const EMPHASIS_TAGS: &[&str] = &["em", "i"];

/// Containers rendered as padded blocks of their children.
pub const BLOCK_TAGS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer", "nav", "aside",
    "address", "details", "summary", "figcaption", "center", "form", "fieldset", "hgroup",
];

/// Containers that may carry a leading `Warning:`-style keyword.
const CALLOUT_TAGS: &[&str] = &["div", "aside", "section", "blockquote"];

/// Enough leading text to hold the longest callout keyword and its colon.
const LEAD_TEXT_CHARS: usize = 24;
const LEAD_TEXT_NODES: usize = 64;

// =============================================================================
// Rules
// =============================================================================

/// A conversion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Non-content element, renders nothing.
    Skip,
    /// `h1`..`h6`.
    Heading,
    /// `<pre>`.
    CodeBlock,
    /// `code`, `kbd`, `samp`, `tt` outside `<pre>`.
    InlineCode,
    /// Container flagged as a note, warning, tip...
    Callout,
    /// `<blockquote>`.
    Blockquote,
    /// `<table>`.
    Table,
    /// `<figure>`.
    Figure,
    /// `<img>`.
    Image,
    /// `<dl>`.
    DefinitionList,
    /// `<dt>`.
    DefinitionTerm,
    /// `<dd>`.
    DefinitionDescription,
    /// `sub`, `sup`, `small`, kept as raw tags.
    RawInline,
    /// `del`, `s`, `strike`.
    Strikethrough,
    /// `<mark>`.
    Highlight,
    /// `strong`, `b`.
    Strong,
    /// `em`, `i`.
    Emphasis,
    /// `<a>`.
    Link,
    /// `<hr>`.
    HorizontalRule,
    /// `<br>`.
    LineBreak,
    /// `ul`, `ol`.
    List,
    /// `<li>`.
    ListItem,
    /// `<p>`.
    Paragraph,
    /// Generic block container.
    Block,
    /// Anything else: children only.
    Passthrough,
}

/// Rules in evaluation order. The first match wins.
pub const RULES: &[Rule] = &[
    Rule::Skip,
    Rule::Heading,
    Rule::CodeBlock,
    Rule::InlineCode,
    Rule::Callout,
    Rule::Blockquote,
    Rule::Table,
    Rule::Figure,
    Rule::Image,
    Rule::DefinitionList,
    Rule::DefinitionTerm,
    Rule::DefinitionDescription,
    Rule::RawInline,
    Rule::Strikethrough,
    Rule::Highlight,
    Rule::Strong,
    Rule::Emphasis,
    Rule::Link,
    Rule::HorizontalRule,
    Rule::LineBreak,
    Rule::List,
    Rule::ListItem,
    Rule::Paragraph,
    Rule::Block,
    Rule::Passthrough,
];

impl Rule {
    /// The first rule matching the element.
    #[must_use]
    pub fn for_element(sel: &Selection) -> Self {
        RULES
            .iter()
            .copied()
            .find(|rule| rule.matches(sel))
            .unwrap_or(Self::Passthrough)
    }

    /// Whether the rule applies to the element.
    #[must_use]
    pub fn matches(self, sel: &Selection) -> bool {
        let tag = utils::tag(sel);
        let tag = tag.as_str();
        match self {
            Self::Skip => SKIP_TAGS.contains(&tag),
            Self::Heading => crate::dom::is_heading_tag(tag),
            Self::CodeBlock => tag == "pre",
            Self::InlineCode => INLINE_CODE_TAGS.contains(&tag),
            Self::Callout => callout_kind(sel).is_some(),
            Self::Blockquote => tag == "blockquote",
            Self::Table => tag == "table",
            Self::Figure => tag == "figure",
            Self::Image => tag == "img",
            Self::DefinitionList => tag == "dl",
            Self::DefinitionTerm => tag == "dt",
            Self::DefinitionDescription => tag == "dd",
            Self::RawInline => RAW_INLINE_TAGS.contains(&tag),
            Self::Strikethrough => STRIKE_TAGS.contains(&tag),
            Self::Highlight => tag == "mark",
            Self::Strong => STRONG_TAGS.contains(&tag),
            Self::Emphasis => EMPHASIS_TAGS.contains(&tag),
            Self::Link => tag == "a",
            Self::HorizontalRule => tag == "hr",
            Self::LineBreak => tag == "br",
            Self::List => tag == "ul" || tag == "ol",
            Self::ListItem => tag == "li",
            Self::Paragraph => tag == "p",
            Self::Block => BLOCK_TAGS.contains(&tag),
            Self::Passthrough => true,
        }
    }

    /// Emphasis marker of an inline rule.
    #[must_use]
    pub const fn marker(self) -> Option<&'static str> {
        match self {
            Self::Strikethrough => Some("~~"),
            Self::Highlight => Some("=="),
            Self::Strong => Some("**"),
            Self::Emphasis => Some("*"),
            _ => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// Callouts
// =============================================================================

/// Callout type. Declaration order is precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CalloutKind {
    Warning,
    Info,
    Note,
    Tip,
    Important,
}

impl CalloutKind {
    /// Parse a callout keyword or one of its synonyms.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "warning" | "caution" | "danger" => Some(Self::Warning),
            "info" | "information" => Some(Self::Info),
            "note" => Some(Self::Note),
            "tip" | "hint" => Some(Self::Tip),
            "important" => Some(Self::Important),
            _ => None,
        }
    }

    /// Label used in the rendered callout.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::Info => "Info",
            Self::Note => "Note",
            Self::Tip => "Tip",
            Self::Important => "Important",
        }
    }
}

/// Attributes and leading text a callout is recognized from.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalloutHints<'a> {
    pub tag: &'a str,
    pub class: &'a str,
    pub data_callout: Option<&'a str>,
    pub role: Option<&'a str>,
    /// Leading text of the element, for keyword detection.
    pub text: &'a str,
    /// Whether the element holds structured content (headings, lists,
    /// tables, code). Keyword detection is skipped for those.
    pub structured: bool,
}

/// Callout type from the hints, `None` when the element is not a callout.
///
/// Several signals may name different types; the one with the highest
/// precedence wins. A marked element with no recognizable type is a note.
#[must_use]
pub fn detect_callout(hints: &CalloutHints<'_>) -> Option<CalloutKind> {
    if !CALLOUT_TAGS.contains(&hints.tag) {
        return None;
    }

    let mut marked = false;
    let mut kinds: Vec<CalloutKind> = Vec::new();

    for token in hints.class.split_whitespace() {
        if let Some(caps) = CALLOUT_CLASS.captures(token) {
            marked = true;
            kinds.extend(caps.get(1).and_then(|m| CalloutKind::parse(m.as_str())));
        }
    }

    if let Some(value) = hints.data_callout {
        marked = true;
        kinds.extend(CalloutKind::parse(value));
    }

    match hints.role.map(|r| r.trim().to_lowercase()).as_deref() {
        Some("note") => {
            marked = true;
            kinds.push(CalloutKind::Note);
        }
        Some("alert") => {
            marked = true;
            kinds.push(CalloutKind::Warning);
        }
        _ => {}
    }

    if !hints.structured || hints.tag == "blockquote" {
        if let Some(caps) = CALLOUT_LEAD.captures(hints.text) {
            marked = true;
            kinds.extend(caps.get(1).and_then(|m| CalloutKind::parse(m.as_str())));
        }
    }

    marked.then(|| kinds.into_iter().min().unwrap_or(CalloutKind::Note))
}

/// Callout type of an element.
#[must_use]
pub fn callout_kind(sel: &Selection) -> Option<CalloutKind> {
    let tag = utils::tag(sel);
    if !CALLOUT_TAGS.contains(&tag.as_str()) {
        return None;
    }
    let class = utils::class(sel);
    let data_callout = sel.attr("data-callout");
    let role = sel.attr("role");
    let text = sel
        .nodes()
        .first()
        .map(|node| crate::dom::leading_text(node, LEAD_TEXT_CHARS, LEAD_TEXT_NODES))
        .unwrap_or_default();
    // Only a keyword lead needs the subtree search
    let structured = CALLOUT_LEAD.is_match(&text)
        && sel.select("h1, h2, h3, h4, h5, h6, ul, ol, table, pre").exists();

    detect_callout(&CalloutHints {
        tag: &tag,
        class: &class,
        data_callout: data_callout.as_deref(),
        role: role.as_deref(),
        text: &text,
        structured,
    })
}

/// Whether a blockquote child is its attribution.
#[must_use]
pub fn is_attribution(tag: &str, class: &str) -> bool {
    matches!(tag, "cite" | "footer") || ATTRIBUTION_CLASS.is_match(class)
}

// =============================================================================
// Markdown builders
// =============================================================================

/// Collapse whitespace runs to single spaces, keeping one space at either
/// edge when the text had whitespace there.
#[must_use]
pub fn collapse_inline(text: &str) -> String {
    crate::patterns::WHITESPACE_NORMALIZE.replace_all(text, " ").into_owned()
}

/// Text on one line, hard breaks included.
#[must_use]
pub fn single_line(text: &str) -> String {
    text.replace("\\\n", " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip hard line breaks and whitespace from the end of a block.
#[must_use]
pub fn trim_block(text: &str) -> &str {
    let mut text = text.trim();
    while let Some(rest) = text.strip_suffix('\\') {
        // A trailing backslash only counts as a break when it is not escaped.
        if rest.ends_with('\\') {
            break;
        }
        text = rest.trim_end();
    }
    text
}

/// Never leave more than one blank line in a row.
fn collapse_blank_runs(text: &str) -> String {
    MULTIPLE_NEWLINES.replace_all(text, "\n\n").into_owned()
}

/// Pad a block with blank lines; empty blocks vanish.
#[must_use]
pub fn block(content: &str) -> String {
    let content = trim_block(content);
    if content.is_empty() {
        String::new()
    } else {
        format!("\n\n{content}\n\n")
    }
}

/// ATX heading, or setext for levels 1 and 2 when configured.
#[must_use]
pub fn heading(level: usize, text: &str, style: HeadingStyle) -> String {
    let text = single_line(text);
    if text.is_empty() {
        return String::new();
    }
    let level = level.clamp(1, 6);
    match style {
        HeadingStyle::Setext if level <= 2 => {
            let ch = if level == 1 { "=" } else { "-" };
            let underline = ch.repeat(text.chars().count().max(3));
            format!("\n\n{text}\n{underline}\n\n")
        }
        _ => format!("\n\n{} {text}\n\n", "#".repeat(level)),
    }
}

/// Wrap inline content in a marker, keeping surrounding whitespace outside.
#[must_use]
pub fn wrap_inline(content: &str, marker: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return content.to_string();
    }
    let lead = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{marker}{trimmed}{marker}{trail}")
}

/// Prefix every line with `> `.
#[must_use]
pub fn quote_lines(text: &str) -> String {
    collapse_blank_runs(text)
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Blockquote with an optional attribution line beneath.
#[must_use]
pub fn blockquote(body: &str, attribution: Option<&str>) -> String {
    let body = trim_block(body);
    let attribution = attribution
        .map(|a| single_line(a).trim_start_matches(['—', '–', '-', '~', ' ']).trim().to_string())
        .filter(|a| !a.is_empty());

    let mut parts = Vec::new();
    if !body.is_empty() {
        parts.push(quote_lines(body));
    }
    if let Some(attribution) = attribution {
        parts.push(format!("*— {attribution}*"));
    }
    if parts.is_empty() {
        return String::new();
    }
    format!("\n\n{}\n\n", parts.join("\n\n"))
}

/// Callout as a labelled blockquote. A leading keyword in the body is
/// replaced by the label.
#[must_use]
pub fn callout(kind: CalloutKind, body: &str) -> String {
    let body = trim_block(body);
    let body = CALLOUT_LEAD_MARKDOWN.replace(body, "");
    let label = format!("**{}:**", kind.label());
    let text = if body.is_empty() {
        label
    } else {
        format!("{label} {body}")
    };
    format!("\n\n{}\n\n", quote_lines(&text))
}

/// Image syntax inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageParts<'a> {
    pub src: Option<&'a str>,
    pub alt: Option<&'a str>,
    pub title: Option<&'a str>,
    pub width: Option<&'a str>,
    pub height: Option<&'a str>,
}

/// `![alt](src "title")`, followed by a hidden size comment when the image
/// declares dimensions.
pub fn image(parts: &ImageParts<'_>) -> Result<String> {
    let src = parts.src.map(str::trim).unwrap_or_default();
    if src.is_empty() {
        return Err(Error::rule("image", "missing src"));
    }

    let alt = single_line(parts.alt.unwrap_or_default()).replace('[', "\\[").replace(']', "\\]");
    let title = parts
        .title
        .map(single_line)
        .filter(|t| !t.is_empty() && *t != alt);

    let mut out = format!("![{alt}]({}", link_target(src));
    if let Some(title) = title {
        out.push_str(&format!(" \"{}\"", title.replace('"', "\\\"")));
    }
    out.push(')');

    let size: Vec<String> = [("width", parts.width), ("height", parts.height)]
        .into_iter()
        .filter_map(|(name, value)| {
            let value = value?.trim();
            (!value.is_empty()).then(|| format!("{name}=\"{}\"", value.replace('"', "")))
        })
        .collect();
    if !size.is_empty() {
        out.push_str(&format!(" <!-- {} -->", size.join(" ")));
    }
    Ok(out)
}

/// Figure: its content, then an italic caption line.
#[must_use]
pub fn figure(body: &str, caption: Option<&str>) -> String {
    let body = trim_block(body);
    let caption = caption.map(single_line).filter(|c| !c.is_empty());
    match caption {
        Some(caption) if body.is_empty() => format!("\n\n*{caption}*\n\n"),
        Some(caption) => format!("\n\n{body}\n*{caption}*\n\n"),
        None => block(body),
    }
}

/// `**term**` on its own line.
#[must_use]
pub fn definition_term(content: &str) -> String {
    let term = single_line(content);
    if term.is_empty() {
        String::new()
    } else {
        format!("\n**{term}**\n")
    }
}

/// `: description` on its own line.
#[must_use]
pub fn definition_description(content: &str) -> String {
    let text = tighten(content);
    if text.is_empty() {
        String::new()
    } else {
        format!("\n: {}\n", text.replace('\n', "\n  "))
    }
}

/// Definition list container.
#[must_use]
pub fn definition_list(content: &str) -> String {
    block(&MULTIPLE_BREAKS.replace_all(content.trim(), "\n"))
}

static MULTIPLE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("MULTIPLE_BREAKS regex"));

/// Block content squeezed into consecutive lines, for list items.
fn tighten(content: &str) -> String {
    MULTIPLE_BREAKS.replace_all(trim_block(content), "\n").into_owned()
}

/// A list from rendered item contents. Empty items are dropped; nested
/// content is indented under its item's marker.
#[must_use]
pub fn list(items: &[String], ordered: bool, start: usize, bullet: BulletMarker) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut number = start;

    for item in items {
        let text = tighten(item);
        if text.is_empty() {
            continue;
        }
        let marker = if ordered {
            let marker = format!("{number}.");
            number += 1;
            marker
        } else {
            bullet.as_char().to_string()
        };
        let indent = " ".repeat(marker.len() + 1);

        for (i, line) in text.lines().enumerate() {
            if i == 0 {
                lines.push(format!("{marker} {line}"));
            } else if line.trim().is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{indent}{line}"));
            }
        }
    }

    if lines.is_empty() {
        return String::new();
    }
    format!("\n\n{}\n\n", lines.join("\n"))
}

/// Numbered link definitions collected under the referenced link style.
#[derive(Debug, Clone, Default)]
pub struct References {
    entries: Vec<(String, Option<String>)>,
}

impl References {
    /// Number of the definition for `href`, added when new.
    pub fn index(&mut self, href: &str, title: Option<&str>) -> usize {
        if let Some(pos) = self.entries.iter().position(|(h, _)| h == href) {
            return pos + 1;
        }
        self.entries.push((href.to_string(), title.map(str::to_string)));
        self.entries.len()
    }

    /// Whether no link was referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions block, `[n]: href "title"` per line.
    #[must_use]
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, (href, title))| match title {
                Some(title) => format!("[{}]: {} \"{}\"", i + 1, link_target(href), title.replace('"', "\\\"")),
                None => format!("[{}]: {}", i + 1, link_target(href)),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Append the definitions to a rendered body.
    #[must_use]
    pub fn append_to(&self, markdown: String) -> String {
        if self.is_empty() {
            markdown
        } else {
            format!("{markdown}\n\n{}\n", self.render())
        }
    }
}

/// Link inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkParts<'a> {
    pub href: Option<&'a str>,
    /// Rendered label.
    pub content: &'a str,
    /// Plain text of the label, compared against the title.
    pub plain_text: &'a str,
    pub title: Option<&'a str>,
}

/// Link syntax. Anchors and `mailto:` stay inline in either style;
/// `javascript:` links and links without a target keep only their label.
#[must_use]
pub fn link(parts: &LinkParts<'_>, style: LinkStyle, references: &mut References) -> String {
    let label = single_line(parts.content);
    let href = parts.href.map(str::trim).unwrap_or_default();

    if href.is_empty() || href.to_ascii_lowercase().starts_with("javascript:") {
        return wrap_edges(parts.content, &label);
    }
    if label.is_empty() {
        return String::new();
    }

    let rendered = if href.starts_with('#') || href.to_ascii_lowercase().starts_with("mailto:") {
        format!("[{label}]({})", link_target(href))
    } else {
        let plain = single_line(parts.plain_text);
        let title = parts
            .title
            .map(single_line)
            .filter(|t| !t.is_empty() && *t != plain);
        match style {
            LinkStyle::Inlined => match title {
                Some(title) => format!("[{label}]({} \"{}\")", link_target(href), title.replace('"', "\\\"")),
                None => format!("[{label}]({})", link_target(href)),
            },
            LinkStyle::Referenced => {
                let n = references.index(href, title.as_deref());
                format!("[{label}][{n}]")
            }
        }
    };
    wrap_edges(parts.content, &rendered)
}

/// Keep the edge whitespace of `original` around `rendered`.
fn wrap_edges(original: &str, rendered: &str) -> String {
    if rendered.is_empty() {
        return original.chars().any(char::is_whitespace).then(|| " ".to_string()).unwrap_or_default();
    }
    let lead = if original.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if original.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{rendered}{trail}")
}

/// URL as a link destination; spaces and parentheses would end it early.
fn link_target(href: &str) -> String {
    if href.contains([' ', '(', ')']) {
        format!("<{}>", href.replace('<', "%3C").replace('>', "%3E"))
    } else {
        href.to_string()
    }
}
