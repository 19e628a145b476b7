//! String-based Markdown engine.
//!
//! Renders the serialized HTML of the sanitized tree with regular
//! expressions instead of a tree walk, sharing the rule builders in
//! [`rules`](super::rules) so the output matches the DOM engine for the
//! same markup. Finished Markdown is parked in a stash behind placeholder
//! tokens so later passes never see it. Block containers are resolved
//! innermost first, which stands in for the post-order walk.
//!
//! Tokens use private-use characters U+E000 to U+E004. Occurrences of those
//! characters in the input are escaped on the way in and restored last.
//!
//! Custom rules need a DOM and are not evaluated here.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

use crate::error::Result;
use crate::extractor::SanitizedTree;
use crate::markdown::escape_markdown;
use crate::patterns::ATTRIBUTION_CLASS;
use crate::result::EngineKind;
use crate::Options;

use super::code::{language_from_class, language_from_content, render_code_block, render_inline_code};
use super::rules::{self, CalloutHints, ImageParts, LinkParts, References, Rule};
use super::table::{cell_text, format_table, Alignment, Cell};
use super::{MarkdownEngine, RenderOutput};

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';
/// Brackets a rendered figure caption until its figure picks it up.
const CAPTION_MARK: char = '\u{E002}';
/// Brackets a rendered quote attribution until its blockquote picks it up.
const ATTRIBUTION_MARK: char = '\u{E003}';
/// Prefix of an escaped input character that collides with a token.
const LITERAL_MARK: char = '\u{E004}';

/// Attributes of a tag, with quoted values that may contain `>`.
const ATTRS: &str = r#"(?:"[^"]*"|'[^']*'|[^'">])*"#;

/// Characters reserved for tokens, indexed by their escape digit.
const TOKEN_CHARS: [char; 5] = [PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE, CAPTION_MARK, ATTRIBUTION_MARK, LITERAL_MARK];

static LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E004}([0-4])").expect("LITERAL regex"));

/// An opening tag and its raw attributes.
static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"<[a-zA-Z][a-zA-Z0-9]*\b({ATTRS})>")).expect("OPEN_TAG regex")
});

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").expect("PLACEHOLDER regex"));

static CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E002}([^\x{E002}]*)\x{E002}").expect("CAPTION regex"));

static ATTRIBUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E003}([^\x{E003}]*)\x{E003}").expect("ATTRIBUTION regex"));

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("COMMENT regex"));

/// Elements dropped with their content.
static SKIPPED_ELEMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        "head", "title", "script", "style", "noscript", "template", "svg", "iframe", "object",
        "canvas", "button", "select", "textarea",
    ]
    .iter()
    .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b{ATTRS}>.*?</{tag}\s*>")).expect("skipped element regex"))
    .collect()
});

static SKIPPED_VOID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)<(?:meta|link|input|embed)\b{ATTRS}>")).expect("SKIPPED_VOID regex")
});

static PRE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?is)<pre\b({ATTRS})>(.*?)</pre\s*>")).expect("PRE regex"));

static FIRST_CODE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?is)^\s*<code\b({ATTRS})>")).expect("FIRST_CODE_TAG regex"));

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)<(?:code|kbd|samp|tt)\b{ATTRS}>(.*?)</(?:code|kbd|samp|tt)\s*>"))
        .expect("INLINE_CODE regex")
});

static TAG_OR_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?s)<{ATTRS}>|[^<]+")).expect("TAG_OR_TEXT regex"));

static IMG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?is)<img\b({ATTRS})>")).expect("IMG regex"));

static RAW_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)<(sub|sup|small)\b{ATTRS}>(.*?)</(?:sub|sup|small)\s*>")).expect("RAW_INLINE regex")
});

/// Inline emphasis elements with the rule that renders them.
static INLINE_MARKS: LazyLock<Vec<(Regex, Rule)>> = LazyLock::new(|| {
    [
        ("del|s|strike", Rule::Strikethrough),
        ("mark", Rule::Highlight),
        ("strong|b", Rule::Strong),
        ("em|i", Rule::Emphasis),
    ]
    .into_iter()
    .map(|(tags, rule)| {
        let pattern = format!(r"(?is)<(?:{tags})\b{ATTRS}>(.*?)</(?:{tags})\s*>");
        (Regex::new(&pattern).expect("inline mark regex"), rule)
    })
    .collect()
});

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?is)<a\b({ATTRS})>(.*?)</a\s*>")).expect("LINK regex"));

static BR: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"(?i)<br\b{ATTRS}>")).expect("BR regex"));

static HR: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"(?i)<hr\b{ATTRS}>")).expect("HR regex"));

static CLOSING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</([a-zA-Z][a-zA-Z0-9]*)\s*>").expect("CLOSING_TAG regex"));

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"(?s)<{ATTRS}>")).expect("ANY_TAG regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("ATTRIBUTE regex")
});

static THEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?is)<thead\b{ATTRS}>(.*?)</thead\s*>")).expect("THEAD regex"));

static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?is)<tr\b{ATTRS}>(.*?)</tr\s*>")).expect("ROW regex"));

static CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)<(td|th)\b({ATTRS})>(.*?)</(?:td|th)\s*>")).expect("CELL regex")
});

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?is)<li\b{ATTRS}>(.*?)</li\s*>")).expect("LIST_ITEM regex"));

/// Markdown lines that make a container structured.
static STRUCTURED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:#{1,6}\s|\||```|~~~|(?:[-*+]|\d{1,9}\.)\s)").expect("STRUCTURED_LINE regex")
});

/// Containers resolved innermost first.
const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "div", "section", "article", "main", "header",
    "footer", "nav", "aside", "address", "details", "summary", "center", "form", "fieldset",
    "hgroup", "blockquote", "figure", "figcaption", "dl", "dt", "dd", "ul", "ol", "table", "cite",
];

/// Renders with regular expressions over the serialized tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexEngine;

impl MarkdownEngine for RegexEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Regex
    }

    fn render(&self, tree: &SanitizedTree, options: &Options) -> Result<RenderOutput> {
        Ok(Renderer::new(options).run(&tree.inner_html()))
    }
}

struct Renderer<'o> {
    options: &'o Options,
    stash: Vec<String>,
    references: References,
    warnings: Vec<String>,
}

impl<'o> Renderer<'o> {
    fn new(options: &'o Options) -> Self {
        Self {
            options,
            stash: Vec::new(),
            references: References::default(),
            warnings: Vec::new(),
        }
    }

    fn run(mut self, html: &str) -> RenderOutput {
        let mut text = COMMENT.replace_all(&escape_tokens(html), "").into_owned();
        for skipped in SKIPPED_ELEMENTS.iter() {
            text = skipped.replace_all(&text, "").into_owned();
        }
        text = SKIPPED_VOID.replace_all(&text, "").into_owned();
        text = encode_attribute_values(&text);

        text = self.code_blocks(&text);
        text = self.inline_code(&text);
        text = escape_text(&text);
        text = self.images(&text);
        text = self.raw_inline(&text);
        text = self.inline_marks(&text);
        text = self.links(&text);
        text = BR.replace_all(&text, "\\\n").into_owned();
        text = HR.replace_all(&text, "\n\n---\n\n").into_owned();
        text = self.blocks(text);

        let body = unmark(&self.finish(&text));
        RenderOutput {
            markdown: restore_tokens(&self.references.append_to(body)),
            warnings: self.warnings,
        }
    }

    // === Stash ===

    fn stash(&mut self, markdown: String) -> String {
        self.stash.push(markdown);
        format!("{PLACEHOLDER_OPEN}{}{PLACEHOLDER_CLOSE}", self.stash.len() - 1)
    }

    /// Replace placeholders with their Markdown, recursively.
    fn restore(&self, text: &str) -> String {
        let mut out = text.to_string();
        for _ in 0..=self.stash.len() {
            if !out.contains(PLACEHOLDER_OPEN) {
                break;
            }
            out = PLACEHOLDER
                .replace_all(&out, |caps: &Captures| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| self.stash.get(i))
                        .cloned()
                        .unwrap_or_default()
                })
                .into_owned();
        }
        out
    }

    /// Final Markdown of a fragment: leftover tags dropped, entities
    /// decoded, stashed Markdown put back.
    fn finish(&self, fragment: &str) -> String {
        self.restore(&decode(&ANY_TAG.replace_all(fragment, "")))
    }

    // === Inline passes ===

    fn code_blocks(&mut self, html: &str) -> String {
        let style = self.options.code_block_style;
        PRE.replace_all(html, |caps: &Captures| {
            let pre_attrs = parse_attributes(&caps[1]);
            let inner = &caps[2];
            let code_attrs = FIRST_CODE_TAG
                .captures(inner)
                .map(|c| parse_attributes(&c[1]))
                .unwrap_or_default();

            let code = decode(&ANY_TAG.replace_all(&BR.replace_all(inner, "\n"), ""));
            if code.trim().is_empty() {
                return String::new();
            }

            let class_language = |attrs: &[(String, String)]| {
                attribute(attrs, "class").and_then(language_from_class)
            };
            let data_language = |attrs: &[(String, String)]| {
                attribute(attrs, "data-lang")
                    .or_else(|| attribute(attrs, "data-language"))
                    .map(|v| v.trim().to_lowercase())
                    .filter(|v| !v.is_empty())
            };
            let language = class_language(&pre_attrs)
                .or_else(|| class_language(&code_attrs))
                .or_else(|| data_language(&pre_attrs))
                .or_else(|| data_language(&code_attrs))
                .or_else(|| language_from_content(&code).map(str::to_string));

            self.stash(render_code_block(&code, language.as_deref(), style))
        })
        .into_owned()
    }

    fn inline_code(&mut self, html: &str) -> String {
        INLINE_CODE
            .replace_all(html, |caps: &Captures| {
                let code = decode(&ANY_TAG.replace_all(&caps[1], ""));
                self.stash(render_inline_code(&code))
            })
            .into_owned()
    }

    fn images(&mut self, html: &str) -> String {
        IMG.replace_all(html, |caps: &Captures| {
            let attrs = parse_attributes(&caps[1]);
            let parts = ImageParts {
                src: attribute(&attrs, "src"),
                alt: attribute(&attrs, "alt"),
                title: attribute(&attrs, "title"),
                width: attribute(&attrs, "width"),
                height: attribute(&attrs, "height"),
            };
            match rules::image(&parts) {
                Ok(markdown) => self.stash(markdown),
                Err(err) => {
                    warn!(error = %err, "rule failed, keeping text");
                    self.warnings.push(err.to_string());
                    let alt = crate::dom::normalize_whitespace(parts.alt.unwrap_or_default());
                    htmlescape::encode_minimal(&escape_markdown(&alt, false))
                }
            }
        })
        .into_owned()
    }

    fn raw_inline(&mut self, html: &str) -> String {
        RAW_INLINE
            .replace_all(html, |caps: &Captures| {
                let tag = caps[1].to_lowercase();
                let open = self.stash(format!("<{tag}>"));
                let close = self.stash(format!("</{tag}>"));
                format!("{open}{}{close}", &caps[2])
            })
            .into_owned()
    }

    fn inline_marks(&self, html: &str) -> String {
        let mut text = html.to_string();
        for (pattern, rule) in INLINE_MARKS.iter() {
            text = pattern
                .replace_all(&text, |caps: &Captures| match rule.marker() {
                    Some(marker) if self.options.preserve_formatting => rules::wrap_inline(&caps[1], marker),
                    _ => caps[1].to_string(),
                })
                .into_owned();
        }
        text
    }

    fn links(&mut self, html: &str) -> String {
        let style = self.options.link_style;
        LINK.replace_all(html, |caps: &Captures| {
            let attrs = parse_attributes(&caps[1]);
            let content = self.finish(&caps[2]);
            let plain = decode(&ANY_TAG.replace_all(&caps[2], ""));
            let markdown = rules::link(
                &LinkParts {
                    href: attribute(&attrs, "href"),
                    content: &content,
                    plain_text: &plain,
                    title: attribute(&attrs, "title"),
                },
                style,
                &mut self.references,
            );
            self.stash(markdown)
        })
        .into_owned()
    }

    // === Block pass ===

    /// Resolve block containers innermost first.
    fn blocks(&mut self, mut text: String) -> String {
        let mut cursor = 0;
        loop {
            let Some((close_start, close_end, tag)) = first_closing_block(&text, cursor) else {
                break;
            };
            match last_opening(&text[..close_start], &tag) {
                Some((open_start, open_end, attrs)) => {
                    let inner = text[open_end..close_start].to_string();
                    let replacement = self.block(&tag, &attrs, &inner);
                    text.replace_range(open_start..close_end, &replacement);
                    cursor = open_start;
                }
                None => {
                    // Stray closing tag.
                    text.replace_range(close_start..close_end, "");
                    cursor = close_start;
                }
            }
        }
        text
    }

    fn block(&mut self, tag: &str, attrs: &str, inner: &str) -> String {
        let attrs = parse_attributes(attrs);
        let class = attribute(&attrs, "class").unwrap_or_default();

        let markdown = match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse().unwrap_or(1);
                rules::heading(level, &self.finish(inner), self.options.heading_style)
            }
            "ul" | "ol" => self.list(tag, &attrs, inner),
            "table" => self.table(&attrs, inner),
            "dl" => rules::definition_list(&self.finish(inner)),
            "dt" => rules::definition_term(&self.finish(inner)),
            "dd" => rules::definition_description(&self.finish(inner)),
            "figcaption" => {
                let caption = rules::single_line(&self.finish(inner));
                format!("\n{CAPTION_MARK}{caption}{CAPTION_MARK}\n")
            }
            "figure" => {
                let content = self.finish(inner);
                let caption = CAPTION.captures(&content).map(|c| c[1].to_string());
                let body = CAPTION.replace(&content, "");
                rules::figure(&body, caption.as_deref())
            }
            "cite" => {
                let text = rules::single_line(&self.finish(inner));
                format!("{ATTRIBUTION_MARK}{text}{ATTRIBUTION_MARK}")
            }
            "footer" => {
                let text = rules::single_line(&self.finish(inner));
                format!("\n\n{ATTRIBUTION_MARK}{text}{ATTRIBUTION_MARK}\n\n")
            }
            _ if tag != "blockquote" && ATTRIBUTION_CLASS.is_match(class) => {
                let text = rules::single_line(&self.finish(inner));
                format!("\n\n{ATTRIBUTION_MARK}{text}{ATTRIBUTION_MARK}\n\n")
            }
            "blockquote" | "div" | "aside" | "section" => {
                let content = self.finish(inner);
                let lead = content.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | '>' | '#'));
                let kind = rules::detect_callout(&CalloutHints {
                    tag,
                    class,
                    data_callout: attribute(&attrs, "data-callout"),
                    role: attribute(&attrs, "role"),
                    text: lead,
                    structured: STRUCTURED_LINE.is_match(&content),
                });
                match kind {
                    Some(kind) => rules::callout(kind, &unmark(&content)),
                    None if tag == "blockquote" => {
                        let (body, attribution) = self.split_attribution(inner);
                        rules::blockquote(&unmark(&body), attribution.as_deref())
                    }
                    None => rules::block(&content),
                }
            }
            _ => rules::block(&self.finish(inner)),
        };

        self.stash(markdown)
    }

    /// Finished blockquote body and the first attribution among the
    /// blockquote's own children. Attributions nested in child blocks stay in
    /// the body.
    fn split_attribution(&self, inner: &str) -> (String, Option<String>) {
        let mut body = decode(&ANY_TAG.replace_all(inner, ""));
        let own = PLACEHOLDER.captures_iter(&body).find_map(|caps| {
            let entry = caps[1].parse::<usize>().ok().and_then(|i| self.stash.get(i))?;
            let entry = entry.trim();
            let mark = ATTRIBUTION.captures(entry).filter(|m| m[0].len() == entry.len())?;
            Some((caps.get(0)?.range(), mark[1].to_string()))
        });

        match own {
            Some((range, attribution)) => {
                body.replace_range(range, "");
                (self.restore(&body), Some(attribution))
            }
            None => (self.restore(&body), None),
        }
    }

    fn list(&mut self, tag: &str, attrs: &[(String, String)], inner: &str) -> String {
        let start = attribute(attrs, "start")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1);
        let items: Vec<String> = LIST_ITEM
            .captures_iter(inner)
            .map(|caps| self.finish(&caps[1]))
            .collect();
        rules::list(&items, tag == "ol", start, self.options.bullet_list_marker)
    }

    fn table(&mut self, attrs: &[(String, String)], inner: &str) -> String {
        let layout = attribute(attrs, "role")
            .is_some_and(|r| matches!(r.trim().to_lowercase().as_str(), "presentation" | "none"));

        let head = THEAD.captures(inner).map(|c| c[1].to_string());
        let body = THEAD.replace(inner, "");
        let rows: Vec<(String, bool)> = head
            .iter()
            .flat_map(|h| ROW.captures_iter(h).map(|c| (c[1].to_string(), true)).collect::<Vec<_>>())
            .chain(ROW.captures_iter(&body).map(|c| (c[1].to_string(), false)))
            .collect();

        if layout {
            return rows
                .iter()
                .flat_map(|(row, _)| CELL.captures_iter(row).map(|c| c[3].to_string()).collect::<Vec<_>>())
                .map(|cell| rules::block(&self.finish(&cell)))
                .collect();
        }

        let mut parsed: Vec<(Vec<Cell>, bool)> = Vec::new();
        for (row, in_head) in rows {
            let cells: Vec<Cell> = CELL
                .captures_iter(&row)
                .map(|caps| {
                    let cell_attrs = parse_attributes(&caps[2]);
                    Cell {
                        text: cell_text(&self.finish(&caps[3])),
                        header: caps[1].eq_ignore_ascii_case("th"),
                        align: Alignment::from_attributes(
                            attribute(&cell_attrs, "style"),
                            attribute(&cell_attrs, "align"),
                        ),
                        colspan: attribute(&cell_attrs, "colspan")
                            .and_then(|v| v.trim().parse().ok())
                            .unwrap_or(1),
                    }
                })
                .collect();
            if !cells.is_empty() {
                parsed.push((cells, in_head));
            }
        }

        let Some((first, first_in_head)) = parsed.first() else {
            let err = crate::error::Error::rule("table", "no rows");
            warn!(error = %err, "rule failed, keeping text");
            self.warnings.push(err.to_string());
            return rules::block(&self.finish(inner));
        };
        let has_header = *first_in_head || first.iter().all(|c| c.header);
        let rows: Vec<Vec<Cell>> = parsed.into_iter().map(|(cells, _)| cells).collect();
        rules::block(&format_table(&rows, has_header))
    }
}

/// Escape the text between tags the way the DOM engine escapes text nodes,
/// re-encoding it so later passes still see well-formed HTML.
fn escape_text(html: &str) -> String {
    TAG_OR_TEXT
        .replace_all(html, |caps: &Captures| {
            let segment = &caps[0];
            if segment.starts_with('<') {
                segment.to_string()
            } else {
                let text = rules::collapse_inline(&decode(segment));
                htmlescape::encode_minimal(&escape_markdown(&text, false))
            }
        })
        .into_owned()
}

/// Escape input characters that would read as tokens.
fn escape_tokens(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for c in html.chars() {
        match TOKEN_CHARS.iter().position(|&token| token == c) {
            Some(index) => {
                out.push(LITERAL_MARK);
                out.push_str(&index.to_string());
            }
            None => out.push(c),
        }
    }
    out
}

/// Put escaped input characters back.
fn restore_tokens(text: &str) -> String {
    LITERAL
        .replace_all(text, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| TOKEN_CHARS.get(index))
                .map_or_else(String::new, char::to_string)
        })
        .into_owned()
}

/// Entity-encode `<` and `>` inside attribute values, which the serializer
/// leaves raw, so no later pass mistakes them for tag boundaries.
fn encode_attribute_values(html: &str) -> String {
    OPEN_TAG
        .replace_all(html, |caps: &Captures| {
            let whole = &caps[0];
            let Some(attrs) = caps.get(1).filter(|m| m.as_str().contains(['<', '>'])) else {
                return whole.to_string();
            };
            let start = attrs.start() - caps.get(0).map_or(0, |m| m.start());
            let encoded = attrs.as_str().replace('<', "&lt;").replace('>', "&gt;");
            format!("{}{encoded}>", &whole[..start])
        })
        .into_owned()
}

fn decode(text: &str) -> String {
    htmlescape::decode_html(text).unwrap_or_else(|_| text.to_string())
}

/// Drop caption and attribution marks that found no container.
fn unmark(text: &str) -> String {
    let text = CAPTION.replace_all(text, |caps: &Captures| format!("\n\n{}\n\n", &caps[1]));
    ATTRIBUTION
        .replace_all(&text, |caps: &Captures| caps[1].to_string())
        .into_owned()
}

/// Attributes of a tag, values decoded. Names are lowercased.
fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            (caps[1].to_lowercase(), decode(value))
        })
        .collect()
}

fn attribute<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
}

/// First closing tag of a block container at or after `from`.
fn first_closing_block(text: &str, from: usize) -> Option<(usize, usize, String)> {
    CLOSING_TAG
        .captures_iter(text.get(from..)?)
        .find_map(|caps| {
            let tag = caps[1].to_lowercase();
            let whole = caps.get(0)?;
            BLOCK_TAGS
                .contains(&tag.as_str())
                .then(|| (from + whole.start(), from + whole.end(), tag))
        })
}

/// Last opening tag named `tag` in `before`: start, end and raw attributes.
fn last_opening(before: &str, tag: &str) -> Option<(usize, usize, String)> {
    let needle = format!("<{tag}");
    let mut end = before.len();
    while let Some(pos) = before[..end].rfind(&needle) {
        let after = &before[pos + needle.len()..];
        if after.starts_with(|c: char| c == '>' || c == '/' || c.is_ascii_whitespace()) {
            let close = tag_end(after)?;
            let attrs = after[..close].trim_end_matches('/').to_string();
            return Some((pos, pos + needle.len() + close + 1, attrs));
        }
        end = pos;
    }
    None
}

/// Offset of the `>` ending a tag, skipping quoted attribute values.
fn tag_end(rest: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in rest.char_indices() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(i),
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::normalize_markdown;
    use pretty_assertions::assert_eq;

    fn render_with(html: &str, options: &Options) -> RenderOutput {
        let tree = SanitizedTree::from_html(html);
        match RegexEngine.render(&tree, options) {
            Ok(output) => output,
            Err(err) => panic!("render failed: {err}"),
        }
    }

    fn render(html: &str) -> String {
        normalize_markdown(&render_with(html, &Options::default()).markdown)
    }

    #[test]
    fn test_headings_and_emphasis() {
        assert_eq!(
            render("<h2>Intro</h2><p>Some <strong>bold</strong> and <em>italic</em>.</p>"),
            "## Intro\n\nSome **bold** and *italic*."
        );
    }

    #[test]
    fn test_code_block_is_protected() {
        assert_eq!(
            render(r#"<pre><code class="language-html">&lt;p&gt;a_b&lt;/p&gt;</code></pre>"#),
            "```html\n<p>a_b</p>\n```"
        );
    }

    #[test]
    fn test_text_is_escaped_once() {
        assert_eq!(render("<p>a_b &amp; 1 &lt; 2</p>"), r"a\_b & 1 \< 2");
    }

    #[test]
    fn test_nested_lists() {
        assert_eq!(
            render("<ul><li>One<ul><li>Sub</li></ul></li><li>Two</li></ul>"),
            "- One\n  - Sub\n- Two"
        );
    }

    #[test]
    fn test_blockquote_attribution() {
        assert_eq!(
            render("<blockquote>Great point.<cite>Jane Doe</cite></blockquote>"),
            "> Great point.\n\n*— Jane Doe*"
        );
    }

    #[test]
    fn test_nested_blockquote() {
        assert_eq!(
            render("<blockquote><p>Outer</p><blockquote><p>Inner</p></blockquote></blockquote>"),
            "> Outer\n>\n> > Inner"
        );
    }

    #[test]
    fn test_callout_by_lead_keyword() {
        assert_eq!(render("<aside><p>Tip: use cargo.</p></aside>"), "> **Tip:** use cargo.");
    }

    #[test]
    fn test_table_with_thead_and_alignment() {
        assert_eq!(
            render(r#"<table><thead><tr><th align="center">A</th></tr></thead><tbody><tr><td><em>1</em></td></tr></tbody></table>"#),
            "| A |\n| :---: |\n| *1* |"
        );
    }

    #[test]
    fn test_figure_caption() {
        assert_eq!(
            render(r#"<figure><img src="https://e.com/a.png" alt="A"><figcaption>Cap</figcaption></figure>"#),
            "![A](https://e.com/a.png)\n*Cap*"
        );
    }

    #[test]
    fn test_image_without_src_warns() {
        let output = render_with(r#"<p><img alt="Chart"></p>"#, &Options::default());
        assert_eq!(normalize_markdown(&output.markdown), "Chart");
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_link_with_inline_code() {
        assert_eq!(
            render(r#"<p>See <a href="https://docs.rs/x"><code>x::y</code> docs</a>.</p>"#),
            "See [`x::y` docs](https://docs.rs/x)."
        );
    }

    #[test]
    fn test_definition_list() {
        assert_eq!(
            render("<dl><dt>Rust</dt><dd>A language.</dd></dl>"),
            "**Rust**\n: A language."
        );
    }

    #[test]
    fn test_angle_brackets_in_attribute_values() {
        assert_eq!(
            render(r#"<p>Look <img alt="a > b" src="x.png"> here and <a href="/y" title="x > y">link</a>.</p>"#),
            r#"Look ![a > b](x.png) here and [link](/y "x > y")."#
        );
    }

    #[test]
    fn test_inline_cite_is_not_attribution() {
        assert_eq!(
            render("<blockquote><p>I loved <cite>Dune</cite> a lot.</p></blockquote>"),
            "> I loved Dune a lot."
        );
    }

    #[test]
    fn test_token_characters_in_input() {
        assert_eq!(
            render("<p>a \u{E000}0\u{E001} b \u{E004}1</p><pre><code>x</code></pre>"),
            "a \u{E000}0\u{E001} b \u{E004}1\n\n```\nx\n```"
        );
    }

    #[test]
    fn test_tag_end_skips_quoted_values() {
        assert_eq!(tag_end(r#" title="a > b">rest"#), Some(14));
        assert_eq!(tag_end(" class='x'>"), Some(10));
        assert_eq!(tag_end(r#" title="open"#), None);
    }

    #[test]
    fn test_last_opening_skips_prefix_tags() {
        let html = "<dl><div><d>";
        assert_eq!(last_opening(html, "div"), Some((4, 9, String::new())));
        assert_eq!(last_opening(html, "p"), None);
    }
}
