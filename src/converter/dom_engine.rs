//! Tree-walking Markdown engine.
//!
//! One post-order walk over the sanitized tree: each element is classified
//! by [`Rule::for_element`] (custom rules first) and rendered from the
//! Markdown of its children. A failing rule degrades to the element's text.

use dom_query::{NodeRef, Selection};
use tracing::{debug, warn};

use crate::dom;
use crate::error::{Error, Result};
use crate::extractor::SanitizedTree;
use crate::markdown::escape_markdown;
use crate::result::EngineKind;
use crate::selector::utils;
use crate::Options;

use super::code::{language_from_class, language_from_content, render_code_block, render_inline_code};
use super::rules::{self, CalloutKind, ImageParts, LinkParts, References, Rule};
use super::table::{cell_text, format_table, Alignment, Cell};
use super::{MarkdownEngine, RenderOutput};

/// Renders by walking the DOM.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomEngine;

impl MarkdownEngine for DomEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Dom
    }

    fn render(&self, tree: &SanitizedTree, options: &Options) -> Result<RenderOutput> {
        let root = tree.root();
        let Some(node) = root.nodes().first().copied() else {
            return Ok(RenderOutput::default());
        };

        let depth = dom::tree_depth(&node);
        if depth > options.max_tree_depth {
            return Err(Error::EngineUnavailable(format!(
                "tree depth {depth} exceeds the limit of {}",
                options.max_tree_depth
            )));
        }

        let mut walker = Walker::new(options);
        let body = walker.children(&node);
        Ok(RenderOutput {
            markdown: walker.references.append_to(body),
            warnings: walker.warnings,
        })
    }
}

/// Walk state: options, collected link definitions and rule failures.
struct Walker<'o> {
    options: &'o Options,
    references: References,
    warnings: Vec<String>,
}

impl<'o> Walker<'o> {
    fn new(options: &'o Options) -> Self {
        Self {
            options,
            references: References::default(),
            warnings: Vec::new(),
        }
    }

    /// Concatenated Markdown of the node's children.
    fn children(&mut self, node: &NodeRef) -> String {
        node.children().iter().map(|child| self.node(child)).collect()
    }

    fn node(&mut self, node: &NodeRef) -> String {
        if node.is_text() {
            return escape_markdown(&rules::collapse_inline(&node.text()), false);
        }
        if !node.is_element() {
            return String::new();
        }

        let sel = Selection::from(*node);

        let options = self.options;
        if let Some(custom) = options.custom_rules.iter().find(|r| (r.matches)(&sel)) {
            debug!(rule = custom.name, "custom rule");
            let content = self.children(node);
            return (custom.render)(&sel, &content);
        }

        let rule = Rule::for_element(&sel);
        match self.apply(rule, &sel, node) {
            Ok(markdown) => markdown,
            Err(err) => {
                warn!(%rule, error = %err, "rule failed, keeping text");
                self.warnings.push(err.to_string());
                degrade(rule, &sel)
            }
        }
    }

    fn apply(&mut self, rule: Rule, sel: &Selection, node: &NodeRef) -> Result<String> {
        let options = self.options;
        let markdown = match rule {
            Rule::Skip => String::new(),
            Rule::Heading => {
                let level = utils::tag(sel)
                    .strip_prefix('h')
                    .and_then(|l| l.parse().ok())
                    .unwrap_or(1);
                rules::heading(level, &self.children(node), options.heading_style)
            }
            Rule::CodeBlock => code_block(sel, node, options),
            Rule::InlineCode => render_inline_code(&sel.text()),
            Rule::Callout => {
                let kind = rules::callout_kind(sel).unwrap_or(CalloutKind::Note);
                rules::callout(kind, &self.children(node))
            }
            Rule::Blockquote => self.blockquote(node),
            Rule::Table => self.table(sel, node)?,
            Rule::Figure => self.figure(node),
            Rule::Image => {
                let attr = |name: &str| sel.attr(name).map(|v| v.to_string());
                let (src, alt, title) = (attr("src"), attr("alt"), attr("title"));
                let (width, height) = (attr("width"), attr("height"));
                rules::image(&ImageParts {
                    src: src.as_deref(),
                    alt: alt.as_deref(),
                    title: title.as_deref(),
                    width: width.as_deref(),
                    height: height.as_deref(),
                })?
            }
            Rule::DefinitionList => rules::definition_list(&self.children(node)),
            Rule::DefinitionTerm => rules::definition_term(&self.children(node)),
            Rule::DefinitionDescription => rules::definition_description(&self.children(node)),
            Rule::RawInline => {
                let tag = utils::tag(sel);
                format!("<{tag}>{}</{tag}>", self.children(node))
            }
            Rule::Strikethrough | Rule::Highlight | Rule::Strong | Rule::Emphasis => {
                let content = self.children(node);
                match rule.marker() {
                    Some(marker) if options.preserve_formatting => rules::wrap_inline(&content, marker),
                    _ => content,
                }
            }
            Rule::Link => {
                let content = self.children(node);
                let (href, title) = (sel.attr("href"), sel.attr("title"));
                let plain = sel.text();
                rules::link(
                    &LinkParts {
                        href: href.as_deref(),
                        content: &content,
                        plain_text: &plain,
                        title: title.as_deref(),
                    },
                    options.link_style,
                    &mut self.references,
                )
            }
            Rule::HorizontalRule => "\n\n---\n\n".to_string(),
            Rule::LineBreak => "\\\n".to_string(),
            Rule::List => self.list(sel, node),
            Rule::ListItem | Rule::Paragraph | Rule::Block => rules::block(&self.children(node)),
            Rule::Passthrough => self.children(node),
        };
        Ok(markdown)
    }

    /// Body with the attribution child split out.
    fn blockquote(&mut self, node: &NodeRef) -> String {
        let mut body = String::new();
        let mut attribution: Option<String> = None;

        for child in node.children() {
            if attribution.is_none() && child.is_element() {
                let sel = Selection::from(child);
                if rules::is_attribution(&utils::tag(&sel), &utils::class(&sel)) {
                    attribution = Some(self.children(&child));
                    continue;
                }
            }
            body.push_str(&self.node(&child));
        }

        rules::blockquote(&body, attribution.as_deref())
    }

    fn figure(&mut self, node: &NodeRef) -> String {
        let mut body = String::new();
        let mut caption: Option<String> = None;

        for child in node.children() {
            if caption.is_none() && dom::node_tag(&child).as_deref() == Some("figcaption") {
                caption = Some(self.children(&child));
                continue;
            }
            body.push_str(&self.node(&child));
        }

        rules::figure(&body, caption.as_deref())
    }

    fn list(&mut self, sel: &Selection, node: &NodeRef) -> String {
        let ordered = utils::is_tag(sel, "ol");
        let start = sel
            .attr("start")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1);

        let mut items: Vec<String> = Vec::new();
        for child in node.children() {
            if child.is_text() {
                if !child.text().trim().is_empty() {
                    items.push(self.node(&child));
                }
                continue;
            }
            match dom::node_tag(&child).as_deref() {
                Some("li") => items.push(self.children(&child)),
                // A list nested without its own <li> belongs to the previous item.
                Some("ul" | "ol") if !items.is_empty() => {
                    let nested = self.node(&child);
                    if let Some(last) = items.last_mut() {
                        last.push('\n');
                        last.push_str(&nested);
                    }
                }
                Some(_) => items.push(self.node(&child)),
                None => {}
            }
        }

        rules::list(&items, ordered, start, self.options.bullet_list_marker)
    }

    fn table(&mut self, sel: &Selection, node: &NodeRef) -> Result<String> {
        let rows = table_rows(node);

        let layout = sel
            .attr("role")
            .is_some_and(|r| matches!(r.trim().to_lowercase().as_str(), "presentation" | "none"));
        if layout {
            let mut out = String::new();
            for (row, _) in &rows {
                for cell in row_cells(row) {
                    out.push_str(&rules::block(&self.children(&cell)));
                }
            }
            return Ok(out);
        }

        let mut parsed: Vec<(Vec<Cell>, bool)> = Vec::new();
        for (row, in_head) in rows {
            let cells: Vec<Cell> = row_cells(&row)
                .iter()
                .map(|cell| {
                    let cell_sel = Selection::from(*cell);
                    Cell {
                        text: cell_text(&self.children(cell)),
                        header: utils::is_tag(&cell_sel, "th"),
                        align: Alignment::from_attributes(
                            cell_sel.attr("style").as_deref(),
                            cell_sel.attr("align").as_deref(),
                        ),
                        colspan: cell_sel
                            .attr("colspan")
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
            return Err(Error::rule("table", "no rows"));
        };
        let has_header = *first_in_head || first.iter().all(|c| c.header);
        let rows: Vec<Vec<Cell>> = parsed.into_iter().map(|(cells, _)| cells).collect();

        Ok(rules::block(&format_table(&rows, has_header)))
    }
}

/// Rows of a table in order, flagged when inside `<thead>`. Nested tables
/// are not descended into.
fn table_rows<'a>(table: &NodeRef<'a>) -> Vec<(NodeRef<'a>, bool)> {
    let mut rows = Vec::new();
    for child in table.children() {
        match dom::node_tag(&child).as_deref() {
            Some("tr") => rows.push((child, false)),
            Some(section @ ("thead" | "tbody" | "tfoot")) => {
                let in_head = section == "thead";
                rows.extend(
                    child
                        .children()
                        .into_iter()
                        .filter(|r| dom::node_tag(r).as_deref() == Some("tr"))
                        .map(|r| (r, in_head)),
                );
            }
            _ => {}
        }
    }
    rows
}

fn row_cells<'a>(row: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    row.children()
        .into_iter()
        .filter(|c| matches!(dom::node_tag(c).as_deref(), Some("td" | "th")))
        .collect()
}

/// Fenced or indented code block from a `<pre>`.
fn code_block(sel: &Selection, node: &NodeRef, options: &Options) -> String {
    let text = pre_text(node);
    if text.trim().is_empty() {
        return String::new();
    }

    let code = sel.select("code");
    let language = class_language(sel)
        .or_else(|| code.exists().then(|| class_language(&code)).flatten())
        .or_else(|| data_language(sel))
        .or_else(|| code.exists().then(|| data_language(&code)).flatten())
        .or_else(|| language_from_content(&text).map(str::to_string));

    render_code_block(&text, language.as_deref(), options.code_block_style)
}

fn class_language(sel: &Selection) -> Option<String> {
    sel.attr("class").and_then(|class| language_from_class(&class))
}

fn data_language(sel: &Selection) -> Option<String> {
    ["data-lang", "data-language"]
        .iter()
        .find_map(|name| sel.attr(name))
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Raw text of a `<pre>`, `<br>` as newlines.
fn pre_text(node: &NodeRef) -> String {
    fn walk(node: &NodeRef, out: &mut String) {
        for child in node.children() {
            if child.is_text() {
                out.push_str(&child.text());
            } else if dom::node_tag(&child).as_deref() == Some("br") {
                out.push('\n');
            } else {
                walk(&child, out);
            }
        }
    }

    let mut out = String::new();
    walk(node, &mut out);
    out
}

/// Text kept when a rule fails.
fn degrade(rule: Rule, sel: &Selection) -> String {
    match rule {
        Rule::Image => escape_markdown(&dom::normalize_whitespace(&sel.attr("alt").unwrap_or_default()), false),
        Rule::Table => rules::block(&escape_markdown(&dom::normalize_whitespace(&sel.text()), false)),
        _ => escape_markdown(&dom::normalize_whitespace(&sel.text()), false),
    }
}
