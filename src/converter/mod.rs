//! HTML to Markdown conversion.
//!
//! Two interchangeable engines render a [`SanitizedTree`] through the same
//! ordered rule set: [`DomEngine`] walks the tree, [`RegexEngine`] works on
//! the serialized HTML. [`render_markdown`] picks one according to
//! [`EnginePreference`] and falls back to the regex engine when the tree
//! walk is unavailable.

pub mod code;
pub mod dom_engine;
pub mod regex_engine;
pub mod rules;
pub mod table;

use dom_query::Selection;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::extractor::SanitizedTree;
use crate::options::EnginePreference;
use crate::result::EngineKind;
use crate::Options;

pub use dom_engine::DomEngine;
pub use regex_engine::RegexEngine;
pub use rules::{CalloutKind, Rule};

/// A caller-supplied conversion rule, evaluated before the built-in rules.
///
/// `render` receives the element and the Markdown of its children.
///
/// # Example
///
/// ```rust
/// use clipmark::{convert_html, CustomRule, Options};
///
/// fn is_abbreviation(sel: &dom_query::Selection) -> bool {
///     sel.is("abbr[title]")
/// }
///
/// fn expand(sel: &dom_query::Selection, content: &str) -> String {
///     let title = sel.attr("title").unwrap_or_default();
///     format!("{content} ({title})")
/// }
///
/// let options = Options {
///     custom_rules: vec![CustomRule { name: "abbr", matches: is_abbreviation, render: expand }],
///     generate_frontmatter: false,
///     ..Options::default()
/// };
/// let html = r#"<p>Uses <abbr title="HyperText Markup Language">HTML</abbr>.</p>"#;
/// let result = convert_html(html, None, &options)?;
/// assert_eq!(result.markdown, "Uses HTML (HyperText Markup Language).");
/// # Ok::<(), clipmark::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CustomRule {
    /// Name used in logs.
    pub name: &'static str,
    /// Whether the rule applies to an element.
    pub matches: fn(&Selection) -> bool,
    /// Markdown for the element, given its rendered children.
    pub render: fn(&Selection, &str) -> String,
}

/// Markdown produced by an engine, before postprocessing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    /// Raw Markdown.
    pub markdown: String,
    /// Rules that failed and degraded to plain text.
    pub warnings: Vec<String>,
}

/// A Markdown rendering engine.
pub trait MarkdownEngine {
    /// Which engine this is.
    fn kind(&self) -> EngineKind;

    /// Render the tree. Rule failures degrade locally and are reported in
    /// [`RenderOutput::warnings`]; an `Err` means the engine cannot handle
    /// the document at all.
    fn render(&self, tree: &SanitizedTree, options: &Options) -> Result<RenderOutput>;
}

/// Render with the preferred engine, falling back to the regex engine when
/// the DOM engine is unavailable.
///
/// Returns the output and the engine that produced it.
#[must_use]
pub fn render_markdown(tree: &SanitizedTree, options: &Options) -> (RenderOutput, EngineKind) {
    if options.engine == EnginePreference::Regex {
        return (render_regex(tree, options), EngineKind::Regex);
    }

    match DomEngine.render(tree, options) {
        Ok(output) => {
            debug!(engine = "dom", "rendered markdown");
            (output, EngineKind::Dom)
        }
        Err(err) => {
            warn!(error = %err, "falling back to regex engine");
            let mut output = render_regex(tree, options);
            output.warnings.insert(0, format!("{err}; rendered with the regex engine"));
            (output, EngineKind::Regex)
        }
    }
}

fn render_regex(tree: &SanitizedTree, options: &Options) -> RenderOutput {
    // The regex engine has no failure mode of its own.
    RegexEngine.render(tree, options).unwrap_or_else(|err: Error| RenderOutput {
        markdown: String::new(),
        warnings: vec![err.to_string()],
    })
}
