//! Configuration options for Markdown conversion.
//!
//! The `Options` struct controls the rendering style of the output and the
//! behavior of the extraction stages. Every heuristic constant used by the
//! locator and sanitizer lives in [`Thresholds`] so it can be tuned and
//! tested on its own.

use crate::converter::CustomRule;
use crate::scoring::QualityWeights;

/// Configuration options for conversion.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use clipmark::{Options, HeadingStyle};
///
/// // Use defaults
/// let options = Options::default();
///
/// // Customize specific fields
/// let options = Options {
///     heading_style: HeadingStyle::Setext,
///     custom_selectors: vec![".story".to_string()],
///     ..Options::default()
/// };
/// ```
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
    /// Keep inline emphasis (bold, italic, strikethrough, highlight).
    ///
    /// When false only the text of emphasized runs is kept.
    ///
    /// Default: `true`
    pub preserve_formatting: bool,

    /// Extract page metadata from the full document.
    ///
    /// When false the result carries default metadata (language only).
    ///
    /// Default: `true`
    pub include_metadata: bool,

    /// Build a YAML frontmatter block from the metadata.
    ///
    /// The frontmatter is returned separately from the Markdown body.
    ///
    /// Default: `true`
    pub generate_frontmatter: bool,

    /// Heading syntax.
    ///
    /// Default: [`HeadingStyle::Atx`]
    pub heading_style: HeadingStyle,

    /// Marker used for unordered list items.
    ///
    /// Default: [`BulletMarker::Dash`]
    pub bullet_list_marker: BulletMarker,

    /// Code block syntax.
    ///
    /// Default: [`CodeBlockStyle::Fenced`]
    pub code_block_style: CodeBlockStyle,

    /// Link syntax.
    ///
    /// Default: [`LinkStyle::Inlined`]
    pub link_style: LinkStyle,

    /// CSS selectors tried, in order, before the built-in content selectors.
    ///
    /// Default: empty
    pub custom_selectors: Vec<String>,

    /// Extra conversion rules evaluated before the built-in rule set.
    ///
    /// Only the DOM engine can evaluate these.
    ///
    /// Default: empty
    pub custom_rules: Vec<CustomRule>,

    /// Which conversion engine renders the body.
    ///
    /// Default: [`EnginePreference::Auto`]
    pub engine: EnginePreference,

    /// Apply link-density penalties and class-name bonuses when scoring
    /// fallback content candidates.
    ///
    /// Default: `true`
    pub enhanced_scoring: bool,

    /// Maximum element nesting the DOM engine walks before handing the
    /// document over to the regex engine.
    ///
    /// Default: `512`
    pub max_tree_depth: usize,

    /// Maximum accepted input size in bytes.
    ///
    /// Default: `10_485_760` (10 MB)
    pub max_input_len: usize,

    /// Heuristic thresholds for the locator and sanitizer.
    pub thresholds: Thresholds,

    /// Weights of the quality score components.
    pub quality_weights: QualityWeights,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            preserve_formatting: true,
            include_metadata: true,
            generate_frontmatter: true,
            heading_style: HeadingStyle::default(),
            bullet_list_marker: BulletMarker::default(),
            code_block_style: CodeBlockStyle::default(),
            link_style: LinkStyle::default(),
            custom_selectors: Vec::new(),
            custom_rules: Vec::new(),
            engine: EnginePreference::default(),
            enhanced_scoring: true,
            max_tree_depth: 512,
            max_input_len: 10 * 1024 * 1024,
            thresholds: Thresholds::default(),
            quality_weights: QualityWeights::default(),
        }
    }
}

/// Heading syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeadingStyle {
    /// `# Heading`
    #[default]
    Atx,
    /// Underlined with `===` / `---` for h1 and h2; deeper levels stay ATX.
    Setext,
}

/// Marker used for unordered list items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BulletMarker {
    /// `- item`
    #[default]
    Dash,
    /// `* item`
    Asterisk,
    /// `+ item`
    Plus,
}

impl BulletMarker {
    /// The marker character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Dash => '-',
            Self::Asterisk => '*',
            Self::Plus => '+',
        }
    }
}

/// Code block syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodeBlockStyle {
    /// Fenced with backticks, tagged with the detected language.
    #[default]
    Fenced,
    /// Indented by four spaces (no language tag).
    Indented,
}

/// Link syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkStyle {
    /// `[text](href "title")`
    #[default]
    Inlined,
    /// `[text][1]` with numbered definitions appended to the document.
    Referenced,
}

/// Engine selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnginePreference {
    /// DOM engine, falling back to the regex engine when it is unavailable.
    #[default]
    Auto,
    /// DOM engine only; an unavailable engine still falls back.
    Dom,
    /// Regex engine only.
    Regex,
}

/// Tunable heuristic thresholds.
///
/// The numbers are reasonable defaults, not derived values.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Minimum words for an element to count as significant content.
    ///
    /// Default: `50`
    pub significant_min_words: usize,

    /// Minimum child elements for an element to count as significant content.
    ///
    /// Default: `1`
    pub significant_min_children: usize,

    /// Noise elements with more words than this are preserved.
    ///
    /// Default: `20`
    pub relaxed_min_words: usize,

    /// Minimum words a noise element needs before a semantic descendant
    /// (heading, paragraph, list, table, ...) can preserve it.
    ///
    /// Default: `5`
    pub relaxed_semantic_min_words: usize,

    /// Link-text share above which a noise element is never preserved.
    ///
    /// Default: `0.5`
    pub max_link_density: f64,

    /// Score added per direct child element of a fallback candidate.
    ///
    /// Default: `10.0`
    pub child_weight: f64,

    /// Bonus for `article`/`section` candidates (enhanced scoring).
    ///
    /// Default: `25.0`
    pub semantic_tag_bonus: f64,

    /// Bonus for content-like class or id names (enhanced scoring).
    ///
    /// Default: `25.0`
    pub content_class_bonus: f64,

    /// Penalty for navigation-like class or id names (enhanced scoring).
    ///
    /// Default: `50.0`
    pub navigation_class_penalty: f64,

    /// Minimum characters of a paragraph used as description fallback.
    ///
    /// Default: `80`
    pub description_min_chars: usize,

    /// Maximum characters of a paragraph-derived description.
    ///
    /// Default: `300`
    pub description_max_chars: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            significant_min_words: 50,
            significant_min_children: 1,
            relaxed_min_words: 20,
            relaxed_semantic_min_words: 5,
            max_link_density: 0.5,
            child_weight: 10.0,
            semantic_tag_bonus: 25.0,
            content_class_bonus: 25.0,
            navigation_class_penalty: 50.0,
            description_min_chars: 80,
            description_max_chars: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = Options::default();
        assert!(options.preserve_formatting);
        assert!(options.include_metadata);
        assert!(options.generate_frontmatter);
        assert_eq!(options.heading_style, HeadingStyle::Atx);
        assert_eq!(options.bullet_list_marker, BulletMarker::Dash);
        assert_eq!(options.code_block_style, CodeBlockStyle::Fenced);
        assert_eq!(options.link_style, LinkStyle::Inlined);
        assert_eq!(options.engine, EnginePreference::Auto);
        assert!(options.custom_selectors.is_empty());
        assert_eq!(options.thresholds.significant_min_words, 50);
        assert_eq!(options.thresholds.relaxed_min_words, 20);
    }

    #[test]
    fn struct_update_keeps_other_defaults() {
        let options = Options {
            bullet_list_marker: BulletMarker::Plus,
            ..Options::default()
        };
        assert_eq!(options.bullet_list_marker.as_char(), '+');
        assert_eq!(options.max_tree_depth, 512);
    }
}
