//! Markdown processing utilities.
//!
//! Escaping of literal text before it is wrapped in Markdown syntax, and the
//! postprocessing pass that normalizes whitespace and block spacing of the
//! rendered document. Both engines share these so their output agrees.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

/// Characters that have special meaning in Markdown and need escaping.
const MARKDOWN_SPECIAL_CHARS: &[char] = &['\\', '*', '_', '[', ']', '<', '`'];

/// Escape Markdown special characters in text content.
///
/// This function prevents accidental Markdown interpretation of content that
/// contains literal asterisks, underscores, brackets, etc.
///
/// # Arguments
///
/// * `text` - The text content to escape
/// * `in_code_block` - If true, skip escaping (code blocks preserve literal content)
///
/// # Examples
///
/// ```
/// use clipmark::markdown::escape_markdown;
///
/// // Asterisks are escaped to prevent italic
/// assert_eq!(escape_markdown("*not italic*", false), r"\*not italic\*");
///
/// // Underscores are escaped to prevent italic
/// assert_eq!(escape_markdown("my_variable_name", false), r"my\_variable\_name");
///
/// // Code blocks are not escaped
/// assert_eq!(escape_markdown("*text*", true), "*text*");
/// ```
#[must_use]
pub fn escape_markdown(text: &str, in_code_block: bool) -> String {
    if in_code_block || text.is_empty() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len() + text.len() / 4);

    for ch in text.chars() {
        if MARKDOWN_SPECIAL_CHARS.contains(&ch) {
            result.push('\\');
        }
        result.push(ch);
    }

    result
}

// =============================================================================
// Postprocessing
// =============================================================================

/// Runs of two or more spaces after a non-space character.
static INNER_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S) {2,}").expect("INNER_SPACES regex"));

/// Link labels padded with whitespace: `[ text ](`.
static PADDED_LINK_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[ \t]+([^\]\n]*?)[ \t]*\]\(|\[([^\]\n]*?[^\]\s\\])[ \t]+\]\(")
        .expect("PADDED_LINK_LABEL regex")
});

/// Emphasis markers wrapping nothing: `****`, `** **`, `~~ ~~`.
static EMPTY_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\\*~])(\*\*[ \t]*\*\*|~~[ \t]+~~)").expect("EMPTY_EMPHASIS regex")
});

/// Links with neither label nor target.
static EMPTY_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\]\(\)").expect("EMPTY_LINK regex"));

/// Lines that are list items (bulleted or numbered).
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d{1,9}[.)])\s").expect("LIST_ITEM regex"));

/// ATX heading lines.
static ATX_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}(?:\s|$)").expect("ATX_HEADING regex"));

/// Thematic breaks.
static THEMATIC_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:-{3,}|\*{3,}|_{3,})$").expect("THEMATIC_BREAK regex"));

/// Setext underlines.
static SETEXT_UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:={3,}|-{3,})$").expect("SETEXT_UNDERLINE regex"));

/// Block kind of a postprocessed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Text,
    Heading,
    Fence,
    Quote,
    List,
    Table,
    Rule,
}

impl LineKind {
    /// Kinds that must be separated from their neighbours by a blank line.
    fn is_block(self) -> bool {
        matches!(
            self,
            Self::Heading | Self::Fence | Self::Quote | Self::List | Self::Table | Self::Rule
        )
    }
}

/// Opening fence of a code block: the fence character and run length.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let run = trimmed.chars().take_while(|c| *c == ch).count();
    (run >= 3).then_some((ch, run))
}

/// Clean spacing artifacts on a line outside code.
fn clean_line(line: &str) -> String {
    let line = line.trim_end();
    let indent_len = line.len() - line.trim_start().len();
    let (indent, body) = line.split_at(indent_len);

    // Indented code keeps its interior spacing.
    if indent.len() >= 4 && !LIST_ITEM.is_match(line) {
        return line.to_string();
    }

    let body = EMPTY_LINK.replace_all(body, "");
    let body = PADDED_LINK_LABEL.replace_all(&body, |caps: &regex::Captures| {
        let label = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("[{}](", label.trim())
    });
    let body = EMPTY_EMPHASIS.replace_all(&body, |caps: &regex::Captures| {
        // Keep the leading context character matched outside the group.
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let marker = caps.get(1).map_or("", |m| m.as_str());
        whole[..whole.len() - marker.len()].to_string()
    });
    let body = INNER_SPACES.replace_all(&body, "$1 ");

    format!("{indent}{}", body.trim_end())
}

/// Classify lines outside code. `prev` is the kind of the previous line.
fn classify(line: &str, prev: LineKind, next: Option<&str>) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if ATX_HEADING.is_match(trimmed) {
        return LineKind::Heading;
    }
    if trimmed.starts_with('>') {
        return LineKind::Quote;
    }
    if trimmed.starts_with('|') {
        return LineKind::Table;
    }
    if SETEXT_UNDERLINE.is_match(trimmed) && prev == LineKind::Heading {
        return LineKind::Heading;
    }
    if THEMATIC_BREAK.is_match(trimmed) {
        return LineKind::Rule;
    }
    if LIST_ITEM.is_match(line) {
        return LineKind::List;
    }
    // Continuation lines of a list item stay with the list.
    if prev == LineKind::List && line.starts_with(' ') {
        return LineKind::List;
    }
    if next.is_some_and(|n| SETEXT_UNDERLINE.is_match(n.trim())) && prev != LineKind::Text {
        return LineKind::Heading;
    }
    LineKind::Text
}

/// Normalize the whitespace and block spacing of rendered Markdown.
///
/// Fence-aware: content inside fenced code blocks is never touched. Outside
/// code it trims trailing whitespace, collapses interior space runs, removes
/// empty emphasis and link artifacts, puts exactly one blank line around
/// headings, fences, quotes, lists, tables and rules, never leaves more than
/// one blank line in a row, and trims leading and trailing blank lines.
///
/// # Examples
///
/// ```
/// use clipmark::markdown::normalize_markdown;
///
/// let raw = "\n\n# Title\nText  here.   \n\n\n\n- a\n- b\n";
/// assert_eq!(normalize_markdown(raw), "# Title\n\nText here.\n\n- a\n- b");
/// ```
#[must_use]
pub fn normalize_markdown(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut prev = LineKind::Blank;
    let mut open_fence: Option<(char, usize)> = None;

    let push_blank = |out: &mut Vec<String>| {
        if out.last().is_some_and(|l| !l.is_empty()) {
            out.push(String::new());
        }
    };

    for (i, raw) in lines.iter().enumerate() {
        if let Some((ch, run)) = open_fence {
            out.push((*raw).to_string());
            let closes = fence_marker(raw).is_some_and(|(c, r)| c == ch && r >= run)
                && raw.trim().chars().all(|c| c == ch);
            if closes {
                open_fence = None;
                prev = LineKind::Fence;
            }
            continue;
        }

        if let Some(marker) = fence_marker(raw) {
            push_blank(&mut out);
            out.push(raw.trim_end().to_string());
            open_fence = Some(marker);
            prev = LineKind::Fence;
            continue;
        }

        let line = clean_line(raw);
        let kind = classify(&line, prev, lines.get(i + 1).copied());

        if kind == LineKind::Blank {
            push_blank(&mut out);
            prev = LineKind::Blank;
            continue;
        }

        let joins_heading = kind == LineKind::Heading && prev == LineKind::Heading
            && SETEXT_UNDERLINE.is_match(line.trim());
        if prev != LineKind::Blank
            && prev != kind
            && (kind.is_block() || prev.is_block())
            && !joins_heading
        {
            push_blank(&mut out);
        } else if prev == LineKind::Heading && kind == LineKind::Heading && !joins_heading {
            push_blank(&mut out);
        } else if prev == LineKind::Rule && kind == LineKind::Rule {
            push_blank(&mut out);
        }

        out.push(line);
        prev = kind;
    }

    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    let start = out.iter().position(|l| !l.is_empty()).unwrap_or(out.len());
    out[start..].join("\n")
}
