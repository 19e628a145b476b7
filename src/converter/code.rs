//! Code block helpers shared by both engines: language detection,
//! dedenting and fencing.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

use crate::options::CodeBlockStyle;
use crate::patterns::CODE_LANGUAGE_CLASS;

/// Content signatures, tried in order; the first match names the language.
static SIGNATURES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("php", r"^\s*<\?php"),
        ("bash", r"^#!\s*/(?:usr/)?bin/(?:env\s+)?(?:ba)?sh\b"),
        ("python", r"^#!\s*/usr/bin/(?:env\s+)?python"),
        ("html", r"(?i)^\s*(?:<!doctype\s+html|<html[\s>])"),
        ("json", r#"^\s*[\{\[]\s*"[^"]+"\s*:"#),
        ("rust", r"(?m)^\s*(?:pub\s+)?fn\s+\w+\s*(?:<[^>]*>)?\s*\([^)]*\)\s*(?:->\s*[^{]+)?\{|\blet\s+mut\s+\w+|\bimpl\s+\w+\s+for\s+\w+"),
        ("go", r"(?m)^package\s+\w+\s*$[\s\S]*\bfunc\s+\w+\s*\("),
        ("python", r"(?m)^\s*def\s+\w+\s*\([^)]*\)\s*(?:->\s*[\w\[\], .]+)?:|^\s*from\s+[\w.]+\s+import\s+\w+|^\s*class\s+\w+(?:\([\w., ]*\))?:\s*$"),
        ("java", r"\bpublic\s+(?:static\s+)?(?:final\s+)?(?:class|void|interface)\s+\w+"),
        ("cpp", r"(?m)^\s*#include\s*<(?:iostream|vector|string|map|memory)>|\bstd::\w+"),
        ("c", r"(?m)^\s*#include\s*<\w+\.h>"),
        ("javascript", r"\bfunction\s*\w*\s*\([^)]*\)\s*\{|\bconsole\.log\s*\(|\b(?:const|let)\s+\w+\s*=\s*(?:\([^)]*\)|\w+)\s*=>|\brequire\(\s*['\x22]"),
        ("sql", r"(?i)^\s*(?:select\s+[\s\S]+\s+from\s+\w+|insert\s+into\s+\w+|create\s+table\s+\w+|update\s+\w+\s+set\s+)"),
        ("css", r"(?m)^\s*[.#]?[\w-]+(?:\s*[.#:>]?[\w-]*)*\s*\{\s*[\w-]+\s*:\s*[^;]+;"),
        ("bash", r"(?m)^\s*\$\s+(?:sudo|apt|brew|npm|cargo|pip|git|cd|ls|curl|docker)\b"),
    ]
    .into_iter()
    .map(|(lang, pattern)| (lang, Regex::new(pattern).expect("code signature regex")))
    .collect()
});

/// Language named by a class attribute (`language-x`, `lang-x`, `brush: x`, ...).
#[must_use]
pub fn language_from_class(class: &str) -> Option<String> {
    CODE_LANGUAGE_CLASS
        .captures(class)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .filter(|lang| !matches!(lang.as_str(), "none" | "plaintext" | "text" | "nohighlight"))
}

/// Guess a language from the code itself. `None` when nothing is distinctive.
#[must_use]
pub fn language_from_content(code: &str) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(_, pattern)| pattern.is_match(code))
        .map(|(lang, _)| *lang)
}

/// Remove the indentation shared by every non-blank line, and blank lines
/// at the start and end.
#[must_use]
pub fn dedent(code: &str) -> String {
    let code = code.replace("\r\n", "\n").replace('\t', "    ");
    let lines: Vec<&str> = code.lines().collect();

    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let lines = &lines[first..=last];

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| l.get(indent..).map_or_else(|| l.trim(), str::trim_end))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Longest run of consecutive backticks in `text`.
#[must_use]
pub fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Render a code block, padded with blank lines.
///
/// Fenced blocks grow their fence past any backtick run in the code.
/// Indented blocks cannot carry a language.
#[must_use]
pub fn render_code_block(code: &str, language: Option<&str>, style: CodeBlockStyle) -> String {
    let code = dedent(code);

    match style {
        CodeBlockStyle::Fenced => {
            let fence = "`".repeat(longest_backtick_run(&code).max(2) + 1);
            format!("\n\n{fence}{}\n{code}\n{fence}\n\n", language.unwrap_or_default())
        }
        CodeBlockStyle::Indented => {
            let body = code
                .lines()
                .map(|l| if l.is_empty() { String::new() } else { format!("    {l}") })
                .collect::<Vec<_>>()
                .join("\n");
            format!("\n\n{body}\n\n")
        }
    }
}

/// Render inline code; content with backticks gets a doubled delimiter.
#[must_use]
pub fn render_inline_code(text: &str) -> String {
    let text = text.replace(['\n', '\r'], " ");
    if text.trim().is_empty() {
        return String::new();
    }
    if text.contains('`') {
        let ticks = "`".repeat(longest_backtick_run(&text) + 1);
        format!("{ticks} {text} {ticks}")
    } else {
        format!("`{text}`")
    }
}
