//! Table conversion.
//!
//! Both engines reduce a table to rows of already-converted cell text plus
//! per-column alignment, then share [`format_table`] for the pipe syntax.

use crate::patterns::TEXT_ALIGN;

/// Column alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// No alignment marker.
    #[default]
    None,
    /// `:---`
    Left,
    /// `:---:`
    Center,
    /// `---:`
    Right,
}

impl Alignment {
    /// Parse an `align` value or `text-align` keyword.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "left" | "start" => Self::Left,
            "center" => Self::Center,
            "right" | "end" => Self::Right,
            _ => Self::None,
        }
    }

    /// Alignment of a cell from its `style` and `align` attributes;
    /// `text-align` wins.
    #[must_use]
    pub fn from_attributes(style: Option<&str>, align: Option<&str>) -> Self {
        let from_style = style
            .and_then(|s| TEXT_ALIGN.captures(s))
            .and_then(|c| c.get(1))
            .map(|m| Self::parse(m.as_str()));
        match from_style {
            Some(a) if a != Self::None => a,
            _ => align.map_or(Self::None, Self::parse),
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::None => "---",
            Self::Left => ":---",
            Self::Center => ":---:",
            Self::Right => "---:",
        }
    }
}

/// One converted cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    /// Inline Markdown of the cell.
    pub text: String,
    /// Header cell (`<th>`).
    pub header: bool,
    /// Alignment declared on the cell.
    pub align: Alignment,
    /// Columns spanned.
    pub colspan: usize,
}

/// Collapse newlines and escape pipes so the text fits in one cell.
#[must_use]
pub fn cell_text(markdown: &str) -> String {
    let flat = markdown
        .replace("\\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::with_capacity(flat.len());
    let mut prev = '\0';
    for ch in flat.chars() {
        if ch == '|' && prev != '\\' {
            out.push('\\');
        }
        out.push(ch);
        prev = ch;
    }
    out
}

/// Format rows as a pipe table.
///
/// The first row is the header when `has_header`; otherwise `Column N`
/// headers are synthesized. Spanned cells expand into empty cells and short
/// rows are padded. Column alignment comes from the header cell, or the
/// first body cell declaring one.
#[must_use]
pub fn format_table(rows: &[Vec<Cell>], has_header: bool) -> String {
    let rows: Vec<Vec<Cell>> = rows
        .iter()
        .map(|row| expand_spans(row))
        .filter(|row| !row.is_empty())
        .collect();
    if rows.is_empty() {
        return String::new();
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let (header, body) = if has_header {
        (rows[0].clone(), &rows[1..])
    } else {
        let synthesized = (1..=columns)
            .map(|i| Cell {
                text: format!("Column {i}"),
                header: true,
                ..Cell::default()
            })
            .collect();
        (synthesized, &rows[..])
    };

    let alignments: Vec<Alignment> = (0..columns)
        .map(|col| {
            std::iter::once(&header)
                .chain(body.iter())
                .filter_map(|row| row.get(col))
                .map(|cell| cell.align)
                .find(|a| *a != Alignment::None)
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    out.push_str(&format_row(&header, columns));
    out.push('\n');
    out.push_str("| ");
    out.push_str(&alignments.iter().map(|a| a.separator()).collect::<Vec<_>>().join(" | "));
    out.push_str(" |");
    for row in body {
        out.push('\n');
        out.push_str(&format_row(row, columns));
    }
    out
}

fn expand_spans(row: &[Cell]) -> Vec<Cell> {
    let mut expanded = Vec::with_capacity(row.len());
    for cell in row {
        let span = cell.colspan.clamp(1, 1000);
        expanded.push(Cell {
            colspan: 1,
            ..cell.clone()
        });
        for _ in 1..span {
            expanded.push(Cell {
                header: cell.header,
                colspan: 1,
                ..Cell::default()
            });
        }
    }
    expanded
}

fn format_row(row: &[Cell], columns: usize) -> String {
    let cells: Vec<&str> = (0..columns)
        .map(|i| row.get(i).map_or("", |c| c.text.as_str()))
        .collect();
    format!("| {} |", cells.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(text: &str, header: bool) -> Cell {
        Cell {
            text: text.to_string(),
            header,
            align: Alignment::None,
            colspan: 1,
        }
    }

    #[test]
    fn test_simple_table() {
        let rows = vec![vec![cell("A", true)], vec![cell("1", false)]];
        assert_eq!(format_table(&rows, true), "| A |\n| --- |\n| 1 |");
    }

    #[test]
    fn test_alignment_markers() {
        let mut right = cell("R", true);
        right.align = Alignment::Right;
        let mut center = cell("C", true);
        center.align = Alignment::Center;
        let mut left = cell("L", true);
        left.align = Alignment::Left;

        let rows = vec![vec![right, center, left, cell("N", true)]];
        assert_eq!(
            format_table(&rows, true),
            "| R | C | L | N |\n| ---: | :---: | :--- | --- |"
        );
    }

    #[test]
    fn test_synthesized_header() {
        let rows = vec![vec![cell("1", false), cell("2", false)]];
        assert_eq!(
            format_table(&rows, false),
            "| Column 1 | Column 2 |\n| --- | --- |\n| 1 | 2 |"
        );
    }

    #[test]
    fn test_colspan_and_padding() {
        let mut wide = cell("wide", false);
        wide.colspan = 2;
        let rows = vec![
            vec![cell("A", true), cell("B", true), cell("C", true)],
            vec![wide],
            vec![cell("x", false)],
        ];
        assert_eq!(
            format_table(&rows, true),
            "| A | B | C |\n| --- | --- | --- |\n| wide |  |  |\n| x |  |  |"
        );
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(format_table(&[], true), "");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text("a | b\n c"), "a \\| b c");
        assert_eq!(cell_text("already \\| escaped"), "already \\| escaped");
    }

    #[test]
    fn test_alignment_from_attributes() {
        assert_eq!(Alignment::from_attributes(Some("text-align:right"), None), Alignment::Right);
        assert_eq!(Alignment::from_attributes(None, Some("CENTER")), Alignment::Center);
        assert_eq!(Alignment::from_attributes(Some("color: red"), Some("left")), Alignment::Left);
    }
}
