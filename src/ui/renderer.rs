use std::io::{self, Write};

use crate::util::display_width;

/// Turns a bounded grid of strings into text
pub trait TableRenderer {
    fn render(&self, headers: &[String], rows: &[Vec<String>], out: &mut dyn Write) -> io::Result<()>;
}

/// Boxed, fixed-width table:
///
/// ```text
/// +-----+------+
/// | sku | name |
/// +-----+------+
/// | A1  | foo  |
/// +-----+------+
/// ```
///
/// Each column is as wide as its widest cell plus one blank on either side.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxRenderer;

impl BoxRenderer {
    fn separator(widths: &[usize]) -> String {
        let mut line = String::from("+");
        for w in widths {
            line.push_str(&"-".repeat(w + 2));
            line.push('+');
        }
        line
    }

    fn row_line(widths: &[usize], cells: &[String]) -> String {
        let mut line = String::from("|");
        for (i, w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(|c| c.as_str()).unwrap_or("");
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(w.saturating_sub(display_width(cell)) + 1));
            line.push('|');
        }
        line
    }
}

impl TableRenderer for BoxRenderer {
    fn render(&self, headers: &[String], rows: &[Vec<String>], out: &mut dyn Write) -> io::Result<()> {
        let widths: Vec<usize> = (0..headers.len())
            .map(|col| {
                rows.iter()
                    .filter_map(|row| row.get(col))
                    .map(|c| display_width(c))
                    .fold(display_width(&headers[col]), usize::max)
            })
            .collect();

        let separator = Self::separator(&widths);
        writeln!(out, "{}", separator)?;
        writeln!(out, "{}", Self::row_line(&widths, headers))?;
        writeln!(out, "{}", separator)?;
        if !rows.is_empty() {
            for row in rows {
                writeln!(out, "{}", Self::row_line(&widths, row))?;
            }
            writeln!(out, "{}", separator)?;
        }
        Ok(())
    }
}
