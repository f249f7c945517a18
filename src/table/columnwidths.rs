use std::borrow::Cow;
use std::cmp;
use std::ops::Range;

use rayon::prelude::*;

use crate::util::{display_width, prefix_by_width, sanitize};

/// Space added around every cell by the boxed renderer (two blanks and a border)
pub const CELL_PADDING: usize = 3;

/// Appended to values cut by `truncate`
const TRUNCATION_SUFFIX: &str = " ...";

/// Threshold for using parallel processing (rows * cols)
const PARALLEL_THRESHOLD: usize = 10_000;

/// Width a single piece of text claims in its column, measured as it will be shown
#[inline]
pub fn cell_width(text: &str, max_col_width: usize) -> usize {
    cmp::min(display_width(&sanitize(text)) + CELL_PADDING, max_col_width)
}

/// Cut a value wider than `max_col_width` down to `max_col_width - 4` cells plus " ...".
///
/// Values that already fit come back untouched, so truncating twice is a no-op.
pub fn truncate(value: &str, max_col_width: usize) -> Cow<'_, str> {
    if display_width(value) <= max_col_width {
        return Cow::Borrowed(value);
    }

    let suffix_width = TRUNCATION_SUFFIX.len();
    if max_col_width <= suffix_width {
        return Cow::Borrowed(prefix_by_width(value, max_col_width));
    }

    let mut out = prefix_by_width(value, max_col_width - suffix_width).to_string();
    out.push_str(TRUNCATION_SUFFIX);
    Cow::Owned(out)
}

/// How many columns starting at `col_offset` fit in `screen_width`.
///
/// The running total starts with the left border and the space of the trailing
/// "more" marker (and a leading one when `has_left_more`). Columns are added left to
/// right while the total stays within the screen; partial columns are never counted.
pub fn visible_column_count(
    widths: &[usize],
    col_offset: usize,
    screen_width: usize,
    has_left_more: bool,
    more_marker: &str,
) -> usize {
    let marker_cell = display_width(more_marker) + CELL_PADDING;

    let mut total = 1 + marker_cell;
    if has_left_more {
        total += marker_cell;
    }

    let mut count = 0;
    for w in widths.iter().skip(col_offset) {
        if total + w > screen_width {
            break;
        }
        total += w;
        count += 1;
    }
    count
}

/// Contiguous run of columns selected for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWindow {
    pub start: usize,
    pub count: usize,
    /// Columns hidden to the left
    pub left_more: bool,
    /// Columns hidden to the right
    pub right_more: bool,
}

impl ColumnWindow {
    pub fn columns(&self) -> Range<usize> {
        self.start..self.start + self.count
    }
}

/// Per-column display widths, grown as rows stream in
#[derive(Debug, Clone)]
pub struct ColumnWidths {
    col_widths: Vec<usize>,
    max_col_width: usize,
}

impl ColumnWidths {
    /// Seed the widths from the header row
    pub fn new(headers: &[String], max_col_width: usize) -> Self {
        Self {
            col_widths: headers.iter().map(|h| cell_width(h, max_col_width)).collect(),
            max_col_width,
        }
    }

    pub fn max_col_width(&self) -> usize {
        self.max_col_width
    }

    #[cfg(test)]
    pub fn widths(&self) -> &[usize] {
        &self.col_widths
    }

    #[cfg(test)]
    pub fn width(&self, col: usize) -> usize {
        self.col_widths.get(col).copied().unwrap_or(0)
    }

    pub fn col_count(&self) -> usize {
        self.col_widths.len()
    }

    /// Space column widths take on screen.
    ///
    /// A column that hit the cap can hold a cell up to `max_col_width` wide, which the
    /// renderer pads like any other, so it is charged `max_col_width + CELL_PADDING`.
    pub fn screen_widths(&self) -> Vec<usize> {
        let max = self.max_col_width;
        self.col_widths
            .iter()
            .map(|&w| if w >= max { max + CELL_PADDING } else { w })
            .collect()
    }

    /// Printed width of the whole table, left border included
    pub fn total_width(&self) -> usize {
        1 + self.screen_widths().iter().sum::<usize>()
    }

    /// Widen columns to fit one newly loaded row (widths never shrink)
    pub fn observe_row(&mut self, row: &[String]) {
        let max = self.max_col_width;
        for (acc, value) in self.col_widths.iter_mut().zip(row) {
            *acc = cmp::max(*acc, cell_width(value, max));
        }
    }

    /// Widen columns to fit a batch of newly loaded rows.
    /// Uses parallel processing for large batches
    pub fn observe_rows(&mut self, rows: &[Vec<String>]) {
        let col_count = self.col_widths.len();
        let max = self.max_col_width;

        if rows.len() * col_count < PARALLEL_THRESHOLD || col_count <= 1 {
            for row in rows {
                self.observe_row(row);
            }
            return;
        }

        let batch = rows
            .par_iter()
            .fold(
                || vec![0; col_count],
                |mut acc: Vec<usize>, row| {
                    for (acc_w, x) in acc.iter_mut().zip(row.iter()) {
                        *acc_w = cmp::max(*acc_w, cell_width(x, max));
                    }
                    acc
                },
            )
            .reduce(
                || vec![0; col_count],
                |a, b| a.iter().zip(b.iter()).map(|(x, y)| cmp::max(*x, *y)).collect(),
            );

        for (acc, w) in self.col_widths.iter_mut().zip(batch) {
            *acc = cmp::max(*acc, w);
        }
    }

    /// Pick the columns to display for a horizontal offset and screen width.
    ///
    /// When the whole table fits, every column is shown and no markers are used.
    /// Otherwise at least one column is shown so scrolling always makes progress.
    pub fn window(&self, col_offset: usize, screen_width: usize, more_marker: &str) -> ColumnWindow {
        let col_count = self.col_widths.len();

        if self.total_width() <= screen_width {
            return ColumnWindow { start: 0, count: col_count, left_more: false, right_more: false };
        }

        let widths = self.screen_widths();

        let start = col_offset.min(col_count.saturating_sub(1));
        let left_more = start > 0;
        let count = visible_column_count(&widths, start, screen_width, left_more, more_marker)
            .max(1)
            .min(col_count - start);

        ColumnWindow {
            start,
            count,
            left_more,
            right_more: start + count < col_count,
        }
    }
}
