pub mod renderer;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::error::Result;
use crate::record::Record;
use crate::table::columnwidths::truncate;
use crate::util::{prefix_by_width, sanitize};
use crate::viewport::{ScreenSize, Viewport};
use renderer::TableRenderer;

/// Set while the pager owns the alternate screen, so a panic can give it back
pub static ALTERNATE_SCREEN_ACTIVE: AtomicBool = AtomicBool::new(false);

/// The strings to hand to the table renderer for one redraw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Cut out the visible part of the table: the rows of the current page and the
/// columns that fit, with "more" markers where columns are hidden. Cells are
/// sanitized and truncated, so every string fits on one line of its column.
pub fn visible_grid<S>(viewport: &Viewport<S>, more_marker: &str) -> Grid
where
    S: Iterator<Item = Result<Record>>,
{
    let state = viewport.state();
    let layout = viewport.layout();
    let max_col_width = layout.max_col_width();
    let window = layout.window(state.col_offset, state.screen.width as usize, more_marker);

    let frame_row = |cells: &[String]| -> Vec<String> {
        let mut out = Vec::with_capacity(window.count + 2);
        if window.left_more {
            out.push(more_marker.to_string());
        }
        for col in window.columns() {
            let value = cells.get(col).map(|s| s.as_str()).unwrap_or("");
            out.push(truncate(&sanitize(value), max_col_width).into_owned());
        }
        if window.right_more {
            out.push(more_marker.to_string());
        }
        out
    };

    let first = state.row_offset;
    let last = first + state.screen.rows_per_screen();

    Grid {
        headers: frame_row(viewport.columns()),
        rows: viewport.buffer().rows(first..last).map(|row| frame_row(row)).collect(),
    }
}

/// Render `grid` into exactly `screen.height` lines.
///
/// Short tables are padded with blank lines so every redraw covers the same area,
/// and lines are clipped to the screen width so nothing wraps.
pub fn render_frame(grid: &Grid, renderer: &dyn TableRenderer, screen: ScreenSize) -> io::Result<Vec<String>> {
    let mut buf = Vec::new();
    renderer.render(&grid.headers, &grid.rows, &mut buf)?;

    let width = screen.width as usize;
    let height = screen.height as usize;

    let text = String::from_utf8_lossy(&buf);
    let mut lines: Vec<String> = text
        .lines()
        .map(|line| prefix_by_width(line, width).to_string())
        .collect();
    lines.resize(height, String::new());
    Ok(lines)
}

/// Paint a frame from the top-left corner of the screen
pub fn draw<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.write_all(b"\r\n")?;
        }
        out.write_all(line.as_bytes())?;
    }
    out.flush()
}

pub fn enter_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, EnterAlternateScreen, Hide)?;
    ALTERNATE_SCREEN_ACTIVE.store(true, Ordering::SeqCst);
    Ok(())
}

pub fn leave_screen<W: Write>(out: &mut W) -> io::Result<()> {
    ALTERNATE_SCREEN_ACTIVE.store(false, Ordering::SeqCst);
    execute!(out, Show, LeaveAlternateScreen)
}
