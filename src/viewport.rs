use tracing::{debug, info};

use crate::error::{PagerError, Result};
use crate::record::Record;
use crate::table::{ColumnWidths, RowBuffer};

/// Lines the boxed table spends on borders and the header row
pub const TABLE_CHROME_LINES: usize = 4;

/// Navigation commands understood by the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
    PageUp,
    PageDown,
    Top,
    Quit,
}

/// What applying a command did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Something visible changed and the table must be redrawn
    Changed,
    /// The command was out of range and ignored
    Unchanged,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u16,
    pub height: u16,
}

impl ScreenSize {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Data rows that fit under the table chrome
    pub fn rows_per_screen(&self) -> usize {
        (self.height as usize).saturating_sub(TABLE_CHROME_LINES).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    /// Topmost visible row, an index into the loaded rows
    pub row_offset: usize,
    /// Leftmost visible column
    pub col_offset: usize,
    pub screen: ScreenSize,
    /// Cap on any column's width, fixed for the session
    pub max_col_width: usize,
}

/// Scroll state over a lazily loaded table.
///
/// Owns the row buffer (and through it the source) and the column layout, and pulls
/// rows on demand when the user scrolls past what has been loaded.
pub struct Viewport<S> {
    state: ViewportState,
    buffer: RowBuffer<S>,
    layout: ColumnWidths,
    /// Rows already folded into `layout`
    scanned: usize,
}

impl<S> Viewport<S>
where
    S: Iterator<Item = Result<Record>>,
{
    /// Start a session: pull the first screenful and size the columns from it
    pub fn open(source: S, screen: ScreenSize, max_col_width: usize) -> Result<Self> {
        let mut buffer = RowBuffer::new(source);
        buffer.ensure_loaded(screen.rows_per_screen() - 1)?;
        if buffer.is_empty() {
            return Err(PagerError::EmptyDataset);
        }

        let layout = ColumnWidths::new(buffer.columns(), max_col_width);
        let mut viewport = Self {
            state: ViewportState { row_offset: 0, col_offset: 0, screen, max_col_width },
            buffer,
            layout,
            scanned: 0,
        };
        viewport.refresh_layout();

        info!(
            rows = viewport.buffer.len(),
            columns = viewport.layout.col_count(),
            max_col_width,
            "initial window loaded"
        );
        Ok(viewport)
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn buffer(&self) -> &RowBuffer<S> {
        &self.buffer
    }

    pub fn layout(&self) -> &ColumnWidths {
        &self.layout
    }

    pub fn columns(&self) -> &[String] {
        self.buffer.columns()
    }

    /// Adopt a new screen geometry; the column width cap stays as it was.
    ///
    /// A taller screen pulls enough rows to fill the new space.
    pub fn resize(&mut self, screen: ScreenSize) -> Result<Outcome> {
        if screen == self.state.screen {
            return Ok(Outcome::Unchanged);
        }
        debug!(width = screen.width, height = screen.height, "screen resized");
        self.state.screen = screen;

        let last_visible = self.state.row_offset + screen.rows_per_screen() - 1;
        if self.buffer.len() <= last_visible {
            self.buffer.ensure_loaded(last_visible)?;
            self.refresh_layout();
        }
        Ok(Outcome::Changed)
    }

    fn refresh_layout(&mut self) {
        for rows in self.buffer.slices_from(self.scanned) {
            self.layout.observe_rows(rows);
        }
        self.scanned = self.buffer.len();
    }

    pub fn apply(&mut self, command: Command) -> Result<Outcome> {
        let outcome = match command {
            Command::ScrollDown => self.scroll_down()?,
            Command::ScrollUp => self.scroll_up(),
            Command::ScrollLeft => self.scroll_left(),
            Command::ScrollRight => self.scroll_right(),
            Command::PageDown => self.page_down()?,
            Command::PageUp => self.page_up(),
            Command::Top => self.move_to_top(),
            Command::Quit => Outcome::Quit,
        };
        debug!(
            ?command,
            ?outcome,
            row_offset = self.state.row_offset,
            col_offset = self.state.col_offset,
            "applied command"
        );
        Ok(outcome)
    }

    fn scroll_down(&mut self) -> Result<Outcome> {
        let rows_per_screen = self.state.screen.rows_per_screen();

        // Make sure the row that would appear at the bottom is loaded
        let before = self.buffer.len();
        let loaded = self.buffer.ensure_loaded(self.state.row_offset + rows_per_screen)?;

        let mut outcome = Outcome::Unchanged;
        if loaded > before {
            self.refresh_layout();
            outcome = Outcome::Changed;
        }

        if loaded >= rows_per_screen && self.state.row_offset + 1 < loaded {
            self.state.row_offset += 1;
            outcome = Outcome::Changed;
        }
        Ok(outcome)
    }

    fn scroll_up(&mut self) -> Outcome {
        if self.state.row_offset == 0 {
            return Outcome::Unchanged;
        }
        self.state.row_offset -= 1;
        Outcome::Changed
    }

    fn scroll_left(&mut self) -> Outcome {
        if self.state.col_offset == 0 {
            return Outcome::Unchanged;
        }
        self.state.col_offset -= 1;
        Outcome::Changed
    }

    fn scroll_right(&mut self) -> Outcome {
        if self.state.col_offset + 1 >= self.columns().len() {
            return Outcome::Unchanged;
        }
        self.state.col_offset += 1;
        Outcome::Changed
    }

    fn page_down(&mut self) -> Result<Outcome> {
        let mut outcome = Outcome::Unchanged;
        for _ in 0..self.state.screen.rows_per_screen() {
            if self.scroll_down()? == Outcome::Unchanged {
                break;
            }
            outcome = Outcome::Changed;
        }
        Ok(outcome)
    }

    fn page_up(&mut self) -> Outcome {
        if self.state.row_offset == 0 {
            return Outcome::Unchanged;
        }
        let jump = self.state.screen.rows_per_screen();
        self.state.row_offset = self.state.row_offset.saturating_sub(jump);
        Outcome::Changed
    }

    fn move_to_top(&mut self) -> Outcome {
        if self.state.row_offset == 0 && self.state.col_offset == 0 {
            return Outcome::Unchanged;
        }
        self.state.row_offset = 0;
        self.state.col_offset = 0;
        Outcome::Changed
    }
}
