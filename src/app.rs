use std::io::Write;

use tracing::{debug, info, warn};

use crate::config::{KeyMap, PagerConfig};
use crate::error::{PagerError, Result};
use crate::input::read_key;
use crate::logging::SCREEN_LOG;
use crate::record::Record;
use crate::term::TerminalBackend;
use crate::ui::renderer::{BoxRenderer, TableRenderer};
use crate::ui::{self, Grid};
use crate::viewport::{Outcome, ScreenSize, Viewport};

/// One interactive paging session over a record source
pub struct Pager<S, T, W> {
    viewport: Viewport<S>,
    term: T,
    out: W,
    renderer: Box<dyn TableRenderer>,
    keymap: KeyMap,
    more_marker: String,
    alternate_screen: bool,
    /// Number of frames drawn so far
    frames: usize,
}

impl<S, T, W> Pager<S, T, W>
where
    S: Iterator<Item = Result<Record>>,
    T: TerminalBackend,
    W: Write,
{
    /// Size the screen and load the first page.
    ///
    /// Fails when the terminal size is unavailable or the source has no records.
    pub fn new(source: S, term: T, out: W, config: &PagerConfig) -> Result<Self> {
        let (width, height) = term.size().map_err(PagerError::TerminalSize)?;
        let screen = ScreenSize::new(width, height);
        let max_col_width = config.max_col_width(width);
        info!(width, height, max_col_width, "terminal size");

        let viewport = Viewport::open(source, screen, max_col_width)?;

        Ok(Self {
            viewport,
            term,
            out,
            renderer: Box::new(BoxRenderer),
            keymap: KeyMap::default(),
            more_marker: config.more_marker.clone(),
            alternate_screen: config.alternate_screen,
            frames: 0,
        })
    }

    #[cfg(test)]
    pub fn viewport(&self) -> &Viewport<S> {
        &self.viewport
    }

    #[cfg(test)]
    pub fn term(&self) -> &T {
        &self.term
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    #[cfg(test)]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Run until the user quits or a fatal error occurs.
    ///
    /// Log output is held back while the table is on screen and written out afterwards.
    pub fn run(&mut self) -> Result<()> {
        if self.alternate_screen {
            ui::enter_screen(&mut self.out)?;
        }
        SCREEN_LOG.defer();

        let result = self.event_loop();

        if self.alternate_screen {
            if let Err(e) = ui::leave_screen(&mut self.out) {
                warn!(error = %e, "failed to leave the alternate screen");
            }
        }
        if let Err(e) = SCREEN_LOG.release(&mut std::io::stderr()) {
            warn!(error = %e, "failed to write held back log output");
        }
        info!(
            rows_loaded = self.viewport.buffer().len(),
            exhausted = self.viewport.buffer().is_exhausted(),
            frames = self.frames,
            "session ended"
        );
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;
        loop {
            if dirty {
                self.render()?;
                dirty = false;
            }

            let key = read_key(&mut self.term)?;
            let Some(command) = self.keymap.lookup(&key) else {
                debug!(?key, "unbound key");
                continue;
            };

            if self.sync_screen_size()? {
                dirty = true;
            }

            match self.viewport.apply(command)? {
                Outcome::Changed => dirty = true,
                Outcome::Unchanged => {}
                Outcome::Quit => return Ok(()),
            }
        }
    }

    /// Pick up a resized terminal; keeps the old geometry if the query fails
    fn sync_screen_size(&mut self) -> Result<bool> {
        match self.term.size() {
            Ok((width, height)) => {
                let outcome = self.viewport.resize(ScreenSize::new(width, height))?;
                Ok(outcome == Outcome::Changed)
            }
            Err(e) => {
                warn!(error = %e, "terminal size unavailable, keeping previous size");
                Ok(false)
            }
        }
    }

    /// The grid the next frame would show
    pub fn grid(&self) -> Grid {
        ui::visible_grid(&self.viewport, &self.more_marker)
    }

    /// Draw the current window
    pub fn render(&mut self) -> Result<()> {
        let grid = self.grid();
        let lines = ui::render_frame(&grid, self.renderer.as_ref(), self.viewport.state().screen)?;
        ui::draw(&mut self.out, &lines)?;
        self.frames += 1;
        Ok(())
    }
}
