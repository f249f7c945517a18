//! Terminal capabilities the pager relies on.
//!
//! The session only talks to a [`TerminalBackend`]: query the screen size, switch raw
//! mode on and off, read input bytes. [`CrosstermTerminal`] is the real implementation;
//! tests drive the pager through a scripted one.

use std::io::{self, Read};

use tracing::warn;

pub trait TerminalBackend {
    /// Current screen size as (columns, rows)
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Switch to raw, non-canonical, non-echoing input
    fn enter_raw_mode(&mut self) -> io::Result<()>;

    /// Restore the input mode saved by `enter_raw_mode`
    fn leave_raw_mode(&mut self) -> io::Result<()>;

    /// Block until one input byte is available. None at end of input
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Raw mode held for as long as the guard lives.
///
/// The previous mode is restored on drop, so every exit path (including `?` on a
/// failed read) gives the terminal back in the state it was found.
pub struct RawModeGuard<'a, T: TerminalBackend + ?Sized> {
    term: &'a mut T,
}

impl<'a, T: TerminalBackend + ?Sized> RawModeGuard<'a, T> {
    pub fn acquire(term: &'a mut T) -> io::Result<Self> {
        term.enter_raw_mode()?;
        Ok(Self { term })
    }

    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.term.read_byte()
    }
}

impl<T: TerminalBackend + ?Sized> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.term.leave_raw_mode() {
            warn!(error = %e, "failed to restore terminal mode");
        }
    }
}

/// Terminal backed by crossterm, reading keys from stdin
pub struct CrosstermTerminal {
    stdin: io::Stdin,
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBackend for CrosstermTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn enter_raw_mode(&mut self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        crossterm::terminal::disable_raw_mode()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.stdin.lock().read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Terminal with a fixed size and a queue of pending input bytes
    pub struct ScriptedTerminal {
        pub width: u16,
        pub height: u16,
        input: VecDeque<u8>,
        pub raw: bool,
        pub raw_entries: usize,
        pub raw_exits: usize,
        pub fail_size: bool,
        pub fail_reads: bool,
    }

    impl ScriptedTerminal {
        pub fn new(width: u16, height: u16) -> Self {
            Self {
                width,
                height,
                input: VecDeque::new(),
                raw: false,
                raw_entries: 0,
                raw_exits: 0,
                fail_size: false,
                fail_reads: false,
            }
        }

        pub fn with_input(mut self, bytes: &[u8]) -> Self {
            self.push_input(bytes);
            self
        }

        pub fn push_input(&mut self, bytes: &[u8]) {
            self.input.extend(bytes.iter().copied());
        }
    }

    impl TerminalBackend for ScriptedTerminal {
        fn size(&self) -> io::Result<(u16, u16)> {
            if self.fail_size {
                return Err(io::Error::new(io::ErrorKind::Unsupported, "not a terminal"));
            }
            Ok((self.width, self.height))
        }

        fn enter_raw_mode(&mut self) -> io::Result<()> {
            assert!(!self.raw, "raw mode entered twice");
            self.raw = true;
            self.raw_entries += 1;
            Ok(())
        }

        fn leave_raw_mode(&mut self) -> io::Result<()> {
            self.raw = false;
            self.raw_exits += 1;
            Ok(())
        }

        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            assert!(self.raw, "read outside raw mode");
            if self.fail_reads {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "input closed"));
            }
            Ok(self.input.pop_front())
        }
    }
}
