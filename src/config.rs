use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{PagerError, Result};
use crate::input::{Key, ESC};
use crate::source::{FileFormat, SourceOptions};
use crate::viewport::Command;

const CTRL_C: u8 = 0x03;

/// Maps decoded keys to viewport commands.
///
/// Exact keys are looked up first; escape sequences then fall back to their final
/// byte, so modified arrows (`ESC [ 1 ; 5 A`) scroll like plain ones.
pub struct KeyMap {
    basic_map: HashMap<Key, Command>,
    final_map: HashMap<u8, Command>,
}

impl KeyMap {
    pub fn lookup(&self, key: &Key) -> Option<Command> {
        if let Some(command) = self.basic_map.get(key) {
            return Some(*command);
        }
        match key {
            Key::Sequence { final_byte, .. } => self.final_map.get(final_byte).copied(),
            _ => None,
        }
    }
}

fn tilde(code: &[u8]) -> Key {
    Key::Sequence { params: code.to_vec(), final_byte: b'~' }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            basic_map: HashMap::from([
                (Key::Byte(b'q'), Command::Quit),
                (Key::Byte(b'Q'), Command::Quit),
                (Key::Byte(CTRL_C), Command::Quit),
                (Key::Eof, Command::Quit),

                (Key::Byte(b'j'), Command::ScrollDown),
                (Key::Byte(b'k'), Command::ScrollUp),
                (Key::Byte(b'h'), Command::ScrollLeft),
                (Key::Byte(b'l'), Command::ScrollRight),
                (Key::Byte(b'\r'), Command::ScrollDown),

                (Key::Byte(b' '), Command::PageDown),
                (Key::Byte(b'b'), Command::PageUp),
                (tilde(b"6"), Command::PageDown),
                (tilde(b"5"), Command::PageUp),

                (Key::Byte(b'g'), Command::Top),
                (tilde(b"1"), Command::Top),
                (tilde(b"7"), Command::Top),
            ]),
            final_map: HashMap::from([
                (b'A', Command::ScrollUp),
                (b'B', Command::ScrollDown),
                (b'C', Command::ScrollRight),
                (b'D', Command::ScrollLeft),
                (b'H', Command::Top),
            ]),
        }
    }
}

/// Settings read from the config file, then overridden from the command line
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagerConfig {
    /// First line of the input holds the column names
    pub has_headers: bool,
    /// Field separator; the input format decides when unset
    pub delimiter: Option<char>,
    pub enclosure: char,
    /// Escape character inside quoted fields; unset means doubled quotes
    pub escape: Option<char>,
    /// Fixed column width cap; computed from the screen when unset
    pub max_col_width: Option<usize>,
    pub max_col_width_divisor: usize,
    pub more_marker: String,
    pub alternate_screen: bool,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            has_headers: true,
            delimiter: None,
            enclosure: '"',
            escape: None,
            max_col_width: None,
            max_col_width_divisor: 4,
            more_marker: "...".to_string(),
            alternate_screen: true,
        }
    }
}

impl PagerConfig {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PagerError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| PagerError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// `$HOME/.config/gridpager/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(PathBuf::from(home).join(".config").join("gridpager").join("config.toml"))
    }

    /// Read the explicit config file, or the default one if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ascii_byte("delimiter", self.delimiter)?;
        ascii_byte("enclosure", Some(self.enclosure))?;
        ascii_byte("escape", self.escape)?;

        if self.max_col_width_divisor == 0 {
            return Err(PagerError::Config("max_col_width_divisor must be at least 1".into()));
        }
        if self.more_marker.chars().any(char::is_control) {
            return Err(PagerError::Config("more_marker must not contain control characters".into()));
        }
        if self.max_col_width == Some(0) {
            return Err(PagerError::Config("max_col_width must be at least 1".into()));
        }
        Ok(())
    }

    /// Column width cap for a screen `screen_width` cells wide
    pub fn max_col_width(&self, screen_width: u16) -> usize {
        let divisor = self.max_col_width_divisor.max(1);
        self.max_col_width
            .unwrap_or(screen_width as usize / divisor)
            .max(1)
    }

    pub fn source_options(&self, format: FileFormat) -> Result<SourceOptions> {
        Ok(SourceOptions {
            format,
            has_headers: self.has_headers,
            delimiter: ascii_byte("delimiter", self.delimiter)?,
            enclosure: ascii_byte("enclosure", Some(self.enclosure))?.unwrap_or(b'"'),
            escape: ascii_byte("escape", self.escape)?,
        })
    }
}

fn ascii_byte(name: &str, c: Option<char>) -> Result<Option<u8>> {
    match c {
        None => Ok(None),
        Some(c) if c.is_ascii() && c as u8 != ESC => Ok(Some(c as u8)),
        Some(c) => Err(PagerError::Config(format!(
            "{} must be a single ASCII character, got {:?}",
            name, c
        ))),
    }
}
