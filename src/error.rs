use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a pager session.
///
/// Out-of-range navigation is never reported here; the viewport absorbs it as a no-op.
#[derive(Debug, Error)]
pub enum PagerError {
    /// The record source failed to produce a record (malformed input, bad encoding...)
    #[error("failed to read record: {0}")]
    Source(#[from] csv::Error),

    /// A record did not carry the column set established by the first record
    #[error("record {row} does not match the header columns: {reason}")]
    SchemaMismatch { row: usize, reason: String },

    #[error("the source contains no records")]
    EmptyDataset,

    #[error("unable to determine the terminal size: {0}")]
    TerminalSize(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{0} is not a terminal")]
    NotATerminal(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("the file \"{}\" does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("you must define the input type via the --in option for {0} files")]
    AmbiguousFormat(String),

    #[error("the input type \"{0}\" is not supported (expected csv or tsv)")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, PagerError>;
