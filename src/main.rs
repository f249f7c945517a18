mod app;
mod config;
mod error;
mod input;
mod logging;
mod record;
mod source;
mod table;
mod term;
mod ui;
mod util;
mod viewport;

use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
    tty::IsTty,
};
use tracing::{error, info, Level};

use app::Pager;
use config::PagerConfig;
use error::{PagerError, Result};
use logging::SCREEN_LOG;
use source::{CsvSource, FileFormat};
use term::CrosstermTerminal;
use ui::ALTERNATE_SCREEN_ACTIVE;

/// Page through a CSV or TSV file one screen at a time, reading rows only as you scroll
#[derive(Debug, Parser)]
#[command(name = "gridpager", version, about)]
struct Cli {
    /// File to display
    input: PathBuf,

    /// Input type (csv or tsv); guessed from the file extension when omitted
    #[arg(short = 'i', long = "in", value_name = "TYPE")]
    input_type: Option<String>,

    /// Whether the first line holds the column names
    #[arg(long, value_name = "BOOL")]
    headers: Option<bool>,

    /// Field delimiter (comma, tab, semicolon, pipe, or a single character)
    #[arg(short, long, value_parser = parse_char)]
    delimiter: Option<char>,

    /// Quote character around fields
    #[arg(long, value_parser = parse_char)]
    enclosure: Option<char>,

    /// Escape character inside quoted fields
    #[arg(long, value_parser = parse_char)]
    escape: Option<char>,

    /// Widest a column may get, in terminal cells
    #[arg(long, value_name = "N")]
    max_col_width: Option<usize>,

    /// Shown in place of hidden columns
    #[arg(long, value_name = "TEXT")]
    more_marker: Option<String>,

    /// Draw on the main screen instead of the alternate one
    #[arg(long)]
    no_alternate_screen: bool,

    /// Config file (defaults to ~/.config/gridpager/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: Level,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Config file settings with command line overrides applied
    fn config(&self) -> Result<PagerConfig> {
        let mut config = PagerConfig::load(self.config.as_deref())?;

        if let Some(headers) = self.headers {
            config.has_headers = headers;
        }
        if self.delimiter.is_some() {
            config.delimiter = self.delimiter;
        }
        if let Some(enclosure) = self.enclosure {
            config.enclosure = enclosure;
        }
        if self.escape.is_some() {
            config.escape = self.escape;
        }
        if self.max_col_width.is_some() {
            config.max_col_width = self.max_col_width;
        }
        if let Some(marker) = &self.more_marker {
            config.more_marker = marker.clone();
        }
        if self.no_alternate_screen {
            config.alternate_screen = false;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse a delimiter-like argument into a single character
fn parse_char(s: &str) -> std::result::Result<char, String> {
    match s.to_lowercase().as_str() {
        "comma" => return Ok(','),
        "tab" | "\\t" => return Ok('\t'),
        "semicolon" => return Ok(';'),
        "pipe" => return Ok('|'),
        "backslash" => return Ok('\\'),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(format!("'{}' is not a single ASCII character", s)),
    }
}

/// Handle panics gracefully
fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        if ALTERNATE_SCREEN_ACTIVE.swap(false, Ordering::SeqCst) {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
        if SCREEN_LOG.is_deferred() {
            let _ = SCREEN_LOG.release(&mut io::stderr());
        }

        if let Some(location) = info.location() {
            error!(file = location.file(), line = location.line(), "panic occurred");
        } else {
            error!("panic occurred");
        }

        default_hook(info);
    }));
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.config()?;
    let format = FileFormat::resolve(cli.input_type.as_deref(), &cli.input)?;
    let options = config.source_options(format)?;
    let source = CsvSource::open(&cli.input, &options)?;

    if !io::stdin().is_tty() {
        return Err(PagerError::NotATerminal("standard input"));
    }
    if !io::stdout().is_tty() {
        return Err(PagerError::NotATerminal("standard output"));
    }

    let mut pager = Pager::new(source, CrosstermTerminal::new(), io::stdout(), &config)?;
    pager.run()
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_level, cli.log_file.as_deref()) {
        eprintln!("gridpager: cannot open log file: {}", e);
        std::process::exit(1);
    }
    install_panic_hook();
    info!(input = %cli.input.display(), "gridpager started");

    match run(&cli) {
        Ok(()) => info!("gridpager exited"),
        Err(PagerError::EmptyDataset) => {
            info!("nothing to display");
            println!("{}: no records to display", cli.input.display());
        }
        Err(e) => {
            error!(error = %e, "gridpager failed");
            eprintln!("gridpager: {}", e);
            std::process::exit(1);
        }
    }
}
