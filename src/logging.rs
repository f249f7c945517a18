use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::Level;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};

use crate::error::Result;

/// Most log output held back during one session; later lines are dropped
const MAX_PENDING: usize = 1 << 20; // 1 MB

/// Log lines written while the pager owns the screen
pub static SCREEN_LOG: DeferredLog = DeferredLog::new();

struct Pending {
    bytes: Vec<u8>,
    dropped: usize,
}

/// Holds log output back while the table is on screen.
///
/// Writing to the terminal mid-session would scribble over the table (or, on the
/// alternate screen, force a switch that clears it), so lines are kept until
/// `release` hands them to the real sink.
pub struct DeferredLog {
    deferred: AtomicBool,
    pending: Mutex<Pending>,
}

impl DeferredLog {
    pub const fn new() -> Self {
        Self {
            deferred: AtomicBool::new(false),
            pending: Mutex::new(Pending { bytes: Vec::new(), dropped: 0 }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred.load(Ordering::SeqCst)
    }

    /// Start holding output back
    pub fn defer(&self) {
        let _pending = self.lock();
        self.deferred.store(true, Ordering::SeqCst);
    }

    /// Stop holding output back and write out everything held so far
    pub fn release<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        let (bytes, dropped) = {
            let mut pending = self.lock();
            self.deferred.store(false, Ordering::SeqCst);
            (std::mem::take(&mut pending.bytes), std::mem::replace(&mut pending.dropped, 0))
        };

        sink.write_all(&bytes)?;
        if dropped > 0 {
            writeln!(sink, "({} bytes of log output dropped)", dropped)?;
        }
        sink.flush()
    }

    pub fn write_to<W: Write>(&self, buf: &[u8], sink: &mut W) -> io::Result<usize> {
        {
            let mut pending = self.lock();
            if self.deferred.load(Ordering::SeqCst) {
                if pending.bytes.len() + buf.len() <= MAX_PENDING {
                    pending.bytes.extend_from_slice(buf);
                } else {
                    pending.dropped += buf.len();
                }
                return Ok(buf.len());
            }
        }
        sink.write(buf)
    }
}

/// A `MakeWriter` for `tracing` that writes to stderr once the pager is off screen
pub struct MainScreenWriter;

impl<'a> MakeWriter<'a> for MainScreenWriter {
    type Writer = MainScreenWriterHandle;

    fn make_writer(&'a self) -> Self::Writer {
        MainScreenWriterHandle
    }
}

pub struct MainScreenWriterHandle;

impl Write for MainScreenWriterHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        SCREEN_LOG.write_to(buf, &mut io::stderr())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Install the global subscriber: to `log_file` when given, else to stderr
pub fn init(level: Level, log_file: Option<&Path>) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(level);
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(BoxMakeWriter::new(Mutex::new(file)))
                .init();
        }
        None => builder.with_writer(BoxMakeWriter::new(MainScreenWriter)).init(),
    }
    Ok(())
}
