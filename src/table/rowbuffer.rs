use tracing::{debug, info};

use crate::error::{PagerError, Result};
use crate::record::Record;

/// Number of rows per chunk for memory-efficient storage
pub const CHUNK_SIZE: usize = 1024;

/// Result of pulling one more record from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A row was appended to the buffer
    Loaded,
    /// The source has nothing left; the buffer is final
    Exhausted,
}

/// Append-only cache of the records consumed from a forward-only source.
///
/// Every record is pulled from the source at most once and kept for the whole
/// session, which is what makes scrolling back up possible.
pub struct RowBuffer<S> {
    source: S,
    /// Column names, taken from the first record pulled
    columns: Vec<String>,
    /// Rows stored in fixed-size chunks, values in column order
    chunks: Vec<Vec<Vec<String>>>,
    total_rows: usize,
    exhausted: bool,
}

impl<S> RowBuffer<S>
where
    S: Iterator<Item = Result<Record>>,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            columns: Vec::new(),
            chunks: Vec::new(),
            total_rows: 0,
            exhausted: false,
        }
    }

    /// Compute which chunk a row belongs to
    #[inline]
    fn chunk_idx(row: usize) -> usize {
        row / CHUNK_SIZE
    }

    /// Compute the index within a chunk
    #[inline]
    fn row_in_chunk(row: usize) -> usize {
        row % CHUNK_SIZE
    }

    pub fn len(&self) -> usize {
        self.total_rows
    }

    pub fn is_empty(&self) -> bool {
        self.total_rows == 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get_row(&self, row: usize) -> Option<&[String]> {
        self.chunks
            .get(Self::chunk_idx(row))?
            .get(Self::row_in_chunk(row))
            .map(|r| r.as_slice())
    }

    /// Iterator over the loaded rows in `range`, clamped to what is loaded
    pub fn rows(&self, range: std::ops::Range<usize>) -> impl Iterator<Item = &[String]> {
        let end = range.end.min(self.total_rows);
        (range.start..end).filter_map(move |idx| self.get_row(idx))
    }

    /// Contiguous slices covering every row from `start` on
    pub fn slices_from(&self, start: usize) -> impl Iterator<Item = &[Vec<String>]> {
        let first = Self::chunk_idx(start);
        self.chunks
            .iter()
            .enumerate()
            .skip(first)
            .map(move |(idx, chunk)| {
                if idx == first {
                    &chunk[Self::row_in_chunk(start).min(chunk.len())..]
                } else {
                    &chunk[..]
                }
            })
    }

    fn push_row(&mut self, row: Vec<String>) {
        match self.chunks.last_mut() {
            Some(chunk) if chunk.len() < CHUNK_SIZE => chunk.push(row),
            _ => {
                let mut chunk = Vec::with_capacity(CHUNK_SIZE);
                chunk.push(row);
                self.chunks.push(chunk);
            }
        }
        self.total_rows += 1;
    }

    /// Pull exactly one more record from the source, if there is one
    pub fn advance_one(&mut self) -> Result<Advance> {
        if self.exhausted {
            return Ok(Advance::Exhausted);
        }

        let record = match self.source.next() {
            Some(Ok(record)) => record,
            Some(Err(e)) => {
                // The session ends on a read failure; never poll the source again
                self.exhausted = true;
                return Err(e);
            }
            None => {
                self.exhausted = true;
                info!(rows = self.total_rows, "source exhausted");
                return Ok(Advance::Exhausted);
            }
        };

        if self.total_rows == 0 {
            self.columns = record.columns().map(|c| c.to_string()).collect();
            debug!(columns = self.columns.len(), "columns established from first record");
        }

        let row_no = self.total_rows;
        let found = record.len();
        let values = record.into_values(&self.columns).ok_or_else(|| {
            self.exhausted = true;
            PagerError::SchemaMismatch {
                row: row_no + 1,
                reason: format!("expected {} columns, found {}", self.columns.len(), found),
            }
        })?;

        self.push_row(values);
        Ok(Advance::Loaded)
    }

    /// Pull until row `up_to` is loaded or the source runs out.
    ///
    /// Returns the number of rows loaded afterwards.
    pub fn ensure_loaded(&mut self, up_to: usize) -> Result<usize> {
        while self.total_rows <= up_to {
            if self.advance_one()? == Advance::Exhausted {
                break;
            }
        }
        Ok(self.total_rows)
    }
}
