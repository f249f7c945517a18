use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{StringRecord, StringRecordsIntoIter};
use tracing::debug;

use crate::error::{PagerError, Result};
use crate::record::Record;

/// Input file format
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    Tsv,
}

impl FileFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" | "tab" => Some(FileFormat::Tsv),
            _ => None,
        }
    }

    /// Parse an explicit `--in` value
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "tsv" => Ok(FileFormat::Tsv),
            other => Err(PagerError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Resolve the format of `path`, honoring an explicit type first.
    ///
    /// Unknown extensions fall back to CSV. XML is ambiguous (plain or Excel
    /// flavored) and must be named explicitly.
    pub fn resolve(explicit: Option<&str>, path: &Path) -> Result<Self> {
        if let Some(name) = explicit {
            return Self::from_name(name);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xml" => Err(PagerError::AmbiguousFormat(ext)),
            "json" | "xls" | "xlsx" => Err(PagerError::UnsupportedFormat(ext)),
            _ => Ok(Self::from_extension(path).unwrap_or(FileFormat::Csv)),
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv => b',',
            FileFormat::Tsv => b'\t',
        }
    }
}

/// Dialect options handed through to the CSV reader untouched
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOptions {
    pub format: FileFormat,
    pub has_headers: bool,
    pub delimiter: Option<u8>,
    pub enclosure: u8,
    /// None keeps the RFC 4180 doubled-quote convention
    pub escape: Option<u8>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            format: FileFormat::Csv,
            has_headers: true,
            delimiter: None,
            enclosure: b'"',
            escape: None,
        }
    }
}

/// Forward-only record source over delimited text.
///
/// Each call to `next` parses exactly one more record from the underlying reader.
pub struct CsvSource<R: Read> {
    headers: Option<Vec<String>>,
    records: StringRecordsIntoIter<R>,
}

impl CsvSource<BufReader<File>> {
    /// Open a file-backed source
    pub fn open(path: &Path, options: &SourceOptions) -> Result<Self> {
        if !path.is_file() {
            return Err(PagerError::MissingInput(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(1 << 20, file); // 1 MB
        debug!(path = %path.display(), format = ?options.format, "opening source");
        Self::from_reader(reader, options)
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(reader: R, options: &SourceOptions) -> Result<Self> {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(options.delimiter.unwrap_or(options.format.delimiter()))
            .quote(options.enclosure)
            .has_headers(options.has_headers);
        if let Some(escape) = options.escape {
            if escape != options.enclosure {
                builder.double_quote(false).escape(Some(escape));
            }
        }

        let mut csv_reader = builder.from_reader(reader);

        let headers = if options.has_headers {
            Some(csv_reader.headers()?.iter().map(|h| h.to_string()).collect())
        } else {
            None
        };

        Ok(Self {
            headers,
            records: csv_reader.into_records(),
        })
    }

    fn to_record(&self, row: StringRecord) -> Record {
        match &self.headers {
            Some(headers) => Record::new(
                headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|v| v.to_string()))
                    .collect(),
            ),
            // Headerless input: columns are named by position
            None => Record::new(
                row.iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }
}

impl<R: Read> Iterator for CsvSource<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.records.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e.into())),
        };
        Some(Ok(self.to_record(row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn source<'a>(data: &'a str, options: &SourceOptions) -> CsvSource<&'a [u8]> {
        CsvSource::from_reader(data.as_bytes(), options).unwrap()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension(Path::new("test.csv")), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension(Path::new("test.TSV")), Some(FileFormat::Tsv));
        assert_eq!(FileFormat::from_extension(Path::new("test.txt")), None);
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(FileFormat::resolve(None, Path::new("a.txt")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::resolve(Some("tsv"), Path::new("a.csv")).unwrap(), FileFormat::Tsv);
        assert!(matches!(
            FileFormat::resolve(None, Path::new("a.xml")),
            Err(PagerError::AmbiguousFormat(_))
        ));
        assert!(matches!(
            FileFormat::resolve(Some("excel"), Path::new("a.xml")),
            Err(PagerError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_records_carry_headers() {
        let mut src = source(
            "sku,name,price\nPOV157,\"Déboucheur\",80.90\nSAV42,\"Mélangeur\",19.90\n",
            &SourceOptions::default(),
        );

        let first = src.next().unwrap().unwrap();
        assert_eq!(first.columns().collect::<Vec<_>>(), vec!["sku", "name", "price"]);
        assert_eq!(first.get("name"), Some("Déboucheur"));

        let second = src.next().unwrap().unwrap();
        assert_eq!(second.get("sku"), Some("SAV42"));
        assert!(src.next().is_none());
        assert!(src.next().is_none());
    }

    #[test]
    fn test_headerless_columns_are_positions() {
        let options = SourceOptions { has_headers: false, ..SourceOptions::default() };
        let mut src = source("a,b\nc,d\n", &options);

        let first = src.next().unwrap().unwrap();
        assert_eq!(first.columns().collect::<Vec<_>>(), vec!["0", "1"]);
        assert_eq!(first.get("1"), Some("b"));
    }

    #[test]
    fn test_dialect_pass_through() {
        let options = SourceOptions {
            delimiter: Some(b';'),
            enclosure: b'\'',
            escape: Some(b'\\'),
            ..SourceOptions::default()
        };
        let mut src = source("a;b\n'x;y';'it\\'s'\n", &options);

        let rec = src.next().unwrap().unwrap();
        assert_eq!(rec.get("a"), Some("x;y"));
        assert_eq!(rec.get("b"), Some("it's"));
    }

    #[test]
    fn test_tsv_default_delimiter() {
        let options = SourceOptions { format: FileFormat::Tsv, ..SourceOptions::default() };
        let mut src = source("a\tb\n1,5\t2\n", &options);
        assert_eq!(src.next().unwrap().unwrap().get("a"), Some("1,5"));
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let mut src = source("a,b,c\n1,2\n", &SourceOptions::default());
        assert!(matches!(src.next(), Some(Err(PagerError::Source(_)))));
    }

    #[test]
    fn test_open_missing_file() {
        let path = PathBuf::from("/definitely/not/here.csv");
        assert!(matches!(
            CsvSource::open(&path, &SourceOptions::default()),
            Err(PagerError::MissingInput(_))
        ));
    }

    #[test]
    fn test_open_file() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "a,b").unwrap();
        writeln!(file, "1,2").unwrap();

        let mut src = CsvSource::open(file.path(), &SourceOptions::default()).unwrap();
        assert_eq!(src.next().unwrap().unwrap().get("b"), Some("2"));
    }
}
