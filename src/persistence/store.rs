// * File stores shared by the stages: JSONL in/out and the CSV mirror
// * Every stage writes a fresh file; only the collector's JSONL is appended to.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON at {path}:{line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Creates the parent directory of `path` if it has one
pub fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Line-by-line JSONL reader. Yields each non-blank line's parse result with its
/// 1-based line number so callers decide whether a bad line is fatal.
pub struct JsonlReader<T> {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_no: 0,
            _marker: std::marker::PhantomData,
        })
    }
}

impl<T: DeserializeOwned> Iterator for JsonlReader<T> {
    type Item = Result<(usize, T), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(StoreError::io(&self.path, e))),
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str(trimmed)
                    .map(|record| (self.line_no, record))
                    .map_err(|source| StoreError::Json {
                        path: self.path.clone(),
                        line: self.line_no,
                        source,
                    }),
            );
        }
    }
}

/// Reads every record of a JSONL file, failing on the first malformed line
pub fn read_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, StoreError> {
    JsonlReader::open(path)?
        .map(|item| item.map(|(_, record)| record))
        .collect()
}

/// Writes all records to a new JSONL file (truncating any previous content)
pub fn write_jsonl<T: Serialize>(
    path: impl AsRef<Path>,
    records: &[T],
) -> Result<usize, StoreError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n").map_err(|e| StoreError::io(path, e))?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))?;

    Ok(records.len())
}

/// Appends records one at a time and flushes after each, so a crash mid-run
/// keeps everything collected so far.
pub struct JsonlAppender {
    path: PathBuf,
    file: File,
    written: usize,
}

impl JsonlAppender {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            written: 0,
        })
    }

    pub fn append<T: Serialize>(&mut self, record: &T) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.file
            .write_all(&line)
            .and_then(|_| self.file.flush())
            .map_err(|e| StoreError::io(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

/// CSV table writer with a fixed header, flushed per row
pub struct CsvTable {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvTable {
    pub fn create<I, S>(path: impl AsRef<Path>, header: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self::create_inner(path.as_ref(), header, false)
    }

    /// Same as `create` but starts the file with a UTF-8 byte order mark so
    /// spreadsheet tools detect the encoding.
    pub fn create_with_bom<I, S>(path: impl AsRef<Path>, header: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self::create_inner(path.as_ref(), header, true)
    }

    fn create_inner<I, S>(path: &Path, header: I, bom: bool) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        ensure_parent(path)?;
        let mut file = File::create(path).map_err(|e| StoreError::io(path, e))?;
        if bom {
            file.write_all("\u{feff}".as_bytes())
                .map_err(|e| StoreError::io(path, e))?;
        }
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(header)
            .map_err(|e| StoreError::csv(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn write_row<I, S>(&mut self, row: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.writer
            .write_record(row)
            .map_err(|e| StoreError::csv(&self.path, e))?;
        self.writer
            .flush()
            .map_err(|e| StoreError::io(&self.path, e))
    }
}
