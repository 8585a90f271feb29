//! Re-openable JSONL sources and the record reader
//!
//! The pipeline reads its input twice. Rather than caching parsed records in
//! memory, a source is a capability to open a fresh iteration over the same
//! bytes; very large inputs complete in bounded memory as long as the caller
//! can re-open them.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use crate::error::{RecordSkip, SkipReason};

/// Longest prefix of a malformed line carried in its skip reason.
const MAX_FRAGMENT_CHARS: usize = 80;

/// A byte stream that can be opened fresh any number of times. Each `open`
/// starts again from the first byte; iterations are independent.
pub trait JsonlSource {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>>;
}

/// A JSONL file on disk. Re-opening the file gives genuinely independent
/// reads, so both passes can stream it without buffering.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl JsonlSource for FileSource {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }
}

/// An in-memory JSONL buffer, e.g. the body of an upload. Re-opening is a
/// fresh cursor over the same bytes.
#[derive(Debug, Clone)]
pub struct BytesSource {
    bytes: Vec<u8>,
}

impl BytesSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        BytesSource { bytes: bytes.into() }
    }
}

impl JsonlSource for BytesSource {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.bytes.as_slice())))
    }
}

/// One item of the record stream: a parsed record or a per-record skip.
/// Blank lines produce neither.
#[derive(Debug)]
pub enum Record {
    Parsed { ordinal: u64, value: Value },
    Skipped(RecordSkip),
}

/// Lazily yields one [`Record`] per non-blank line.
///
/// Ordinals are 1-based physical line numbers, so a skip report points at
/// the actual line in the input. A line that fails to parse yields a skip
/// and iteration continues; only I/O errors end the stream.
pub struct RecordIter<R: BufRead> {
    reader: R,
    line: String,
    scratch: Vec<u8>,
    ordinal: u64,
    done: bool,
}

impl<R: BufRead> RecordIter<R> {
    pub fn new(reader: R) -> Self {
        RecordIter {
            reader,
            line: String::new(),
            scratch: Vec::new(),
            ordinal: 0,
            done: false,
        }
    }

    fn parse_line(&mut self, ordinal: u64) -> Record {
        let trimmed = self.line.trim();

        // SIMD parse first, serde_json as the fallback and for the error.
        self.scratch.clear();
        self.scratch.extend_from_slice(trimmed.as_bytes());
        if let Ok(value) = simd_json::serde::from_slice::<Value>(&mut self.scratch) {
            return Record::Parsed { ordinal, value };
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Record::Parsed { ordinal, value },
            Err(err) => {
                debug!(ordinal, error = %err, "line failed to parse");
                Record::Skipped(RecordSkip {
                    ordinal,
                    reason: SkipReason::Parse {
                        fragment: truncate_fragment(trimmed),
                    },
                })
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordIter<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    self.ordinal += 1;
                    if self.line.trim().is_empty() {
                        continue;
                    }
                    let ordinal = self.ordinal;
                    return Some(Ok(self.parse_line(ordinal)));
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

fn truncate_fragment(line: &str) -> String {
    if line.chars().count() <= MAX_FRAGMENT_CHARS {
        line.to_string()
    } else {
        line.chars().take(MAX_FRAGMENT_CHARS).collect()
    }
}
