//! Error taxonomy for the flattening pipeline
//!
//! Per-record failures (`SkipReason`) never abort a run: the record is
//! skipped, counted, and reported in the run summary. Only stream-level
//! conditions (`PipelineError`) are terminal.

use thiserror::Error;

use crate::sink::SinkError;

/// Why a single record was skipped. Carried alongside its ordinal in
/// [`RecordSkip`] so callers can produce an actionable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The line was not valid JSON. `fragment` is a bounded prefix of the
    /// offending line.
    #[error("line is not valid JSON: {fragment}")]
    Parse { fragment: String },

    /// The record's nesting exceeded the configured maximum depth.
    #[error("nesting exceeds maximum depth {max_depth}")]
    DepthExceeded { max_depth: usize },
}

/// One skipped record: its 1-based line number and the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSkip {
    pub ordinal: u64,
    pub reason: SkipReason,
}

/// Terminal, run-level failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Zero valid records were found across the whole input. No schema can
    /// be produced.
    #[error("no valid records found in input stream")]
    EmptyStream,

    /// Opaque failure from the sink collaborator, propagated unchanged.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The source could not be opened or read.
    #[error("source I/O: {0}")]
    Io(#[from] std::io::Error),
}
