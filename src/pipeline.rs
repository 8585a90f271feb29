//! The two-pass pipeline driver
//!
//! Pass 1 streams the source once and folds every record into the schema
//! accumulator. The unified schema is published to the sink atomically (one
//! `create_table` call) before any row exists. Pass 2 re-opens the source,
//! materializes rows in stream order, and appends them in bounded batches.
//! Per-record failures are skipped and reported; only an empty stream, an
//! I/O failure, or a sink failure ends the run.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::FlattenConfig;
use crate::error::{PipelineError, RecordSkip, SkipReason};
use crate::flatten::Flattener;
use crate::materialize::RowMaterializer;
use crate::schema::{SchemaAccumulator, UnifiedSchema};
use crate::sink::TableSink;
use crate::source::{JsonlSource, Record, RecordIter};

/// Rows buffered between sink appends. Bounds pass-2 memory alongside the
/// single in-flight flattened record.
const ROW_BATCH: usize = 512;

/// Materialized rows carried in the report as a preview.
const SAMPLE_ROWS: usize = 5;

/// Outcome of pass 1.
#[derive(Debug)]
pub struct SchemaDiscovery {
    pub schema: UnifiedSchema,
    /// Records successfully flattened into the schema.
    pub records_folded: u64,
    pub skipped: Vec<RecordSkip>,
}

/// The observable contract of a finished run: what a caller (e.g. an upload
/// endpoint) uses to report success or partial success to its user.
#[derive(Debug)]
pub struct RunReport {
    pub table: String,
    /// Non-blank lines encountered in pass 2.
    pub records_seen: u64,
    /// Rows accepted by the sink.
    pub rows_written: u64,
    pub column_count: usize,
    /// Every skipped record with its line number and reason, merged across
    /// both passes, in line order.
    pub skipped: Vec<RecordSkip>,
    /// The first few materialized rows, keyed by column path.
    pub sample: Vec<Map<String, Value>>,
}

/// Pass 1: stream the source once and discover the unified schema.
pub fn discover_schema<S: JsonlSource + ?Sized>(
    source: &S,
    config: &FlattenConfig,
) -> Result<SchemaDiscovery, PipelineError> {
    let flattener = Flattener::new(config);
    let mut accumulator = SchemaAccumulator::new();
    let mut skipped = Vec::new();

    for item in RecordIter::new(source.open()?) {
        match item? {
            Record::Parsed { ordinal, value } => match flattener.flatten(&value) {
                Ok(flat) => accumulator.fold(ordinal, &flat),
                Err(reason) => {
                    debug!(ordinal, %reason, "record skipped during discovery");
                    skipped.push(RecordSkip { ordinal, reason });
                }
            },
            Record::Skipped(skip) => skipped.push(skip),
        }
    }

    let records_folded = accumulator.records_folded();
    let schema = accumulator.finish();
    info!(
        columns = schema.len(),
        records = records_folded,
        skipped = skipped.len(),
        "schema discovery complete"
    );

    Ok(SchemaDiscovery {
        schema,
        records_folded,
        skipped,
    })
}

/// Run the full two-pass pipeline: discover the schema, publish it to the
/// sink, then materialize and append every record.
pub fn run<S, K>(
    source: &S,
    sink: &mut K,
    table: &str,
    config: &FlattenConfig,
) -> Result<RunReport, PipelineError>
where
    S: JsonlSource + ?Sized,
    K: TableSink,
{
    let discovery = discover_schema(source, config)?;
    if discovery.records_folded == 0 {
        return Err(PipelineError::EmptyStream);
    }

    // Schema publication is atomic: the sink sees the whole schema or none
    // of it, and no row exists before this point.
    let handle = sink.create_table(table, &discovery.schema)?;

    // Skips merge by ordinal across passes; the first recorded reason wins.
    let mut skips: BTreeMap<u64, SkipReason> = discovery
        .skipped
        .into_iter()
        .map(|skip| (skip.ordinal, skip.reason))
        .collect();

    let materializer = RowMaterializer::new(&discovery.schema, config);
    let mut batch = Vec::with_capacity(ROW_BATCH);
    let mut sample = Vec::new();
    let mut records_seen: u64 = 0;
    let mut rows_written: u64 = 0;

    for item in RecordIter::new(source.open()?) {
        records_seen += 1;
        match item? {
            Record::Parsed { ordinal, value } => match materializer.materialize(&value) {
                Ok(row) => {
                    if sample.len() < SAMPLE_ROWS {
                        sample.push(row.to_map(&discovery.schema));
                    }
                    batch.push(row);
                    if batch.len() == ROW_BATCH {
                        rows_written += sink.append_rows(&handle, &batch)?;
                        batch.clear();
                    }
                }
                Err(reason) => {
                    debug!(ordinal, %reason, "record skipped during materialization");
                    skips.entry(ordinal).or_insert(reason);
                }
            },
            Record::Skipped(skip) => {
                skips.entry(skip.ordinal).or_insert(skip.reason);
            }
        }
    }

    if !batch.is_empty() {
        rows_written += sink.append_rows(&handle, &batch)?;
    }

    info!(
        table = %table,
        rows = rows_written,
        columns = discovery.schema.len(),
        skipped = skips.len(),
        "materialization complete"
    );

    Ok(RunReport {
        table: table.to_string(),
        records_seen,
        rows_written,
        column_count: discovery.schema.len(),
        skipped: skips
            .into_iter()
            .map(|(ordinal, reason)| RecordSkip { ordinal, reason })
            .collect(),
        sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use crate::sink::{MemorySink, SinkError, TableHandle};
    use crate::source::BytesSource;
    use serde_json::json;

    fn run_on(input: &str) -> (RunReport, MemorySink) {
        let source = BytesSource::new(input);
        let mut sink = MemorySink::new();
        let report = run(&source, &mut sink, "t", &FlattenConfig::default()).unwrap();
        (report, sink)
    }

    #[test]
    fn test_missing_fields_null_fill() {
        let (report, sink) = run_on("{\"a\": 1}\n{\"b\": 2}\n");

        let schema = sink.schema("t").unwrap();
        assert_eq!(schema.paths().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(schema.columns()[0].ty, ColumnType::Integer);
        assert_eq!(schema.columns()[1].ty, ColumnType::Integer);

        let rows = sink.rows("t").unwrap();
        assert_eq!(rows[0].values(), &[json!(1), Value::Null]);
        assert_eq!(rows[1].values(), &[Value::Null, json!(2)]);

        assert_eq!(report.rows_written, 2);
        assert_eq!(report.column_count, 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_every_row_has_schema_width() {
        let (_, sink) = run_on(
            "{\"a\": 1}\n{\"b\": {\"c\": 2}}\n{\"tags\": [\"x\", \"y\"]}\n{}\n",
        );
        let schema = sink.schema("t").unwrap();
        for row in sink.rows("t").unwrap() {
            assert_eq!(row.len(), schema.len());
        }
    }

    #[test]
    fn test_malformed_line_is_reported_not_fatal() {
        let (report, sink) = run_on("{\"a\": 1}\nnot json\n{\"a\": 2}\n");

        assert_eq!(report.records_seen, 3);
        assert_eq!(report.rows_written, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].ordinal, 2);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::Parse { .. }
        ));

        // Schema is built only from the valid records.
        assert_eq!(sink.schema("t").unwrap().len(), 1);
    }

    #[test]
    fn test_depth_exceeded_is_reported_per_record() {
        let source = BytesSource::new("{\"a\": 1}\n{\"a\": {\"b\": {\"c\": 1}}}\n");
        let mut sink = MemorySink::new();
        let config = FlattenConfig {
            max_depth: 1,
            ..FlattenConfig::default()
        };
        let report = run(&source, &mut sink, "t", &config).unwrap();

        assert_eq!(report.rows_written, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::DepthExceeded { max_depth: 1 }
        );
    }

    #[test]
    fn test_empty_stream_is_terminal() {
        let source = BytesSource::new("");
        let mut sink = MemorySink::new();
        let result = run(&source, &mut sink, "t", &FlattenConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyStream)));

        let source = BytesSource::new("not json\nstill not json\n");
        let result = run(&source, &mut sink, "t", &FlattenConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyStream)));
    }

    #[test]
    fn test_rows_preserve_stream_order() {
        let (_, sink) = run_on("{\"id\": 1}\n{\"id\": 2}\n{\"id\": 3}\n");
        let ids: Vec<Value> = sink
            .rows("t")
            .unwrap()
            .iter()
            .map(|row| row.values()[0].clone())
            .collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_type_widening_across_the_stream() {
        let (_, sink) = run_on("{\"x\": 1}\n{\"x\": 1.5}\n{\"x\": \"n/a\"}\n");
        assert_eq!(sink.schema("t").unwrap().columns()[0].ty, ColumnType::Text);
    }

    #[test]
    fn test_sample_holds_at_most_five_rows() {
        let input: String = (0..10).map(|i| format!("{{\"n\": {i}}}\n")).collect();
        let (report, _) = run_on(&input);
        assert_eq!(report.sample.len(), 5);
        assert_eq!(report.sample[0]["n"], json!(0));
        assert_eq!(report.sample[4]["n"], json!(4));
    }

    #[test]
    fn test_blank_lines_contribute_nothing() {
        let (report, _) = run_on("{\"a\": 1}\n\n   \n{\"a\": 2}\n");
        assert_eq!(report.records_seen, 2);
        assert_eq!(report.rows_written, 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_sink_failure_is_terminal() {
        struct FailingSink;
        impl TableSink for FailingSink {
            fn create_table(
                &mut self,
                _name: &str,
                _schema: &UnifiedSchema,
            ) -> Result<TableHandle, SinkError> {
                Err(SinkError::other("disk full"))
            }
            fn append_rows(
                &mut self,
                _handle: &TableHandle,
                _rows: &[crate::materialize::Row],
            ) -> Result<u64, SinkError> {
                unreachable!("create_table already failed")
            }
        }

        let source = BytesSource::new("{\"a\": 1}\n");
        let result = run(&source, &mut FailingSink, "t", &FlattenConfig::default());
        assert!(matches!(result, Err(PipelineError::Sink(_))));
    }

    #[test]
    fn test_unicode_smoke_one_thousand_records() {
        let input: String = (0..1000)
            .map(|i| format!("{{\"naïve_φeld\": \"värde {i}\", \"id\": {i}}}\n"))
            .collect();
        let (report, sink) = run_on(&input);

        assert_eq!(report.records_seen, 1000);
        assert_eq!(report.rows_written, 1000);
        assert!(report.skipped.is_empty());

        let schema = sink.schema("t").unwrap();
        let paths: Vec<&str> = schema.paths().collect();
        assert!(paths.contains(&"naïve_φeld"));

        let rows = sink.rows("t").unwrap();
        assert_eq!(rows.len(), 1000);
        let last = rows[999].to_map(schema);
        assert_eq!(last["naïve_φeld"], json!("värde 999"));
    }

    #[test]
    fn test_schema_discovery_alone() {
        let source = BytesSource::new("{\"user\": {\"id\": 7}}\n{\"user\": {\"id\": 8.5}}\n");
        let discovery =
            discover_schema(&source, &FlattenConfig::default()).unwrap();
        assert_eq!(discovery.records_folded, 2);
        assert_eq!(
            discovery.schema.paths().collect::<Vec<_>>(),
            vec!["user__id"]
        );
        assert_eq!(discovery.schema.columns()[0].ty, ColumnType::Real);
    }
}
