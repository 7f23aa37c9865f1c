use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use burn_train::logger::{FileMetricLogger, MetricLogger};
use burn_train::metric::MetricEntry;

pub const POLICY_EVALUATION_VALUE: &str = "policy_evaluation.value";
pub const POLICY_EVALUATION_DELTA: &str = "policy_evaluation.delta";
pub const VALUE_ITERATION_DELTA: &str = "value_iteration.delta";

/// Destination for named scalar metrics.
pub trait MetricsSink {
    fn record(&mut self, tag: &str, value: f64, step: u64);

    fn flush(&mut self) {}
}

impl<S: MetricsSink + ?Sized> MetricsSink for &mut S {
    fn record(&mut self, tag: &str, value: f64, step: u64) {
        (**self).record(tag, value, step);
    }

    fn flush(&mut self) {
        (**self).flush();
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn record(&mut self, tag: &str, value: f64, step: u64) {
        (**self).record(tag, value, step);
    }

    fn flush(&mut self) {
        (**self).flush();
    }
}

/// Forwards every record to both sinks.
impl<A: MetricsSink, B: MetricsSink> MetricsSink for (A, B) {
    fn record(&mut self, tag: &str, value: f64, step: u64) {
        self.0.record(tag, value, step);
        self.1.record(tag, value, step);
    }

    fn flush(&mut self) {
        self.0.flush();
        self.1.flush();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record(&mut self, _tag: &str, _value: f64, _step: u64) {}
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricRecord {
    pub tag: String,
    pub value: f64,
    pub step: u64,
}

/// Keeps every record in memory, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Vec<MetricRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn values(&self, tag: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter(|record| record.tag == tag)
            .map(|record| record.value)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MetricsSink for MemorySink {
    fn record(&mut self, tag: &str, value: f64, step: u64) {
        self.records.push(MetricRecord {
            tag: tag.to_string(),
            value,
            step,
        });
    }
}

/// Writes metrics in the Burn dashboard file layout. Step `n` lands in the
/// `epoch-{n + 1}` directory.
pub struct FileMetricSink {
    directory: PathBuf,
    logger: FileMetricLogger,
    epoch: usize,
}

impl FileMetricSink {
    pub fn new(directory: impl AsRef<Path>) -> io::Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        let logger = FileMetricLogger::new_train(&directory);
        Ok(Self {
            directory,
            logger,
            epoch: 1,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl MetricsSink for FileMetricSink {
    fn record(&mut self, tag: &str, value: f64, step: u64) {
        let epoch = step as usize + 1;
        if epoch != self.epoch {
            self.logger.end_epoch(epoch - 1);
            self.epoch = epoch;
        }
        let entry = MetricEntry::new(
            tag.to_string().into(),
            format!("{value:.6} (step {step})"),
            format!("{value:.8},1"),
        );
        self.logger.log(&entry);
    }

    /// Closes the open metric files. The logger moves on to the next epoch,
    /// so the next record re-syncs it to its own step; re-recording a step
    /// that was already flushed starts that step's files over.
    fn flush(&mut self) {
        self.logger.end_epoch(self.epoch);
        self.epoch = 0;
    }
}
