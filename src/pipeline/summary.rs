//! Run statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::ErrorKind;

/// Summary of one scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Variations handed to the scheduler
    pub submitted: usize,
    /// Variations a worker picked up
    pub processed: usize,
    /// Variations never picked up because the deadline passed
    pub skipped: usize,
    /// Records returned across all pages, duplicates included
    pub hits: usize,
    /// Distinct records in the final store
    pub records: usize,
    /// Pages that came back empty
    pub empty_responses: usize,
    /// Failed or refused searches by kind
    pub errors: BTreeMap<ErrorKind, usize>,
    /// Workers that panicked; their counters are lost
    pub failed_workers: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn error_count(&self, kind: ErrorKind) -> usize {
        self.errors.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_errors(&self) -> usize {
        self.errors.values().sum()
    }

    pub(crate) fn record_error(&mut self, kind: ErrorKind) {
        *self.errors.entry(kind).or_default() += 1;
    }

    /// Fold a worker's counters into this summary.
    pub(crate) fn absorb(&mut self, other: RunSummary) {
        self.processed += other.processed;
        self.hits += other.hits;
        self.empty_responses += other.empty_responses;
        for (kind, count) in other.errors {
            *self.errors.entry(kind).or_default() += count;
        }
    }

    /// Log the summary at info level.
    pub fn log(&self) {
        for line in self.to_string().lines() {
            log::info!("{line}");
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[SUMMARY] Search run")?;
        writeln!(f, "    variations: {}", self.submitted)?;
        writeln!(f, "    processed: {}", self.processed)?;
        writeln!(f, "    skipped: {}", self.skipped)?;
        writeln!(f, "    hits: {}", self.hits)?;
        writeln!(f, "    records: {}", self.records)?;
        writeln!(f, "    empty responses: {}", self.empty_responses)?;
        for (kind, count) in &self.errors {
            writeln!(f, "    {kind} errors: {count}")?;
        }
        if self.failed_workers > 0 {
            writeln!(f, "    failed workers: {}", self.failed_workers)?;
        }
        write!(f, "    elapsed: {:.1}s", self.elapsed.as_secs_f64())
    }
}
