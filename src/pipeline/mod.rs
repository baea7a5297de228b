// src/pipeline/mod.rs

mod export;
mod retry;
mod scheduler;
mod scrape;
mod summary;

pub use export::{JsonExport, RecordExport, SHEET_NAME, XlsxExport, export_records, exporter_for};
pub use retry::RetryPolicy;
pub use scheduler::{FetchScheduler, RunOutcome};
pub use scrape::{planned_variations, run_scrape, run_scrape_with};
pub use summary::RunSummary;
