// src/models/mod.rs

//! Domain models for the register book scraper.

mod config;
mod record;
mod variation;

// Re-export all public types
pub use config::{
    AlphabetConfig, Config, OutputConfig, ParserConfig, PartitionConfig, SchedulerConfig,
    SearchConfig,
};
pub use record::{Record, RecordMap};
pub use variation::Variation;
