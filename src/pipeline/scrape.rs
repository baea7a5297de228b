// src/pipeline/scrape.rs

//! Full scrape: generate, shard, search, export.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Config, Variation};
use crate::pipeline::{FetchScheduler, RunSummary, export_records};
use crate::services::{Alphabet, RegbookClient, ResponseParser, SearchClient, select_bucket};

/// Variations this run is responsible for, after optional sharding.
pub fn planned_variations(config: &Config) -> Result<Vec<Variation>> {
    let alphabet = Alphabet::from_config(&config.alphabet);
    let variations = alphabet.variations();
    log::info!(
        "Built {} variations from {} characters",
        variations.len(),
        alphabet.chars().len()
    );

    match config.partition.bucket {
        Some(bucket) => {
            let selected = select_bucket(&variations, config.partition.buckets, bucket)?;
            log::info!(
                "Bucket {}/{}: {} variations",
                bucket,
                config.partition.buckets,
                selected.len()
            );
            Ok(selected)
        }
        None => Ok(variations),
    }
}

/// Run the whole scrape against the configured register and export the result.
pub async fn run_scrape(config: &Config) -> Result<RunSummary> {
    config.validate()?;
    let client = RegbookClient::new(&config.search)?;
    run_scrape_with(config, Arc::new(client)).await
}

/// Run the scrape with a caller-provided search client.
pub async fn run_scrape_with(config: &Config, client: Arc<dyn SearchClient>) -> Result<RunSummary> {
    config.validate()?;

    let variations = planned_variations(config)?;
    if variations.is_empty() {
        return Err(AppError::config("alphabet and partition leave nothing to search"));
    }

    let parser = Arc::new(ResponseParser::new(&config.parser)?);
    let scheduler = FetchScheduler::from_config(client, parser, &config.scheduler);
    let outcome = scheduler.run(variations, config.scheduler.workers).await?;

    outcome.summary.log();
    export_records(&outcome.store, &config.output.path).await?;

    Ok(outcome.summary)
}
