//! regbook CLI
//!
//! Local execution entry point for register book scraping.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use regbook::{
    error::Result,
    models::Config,
    pipeline,
    services::{Alphabet, partition},
};

/// regbook - RS register book scraper
#[derive(Parser, Debug)]
#[command(
    name = "regbook",
    version,
    about = "Enumerates the register book through its search form"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "regbook.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search every variation and export all vessels found
    Scrape(ScrapeArgs),

    /// Print the generated search strings
    Variations {
        #[command(flatten)]
        shard: ShardArgs,
    },

    /// Print how many search strings land in each bucket
    Buckets {
        /// Number of buckets
        #[arg(long)]
        buckets: i64,
    },

    /// Validate configuration
    Validate,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Search form URL
    #[arg(long)]
    url: Option<String>,

    /// Output file (.xlsx or .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Deadline for the whole run in seconds
    #[arg(long)]
    deadline: Option<u64>,

    #[command(flatten)]
    shard: ShardArgs,
}

#[derive(Args, Debug)]
struct ShardArgs {
    /// Number of buckets to split the search strings into
    #[arg(long)]
    buckets: Option<i64>,

    /// Bucket to process (requires --buckets)
    #[arg(long, requires = "buckets")]
    bucket: Option<u64>,
}

impl ShardArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(buckets) = self.buckets {
            config.partition.buckets = buckets;
        }
        if let Some(bucket) = self.bucket {
            config.partition.bucket = Some(bucket);
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Scrape(args) => {
            if let Some(url) = args.url {
                config.search.url = url;
            }
            if let Some(output) = args.output {
                config.output.path = output;
            }
            if let Some(workers) = args.workers {
                config.scheduler.workers = workers;
            }
            if let Some(deadline) = args.deadline {
                config.scheduler.deadline_secs = Some(deadline);
            }
            args.shard.apply(&mut config);

            log::info!("regbook scraper starting...");
            let summary = pipeline::run_scrape(&config).await?;
            log::info!(
                "Scrape complete: {} records from {} searches",
                summary.records,
                summary.processed
            );
        }

        Command::Variations { shard } => {
            shard.apply(&mut config);
            config.validate()?;

            let variations = pipeline::planned_variations(&config)?;
            for variation in &variations {
                println!("{variation}");
            }
            log::info!("{} variations", variations.len());
        }

        Command::Buckets { buckets } => {
            let variations = Alphabet::from_config(&config.alphabet).variations();
            for (bucket, members) in partition(&variations, buckets)? {
                println!("{bucket}\t{}", members.len());
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
