// src/pipeline/scheduler.rs

//! Fetch scheduler.
//!
//! Runs every variation through the search client and the page parser on a
//! fixed pool of spawned workers. Workers claim variations from a shared cursor
//! and merge their partial results into one record store under a mutex.
//! A failed search is logged and counted, then the worker moves on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AppError, ErrorKind, Result};
use crate::models::{RecordMap, SchedulerConfig, Variation};
use crate::pipeline::{RetryPolicy, RunSummary};
use crate::services::{ParsedPage, ResponseParser, SearchClient};
use crate::store::RecordStore;

/// Processed variations between two progress lines.
const PROGRESS_INTERVAL: usize = 500;

/// Final state of a scheduler run.
#[derive(Debug)]
pub struct RunOutcome {
    pub store: RecordStore,
    pub summary: RunSummary,
}

/// Bounded worker pool driving search, parse and merge.
pub struct FetchScheduler {
    client: Arc<dyn SearchClient>,
    parser: Arc<ResponseParser>,
    retry: RetryPolicy,
    deadline: Option<Duration>,
    request_delay: Duration,
}

impl FetchScheduler {
    /// Create a scheduler without retries, deadline or pacing.
    pub fn new(client: Arc<dyn SearchClient>, parser: Arc<ResponseParser>) -> Self {
        Self {
            client,
            parser,
            retry: RetryPolicy::none(),
            deadline: None,
            request_delay: Duration::ZERO,
        }
    }

    /// Create a scheduler with retry, deadline and pacing taken from config.
    pub fn from_config(
        client: Arc<dyn SearchClient>,
        parser: Arc<ResponseParser>,
        config: &SchedulerConfig,
    ) -> Self {
        Self::new(client, parser)
            .with_retry(RetryPolicy::from_config(config))
            .with_deadline(config.deadline())
            .with_request_delay(config.request_delay())
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bound the whole run. In-flight requests are dropped when it passes.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Pause each worker after every request.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Search all variations with `concurrency` workers and merge the results.
    ///
    /// Returns once every variation was processed or the deadline passed.
    /// Only an empty variation set or a zero pool size fail the run.
    pub async fn run(&self, variations: Vec<Variation>, concurrency: usize) -> Result<RunOutcome> {
        if variations.is_empty() {
            return Err(AppError::config("no variations to search"));
        }
        if concurrency == 0 {
            return Err(AppError::config("worker pool size must be > 0"));
        }

        let started = Instant::now();
        let submitted = variations.len();
        let workers = concurrency.min(submitted);

        log::info!(
            "Searching {} variations with {} workers",
            submitted,
            workers
        );

        let context = Arc::new(WorkerContext {
            client: Arc::clone(&self.client),
            parser: Arc::clone(&self.parser),
            variations,
            cursor: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
            store: Mutex::new(RecordStore::new()),
            retry: self.retry,
            deadline: self.deadline.map(|d| started + d),
            request_delay: self.request_delay,
        });

        let handles: Vec<_> = (0..workers)
            .map(|_| tokio::spawn(Arc::clone(&context).work()))
            .collect();

        let mut summary = RunSummary {
            submitted,
            ..RunSummary::default()
        };
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(tally) => summary.absorb(tally),
                Err(error) => {
                    summary.failed_workers += 1;
                    log::error!("Search worker terminated abnormally: {}", error);
                }
            }
        }

        let store = std::mem::take(&mut *context.lock_store());
        summary.skipped = submitted.saturating_sub(summary.processed);
        summary.records = store.len();
        summary.elapsed = started.elapsed();

        if summary.skipped > 0 {
            if self.deadline.is_some() && context.deadline_passed() {
                log::warn!(
                    "Deadline reached, {} variations were not searched",
                    summary.skipped
                );
            } else {
                log::warn!("{} variations were not searched", summary.skipped);
            }
        }

        Ok(RunOutcome { store, summary })
    }
}

/// State shared by all workers of one run.
struct WorkerContext {
    client: Arc<dyn SearchClient>,
    parser: Arc<ResponseParser>,
    variations: Vec<Variation>,
    cursor: AtomicUsize,
    done: AtomicUsize,
    store: Mutex<RecordStore>,
    retry: RetryPolicy,
    deadline: Option<Instant>,
    request_delay: Duration,
}

impl WorkerContext {
    /// Worker loop: claim, search, merge until the variations run out.
    async fn work(self: Arc<Self>) -> RunSummary {
        let mut tally = RunSummary::default();

        loop {
            if self.deadline_passed() {
                break;
            }

            let index = self.cursor.fetch_add(1, Ordering::Relaxed);
            let Some(variation) = self.variations.get(index) else {
                break;
            };
            tally.processed += 1;

            match self.search(variation).await {
                Ok(ParsedPage::Records(records)) => {
                    let found = records.len();
                    tally.hits += found;
                    let added = self.merge(records);
                    log::debug!(
                        "Found {} record(s), {} new, search string: {}",
                        found,
                        added,
                        variation
                    );
                }
                Ok(ParsedPage::Empty) => {
                    tally.empty_responses += 1;
                    log::warn!("Empty response for search string: {}", variation);
                }
                Ok(ParsedPage::CapacityExceeded) => {
                    let error = AppError::CapacityExceeded {
                        variation: variation.to_string(),
                    };
                    tally.record_error(ErrorKind::CapacityExceeded);
                    log::warn!("{}", error);
                }
                Err(error) => {
                    tally.record_error(error.kind());
                    log::warn!("Search '{}' failed: {}", variation, error);
                }
            }

            self.report_progress();

            if !self.request_delay.is_zero() && !self.pause(self.request_delay).await {
                break;
            }
        }

        tally
    }

    /// Fetch and parse one variation, retrying as the policy allows.
    async fn search(&self, variation: &Variation) -> Result<ParsedPage> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.fetch(variation).await {
                Ok(html) => return self.parser.parse_page(&html),
                Err(error) => match self.retry.next_delay(attempts, &error) {
                    Some(delay) => {
                        log::debug!(
                            "Retrying '{}' after attempt {}: {}",
                            variation,
                            attempts,
                            error
                        );
                        if !self.pause(delay).await {
                            return Err(AppError::DeadlineExceeded {
                                variation: variation.to_string(),
                            });
                        }
                    }
                    None => return Err(error),
                },
            }
        }
    }

    async fn fetch(&self, variation: &Variation) -> Result<String> {
        let request = self.client.fetch(variation);
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, request)
                .await
                .map_err(|_| AppError::DeadlineExceeded {
                    variation: variation.to_string(),
                })?,
            None => request.await,
        }
    }

    fn merge(&self, records: RecordMap) -> usize {
        self.lock_store().merge(records)
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, RecordStore> {
        // Merges replace whole entries, so a poisoned store is still consistent.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `delay`, cut short by the deadline.
    ///
    /// Returns `false` when the deadline ended the pause.
    async fn pause(&self, delay: Duration) -> bool {
        let wake = Instant::now() + delay;
        match self.deadline {
            Some(deadline) if deadline <= wake => {
                tokio::time::sleep_until(deadline).await;
                false
            }
            _ => {
                tokio::time::sleep_until(wake).await;
                true
            }
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn report_progress(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_INTERVAL == 0 || done == self.variations.len() {
            log::info!(
                "Progress: {}/{} variations, {} records",
                done,
                self.variations.len(),
                self.lock_store().len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::models::ParserConfig;
    use crate::services::alphabet::generate;

    /// Serves canned pages per search string, empty pages otherwise.
    #[derive(Default)]
    struct StubClient {
        pages: HashMap<String, String>,
        failures: HashMap<String, usize>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubClient {
        fn with_page(mut self, variation: &str, html: String) -> Self {
            self.pages.insert(variation.to_string(), html);
            self
        }
    }

    #[async_trait]
    impl SearchClient for StubClient {
        async fn fetch(&self, variation: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if let Some(kind) = self.failures.get(variation) {
                return match kind {
                    0 => Err(AppError::invalid_input("stub")),
                    1 => Err(AppError::config("stub")),
                    3 => panic!("stub worker crash"),
                    // Nothing listens on the discard port.
                    _ => Err(reqwest::get("http://127.0.0.1:9/").await.unwrap_err().into()),
                };
            }
            Ok(self.pages.get(variation).cloned().unwrap_or_default())
        }
    }

    fn row(imo: &str, name: &str) -> String {
        format!(
            r#"<tr><td><img title="Россия"></td><td>{name}<div>{name}</div></td><td>Архангельск</td><td>UAAA</td><td>R-{imo}</td><td>{imo}</td></tr>"#
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            r#"<html><body><table><tbody id="myTable0">{}</tbody></table></body></html>"#,
            rows.concat()
        )
    }

    fn scheduler(client: StubClient) -> FetchScheduler {
        let parser = ResponseParser::new(&ParserConfig::default()).unwrap();
        FetchScheduler::new(Arc::new(client), Arc::new(parser))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_hit_end_to_end() {
        let variations = generate(&['A', 'B'], &['-']);
        assert_eq!(variations.len(), 8);

        let client = StubClient::default().with_page("AB", page(&[row("9000001", "ALFA")]));
        let outcome = scheduler(client).run(variations, 3).await.unwrap();

        assert_eq!(outcome.store.len(), 1);
        assert_eq!(outcome.store.get("9000001").unwrap().primary_name, "ALFA");
        assert_eq!(outcome.summary.submitted, 8);
        assert_eq!(outcome.summary.processed, 8);
        assert_eq!(outcome.summary.records, 1);
        assert_eq!(outcome.summary.empty_responses, 7);
        assert_eq!(outcome.summary.total_errors(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_size_does_not_change_result() {
        let variations: Vec<Variation> = (0..50).map(|i| Variation::new(format!("V{i:02}"))).collect();

        let build = || {
            let mut client = StubClient::default();
            for i in 0..50 {
                // Neighbouring variations overlap on one vessel.
                let rows = [
                    row(&(1000 + i).to_string(), "SHIP"),
                    row(&(1000 + i / 2).to_string(), "SHIP"),
                ];
                client = client.with_page(&format!("V{i:02}"), page(&rows));
            }
            client
        };

        let sequential = scheduler(build()).run(variations.clone(), 1).await.unwrap();
        let parallel = scheduler(build()).run(variations, 10).await.unwrap();

        assert_eq!(sequential.store, parallel.store);
        assert_eq!(sequential.store.len(), 50);
        assert_eq!(sequential.summary.hits, parallel.summary.hits);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failures_are_counted_and_skipped() {
        let variations = generate(&['A', 'B'], &[]);
        let mut client = StubClient::default()
            .with_page("AA", page(&[row("1", "ONE")]))
            .with_page("AB", page(&[row("2", "TWO"), "<tr><td>broken</td></tr>".to_string()]))
            .with_page(
                "BA",
                format!("<p>{}</p>", ParserConfig::default().capacity_marker),
            );
        client.failures.insert("BB".to_string(), 0);

        let outcome = scheduler(client).run(variations, 2).await.unwrap();

        assert_eq!(outcome.store.len(), 1);
        assert!(outcome.store.contains("1"));
        assert_eq!(outcome.summary.processed, 4);
        assert_eq!(outcome.summary.error_count(ErrorKind::Parse), 1);
        assert_eq!(outcome.summary.error_count(ErrorKind::CapacityExceeded), 1);
        assert_eq!(outcome.summary.error_count(ErrorKind::InvalidInput), 1);
    }

    #[tokio::test]
    async fn test_rejects_bad_configuration() {
        let err = scheduler(StubClient::default())
            .run(Vec::new(), 4)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = scheduler(StubClient::default())
            .run(vec![Variation::from("AB")], 0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_deadline_stops_run() {
        let variations: Vec<Variation> = (0..20).map(|i| Variation::new(format!("D{i}"))).collect();
        let client = StubClient {
            delay: Duration::from_secs(5),
            ..StubClient::default()
        };

        let outcome = scheduler(client)
            .with_deadline(Some(Duration::from_millis(50)))
            .run(variations, 2)
            .await
            .unwrap();

        assert_eq!(outcome.summary.processed, 2);
        assert_eq!(outcome.summary.skipped, 18);
        assert_eq!(outcome.summary.error_count(ErrorKind::Network), 2);
        assert!(outcome.summary.elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_deadline_cuts_request_delay_short() {
        let variations: Vec<Variation> = (0..5).map(|i| Variation::new(format!("P{i}"))).collect();

        let outcome = scheduler(StubClient::default())
            .with_deadline(Some(Duration::from_millis(50)))
            .with_request_delay(Duration::from_secs(2))
            .run(variations, 1)
            .await
            .unwrap();

        assert_eq!(outcome.summary.processed, 1);
        assert_eq!(outcome.summary.skipped, 4);
        assert!(outcome.summary.elapsed < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_deadline_cuts_retry_delay_short() {
        let mut client = StubClient::default();
        client.failures.insert("AB".to_string(), 2);

        let outcome = scheduler(client)
            .with_retry(RetryPolicy::new(5, Duration::from_secs(2)))
            .with_deadline(Some(Duration::from_millis(200)))
            .run(vec![Variation::from("AB")], 1)
            .await
            .unwrap();

        assert_eq!(outcome.summary.processed, 1);
        assert_eq!(outcome.summary.error_count(ErrorKind::Network), 1);
        assert!(outcome.summary.elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_panicked_worker_is_counted() {
        let mut client = StubClient::default();
        client.failures.insert("AA".to_string(), 3);

        let outcome = scheduler(client)
            .run(vec![Variation::from("AA"), Variation::from("AB")], 1)
            .await
            .unwrap();

        assert_eq!(outcome.summary.failed_workers, 1);
        assert_eq!(outcome.summary.processed, 0);
        assert_eq!(outcome.summary.skipped, 2);
    }

    #[tokio::test]
    async fn test_non_network_failures_are_not_retried() {
        let mut client = StubClient::default();
        client.failures.insert("AB".to_string(), 1);
        let client = Arc::new(client);

        let parser = ResponseParser::new(&ParserConfig::default()).unwrap();
        let scheduler = FetchScheduler::new(client.clone(), Arc::new(parser))
            .with_retry(RetryPolicy::new(3, Duration::ZERO));
        let outcome = scheduler.run(vec![Variation::from("AB")], 1).await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.summary.error_count(ErrorKind::Configuration), 1);
    }
}
