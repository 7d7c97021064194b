use crate::error::{Result, ScanError};
use crate::extract::{extract_links, is_same_domain};
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::result::{CrawlOutcome, PageRecord};
use futures::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use url::Url;

/// Called with `(pages_visited, url)` each time a page is admitted.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// FIFO queue of discovered URLs with O(1) membership checks.
///
/// `seen` holds every URL ever enqueued, so a URL is queued at most once
/// per crawl, including URLs whose fetch later failed.
#[derive(Debug)]
struct Frontier {
    queue: VecDeque<String>,
    seen: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    fn new(start_url: String) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            visited: HashSet::new(),
        };
        frontier.push(start_url);
        frontier
    }

    fn push(&mut self, url: String) -> bool {
        if self.visited.contains(&url) || !self.seen.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Pop up to `max` unvisited URLs from the head of the queue.
    fn next_batch(&mut self, max: usize) -> Vec<String> {
        let mut batch = Vec::with_capacity(max);
        while batch.len() < max {
            let Some(url) = self.queue.pop_front() else {
                break;
            };
            if self.visited.contains(&url) {
                debug!("Skipping already visited {}", url);
                continue;
            }
            batch.push(url);
        }
        batch
    }

    fn mark_visited(&mut self, url: String) {
        self.visited.insert(url);
    }

    fn visited_count(&self) -> usize {
        self.visited.len()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Check that `start_url` is an absolute http(s) URL with a host.
///
/// Returns the normalized URL and its host, the crawl's base domain.
pub fn validate_start_url(start_url: &str) -> Result<(String, String)> {
    let parsed = Url::parse(start_url.trim())
        .map_err(|e| ScanError::InvalidStartUrl(format!("{}: {}", start_url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScanError::InvalidStartUrl(format!(
            "{}: scheme must be http or https",
            start_url
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ScanError::InvalidStartUrl(format!("{}: missing host", start_url)))?
        .to_string();

    Ok((parsed.to_string(), host))
}

/// Bounded breadth-first crawler over a single host.
pub struct Crawler<F: PageFetcher> {
    fetcher: F,
    workers: usize,
    progress_callback: Option<ProgressCallback>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl Crawler<HttpFetcher> {
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::new()?))
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::with_timeout(timeout_secs)?))
    }
}

impl<F: PageFetcher> Crawler<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            workers: 1,
            progress_callback: None,
            cancel_flag: None,
        }
    }

    /// Maximum number of fetches in flight at once.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub async fn crawl(&self, start_url: &str, page_budget: usize) -> Result<CrawlOutcome> {
        let (start_url, base_domain) = validate_start_url(start_url)?;
        if page_budget == 0 {
            return Err(ScanError::InvalidBudget);
        }

        info!(
            "Starting crawl of {} (budget {}, {} workers)",
            start_url, page_budget, self.workers
        );

        let mut frontier = Frontier::new(start_url);
        let mut outcome = CrawlOutcome::default();

        while !frontier.is_empty() && frontier.visited_count() < page_budget {
            if self.is_cancelled() {
                info!("Crawl cancelled after {} pages", frontier.visited_count());
                outcome.cancelled = true;
                break;
            }

            // Never admit more pages than the remaining budget allows
            let slots = self.workers.min(page_budget - frontier.visited_count());
            let batch = frontier.next_batch(slots);
            if batch.is_empty() {
                break;
            }

            let fetcher = &self.fetcher;
            let responses: Vec<(String, Result<String>)> = stream::iter(batch)
                .map(|url| async move {
                    let response = fetcher.fetch(&url).await;
                    (url, response)
                })
                .buffered(slots)
                .collect()
                .await;

            // Responses arrive in pop order, which keeps the visit order breadth-first
            for (url, response) in responses {
                let html = match response {
                    Ok(html) => html,
                    Err(e) => {
                        warn!("Skipping {}: {}", url, e);
                        outcome.failed += 1;
                        continue;
                    }
                };

                let record = Self::build_record(&url, &html, &base_domain, &mut frontier);
                frontier.mark_visited(url.clone());

                if let Some(ref callback) = self.progress_callback {
                    callback(frontier.visited_count(), url);
                }
                outcome.records.push(record);
            }
        }

        info!(
            "Crawl complete. Visited {} pages, {} failed",
            outcome.records.len(),
            outcome.failed
        );
        Ok(outcome)
    }

    fn build_record(
        url: &str,
        html: &str,
        base_domain: &str,
        frontier: &mut Frontier,
    ) -> PageRecord {
        let mut record = PageRecord::new(url.to_string());

        for link in extract_links(html, url) {
            if is_same_domain(&link, base_domain) {
                if frontier.push(link.clone()) {
                    debug!("Queued {}", link);
                }
                record.internal_links.insert(link);
            } else {
                record.external_links.insert(link);
            }
        }

        record
    }
}
