use indicatif::{ProgressBar, ProgressStyle};
use linkrank_scanner::Crawler;
use linkrank_scanner::result::CrawlOutcome;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::error::Result;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub start_url: String,
    pub max_pages: usize,
    pub workers: usize,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            max_pages: 20,
            workers: 1,
            timeout_secs: 5,
            show_progress_bars: false,
            cancel_flag: None,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome> {
    let CrawlOptions {
        start_url,
        max_pages,
        workers,
        timeout_secs,
        show_progress_bars,
        cancel_flag,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));
    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let internal_callback: linkrank_scanner::ProgressCallback =
        Arc::new(move |visited: usize, url: String| {
            count_clone.store(visited, Ordering::Relaxed);
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!(
                    "Crawling... {}/{} pages  {}",
                    visited,
                    max_pages,
                    extract_url_path(&url)
                ));
            }
            if let Some(ref callback) = progress_callback {
                callback(visited, url);
            }
        });

    let mut crawler = Crawler::with_timeout(timeout_secs)?
        .with_workers(workers)
        .with_progress_callback(internal_callback);
    if let Some(flag) = cancel_flag {
        crawler = crawler.with_cancel_flag(flag);
    }

    let outcome = crawler.crawl(&start_url, max_pages).await;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        match &outcome {
            Ok(o) if o.cancelled => {
                pb.finish_with_message(format!("Crawl cancelled after {} pages", total))
            }
            Ok(_) => pb.finish_with_message(format!("Crawl complete! {} pages processed", total)),
            Err(_) => pb.finish_and_clear(),
        }
    }

    Ok(outcome?)
}

/// Short human summary of a finished crawl
pub fn generate_crawl_summary(outcome: &CrawlOutcome) -> String {
    let internal: usize = outcome.records.iter().map(|r| r.internal_links.len()).sum();
    let external: usize = outcome.records.iter().map(|r| r.external_links.len()).sum();
    let total: usize = outcome.records.iter().map(|r| r.link_count()).sum();

    let mut summary = String::new();
    summary.push_str(&format!("  Pages crawled:       {}\n", outcome.pages_crawled()));
    summary.push_str(&format!("  Failed fetches:      {}\n", outcome.failed));
    summary.push_str(&format!("  Internal links seen: {}\n", internal));
    summary.push_str(&format!("  External links seen: {}\n", external));
    summary.push_str(&format!("  Links recorded:      {}\n", total));
    if outcome.cancelled {
        summary.push_str("  Stopped early: cancelled\n");
    }
    summary
}
