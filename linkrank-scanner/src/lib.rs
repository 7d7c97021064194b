pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod result;

pub use crawler::{Crawler, ProgressCallback};
pub use error::ScanError;
pub use extract::extract_links;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use result::{CrawlOutcome, PageRecord};
