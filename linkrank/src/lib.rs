pub mod commands;

// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{expand_path, init_logging, parse_start_url, rank_config_from_args};

// Re-export the pieces of linkrank-core the handlers are built from
pub use linkrank_core::crawl::{CrawlOptions, execute_crawl, extract_url_path};
pub use linkrank_core::report::{RankReport, ReportFormat};
