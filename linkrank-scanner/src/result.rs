use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Links discovered on a single crawled page.
///
/// Serializes to the crawl exchange format: `url`, `internal_links`,
/// `external_links`. Link sets serialize as sorted lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub internal_links: BTreeSet<String>,
    pub external_links: BTreeSet<String>,
}

impl PageRecord {
    pub fn new(url: String) -> Self {
        Self {
            url,
            internal_links: BTreeSet::new(),
            external_links: BTreeSet::new(),
        }
    }

    pub fn link_count(&self) -> usize {
        self.internal_links.len() + self.external_links.len()
    }
}

/// Page records in visit order, plus how the crawl ended.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub records: Vec<PageRecord>,
    pub failed: usize,
    pub cancelled: bool,
}

impl CrawlOutcome {
    pub fn pages_crawled(&self) -> usize {
        self.records.len()
    }
}

pub fn records_to_json(records: &[PageRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn records_from_json(json: &str) -> Result<Vec<PageRecord>> {
    Ok(serde_json::from_str(json)?)
}

pub fn save_records(records: &[PageRecord], path: &Path) -> Result<()> {
    fs::write(path, records_to_json(records)?)?;
    Ok(())
}

pub fn load_records(path: &Path) -> Result<Vec<PageRecord>> {
    let content = fs::read_to_string(path)?;
    records_from_json(&content)
}
