// Ranking reports: per-node scores, crawl statistics, text/json/csv output

use crate::error::{CoreError, Result};
use crate::graph::{GraphStats, LinkGraph, NodeKind};
use crate::rank::{RankOutcome, Ranker};
use colored::Colorize;
use linkrank_scanner::result::PageRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

/// How a finished ranking is rendered and where it goes
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub format: ReportFormat,
    pub top_n: usize,
    /// `None` prints to stdout
    pub output: Option<PathBuf>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            top_n: 10,
            output: None,
        }
    }
}

/// Numeric column a report can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreField {
    PageRank,
    Authority,
    Hub,
}

impl ScoreField {
    pub const ALL: [ScoreField; 3] = [ScoreField::PageRank, ScoreField::Authority, ScoreField::Hub];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pagerank" | "pr" => Some(ScoreField::PageRank),
            "authority" | "auth" => Some(ScoreField::Authority),
            "hub" => Some(ScoreField::Hub),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoreField::PageRank => "pagerank",
            ScoreField::Authority => "authority",
            ScoreField::Hub => "hub",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ScoreField::PageRank => "TOP PAGES (PAGERANK)",
            ScoreField::Authority => "TOP AUTHORITIES (HITS)",
            ScoreField::Hub => "TOP HUBS (HITS)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeScore {
    pub url: String,
    pub pagerank: f64,
    pub authority: f64,
    pub hub: f64,
    pub kind: NodeKind,
    pub in_degree: usize,
    pub out_degree: usize,
}

impl NodeScore {
    pub fn score(&self, field: ScoreField) -> f64 {
        match field {
            ScoreField::PageRank => self.pagerank,
            ScoreField::Authority => self.authority,
            ScoreField::Hub => self.hub,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    pub pagerank_iterations: usize,
    pub pagerank_converged: bool,
    pub pagerank_cancelled: bool,
    pub hits_iterations: usize,
    pub hits_converged: bool,
    pub hits_cancelled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankReport {
    pub pages_crawled: usize,
    pub stats: GraphStats,
    pub convergence: ConvergenceInfo,
    /// One row per graph node, in graph insertion order
    pub rows: Vec<NodeScore>,
}

impl RankReport {
    pub fn new(pages_crawled: usize, graph: &LinkGraph, ranks: &RankOutcome) -> Self {
        let rows = graph
            .nodes()
            .map(|node| NodeScore {
                url: node.url.clone(),
                pagerank: score_of(&ranks.pagerank.scores, &node.url),
                authority: score_of(&ranks.hits.authorities, &node.url),
                hub: score_of(&ranks.hits.hubs, &node.url),
                kind: node.kind,
                in_degree: graph.in_degree(&node.url),
                out_degree: graph.out_degree(&node.url),
            })
            .collect();

        Self {
            pages_crawled,
            stats: graph.stats(),
            convergence: ConvergenceInfo {
                pagerank_iterations: ranks.pagerank.iterations,
                pagerank_converged: ranks.pagerank.converged,
                pagerank_cancelled: ranks.pagerank.cancelled,
                hits_iterations: ranks.hits.iterations,
                hits_converged: ranks.hits.converged,
                hits_cancelled: ranks.hits.cancelled,
            },
            rows,
        }
    }

    /// Rows ordered by `field`, highest first. Ties fall back to URL order.
    pub fn sorted_by(&self, field: ScoreField) -> Vec<&NodeScore> {
        let mut rows: Vec<&NodeScore> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            b.score(field)
                .partial_cmp(&a.score(field))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.url.cmp(&b.url))
        });
        rows
    }

    pub fn top(&self, field: ScoreField, n: usize) -> Vec<&NodeScore> {
        let mut rows = self.sorted_by(field);
        rows.truncate(n);
        rows
    }

    pub fn row(&self, url: &str) -> Option<&NodeScore> {
        self.rows.iter().find(|row| row.url == url)
    }
}

fn score_of(scores: &std::collections::HashMap<String, f64>, url: &str) -> f64 {
    scores.get(url).copied().unwrap_or(0.0)
}

/// Build the graph from a finished crawl and rank it.
pub fn analyze_records(records: &[PageRecord], ranker: &Ranker) -> RankReport {
    let graph = LinkGraph::from_records(records);
    let ranks = ranker.rank(&graph);
    RankReport::new(records.len(), &graph, &ranks)
}

pub fn generate_text_report(report: &RankReport, top_n: usize) -> String {
    let rule = "━".repeat(80);
    let mut out = String::new();

    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("{}\n", "                         LINKRANK INFLUENCE REPORT".bold()));
    out.push_str(&format!("{}\n\n", rule));

    out.push_str(&format!("{}\n", "CRAWL STATISTICS".bright_blue().bold()));
    out.push_str(&format!("  Pages crawled:    {}\n", report.pages_crawled));
    out.push_str(&format!("  Total nodes:      {}\n", report.stats.total_nodes));
    out.push_str(&format!("  Total edges:      {}\n", report.stats.total_edges));
    out.push_str(&format!("  Internal links:   {}\n", report.stats.internal_edges));
    out.push_str(&format!("  External links:   {}\n", report.stats.external_edges));
    out.push_str(&format!(
        "  Node kinds:       {} page, {} external\n",
        report.stats.page_nodes, report.stats.external_nodes
    ));
    out.push('\n');

    let convergence = &report.convergence;
    out.push_str(&format!(
        "  PageRank: {} iterations{}\n",
        convergence.pagerank_iterations,
        convergence_note(convergence.pagerank_converged, convergence.pagerank_cancelled)
    ));
    out.push_str(&format!(
        "  HITS:     {} iterations{}\n\n",
        convergence.hits_iterations,
        convergence_note(convergence.hits_converged, convergence.hits_cancelled)
    ));

    for field in ScoreField::ALL {
        out.push_str(&format!("{}\n", rule));
        out.push_str(&format!("{}\n", field.title().bright_blue().bold()));
        out.push_str(&format!("{}\n\n", rule));

        let top = report.top(field, top_n);
        if top.is_empty() {
            out.push_str("  (empty)\n\n");
            continue;
        }
        for (idx, row) in top.iter().enumerate() {
            out.push_str(&format!(
                "  {:>3}. {:.4}  {:<8}  {}\n",
                idx + 1,
                row.score(field),
                row.kind.as_str(),
                row.url
            ));
        }
        out.push('\n');
    }

    out
}

fn convergence_note(converged: bool, cancelled: bool) -> String {
    if converged {
        " (converged)".green().to_string()
    } else if cancelled {
        " (interrupted, partial estimate)".yellow().to_string()
    } else {
        " (iteration cap reached, best estimate)".yellow().to_string()
    }
}

pub fn generate_json_report(report: &RankReport, top_n: usize) -> Result<String> {
    let top_list = |field: ScoreField| -> Vec<serde_json::Value> {
        report
            .top(field, top_n)
            .into_iter()
            .map(|row| {
                let mut entry = serde_json::Map::new();
                entry.insert("url".to_string(), row.url.clone().into());
                entry.insert("kind".to_string(), row.kind.as_str().into());
                entry.insert(field.name().to_string(), row.score(field).into());
                serde_json::Value::Object(entry)
            })
            .collect()
    };

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "linkrank",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "pages_crawled": report.pages_crawled,
                "stats": report.stats,
                "convergence": report.convergence
            },
            "top": {
                "pagerank": top_list(ScoreField::PageRank),
                "authority": top_list(ScoreField::Authority),
                "hub": top_list(ScoreField::Hub)
            },
            "nodes": report.rows
        }
    });

    Ok(serde_json::to_string_pretty(&json_report)?)
}

/// Full table, one line per node, sorted by PageRank.
pub fn generate_csv_report(report: &RankReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["page", "pagerank", "authority", "hub", "type"])?;

    for row in report.sorted_by(ScoreField::PageRank) {
        writer.write_record([
            row.url.as_str(),
            &row.pagerank.to_string(),
            &row.authority.to_string(),
            &row.hub.to_string(),
            row.kind.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|_| CoreError::CsvEncoding)
}

pub fn render_report(report: &RankReport, format: ReportFormat, top_n: usize) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report, top_n)),
        ReportFormat::Json => generate_json_report(report, top_n),
        ReportFormat::Csv => generate_csv_report(report),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
