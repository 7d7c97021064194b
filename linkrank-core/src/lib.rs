pub mod crawl;
pub mod error;
pub mod graph;
pub mod rank;
pub mod report;

use colored::Colorize;

pub use error::{CoreError, Result};
pub use graph::{EdgeKind, GraphEdge, GraphNode, GraphStats, LinkGraph, NodeKind};
pub use rank::{HitsResult, PageRankResult, RankConfig, RankError, RankOutcome, Ranker};
pub use report::{NodeScore, RankReport, ReportFormat, ReportOptions, ScoreField};

pub fn print_banner() {
    let banner = r#"
  _ _       _                     _
 | (_)_ __ | | ___ __ __ _ _ __ | | __
 | | | '_ \| |/ / '__/ _` | '_ \| |/ /
 | | | | | |   <| | | (_| | | | |   <
 |_|_|_| |_|_|\_\_|  \__,_|_| |_|_|\_\
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "crawl a site, rank its pages".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).as_str().bright_black()
    );
}
