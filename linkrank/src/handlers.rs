use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use linkrank_core::crawl::{CrawlOptions, execute_crawl, generate_crawl_summary};
use linkrank_core::rank::{RankConfig, Ranker};
use linkrank_core::report::{
    RankReport, ReportFormat, ReportOptions, analyze_records, render_report, save_report,
};
use linkrank_scanner::result::{PageRecord, load_records, save_records};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Route tracing output to stderr. `RUST_LOG` wins over the -v count.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Parse a start URL, trying to add http:// if there is no scheme
pub fn parse_start_url(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.contains("://") {
        return Url::parse(line).ok().map(|_| line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    Url::parse(&with_scheme).ok().map(|_| with_scheme)
}

/// Expand a leading `~` in a user supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn rank_config_from_args(args: &ArgMatches) -> RankConfig {
    let defaults = RankConfig::default();
    RankConfig {
        damping: args.get_one::<f64>("damping").copied().unwrap_or(defaults.damping),
        tolerance: args
            .get_one::<f64>("tolerance")
            .copied()
            .unwrap_or(defaults.tolerance),
        max_iterations: args
            .get_one::<usize>("max-iterations")
            .copied()
            .unwrap_or(defaults.max_iterations),
    }
}

pub fn report_format_from_args(args: &ArgMatches) -> Result<ReportFormat> {
    let name = args
        .get_one::<String>("format")
        .map(|s| s.as_str())
        .unwrap_or("text");
    match ReportFormat::from_str(name) {
        Some(format) => Ok(format),
        None => bail!("Unknown report format '{}'. Use text, json or csv", name),
    }
}

pub fn report_options_from_args(args: &ArgMatches) -> Result<ReportOptions> {
    let defaults = ReportOptions::default();
    Ok(ReportOptions {
        format: report_format_from_args(args)?,
        top_n: args.get_one::<usize>("top").copied().unwrap_or(defaults.top_n),
        output: args.get_one::<String>("output").map(|p| expand_path(p)),
    })
}

pub fn crawl_options_from_args(
    args: &ArgMatches,
    quiet: bool,
    cancel_flag: Arc<AtomicBool>,
) -> Result<CrawlOptions> {
    let raw_url = args
        .get_one::<String>("url")
        .context("A start URL is required (--url)")?;
    let start_url = parse_start_url(raw_url)
        .with_context(|| format!("'{}' is not a valid start URL", raw_url))?;

    Ok(CrawlOptions {
        start_url,
        max_pages: args.get_one::<usize>("max-pages").copied().unwrap_or(20),
        workers: args.get_one::<usize>("threads").copied().unwrap_or(1),
        timeout_secs: args.get_one::<u64>("timeout").copied().unwrap_or(5),
        show_progress_bars: !quiet,
        cancel_flag: Some(cancel_flag),
    })
}

fn print_divider() {
    println!("{}", "─".repeat(60).bright_black());
}

async fn crawl_from_args(
    args: &ArgMatches,
    quiet: bool,
    cancel_flag: Arc<AtomicBool>,
) -> Result<Vec<PageRecord>> {
    let options = crawl_options_from_args(args, quiet, cancel_flag)?;
    let start_url = options.start_url.clone();
    info!(
        "crawling {} (max {} pages, {} workers)",
        start_url, options.max_pages, options.workers
    );

    let outcome = execute_crawl(options, None)
        .await
        .with_context(|| format!("Crawl of {} failed", start_url))?;

    if !quiet {
        print_divider();
        print!("{}", generate_crawl_summary(&outcome));
        print_divider();
    }
    if outcome.cancelled {
        eprintln!("{} Crawl interrupted, keeping the pages fetched so far", "!".yellow().bold());
    }

    Ok(outcome.records)
}

fn write_crawl_results(records: &[PageRecord], path: &Path, quiet: bool) -> Result<()> {
    save_records(records, path)
        .with_context(|| format!("Failed to write crawl results to {}", path.display()))?;
    if !quiet {
        println!(
            "{} Saved {} page records to {}",
            "✓".green().bold(),
            records.len(),
            path.display()
        );
    }
    Ok(())
}

fn rank_and_emit(
    records: &[PageRecord],
    args: &ArgMatches,
    quiet: bool,
    cancel_flag: Arc<AtomicBool>,
) -> Result<RankReport> {
    let config = rank_config_from_args(args);
    let ReportOptions {
        format,
        top_n,
        output,
    } = report_options_from_args(args)?;

    let ranker = Ranker::new(config)?.with_cancel_flag(cancel_flag);
    let report = analyze_records(records, &ranker);
    debug!(
        "ranked {} nodes (pagerank {} iterations, hits {} iterations)",
        report.rows.len(),
        report.convergence.pagerank_iterations,
        report.convergence.hits_iterations
    );

    match output {
        Some(path) => {
            let content = if format == ReportFormat::Text {
                // Files never get ANSI escapes
                colored::control::set_override(false);
                let content = render_report(&report, format, top_n);
                colored::control::unset_override();
                content?
            } else {
                render_report(&report, format, top_n)?
            };
            save_report(&content, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => {
            let content = render_report(&report, format, top_n)?;
            println!("{}", content);
        }
    }

    Ok(report)
}

// Handler functions

pub async fn handle_crawl(args: &ArgMatches, quiet: bool, cancel_flag: Arc<AtomicBool>) -> Result<()> {
    let output = args
        .get_one::<String>("output")
        .map(|p| expand_path(p))
        .context("An output path is required (--output)")?;

    let records = crawl_from_args(args, quiet, cancel_flag).await?;
    write_crawl_results(&records, &output, quiet)
}

pub fn handle_analyze(args: &ArgMatches, quiet: bool, cancel_flag: Arc<AtomicBool>) -> Result<()> {
    let input = args
        .get_one::<String>("input")
        .map(|p| expand_path(p))
        .context("An input path is required (--input)")?;

    let records = load_records(&input)
        .with_context(|| format!("Failed to read crawl results from {}", input.display()))?;
    info!("loaded {} page records from {}", records.len(), input.display());

    rank_and_emit(&records, args, quiet, cancel_flag)?;
    Ok(())
}

pub async fn handle_run(args: &ArgMatches, quiet: bool, cancel_flag: Arc<AtomicBool>) -> Result<()> {
    let records = crawl_from_args(args, quiet, cancel_flag.clone()).await?;

    // An interrupt that ended the crawl must not also cut ranking short.
    // Another Ctrl-C sets the flag again.
    if cancel_flag.swap(false, Ordering::Relaxed) {
        info!("ranking the {} pages fetched before the interrupt", records.len());
    }

    if let Some(path) = args.get_one::<String>("save-crawl").map(|p| expand_path(p)) {
        write_crawl_results(&records, &path, quiet)?;
    }

    rank_and_emit(&records, args, quiet, cancel_flag)?;
    Ok(())
}
