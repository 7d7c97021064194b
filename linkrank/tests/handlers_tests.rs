use linkrank::commands::command_argument_builder;
use linkrank::handlers::*;
use linkrank_core::rank::RankConfig;
use linkrank_core::report::ReportFormat;
use linkrank_scanner::result::{PageRecord, save_records};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn sub_matches(argv: &[&str]) -> clap::ArgMatches {
    let matches = command_argument_builder()
        .try_get_matches_from(argv)
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();
    sub.clone()
}

fn sample_records() -> Vec<PageRecord> {
    let mut home = PageRecord::new("https://a.test/".to_string());
    home.internal_links.insert("https://a.test/b".to_string());
    home.external_links.insert("https://x.test/".to_string());
    let mut b = PageRecord::new("https://a.test/b".to_string());
    b.internal_links.insert("https://a.test/".to_string());
    vec![home, b]
}

// ============================================================================
// Start URL Parsing Tests
// ============================================================================

#[test]
fn test_parse_start_url_with_scheme() {
    let result = parse_start_url("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_start_url_without_scheme() {
    let result = parse_start_url("example.com/docs");
    assert_eq!(result, Some("http://example.com/docs".to_string()));
}

#[test]
fn test_parse_start_url_trims_whitespace() {
    let result = parse_start_url("  https://example.com/  ");
    assert_eq!(result, Some("https://example.com/".to_string()));
}

#[test]
fn test_parse_start_url_invalid() {
    assert_eq!(parse_start_url("not a valid url!!!"), None);
    assert_eq!(parse_start_url(""), None);
    assert_eq!(parse_start_url("   "), None);
}

#[test]
fn test_expand_path_plain() {
    assert_eq!(expand_path("/tmp/crawl.json"), PathBuf::from("/tmp/crawl.json"));
    assert_eq!(expand_path("crawled_links.json"), PathBuf::from("crawled_links.json"));
}

// ============================================================================
// Argument Mapping Tests
// ============================================================================

#[test]
fn test_rank_config_defaults() {
    let args = sub_matches(&["linkrank", "analyze"]);
    let config = rank_config_from_args(&args);
    assert_eq!(config, RankConfig::default());
}

#[test]
fn test_rank_config_overrides() {
    let args = sub_matches(&[
        "linkrank",
        "analyze",
        "--damping",
        "0.5",
        "--tolerance",
        "0.001",
        "--max-iterations",
        "7",
    ]);
    let config = rank_config_from_args(&args);

    assert_eq!(config.damping, 0.5);
    assert_eq!(config.tolerance, 0.001);
    assert_eq!(config.max_iterations, 7);
}

#[test]
fn test_report_format_from_args() {
    let args = sub_matches(&["linkrank", "analyze", "-f", "csv"]);
    assert_eq!(report_format_from_args(&args).unwrap(), ReportFormat::Csv);

    let args = sub_matches(&["linkrank", "analyze"]);
    assert_eq!(report_format_from_args(&args).unwrap(), ReportFormat::Text);
}

#[test]
fn test_unknown_format_rejected_by_parser() {
    let result = command_argument_builder().try_get_matches_from(["linkrank", "analyze", "-f", "pdf"]);
    assert!(result.is_err());
}

#[test]
fn test_zero_max_pages_rejected_by_parser() {
    let result =
        command_argument_builder().try_get_matches_from(["linkrank", "crawl", "-u", "a.test", "-m", "0"]);
    assert!(result.is_err());
}

#[test]
fn test_crawl_options_from_args() {
    let args = sub_matches(&["linkrank", "run", "-u", "example.com", "-m", "5", "-t", "3"]);
    let options = crawl_options_from_args(&args, true, Arc::new(AtomicBool::new(false))).unwrap();

    assert_eq!(options.start_url, "http://example.com");
    assert_eq!(options.max_pages, 5);
    assert_eq!(options.workers, 3);
    assert_eq!(options.timeout_secs, 5);
    assert!(!options.show_progress_bars);
    assert!(options.cancel_flag.is_some());
}

#[test]
fn test_crawl_options_invalid_url() {
    let args = sub_matches(&["linkrank", "crawl", "-u", "not a valid url!!!"]);
    let result = crawl_options_from_args(&args, true, Arc::new(AtomicBool::new(false)));
    assert!(result.is_err());
}

#[test]
fn test_crawl_output_default() {
    let args = sub_matches(&["linkrank", "crawl", "-u", "example.com"]);
    assert_eq!(
        args.get_one::<String>("output").map(|s| s.as_str()),
        Some("crawled_links.json")
    );
}

// ============================================================================
// Analyze Handler Tests
// ============================================================================

#[test]
fn test_handle_analyze_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("crawled_links.json");
    let output = dir.path().join("page_influence_summary.csv");
    save_records(&sample_records(), &input).unwrap();

    let args = sub_matches(&[
        "linkrank",
        "analyze",
        "-i",
        input.to_str().unwrap(),
        "-f",
        "csv",
        "-o",
        output.to_str().unwrap(),
    ]);
    handle_analyze(&args, true, Arc::new(AtomicBool::new(false))).unwrap();

    let csv = std::fs::read_to_string(&output).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("page,pagerank,authority,hub,type"));
    assert_eq!(lines.count(), 3);
}

#[test]
fn test_handle_analyze_writes_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("crawled_links.json");
    let output = dir.path().join("report.json");
    save_records(&sample_records(), &input).unwrap();

    let args = sub_matches(&[
        "linkrank",
        "analyze",
        "-i",
        input.to_str().unwrap(),
        "-f",
        "json",
        "-o",
        output.to_str().unwrap(),
        "--top",
        "1",
    ]);
    handle_analyze(&args, true, Arc::new(AtomicBool::new(false))).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value["report"]["top"]["pagerank"].as_array().unwrap().len(), 1);
    assert_eq!(value["report"]["nodes"].as_array().unwrap().len(), 3);
}

#[test]
fn test_handle_analyze_text_file_has_no_ansi() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("crawled_links.json");
    let output = dir.path().join("report.txt");
    save_records(&sample_records(), &input).unwrap();

    let args = sub_matches(&[
        "linkrank",
        "analyze",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);
    handle_analyze(&args, true, Arc::new(AtomicBool::new(false))).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("TOP PAGES (PAGERANK)"));
    assert!(!text.contains('\u{1b}'));
}

#[test]
fn test_handle_analyze_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("does_not_exist.json");

    let args = sub_matches(&["linkrank", "analyze", "-i", input.to_str().unwrap()]);
    let result = handle_analyze(&args, true, Arc::new(AtomicBool::new(false)));

    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read crawl results"));
}

#[test]
fn test_handle_analyze_malformed_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("crawled_links.json");
    std::fs::write(&input, "{ not json").unwrap();

    let args = sub_matches(&["linkrank", "analyze", "-i", input.to_str().unwrap()]);
    assert!(handle_analyze(&args, true, Arc::new(AtomicBool::new(false))).is_err());
}

#[test]
fn test_handle_analyze_rejects_bad_damping() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("crawled_links.json");
    save_records(&sample_records(), &input).unwrap();

    let args = sub_matches(&[
        "linkrank",
        "analyze",
        "-i",
        input.to_str().unwrap(),
        "--damping",
        "1.5",
    ]);
    assert!(handle_analyze(&args, true, Arc::new(AtomicBool::new(false))).is_err());
}

#[test]
fn test_report_options_from_args() {
    let args = sub_matches(&["linkrank", "analyze", "-f", "json", "-n", "3", "-o", "/tmp/r.json"]);
    let options = report_options_from_args(&args).unwrap();

    assert_eq!(options.format, ReportFormat::Json);
    assert_eq!(options.top_n, 3);
    assert_eq!(options.output, Some(PathBuf::from("/tmp/r.json")));

    let args = sub_matches(&["linkrank", "analyze"]);
    let options = report_options_from_args(&args).unwrap();
    assert_eq!(options.top_n, 10);
    assert!(options.output.is_none());
}

// ============================================================================
// Run Handler Tests
// ============================================================================

#[tokio::test]
async fn test_handle_run_clears_interrupt_before_ranking() {
    let dir = tempfile::tempdir().unwrap();
    let crawl_path = dir.path().join("crawled_links.json");
    let report_path = dir.path().join("report.json");

    let args = sub_matches(&[
        "linkrank",
        "run",
        "-u",
        "http://127.0.0.1:9/",
        "--save-crawl",
        crawl_path.to_str().unwrap(),
        "-f",
        "json",
        "-o",
        report_path.to_str().unwrap(),
    ]);
    let cancel_flag = Arc::new(AtomicBool::new(true));
    handle_run(&args, true, cancel_flag.clone()).await.unwrap();

    assert!(!cancel_flag.load(std::sync::atomic::Ordering::Relaxed));
    assert_eq!(std::fs::read_to_string(&crawl_path).unwrap().trim(), "[]");
    assert!(report_path.exists());
}
