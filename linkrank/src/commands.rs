use clap::{Arg, arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub const DEFAULT_CRAWL_FILE: &str = "crawled_links.json";

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkrank")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkrank")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and progress output").required(false))
        .arg(
            arg!(-v --"verbose" ... "Increase log verbosity (-v info, -vv debug)")
                .required(false),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about("Crawl a site breadth-first and save the discovered links")
                .args(crawl_args())
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Where to write the crawl results (JSON)")
                        .default_value(DEFAULT_CRAWL_FILE),
                ),
        )
        .subcommand(
            command!("analyze")
                .about("Build the link graph from saved crawl results and rank every page")
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(false)
                        .help("Crawl results produced by `linkrank crawl`")
                        .default_value(DEFAULT_CRAWL_FILE),
                )
                .args(report_args())
                .args(rank_args()),
        )
        .subcommand(
            command!("run")
                .about("Crawl a site and rank its pages in one step")
                .args(crawl_args())
                .arg(
                    arg!(--"save-crawl" <PATH>)
                        .required(false)
                        .help("Also save the crawl results (JSON) to this path"),
                )
                .args(report_args())
                .args(rank_args()),
        )
}

fn crawl_args() -> Vec<Arg> {
    vec![
        arg!(-u --"url" <URL>)
            .required(true)
            .help("The start URL; its host decides which links are internal"),
        arg!(-m --"max-pages" <NUM>)
            .required(false)
            .help("Maximum number of pages to crawl")
            .value_parser(clap::builder::RangedU64ValueParser::<usize>::new().range(1..))
            .default_value("20"),
        arg!(-t --"threads" <NUM_WORKERS>)
            .required(false)
            .help("Number of fetches kept in flight at once")
            .value_parser(clap::builder::RangedU64ValueParser::<usize>::new().range(1..))
            .default_value("1"),
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Request timeout in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("5"),
    ]
}

fn report_args() -> Vec<Arg> {
    vec![
        arg!(-f --"format" <FORMAT>)
            .required(false)
            .help("Report format: text, json, csv")
            .value_parser(["text", "json", "csv"])
            .default_value("text"),
        arg!(-o --"output" <PATH>)
            .required(false)
            .help("Save report to file (default: display to screen)"),
        arg!(-n --"top" <NUM>)
            .required(false)
            .help("How many entries to list per ranking")
            .value_parser(clap::value_parser!(usize))
            .default_value("10"),
    ]
}

fn rank_args() -> Vec<Arg> {
    vec![
        arg!(--"damping" <FACTOR>)
            .required(false)
            .help("PageRank damping factor")
            .value_parser(clap::value_parser!(f64))
            .default_value("0.85"),
        arg!(--"tolerance" <EPSILON>)
            .required(false)
            .help("Convergence tolerance (L1 change between iterations)")
            .value_parser(clap::value_parser!(f64))
            .default_value("1e-6"),
        arg!(--"max-iterations" <NUM>)
            .required(false)
            .help("Iteration cap for PageRank and HITS")
            .value_parser(clap::value_parser!(usize))
            .default_value("100"),
    ]
}
