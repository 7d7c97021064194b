use colored::Colorize;
use linkrank::commands::command_argument_builder;
use linkrank::handlers::{handle_analyze, handle_crawl, handle_run, init_logging};
use linkrank_core::print_banner;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    init_logging(chosen_command.get_count("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    // Each Ctrl-C stops the running crawl or ranking loop; results so far are kept
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let signal_flag = cancel_flag.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping");
            signal_flag.store(true, Ordering::Relaxed);
        }
    });

    let result = match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet, cancel_flag).await,
        Some(("analyze", primary_command)) => handle_analyze(primary_command, quiet, cancel_flag),
        Some(("run", primary_command)) => handle_run(primary_command, quiet, cancel_flag).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
