// Inherit lint configuration from lib.rs for consistency
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::items_after_statements,
    clippy::unnecessary_wraps,
    clippy::needless_pass_by_value
)]

use std::io::{BufReader, Read};

use chrono::Utc;
use clap::Parser;
use serde::Serialize;

use jtrack::cli::commands::{Cli, Command};
use jtrack::cli::output;
use jtrack::config::Config;
use jtrack::ingest::listing::Listing;
use jtrack::models::record::RecordEdit;
use jtrack::operations::{self, ListFilter, ScanSource, SortKey};
use jtrack::tracker::Tracker;

fn main() {
    let cli = Cli::parse();

    if !matches!(cli.command, Command::Mcp) {
        init_tracing();
    }

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr; stdout carries only JSON results.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn run(cli: Cli) -> CmdResult {
    match cli.command {
        Command::Scan { path, from_list } => cmd_scan(&path, from_list.as_deref()),
        Command::List {
            search,
            sort,
            hide_completed,
            hide_incomplete,
            hide_auto,
            dirs,
            limit,
            offset,
        } => cmd_list(
            &sort,
            ListFilter {
                search,
                show_completed: !hide_completed,
                show_incomplete: !hide_incomplete,
                show_auto_detected: !hide_auto,
                directories: dirs,
                sort: SortKey::default(),
                offset,
                limit,
            },
        ),
        Command::Show { id } => cmd_show(&id),
        Command::Update {
            id,
            test,
            doc,
            notes,
        } => cmd_update(
            &id,
            RecordEdit {
                test_completed: test,
                doc_completed: doc,
                notes,
            },
        ),
        Command::Stats => cmd_stats(),
        Command::Export { out } => cmd_export(out.as_deref()),
        Command::Import { file } => cmd_import(&file),
        Command::Clear { yes } => cmd_clear(yes),
        Command::Mcp => cmd_mcp(),
    }
}

type CmdResult = Result<(), Box<dyn std::fmt::Display>>;

fn map_err(e: impl std::fmt::Display + 'static) -> Box<dyn std::fmt::Display> {
    Box::new(e.to_string())
}

fn get_config() -> Result<Config, Box<dyn std::fmt::Display>> {
    Config::from_cwd().map_err(map_err)
}

fn get_tracker(config: &Config) -> Result<Tracker, Box<dyn std::fmt::Display>> {
    let tracker = Tracker::open(config).map_err(map_err)?;
    for warning in tracker.load_warnings() {
        tracing::warn!(store = %tracker.location(), "{warning}");
    }
    Ok(tracker)
}

fn print<T: Serialize>(config: &Config, result: &T) {
    println!("{}", output::format_output(result, config.pretty_output()));
}

fn cmd_scan(path: &str, from_list: Option<&str>) -> CmdResult {
    let config = get_config()?;

    let source = match from_list {
        Some("-") => {
            let stdin = std::io::stdin();
            ScanSource::Listing(Listing::from_reader(stdin.lock()).map_err(map_err)?)
        }
        Some(file) => {
            let f = std::fs::File::open(file).map_err(map_err)?;
            ScanSource::Listing(Listing::from_reader(BufReader::new(f)).map_err(map_err)?)
        }
        None if path == "." => ScanSource::Directory(config.home.clone()),
        None => ScanSource::Directory(config.home.join(path)),
    };

    let result = operations::run_scan(&config, &source, |p| {
        tracing::debug!(done = p.done, total = p.total, batch = p.batch, "scan batch");
    })
    .map_err(map_err)?;
    print(&config, &result);
    Ok(())
}

fn cmd_list(sort: &str, mut filter: ListFilter) -> CmdResult {
    filter.sort = sort.parse().map_err(map_err)?;
    let config = get_config()?;
    let tracker = get_tracker(&config)?;

    let result = operations::list_records(
        tracker.records(),
        &filter,
        config.settings.scan.batch_size,
        |p| tracing::debug!(done = p.done, total = p.total, "list batch"),
    );
    print(&config, &result);
    Ok(())
}

fn cmd_show(id: &str) -> CmdResult {
    let config = get_config()?;
    let tracker = get_tracker(&config)?;
    let result = operations::show_record(&tracker, id).map_err(map_err)?;
    print(&config, &result);
    Ok(())
}

fn cmd_update(id: &str, edit: RecordEdit) -> CmdResult {
    let config = get_config()?;
    let mut tracker = get_tracker(&config)?;
    let result = operations::update_record(&mut tracker, id, &edit).map_err(map_err)?;
    print(&config, &result);
    Ok(())
}

fn cmd_stats() -> CmdResult {
    let config = get_config()?;
    let tracker = get_tracker(&config)?;
    let result = operations::get_stats(tracker.records());
    print(&config, &result);
    Ok(())
}

fn cmd_export(out: Option<&str>) -> CmdResult {
    let config = get_config()?;
    let tracker = get_tracker(&config)?;
    let doc = operations::export_records(tracker.records(), Utc::now());

    match out {
        Some(path) => {
            std::fs::write(path, output::format_pretty(&doc)).map_err(map_err)?;
            #[derive(Serialize)]
            struct Exported<'a> {
                exported: usize,
                path: &'a str,
            }
            print(
                &config,
                &Exported {
                    exported: doc.files.len(),
                    path,
                },
            );
        }
        None => print(&config, &doc),
    }
    Ok(())
}

fn cmd_import(file: &str) -> CmdResult {
    let config = get_config()?;
    let mut text = String::new();
    if file == "-" {
        std::io::stdin().read_to_string(&mut text).map_err(map_err)?;
    } else {
        text = std::fs::read_to_string(file).map_err(map_err)?;
    }

    let mut tracker = get_tracker(&config)?;
    let result = operations::import_records(&mut tracker, &text).map_err(map_err)?;
    print(&config, &result);
    Ok(())
}

fn cmd_clear(yes: bool) -> CmdResult {
    if !yes {
        return Err(map_err("refusing to delete all records without --yes"));
    }
    let config = get_config()?;
    let mut tracker = get_tracker(&config)?;
    let result = operations::clear_records(&mut tracker).map_err(map_err)?;
    print(&config, &result);
    Ok(())
}

fn cmd_mcp() -> CmdResult {
    let rt = tokio::runtime::Runtime::new().map_err(map_err)?;
    rt.block_on(async { jtrack::mcp::start_mcp_server().await.map_err(map_err) })
}
