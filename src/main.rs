/*
cargo run --release -- \
    --input 18.json \
    --output files/merged_sites.json \
    --delay 0.5

cargo run --release -- \
    --input https://raw.githubusercontent.com/example/repo/main/18.json \
    --output files/merged_sites.json \
    --max 20
*/

mod canonical;
mod extract;
mod fetch;
mod index;
mod merge;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{error, info, LevelFilter};
use serde::Serialize;
use serde_json::Value;
use simplelog::{Config as LogConfig, WriteLogger};

use extract::SitesPattern;
use fetch::HttpFetcher;
use index::{load_input, resolve_urls, UrlPattern};

/// Merge the "sites" arrays of every document listed in the index into one
/// deduplicated JSON file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Index document: local path or raw URL
    #[arg(short, long, default_value = "18.json")]
    input: String,

    /// Output JSON file path (parent directory must exist)
    #[arg(short, long, default_value = "files/merged_sites.json")]
    output: PathBuf,

    /// Delay in seconds between requests
    #[arg(short, long, default_value_t = 0.5)]
    delay: f64,

    /// Max number of urls to process (0 = all)
    #[arg(long, default_value_t = 0)]
    max: usize,
}

#[derive(Serialize)]
struct MergedResult {
    sites: Vec<Value>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logging setup
    fs::create_dir_all("logs").context("creating log directory")?;
    let ts = Local::now().format("%Y-%m-%d_%H-%M-%S");
    WriteLogger::init(
        LevelFilter::Info,
        LogConfig::default(),
        fs::File::create(format!("logs/merge_sites_{ts}.log")).context("opening log file")?,
    )?;

    let sites_pattern = SitesPattern::new()?;
    let url_pattern = UrlPattern::new()?;
    let fetcher = HttpFetcher::new()?;

    let index = match load_input(&cli.input, &fetcher) {
        Ok(v) => v,
        Err(e) => {
            error!("failed to load index: {e:#}");
            eprintln!("Failed to load index: {e:#}");
            std::process::exit(1);
        }
    };

    let urls = resolve_urls(&index, &url_pattern);
    match cli.max {
        0 => info!("found {} urls, processing all", urls.len()),
        n => info!("found {} urls, processing up to {n}", urls.len()),
    }

    let sites = merge::merge(
        &urls,
        &fetcher,
        &sites_pattern,
        Duration::from_secs_f64(cli.delay.max(0.0)),
        cli.max,
    );
    let total = sites.len();
    info!("total unique sites collected: {total}");

    write_output(&cli.output, sites)?;

    info!("wrote merged sites to {}", cli.output.display());
    println!("Merged {total} unique site(s) into {}", cli.output.display());
    Ok(())
}

/// Serialize `{"sites": [...]}` pretty-printed and write it out. The parent
/// directory must already exist; any failure here is fatal for the run.
fn write_output(path: &Path, sites: Vec<Value>) -> Result<()> {
    let pretty = serde_json::to_string_pretty(&MergedResult { sites })?;
    fs::write(path, pretty).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
