use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde_json::Value;

use crate::canonical::canonicalize;
use crate::extract::{extract_sites, SitesPattern};

/// Fetch collaborator: one GET attempt per URL, body text on success.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Walk `urls` in order, recover a sites list from each response and keep the
/// first occurrence of every structurally distinct record. `max == 0` means
/// no cap; otherwise URLs past the cap are never fetched. A single URL's
/// failure is logged and contributes nothing.
pub fn merge(
    urls: &[String],
    fetcher: &dyn Fetch,
    patterns: &SitesPattern,
    delay: Duration,
    max: usize,
) -> Vec<Value> {
    let planned = if max == 0 { urls.len() } else { urls.len().min(max) };
    let bar = ProgressBar::new(planned as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {pos}/{len} {wide_bar:.cyan/blue} {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut merged: Vec<Value> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut processed = 0usize;

    for url in urls {
        if max != 0 && processed >= max {
            break;
        }
        info!("GET {url}");
        match fetcher.fetch(url) {
            Ok(text) => {
                let sites = extract_sites(patterns, &text);
                if sites.is_empty() {
                    info!("no 'sites' found in {url}");
                }
                for site in sites {
                    if seen.insert(canonicalize(&site)) {
                        merged.push(site);
                    }
                }
            }
            Err(err) => warn!("failed to fetch {url}: {err:#}"),
        }
        processed += 1;
        bar.inc(1);
        // courtesy rate limit, applied after every URL including the last
        thread::sleep(delay);
    }
    bar.finish_and_clear();

    merged
}
