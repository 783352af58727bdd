use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use reqwest::blocking::Client;
use tracing::info;

use crate::extract::{self, ErrorNote, StationRecord};
use crate::fetch;
use crate::registry::CategoryConfig;

/// Everything one category run produced. Fresh per invocation; handed to the
/// output writer and dropped.
pub struct RunResult {
    pub records: Vec<StationRecord>,
    pub notes: Vec<ErrorNote>,
}

/// Keep only the links that are station detail pages for this category.
/// Order-stable: output is a subsequence of the input. The prefix pattern is
/// a substring test, and dedup happened upstream in the href harvest.
pub fn filter_links(raw_links: &[String], prefix: &Regex) -> Vec<String> {
    raw_links
        .iter()
        .filter(|link| prefix.is_match(link))
        .cloned()
        .collect()
}

/// Run one category end to end: listing fetch, link filter, then one
/// sequential detail fetch + extraction per station.
///
/// A listing fetch failure is fatal for this category (the caller logs it
/// and moves on); per-station failures land in `RunResult::notes`.
pub fn run_category(client: &Client, cfg: &CategoryConfig) -> Result<RunResult, fetch::FetchError> {
    let raw_links = fetch::collect_links(client, cfg.listing_url)?;
    let links = filter_links(&raw_links, &cfg.link_prefix);
    info!(
        "{}: {} station links after filtering ({} raw)",
        cfg.category,
        links.len(),
        raw_links.len()
    );

    let pb = ProgressBar::new(links.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({percent}%)")
            .expect("progress template")
            .progress_chars("=> "),
    );

    let mut records = Vec::new();
    let mut notes = Vec::new();
    for link in &links {
        match extract::extract_station(client, cfg, link) {
            Ok(record) => records.push(record),
            Err(note) => notes.push(note),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "{}: {} records, {} errors",
        cfg.category,
        records.len(),
        notes.len()
    );
    Ok(RunResult { records, notes })
}
