use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use reqwest::blocking::Client;
use tracing::error;

use ofcom_scraper::fetch;
use ofcom_scraper::output;
use ofcom_scraper::pipeline;
use ofcom_scraper::registry::{self, Category, CategoryConfig};

#[derive(Parser)]
#[command(
    name = "ofcom_scraper",
    about = "Scrape UK community radio station registries into CSV files"
)]
struct Cli {
    /// Category to scrape (community, digital, small-scale, all).
    /// Starts the interactive menu when omitted.
    #[arg(short, long)]
    category: Option<String>,

    /// Output directory for CSV and error files. Blank or nonexistent paths
    /// fall back to the current directory.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    One(Category),
    All,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let client = fetch::build_client()?;
    let configs = registry::all();

    if let Some(raw) = cli.category.as_deref() {
        // Non-interactive run. An unrecognized category is a hard stop
        // before anything is fetched or written.
        let Some(selection) = parse_selection(raw) else {
            bail!("unknown category: {raw:?} (expected community, digital, small-scale or all)");
        };
        let out_dir = resolve_output_dir(cli.out.as_deref());
        run_selection(&client, &configs, selection, &out_dir);
        return Ok(());
    }

    menu_loop(&client, &configs, cli.out)
}

fn menu_loop(client: &Client, configs: &[CategoryConfig], preset_out: Option<PathBuf>) -> Result<()> {
    println!("Ofcom Station Registry Scraper");
    println!("==============================\n");

    let out_dir = match preset_out {
        Some(path) => resolve_output_dir(Some(&path)),
        None => prompt_output_dir()?,
    };
    println!("Writing outputs to {}\n", out_dir.display());

    loop {
        println!("1) Community stations");
        println!("2) Digital (SSDAB) service providers");
        println!("3) Small-scale stations");
        println!("4) All categories");
        println!("5) Quit");
        print!("Select an option: ");
        io::stdout().flush()?;

        let Some(line) = read_line()? else { break };
        let selection = match line.to_lowercase().as_str() {
            "1" | "community" => Selection::One(Category::Community),
            "2" | "digital" => Selection::One(Category::Digital),
            "3" | "small-scale" | "smallscale" => Selection::One(Category::SmallScale),
            "4" | "all" => Selection::All,
            "5" | "q" | "quit" => break,
            other => {
                println!("Unrecognised option: {other:?}\n");
                continue;
            }
        };

        run_selection(client, configs, selection, &out_dir);
        println!();
    }

    Ok(())
}

/// Process the selected categories strictly in sequence. A failed listing
/// fetch kills that category only; output write failures are reported and
/// the run moves on.
fn run_selection(
    client: &Client,
    configs: &[CategoryConfig],
    selection: Selection,
    out_dir: &Path,
) {
    for cfg in configs {
        if let Selection::One(category) = selection {
            if cfg.category != category {
                continue;
            }
        }

        let t0 = Instant::now();
        println!("Scraping {} stations...", cfg.category);
        let result = match pipeline::run_category(client, cfg) {
            Ok(result) => result,
            Err(e) => {
                error!("{} listing fetch failed: {}", cfg.category, e);
                continue;
            }
        };

        match output::write_outputs(cfg.category, &result.records, &result.notes, out_dir) {
            Ok((csv_path, _)) => println!(
                "{}: {} stations, {} errors in {:.1}s -> {}",
                cfg.category,
                result.records.len(),
                result.notes.len(),
                t0.elapsed().as_secs_f64(),
                csv_path.display()
            ),
            Err(e) => error!("{} output write failed: {:#}", cfg.category, e),
        }
    }
}

fn parse_selection(raw: &str) -> Option<Selection> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Some(Selection::All);
    }
    raw.parse::<Category>().ok().map(Selection::One)
}

/// Ask for the output directory once. Blank or nonexistent input falls back
/// to the directory the program runs from.
fn prompt_output_dir() -> Result<PathBuf> {
    print!("Output directory (blank for current): ");
    io::stdout().flush()?;
    let line = read_line()?.unwrap_or_default();
    Ok(resolve_output_dir(if line.is_empty() {
        None
    } else {
        Some(Path::new(&line))
    }))
}

fn resolve_output_dir(requested: Option<&Path>) -> PathBuf {
    let fallback = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match requested {
        Some(path) if path.is_dir() => path.to_path_buf(),
        Some(path) => {
            println!("{} does not exist, using current directory", path.display());
            fallback()
        }
        None => fallback(),
    }
}

/// One trimmed line from stdin; None on EOF.
fn read_line() -> Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
