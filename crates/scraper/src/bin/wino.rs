// ABOUTME: CLI binary for the wino wine-page scraper.
// ABOUTME: Scrapes URLs (or a saved HTML file) and prints the normalized wine records.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wino_scraper::{Client, HttpFetcher, WineRecord};
use wino_taxonomy::{Taxonomy, VarietalList};

#[derive(Parser, Debug)]
#[command(name = "wino")]
#[command(about = "Scrape wine pages into normalized wine records")]
struct Args {
    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output as JSON instead of a one-line summary per wine
    #[arg(long = "json")]
    json_output: bool,

    /// HTML file to parse (requires --url)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// URL context for HTML file parsing (required with --html)
    #[arg(long = "url")]
    url: Option<String>,

    /// Region taxonomy JSON file (default: builtin)
    #[arg(long = "taxonomy")]
    taxonomy: Option<PathBuf>,

    /// Varietal list JSON file (default: builtin)
    #[arg(long = "varietals")]
    varietals: Option<PathBuf>,

    /// Fetch with plain HTTP instead of a headless browser
    #[arg(long = "http")]
    http: bool,

    /// Fetch timeout in seconds
    #[arg(long = "timeout", default_value_t = 25)]
    timeout: u64,

    /// Skip the pauses between retry attempts
    #[arg(long = "no-delay")]
    no_delay: bool,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Wine page URLs to scrape
    #[arg()]
    urls: Vec<String>,
}

/// One scraped URL as reported by the CLI.
#[derive(Debug, Serialize)]
struct Output {
    url: Option<String>,
    record: WineRecord,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_client(args: &Args) -> anyhow::Result<Client> {
    let timeout = Duration::from_secs(args.timeout);
    let mut builder = Client::builder().timeout(timeout);

    if let Some(path) = &args.taxonomy {
        let taxonomy = Taxonomy::from_path(path).context("loading taxonomy")?;
        builder = builder.taxonomy(taxonomy);
    }
    if let Some(path) = &args.varietals {
        let varietals = VarietalList::from_path(path).context("loading varietals")?;
        builder = builder.varietals(varietals);
    }
    if args.http {
        builder = builder.fetcher(HttpFetcher::new(timeout));
    }
    if args.no_delay {
        builder = builder.no_delay();
    }
    Ok(builder.build())
}

fn summary_line(out: &Output) -> String {
    let r = &out.record;
    let vintage = r.vintage.map(|v| v.to_string()).unwrap_or_else(|| "NV".to_string());
    let mut line = format!(
        "{} {} | {} | {}",
        r.name,
        vintage,
        r.varietal,
        r.region_full.as_deref().unwrap_or(&r.country)
    );
    if let Some(rating) = r.rating {
        line.push_str(&format!(" | {:.1}", rating));
        if let Some(count) = r.rating_count {
            line.push_str(&format!(" ({} ratings)", count));
        }
    }
    if r.needs_review {
        line.push_str(" | needs review");
    }
    line
}

fn format_output(results: &[Output], json_output: bool) -> anyhow::Result<String> {
    if json_output {
        if results.len() == 1 {
            Ok(serde_json::to_string_pretty(&results[0])?)
        } else {
            Ok(serde_json::to_string_pretty(results)?)
        }
    } else {
        Ok(results.iter().map(summary_line).collect::<Vec<_>>().join("\n"))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.html.is_some() && args.url.is_none() {
        eprintln!("error: --url is required when using --html");
        return ExitCode::from(1);
    }

    if args.html.is_none() && args.urls.is_empty() {
        eprintln!("error: at least one URL is required, or use --html with --url");
        return ExitCode::from(1);
    }

    if args.html.is_some() && !args.urls.is_empty() {
        eprintln!("error: cannot use both --html and positional URLs");
        return ExitCode::from(1);
    }

    let client = match build_client(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    let start = Instant::now();
    let mut results: Vec<Output> = Vec::new();
    let mut had_error = false;

    if let (Some(html_path), Some(url)) = (&args.html, &args.url) {
        match fs::read_to_string(html_path) {
            Ok(html) => match client.scrape_html(&html, url) {
                Ok((record, url)) => results.push(Output {
                    url: Some(url),
                    record,
                }),
                Err(e) => {
                    eprintln!("error parsing HTML: {}", e);
                    had_error = true;
                }
            },
            Err(e) => {
                eprintln!("error reading file {:?}: {}", html_path, e);
                had_error = true;
            }
        }
    } else {
        for url in &args.urls {
            match client.scrape(url).await {
                (Some(record), canonical) => results.push(Output {
                    url: canonical,
                    record,
                }),
                (None, _) => {
                    eprintln!("error: could not scrape {}", url);
                    had_error = true;
                }
            }
        }
    }

    let elapsed = start.elapsed();

    if !results.is_empty() {
        match format_output(&results, args.json_output) {
            Ok(output_str) => {
                if let Some(output_path) = &args.output {
                    if let Err(e) = fs::write(output_path, &output_str) {
                        eprintln!("error writing to {:?}: {}", output_path, e);
                        had_error = true;
                    }
                } else {
                    println!("{}", output_str);
                }
            }
            Err(e) => {
                eprintln!("error formatting output: {}", e);
                had_error = true;
            }
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
