//! Command-line entry point for the Chilito Finder.

mod config;

use anyhow::{Context, Result};
use chilito_finder::{
    Fetcher, FetcherExt, Finder, FinderConfig, HttpFetcher, OverrideTable, SearchOutcome,
    VerificationResult,
};
use clap::Parser;
use colored::Colorize;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;

#[derive(Parser)]
#[command(name = "chilito")]
#[command(about = "Find the nearest Taco Bell that still serves the Chili Cheese Burrito")]
struct Cli {
    /// Street address, place name, or "lat,lng"
    #[arg(short, long)]
    address: String,

    /// Search radius in meters
    #[arg(short, long, default_value_t = 100_000)]
    radius: u32,

    /// Debug logging for the finder
    #[arg(short, long)]
    verbose: bool,

    /// How many of the nearest locations to check
    #[arg(long, default_value_t = 5)]
    max_candidates: usize,

    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// JSON override table (defaults to the builtin one)
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Cap outgoing requests per second
    #[arg(long)]
    rps: Option<NonZeroU32>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,chilito_finder=debug"
    } else {
        "info,chilito_finder=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let env = Config::from_env().context("Failed to load configuration")?;
    let config = env.finder_config(FinderConfig::default().with_max_candidates(cli.max_candidates));

    let overrides = match &cli.overrides {
        Some(path) => OverrideTable::from_path(path)
            .with_context(|| format!("Failed to load override table {}", path.display()))?,
        None => OverrideTable::builtin(),
    };

    let http = HttpFetcher::with_timeout(config.request_timeout())
        .context("Failed to build HTTP client")?;
    let fetcher: Arc<dyn Fetcher> = match cli.rps {
        Some(rps) => Arc::new(http.rate_limited(rps)),
        None => Arc::new(http),
    };

    let finder = Finder::new(fetcher, config)
        .context("Invalid finder configuration")?
        .with_overrides(overrides);

    let started = Instant::now();
    let outcome = match cli.timeout {
        Some(secs) => {
            finder
                .search_with_timeout(&cli.address, cli.radius, Duration::from_secs(secs))
                .await
        }
        None => finder.search(&cli.address, cli.radius).await,
    };
    let elapsed = started.elapsed();
    info!(elapsed_ms = elapsed.as_millis() as u64, found = outcome.found, "Search finished");

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
        );
    } else {
        print_outcome(&outcome);
        println!();
        println!(
            "{}",
            format!("Search completed in {}", format_elapsed(elapsed)).dimmed()
        );
    }

    if outcome.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_outcome(outcome: &SearchOutcome) {
    if let Some(origin) = &outcome.origin {
        println!("{} {}", "Searching from:".bright_blue(), origin);
    }

    for attempt in &outcome.attempts {
        let mark = match attempt.result {
            VerificationResult::Found => "✓".bright_green(),
            VerificationResult::NotFound => "✗".bright_red(),
            VerificationResult::Inconclusive => "?".bright_yellow(),
        };
        println!(
            "  {} {} ({:.1} km) [{}]",
            mark, attempt.record.display_name, attempt.record.distance_km, attempt.identifier
        );
    }
    println!();

    match &outcome.location {
        Some(location) => {
            println!("{}", "🌯 Chili Cheese Burrito found!".bright_green().bold());
            println!("  {} {}", "Location:".bright_yellow(), location.display_name);
            println!("  {} {}", "Address:".bright_yellow(), location.address);
            println!(
                "  {} {:.1} km",
                "Distance:".bright_yellow(),
                location.distance_km
            );
            if let Some(phone) = &location.phone {
                println!("  {} {}", "Phone:".bright_yellow(), phone);
            }
        }
        None => {
            let message = outcome.message.as_deref().unwrap_or("No result");
            if outcome.is_error() {
                println!("{} {}", "❌".bright_red(), message.bright_red());
            } else {
                println!("{}", message.dimmed());
            }
        }
    }
}

/// Rounded to the nearest second, e.g. "7s" or "1m5s".
fn format_elapsed(elapsed: Duration) -> String {
    let secs = (elapsed.as_millis() + 500) / 1000;
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m{}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_rounds_to_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "0s");
        assert_eq!(format_elapsed(Duration::from_millis(7_499)), "7s");
        assert_eq!(format_elapsed(Duration::from_millis(7_500)), "8s");
        assert_eq!(format_elapsed(Duration::from_secs(65)), "1m5s");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["chilito", "--address", "39.1,-89.6", "--rps", "2", "--json"]);
        assert_eq!(cli.address, "39.1,-89.6");
        assert_eq!(cli.radius, 100_000);
        assert_eq!(cli.max_candidates, 5);
        assert_eq!(cli.rps.map(|r| r.get()), Some(2));
        assert!(cli.json);
        assert!(cli.timeout.is_none());
    }
}
