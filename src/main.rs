//! rankwatch - Domain popularity rank history
//!
//! Prints the cached rank series for each requested domain, refreshing stale
//! domains from the ranking provider first.

use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rankwatch::cache::FileStore;
use rankwatch::cli::{Cli, OutputFormat, StartupConfig};
use rankwatch::data::TrancoClient;
use rankwatch::ranking::RankingService;
use rankwatch::sparkline::render_report;

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rankwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let startup = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    if startup.ranking.provider_base_url.is_none() {
        warn!("TRANCO_API_BASE_URL is not set; only cached domains can be served");
    }

    let store = match startup.cache_dir {
        Some(dir) => FileStore::with_dir(dir),
        None => FileStore::new().ok_or("could not determine a cache directory; pass --cache-dir")?,
    };
    let provider = TrancoClient::new(&startup.ranking)?;
    let service = RankingService::new(startup.ranking, Arc::new(provider), Arc::new(store));

    let reports = service.get_ranking(&startup.domains).await;

    match startup.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Sparkline { width } => {
            for report in reports.values() {
                println!("{}", render_report(report, width));
            }
        }
    }

    Ok(())
}
