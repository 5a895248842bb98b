use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use itinerary_studio::{AppConfig, CostInputs, ImageCompressor, PricingReconciler, TravelWindow};

#[derive(Debug, Parser)]
#[command(name = "itinerary-studio")]
#[command(about = "Costing, schedule and image tools for branded travel itineraries")]
struct Args {
    /// JSON configuration file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scale and re-encode an image as JPEG within a byte budget
    Compress {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        max_height: Option<u32>,
        #[arg(long)]
        target_bytes: Option<usize>,
    },
    /// Reconcile the costing record of an itinerary pricing JSON document
    Reconcile {
        /// Pricing JSON file, `-` for stdin
        input: PathBuf,
    },
    /// Print duration and travel dates for a departure and return date (YYYY-MM-DD)
    Schedule { start: String, end: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    match args.command {
        Command::Compress {
            input,
            output,
            max_width,
            max_height,
            target_bytes,
        } => {
            let compressor = ImageCompressor::new(config.compression.clone())?;
            let source = tokio::fs::read(&input)
                .await
                .with_context(|| format!("failed to read {}", input.display()))?;

            let mut request = compressor.request(source);
            request.max_width = max_width.unwrap_or(request.max_width);
            request.max_height = max_height.unwrap_or(request.max_height);
            request.target_bytes = target_bytes.unwrap_or(request.target_bytes);

            let result = compressor.compress_async(request).await?;
            tokio::fs::write(&output, &result.bytes)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;

            tracing::info!(
                width = result.width,
                height = result.height,
                quality = result.quality,
                size = result.size(),
                within_budget = result.within_budget,
                output = %output.display(),
                "image compressed"
            );
        }
        Command::Reconcile { input } => {
            let raw = if input.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
            } else {
                tokio::fs::read_to_string(&input)
                    .await
                    .with_context(|| format!("failed to read {}", input.display()))?
            };

            let mut pricing: CostInputs =
                serde_json::from_str(&raw).context("pricing document is not valid JSON")?;
            let outcome = PricingReconciler::new(config.pricing.clone()).reconcile(&mut pricing);
            tracing::info!(updated = outcome.is_updated(), "costing reconciled");

            println!("{}", serde_json::to_string_pretty(&pricing)?);
        }
        Command::Schedule { start, end } => {
            let window = TravelWindow::parse(&start, &end).context("dates must be YYYY-MM-DD")?;
            println!("{}", window.duration());
            println!("{}", window.travel_dates());
        }
    }

    Ok(())
}
