use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use policing_intensity::census;
use policing_intensity::report::{self, ChartStyle, ReportInputs};
use policing_intensity::risk::{self, RiskReport};
use policing_intensity::{GeoFilter, Result, StudyConfig, aggregate_block_groups, load_arrests, tier};

/// Block-group policing-intensity analysis
#[derive(Debug, Parser)]
#[command(name = "policing-intensity", version, about)]
struct Cli {
    /// Path to the arrest dataset (parquet)
    #[arg(long, default_value = "data/census_mapped_anon_data.parquet")]
    arrests: PathBuf,

    /// Path to the census population cache (CSV); fetched from the ACS API
    /// when absent
    #[arg(long, default_value = "data/census_blockgroups.csv")]
    census_cache: PathBuf,

    /// Directory for output artifacts
    #[arg(long, default_value = "results")]
    out_dir: PathBuf,

    /// Optional JSON study configuration; defaults reproduce the
    /// Charleston/Berkeley study
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => StudyConfig::from_file(path)?,
        None => StudyConfig::default(),
    };
    config.validate()?;

    let start = Instant::now();

    // Load arrests and take the study-period date range before any filtering
    let arrests = load_arrests(&cli.arrests)?;
    let arrests_total = arrests.len();
    let full_date_range = risk::date_range(&arrests)?;
    info!(
        "Time period: {} to {}",
        full_date_range.0, full_date_range.1
    );

    // Restrict to the study counties
    let arrests = GeoFilter::new(&config).filter(arrests)?;
    let arrests_filtered = arrests.len();

    // Population reference: cache or census API
    let population = census::load_population(&cli.census_cache, &config).await?;

    // Aggregate, classify, compute risks
    let aggregates = aggregate_block_groups(&arrests, &population, &config)?;
    let classification = tier::classify(aggregates, &config)?;
    let risks = RiskReport::compute(&arrests, full_date_range, &classification, &config)?;

    // Emit artifacts only after every stage has succeeded
    let inputs = ReportInputs {
        config: &config,
        classification: &classification,
        risks: &risks,
        arrests_total,
        arrests_filtered,
    };
    report::write_artifacts(&cli.out_dir, &inputs, &ChartStyle::default())?;

    info!("Analysis complete in {:?}", start.elapsed());
    Ok(())
}
