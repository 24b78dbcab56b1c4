use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cf_scraper::{CourseFinderClient, export};

#[derive(Debug, Parser)]
#[command(
	version = cf_cli::VERSION,
	rename_all = "kebab",
	styles = cf_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Overrides `scraper.output` from the config file.
	#[arg(long, short = 'o', value_name = "FILE")]
	pub output: Option<PathBuf>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = cf_config::load_scraper(&args.config)?;

	init_tracing(&config.scraper.log_level);

	let output = args.output.unwrap_or_else(|| config.scraper.output.clone());
	let client = CourseFinderClient::new(&config.scraper)?;
	let outcome = cf_scraper::scrape(&client, &config.targets).await;

	export::write_csv(&output, &outcome.records)?;

	tracing::info!(
		courses = outcome.records.len(),
		targets = config.targets.len(),
		output = %output.display(),
		"Scrape finished."
	);

	for name in &outcome.failed {
		tracing::warn!(target_name = %name, "Institute failed or had no courses.");
	}

	Ok(())
}

fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
