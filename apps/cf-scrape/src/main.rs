use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = cf_scrape::Args::parse();

	cf_scrape::run(args).await
}
