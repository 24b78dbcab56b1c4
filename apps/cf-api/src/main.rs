use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = cf_api::Args::parse();

	cf_api::run(args).await
}
