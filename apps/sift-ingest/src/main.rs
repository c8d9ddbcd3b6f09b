use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = sift_ingest::Args::parse();
	sift_ingest::run(args).await
}
