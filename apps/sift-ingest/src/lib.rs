pub mod worker;

mod error;

pub use error::{Error, Result};

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
	version = sift_cli::VERSION,
	rename_all = "kebab",
	styles = sift_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sift_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = sift_storage::db::Db::connect(&config.storage.postgres).await?;
	db.ensure_schema().await?;

	let state = worker::WorkerState { db, ingest: config.ingest };

	worker::run_worker(state).await?;

	Ok(())
}
