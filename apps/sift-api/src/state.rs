use std::sync::Arc;

use sift_service::{ResultCache, SearchService};
use sift_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SearchService>,
}
impl AppState {
	pub async fn new(config: sift_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let cache = ResultCache::load(&config.cache);
		let service = SearchService::new(config, db, cache);

		Ok(Self { service: Arc::new(service) })
	}
}
