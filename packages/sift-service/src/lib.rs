pub mod cache;
pub mod quota;
pub mod retrieval;
pub mod scoring;
pub mod search;

use std::{future::Future, pin::Pin, sync::Arc};

pub use cache::{CacheEntry, ResultCache};
pub use quota::{Admission, QuotaGuard};
pub use search::SearchRequest;

use sift_config::{Config, EmbeddingProviderConfig};
use sift_storage::db::Db;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_providers::Result<Vec<Vec<f32>>>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	QuotaDenied,
	Storage { message: String },
	Scoring { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

/// The query pipeline. Owns the ordering of admission, cache lookup,
/// retrieval, scoring, blending, and cache store; every collaborator is
/// injected so tests can substitute fakes.
pub struct SearchService {
	pub cfg: Config,
	pub db: Db,
	pub quota: QuotaGuard,
	pub cache: ResultCache,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::QuotaDenied => write!(f, "Rate limit exceeded."),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
			Self::Scoring { message } => write!(f, "Scoring error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<sift_storage::Error> for ServiceError {
	fn from(err: sift_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<sift_providers::Error> for ServiceError {
	fn from(err: sift_providers::Error) -> Self {
		Self::Scoring { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(sift_providers::embedding::embed(cfg, texts))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

impl SearchService {
	pub fn new(cfg: Config, db: Db, cache: ResultCache) -> Self {
		let quota = QuotaGuard::new(db.pool.clone(), &cfg.quota);

		Self { cfg, db, quota, cache, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, cache: ResultCache, providers: Providers) -> Self {
		let quota = QuotaGuard::new(db.pool.clone(), &cfg.quota);

		Self { cfg, db, quota, cache, providers }
	}
}
