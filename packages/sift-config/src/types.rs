use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub provider: Provider,
	pub quota: Quota,
	pub search: Search,
	pub cache: Cache,
	pub ingest: Ingest,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Provider {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Quota {
	pub window_seconds: i64,
	pub max_requests: i64,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_top_k")]
	pub default_top_k: u32,
	#[serde(default = "default_threshold")]
	pub default_threshold: f32,
	/// Disabling drops the embedding scorer and ranks on lexical scores alone.
	#[serde(default = "default_semantic")]
	pub semantic: bool,
	pub retrieval_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
	pub enabled: bool,
	pub path: PathBuf,
	#[serde(default = "default_cache_ttl_seconds")]
	pub ttl_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct Ingest {
	pub sources: Vec<String>,
	pub poll_interval_seconds: u64,
	pub request_timeout_ms: u64,
}

fn default_top_k() -> u32 {
	10
}

fn default_threshold() -> f32 {
	0.5
}

fn default_semantic() -> bool {
	true
}

fn default_cache_ttl_seconds() -> i64 {
	3_600
}
