//! Durable, time-bounded memoization of blended search results.
//!
//! Entries are keyed by a digest of the normalized query parameters and
//! stored in the order the blender produced; lookups never re-sort. The
//! whole map is loaded from disk once at startup and rewritten on every
//! write, with a single async mutex guarding the map and its backing file
//! together. Concurrent misses for the same key may each compute and write;
//! the last writer wins.

use std::{collections::HashMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;

use sift_domain::ScoredResult;

use crate::{ServiceError, ServiceResult};

const SEARCH_CACHE_SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
	pub results: Vec<ScoredResult>,
	pub timestamp: i64,
}

pub struct ResultCache {
	enabled: bool,
	ttl_seconds: i64,
	path: PathBuf,
	entries: Mutex<HashMap<String, CacheEntry>>,
}
impl ResultCache {
	/// Loads the persisted cache wholesale. A missing file starts an empty
	/// cache; an unreadable one is logged and treated as empty rather than
	/// refusing to start.
	pub fn load(cfg: &sift_config::Cache) -> Self {
		let entries = if cfg.enabled {
			match std::fs::read(&cfg.path) {
				Ok(raw) => match serde_json::from_slice(&raw) {
					Ok(entries) => entries,
					Err(err) => {
						tracing::warn!(
							error = %err,
							path = %cfg.path.display(),
							"Cache file decode failed. Starting empty."
						);

						HashMap::new()
					},
				},
				Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
				Err(err) => {
					tracing::warn!(
						error = %err,
						path = %cfg.path.display(),
						"Cache file read failed. Starting empty."
					);

					HashMap::new()
				},
			}
		} else {
			HashMap::new()
		};

		Self {
			enabled: cfg.enabled,
			ttl_seconds: cfg.ttl_seconds,
			path: cfg.path.clone(),
			entries: Mutex::new(entries),
		}
	}

	/// Returns the stored results while the entry is younger than the TTL.
	/// An expired entry is evicted lazily and reported as absent.
	pub async fn get(&self, key: &str, now: OffsetDateTime) -> Option<Vec<ScoredResult>> {
		if !self.enabled {
			return None;
		}

		let mut entries = self.entries.lock().await;
		let entry = entries.get(key)?;

		if now.unix_timestamp() - entry.timestamp < self.ttl_seconds {
			return Some(entry.results.clone());
		}

		entries.remove(key);

		None
	}

	/// Stores results in their final order and re-persists the full cache.
	/// A failed write is logged, not surfaced; the in-memory entry stays
	/// usable for this process.
	pub async fn put(&self, key: &str, results: Vec<ScoredResult>, now: OffsetDateTime) {
		if !self.enabled {
			return;
		}

		let mut entries = self.entries.lock().await;

		entries.insert(key.to_string(), CacheEntry { results, timestamp: now.unix_timestamp() });

		if let Err(err) = self.persist(&entries).await {
			tracing::warn!(error = %err, path = %self.path.display(), "Cache persist failed.");
		}
	}

	async fn persist(&self, entries: &HashMap<String, CacheEntry>) -> std::io::Result<()> {
		let raw = serde_json::to_vec(entries)?;
		let tmp = self.path.with_extension("tmp");

		tokio::fs::write(&tmp, raw).await?;
		tokio::fs::rename(&tmp, &self.path).await?;

		Ok(())
	}
}

pub fn normalize_query(query: &str) -> String {
	query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

pub fn build_search_key(query: &str, top_k: u32, threshold: f32) -> ServiceResult<String> {
	let payload = serde_json::json!({
		"kind": "search",
		"schema_version": SEARCH_CACHE_SCHEMA_VERSION,
		"query": normalize_query(query),
		"top_k": top_k,
		"threshold": threshold,
	});
	let raw = serde_json::to_vec(&payload).map_err(|err| ServiceError::Storage {
		message: format!("Failed to encode cache key payload: {err}"),
	})?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

pub fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}
