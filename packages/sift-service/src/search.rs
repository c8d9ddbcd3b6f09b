use std::time::Instant;

use time::OffsetDateTime;

use sift_domain::{ScoredResult, lexical, rank};

use crate::{Admission, SearchService, ServiceError, ServiceResult, cache, retrieval, scoring};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub caller_id: String,
	pub query: String,
	pub top_k: Option<u32>,
	pub threshold: Option<f32>,
}

impl SearchService {
	/// Runs one query through the pipeline: admission, cache lookup,
	/// retrieval, scoring, blending, cache store. Validation happens before
	/// any side effect, so a malformed request consumes no quota and
	/// touches no cache.
	pub async fn search(&self, req: SearchRequest) -> ServiceResult<Vec<ScoredResult>> {
		let started = Instant::now();
		let caller_id = req.caller_id.trim().to_string();
		let query = req.query.trim().to_string();
		let result = self.search_inner(&caller_id, &query, req.top_k, req.threshold).await;

		match &result {
			Ok(results) => {
				tracing::info!(
					%caller_id,
					%query,
					result_count = results.len(),
					elapsed_ms = started.elapsed().as_millis() as u64,
					"Search completed."
				);
			},
			Err(err @ (ServiceError::Storage { .. } | ServiceError::Scoring { .. })) => {
				tracing::error!(error = %err, %caller_id, %query, "Search failed.");
			},
			Err(_) => {},
		}

		result
	}

	async fn search_inner(
		&self,
		caller_id: &str,
		query: &str,
		top_k: Option<u32>,
		threshold: Option<f32>,
	) -> ServiceResult<Vec<ScoredResult>> {
		if caller_id.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Missing user_id header.".to_string(),
			});
		}
		if query.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Missing 'text' parameter in query string.".to_string(),
			});
		}

		let top_k = top_k.unwrap_or(self.cfg.search.default_top_k).max(1);
		// Accepted and keyed on, but never used to filter results.
		let threshold = threshold.unwrap_or(self.cfg.search.default_threshold);

		if self.quota.admit(caller_id).await == Admission::Denied {
			return Err(ServiceError::QuotaDenied);
		}

		let now = OffsetDateTime::now_utc();
		let key = cache::build_search_key(query, top_k, threshold)?;

		if let Some(results) = self.cache.get(&key, now).await {
			tracing::info!(
				cache_key_prefix = cache::cache_key_prefix(&key),
				hit = true,
				"Cache hit."
			);

			return Ok(results);
		}

		tracing::info!(cache_key_prefix = cache::cache_key_prefix(&key), hit = false, "Cache miss.");

		let candidates =
			retrieval::retrieve(&self.db, query, self.cfg.search.retrieval_timeout_ms).await?;
		let order: Vec<i64> = candidates.iter().map(|candidate| candidate.id).collect();
		let pairs: Vec<(i64, &str)> = candidates
			.iter()
			.map(|candidate| (candidate.id, candidate.content.as_str()))
			.collect();
		let lexical_scores = lexical::score_candidates(query, &pairs);
		let semantic_scores = if self.cfg.search.semantic {
			Some(
				scoring::semantic_scores(
					&self.providers,
					&self.cfg.provider.embedding,
					query,
					&candidates,
				)
				.await?,
			)
		} else {
			None
		};
		let results =
			rank::blend(&lexical_scores, semantic_scores.as_ref(), &order, top_k as usize);

		self.cache.put(&key, results.clone(), now).await;

		Ok(results)
	}
}
