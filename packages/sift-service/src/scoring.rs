use std::collections::HashMap;

use sift_config::EmbeddingProviderConfig;
use sift_domain::cosine_similarity;
use sift_storage::models::DocumentRow;

use crate::{Providers, ServiceError, ServiceResult};

/// Scores each candidate against the query by cosine similarity of
/// embedding vectors. Query and candidates are encoded in one batched
/// provider call; the provider's own timeout bounds the request.
pub async fn semantic_scores(
	providers: &Providers,
	cfg: &EmbeddingProviderConfig,
	query: &str,
	candidates: &[DocumentRow],
) -> ServiceResult<HashMap<i64, f32>> {
	if candidates.is_empty() {
		return Ok(HashMap::new());
	}

	let mut inputs = Vec::with_capacity(candidates.len() + 1);

	inputs.push(query.to_string());
	inputs.extend(candidates.iter().map(|candidate| candidate.content.clone()));

	let vectors = providers.embedding.embed(cfg, &inputs).await?;

	if vectors.len() != inputs.len() {
		return Err(ServiceError::Scoring {
			message: format!(
				"Embedding provider returned {} vectors for {} inputs.",
				vectors.len(),
				inputs.len()
			),
		});
	}

	for vector in &vectors {
		if vector.len() != cfg.dimensions as usize {
			return Err(ServiceError::Scoring {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}
	}

	let query_vector = &vectors[0];
	let mut out = HashMap::with_capacity(candidates.len());

	for (candidate, vector) in candidates.iter().zip(&vectors[1..]) {
		let score = cosine_similarity(query_vector, vector).unwrap_or(0.0);

		out.insert(candidate.id, score);
	}

	Ok(out)
}
