use std::collections::HashMap;

use crate::ScoredResult;

/// Merges lexical and semantic scores into a final ranking.
///
/// With both score maps present the combined score is the arithmetic mean of
/// the two components; without a semantic map the lexical score stands
/// alone. `order` is the retrieval order of the candidate set and breaks
/// ties: the sort is stable, so candidates with equal combined scores keep
/// their retrieval order. The result is truncated to `top_k`.
pub fn blend(
	lexical: &HashMap<i64, f32>,
	semantic: Option<&HashMap<i64, f32>>,
	order: &[i64],
	top_k: usize,
) -> Vec<ScoredResult> {
	let mut out: Vec<ScoredResult> = order
		.iter()
		.map(|document_id| {
			let lexical_score = lexical.get(document_id).copied().unwrap_or(0.0);
			let score = match semantic {
				Some(semantic) => {
					let semantic_score = semantic.get(document_id).copied().unwrap_or(0.0);

					(lexical_score + semantic_score) / 2.0
				},
				None => lexical_score,
			};

			ScoredResult { document_id: *document_id, score }
		})
		.collect();

	out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
	out.truncate(top_k);

	out
}
