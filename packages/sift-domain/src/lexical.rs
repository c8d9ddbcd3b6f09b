//! Request-local term-weighting model.
//!
//! The model is fitted on the candidate set of a single request and thrown
//! away with it: the vocabulary and inverse-document-frequency statistics
//! change with every candidate set, so scores are only meaningful within the
//! request that produced them.

use std::collections::{HashMap, HashSet};

use crate::cosine_similarity;

pub fn tokenize(text: &str) -> Vec<String> {
	let mut normalized = String::with_capacity(text.len());

	for ch in text.chars() {
		if ch.is_ascii_alphanumeric() {
			normalized.push(ch.to_ascii_lowercase());
		} else {
			normalized.push(' ');
		}
	}

	normalized
		.split_whitespace()
		.filter(|token| token.len() >= 2)
		.map(|token| token.to_string())
		.collect()
}

pub struct TfIdfModel {
	vocabulary: HashMap<String, usize>,
	idf: Vec<f32>,
}
impl TfIdfModel {
	/// Fits vocabulary and smoothed IDF statistics on the given documents
	/// only. `ln((1 + n) / (1 + df)) + 1`, so terms present in every
	/// document still carry weight 1 rather than vanishing.
	pub fn fit(documents: &[&str]) -> Self {
		let n_docs = documents.len();
		let mut vocabulary = HashMap::new();
		let mut document_frequency = Vec::new();

		for document in documents {
			let mut seen = HashSet::new();

			for token in tokenize(document) {
				let next_index = vocabulary.len();
				let index = *vocabulary.entry(token).or_insert(next_index);

				if index == document_frequency.len() {
					document_frequency.push(0_usize);
				}
				if seen.insert(index) {
					document_frequency[index] += 1;
				}
			}
		}

		let idf = document_frequency
			.iter()
			.map(|df| ((1.0 + n_docs as f32) / (1.0 + *df as f32)).ln() + 1.0)
			.collect();

		Self { vocabulary, idf }
	}

	/// Projects arbitrary text onto the fitted vocabulary as an
	/// L2-normalized TF-IDF vector. Terms outside the vocabulary are
	/// ignored, matching transform-after-fit semantics.
	pub fn vector(&self, text: &str) -> Vec<f32> {
		let mut out = vec![0.0_f32; self.vocabulary.len()];

		for token in tokenize(text) {
			if let Some(index) = self.vocabulary.get(&token) {
				out[*index] += 1.0;
			}
		}

		for (index, weight) in out.iter_mut().enumerate() {
			*weight *= self.idf[index];
		}

		let norm = out.iter().map(|weight| weight * weight).sum::<f32>().sqrt();

		if norm > f32::EPSILON {
			for weight in &mut out {
				*weight /= norm;
			}
		}

		out
	}
}

/// Scores each candidate against the query by cosine similarity of TF-IDF
/// vectors over a model fitted on exactly these candidates. Candidates with
/// no overlapping terms score 0.
pub fn score_candidates(query: &str, candidates: &[(i64, &str)]) -> HashMap<i64, f32> {
	let contents: Vec<&str> = candidates.iter().map(|(_, content)| *content).collect();
	let model = TfIdfModel::fit(&contents);
	let query_vector = model.vector(query);
	let mut out = HashMap::with_capacity(candidates.len());

	for (document_id, content) in candidates {
		let candidate_vector = model.vector(content);
		let score = cosine_similarity(&query_vector, &candidate_vector).unwrap_or(0.0);

		out.insert(*document_id, score);
	}

	out
}
