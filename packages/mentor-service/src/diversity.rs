//! Maximal Marginal Relevance selection.
//!
//! Plain top-k similarity tends to return near-duplicates of the best match;
//! MMR trades a controlled amount of relevance for coverage. `lambda` = 1.0
//! is pure relevance, 0.0 pure diversity.

/// 0.0 when either operand has zero norm.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> f32 {
	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	let denom = lhs_norm.sqrt() * rhs_norm.sqrt();

	if denom == 0.0 {
		return 0.0;
	}

	dot / denom
}

/// Greedy MMR over candidate vectors, returning selected indices in
/// selection order (which is the presentation order).
///
/// The first pick is the candidate most similar to the query. Each later
/// round scores every unpicked candidate as
/// `lambda * sim(i, query) - (1 - lambda) * max_j sim(i, picked_j)`,
/// recomputing the max against the picked set as it grows. Ties keep the
/// candidate with the earlier retrieval rank, so selection is deterministic.
pub fn apply_mmr(
	candidates: &[Vec<f32>],
	query: &[f32],
	lambda: f32,
	top_n: usize,
) -> Vec<usize> {
	let mut selected: Vec<usize> = Vec::new();
	let mut remaining: Vec<usize> = (0..candidates.len()).collect();

	while selected.len() < top_n && !remaining.is_empty() {
		let scored = |&i: &usize| -> f32 {
			if selected.is_empty() {
				return cosine_similarity(&candidates[i], query);
			}

			let relevance = cosine_similarity(&candidates[i], query);
			let max_similarity = selected
				.iter()
				.map(|&j| cosine_similarity(&candidates[i], &candidates[j]))
				.fold(f32::NEG_INFINITY, f32::max);

			lambda * relevance - (1.0 - lambda) * max_similarity
		};
		let mut best_pos = 0;
		let mut best_score = scored(&remaining[0]);

		for (pos, index) in remaining.iter().enumerate().skip(1) {
			let score = scored(index);

			// Strict comparison keeps the earlier retrieval rank on ties.
			if score > best_score {
				best_pos = pos;
				best_score = score;
			}
		}

		selected.push(remaining.remove(best_pos));
	}

	selected
}
