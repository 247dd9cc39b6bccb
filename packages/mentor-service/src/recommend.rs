use mentor_storage::models::CandidateRow;

use crate::{MentorService, ServiceError, ServiceResult, diversity, query_text, recency};

/// Ceiling on requested result counts; `k` and the MMR pass both scale with
/// `top_n`, so an unbounded request would turn into an unbounded amount of
/// per-request CPU.
const MAX_TOP_N: u32 = 50;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecommendRequest {
	pub student_id: i64,
	pub profile_label: String,
	#[serde(default)]
	pub difficulties: Vec<String>,
	pub top_n: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecommendationItem {
	pub resource_id: i64,
	pub title: String,
	pub description: String,
	pub difficulty_level: String,
	pub url: String,
	pub score: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecommendResponse {
	pub student_id: i64,
	pub recommendations: Vec<RecommendationItem>,
}

/// One hydrated raw candidate, in retrieval-rank order.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
	pub(crate) resource_id: i64,
	pub(crate) title: String,
	pub(crate) description: String,
	pub(crate) difficulty_level: String,
	pub(crate) url: String,
	pub(crate) similarity: f32,
	pub(crate) embedding: Vec<f32>,
}

impl MentorService {
	/// The one public recommendation entry point: embed a synthetic query,
	/// over-fetch raw candidates, re-rank with MMR, drop recently engaged
	/// resources, log what was served, return the top `n`.
	pub async fn recommend(&self, req: RecommendRequest) -> ServiceResult<RecommendResponse> {
		let top_n = effective_top_n(req.top_n, self.cfg.retrieval.default_top_n)?;
		let query = query_text(&req.profile_label, &req.difficulties);
		// Embed before touching the index so a slow provider never holds up
		// concurrent searches.
		let query_vec = self.embed_one(&query).await?;
		// One generation for the whole request: the slot numbers a search
		// returns are only meaningful against the index that produced them.
		let index = self.ensure_index().await?;
		let retrieval = &self.cfg.retrieval;
		let k = (retrieval.min_candidates as usize).max(retrieval.per_item_factor as usize * top_n);
		let hits = index.search(&query_vec, k)?;

		if hits.is_empty() {
			return Ok(RecommendResponse { student_id: req.student_id, recommendations: Vec::new() });
		}

		let slots: Vec<usize> = hits.iter().map(|hit| hit.slot).collect();
		let resource_ids = index.resource_ids(&slots)?;
		let ranked: Vec<(i64, f32)> = resource_ids
			.iter()
			.copied()
			.zip(hits.iter().map(|hit| hit.similarity))
			.collect();
		let rows = self
			.store
			.fetch_candidates(&resource_ids, &self.cfg.providers.embedding.model)
			.await?;
		let candidates = align_candidates(&ranked, rows);

		if candidates.is_empty() {
			return Ok(RecommendResponse { student_id: req.student_id, recommendations: Vec::new() });
		}

		// Order the whole candidate set so the recency pass can skip
		// exclusions without running short.
		let vectors: Vec<Vec<f32>> =
			candidates.iter().map(|candidate| candidate.embedding.clone()).collect();
		let picks = diversity::apply_mmr(
			&vectors,
			&query_vec,
			self.cfg.ranking.mmr_lambda,
			candidates.len(),
		);
		let candidate_ids: Vec<i64> =
			candidates.iter().map(|candidate| candidate.resource_id).collect();
		let excluded = self.excluded_set(req.student_id, &candidate_ids).await?;
		let kept = recency::filter_picks(
			&picks,
			|pick| candidates[pick].resource_id,
			&excluded,
			top_n,
		);
		let items: Vec<RecommendationItem> = kept
			.into_iter()
			.map(|pick| {
				let candidate = &candidates[pick];

				RecommendationItem {
					resource_id: candidate.resource_id,
					title: candidate.title.clone(),
					description: candidate.description.clone(),
					difficulty_level: candidate.difficulty_level.clone(),
					url: candidate.url.clone(),
					score: candidate.similarity,
				}
			})
			.collect();

		self.log_served(req.student_id, &req.profile_label, &req.difficulties, &items).await;

		Ok(RecommendResponse { student_id: req.student_id, recommendations: items })
	}

	/// Append one audit row per served item. Best-effort: a write failure is
	/// an operator problem, not a reason to withhold the recommendations.
	async fn log_served(
		&self,
		student_id: i64,
		profile_label: &str,
		difficulties: &[String],
		items: &[RecommendationItem],
	) {
		let context = serde_json::json!({
			"profile": profile_label,
			"difficulties": difficulties,
		});

		for item in items {
			if let Err(err) = self
				.store
				.insert_recommendation(student_id, item.resource_id, item.score, &context)
				.await
			{
				tracing::warn!(
					student_id,
					resource_id = item.resource_id,
					%err,
					"Failed to log a served recommendation.",
				);
			}
		}
	}
}

/// Zero is a caller error; oversized requests clamp to the ceiling instead
/// of erroring, matching how search treats its limit.
pub(crate) fn effective_top_n(requested: Option<u32>, default_top_n: u32) -> ServiceResult<usize> {
	let top_n = requested.unwrap_or(default_top_n);

	if top_n == 0 {
		return Err(ServiceError::InvalidRequest {
			message: "top_n must be greater than zero".to_string(),
		});
	}

	Ok(top_n.min(MAX_TOP_N) as usize)
}

/// Re-align hydration rows to retrieval rank and attach similarities.
/// Ids the store could no longer hydrate are dropped: a resource present in
/// the index but gone from the catalog is an eventual-consistency condition,
/// not an error.
pub(crate) fn align_candidates(ranked: &[(i64, f32)], rows: Vec<CandidateRow>) -> Vec<Candidate> {
	let mut by_id: std::collections::HashMap<i64, CandidateRow> =
		rows.into_iter().map(|row| (row.resource_id, row)).collect();
	let mut candidates = Vec::with_capacity(ranked.len());

	for &(resource_id, similarity) in ranked {
		let Some(row) = by_id.remove(&resource_id) else {
			tracing::debug!(resource_id, "Dropping candidate with no hydration row.");

			continue;
		};
		let embedding = match mentor_storage::parse_pg_vector(&row.vec_text) {
			Ok(embedding) => embedding,
			Err(err) => {
				tracing::debug!(resource_id, %err, "Dropping candidate with unreadable embedding.");

				continue;
			},
		};

		candidates.push(Candidate {
			resource_id,
			title: row.title,
			description: row.description,
			difficulty_level: row.difficulty_level,
			url: row.url,
			similarity,
			embedding,
		});
	}

	candidates
}
