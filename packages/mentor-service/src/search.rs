use std::collections::HashMap;

use mentor_storage::models::Resource;

use crate::{MentorService, ServiceError, ServiceResult};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub q: String,
	pub limit: Option<u32>,
}

/// Which stage of the search strategy produced the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
	Semantic,
	Keyword,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchResponse {
	pub mode: SearchMode,
	pub results: Vec<Resource>,
}

impl MentorService {
	/// Two-stage search with a fixed precedence: semantic first, keyword
	/// ILIKE only when the semantic stage is unavailable (embedding provider
	/// down or no index). Any other failure propagates; a degraded answer is
	/// only acceptable for the two outage conditions.
	pub async fn search(&self, req: SearchRequest) -> ServiceResult<SearchResponse> {
		let query = req.q.trim();

		if query.chars().count() < 2 {
			return Err(ServiceError::InvalidRequest {
				message: "query must be at least 2 characters".to_string(),
			});
		}

		let limit = req.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;

		match self.semantic_search(query, limit).await {
			Ok(results) => Ok(SearchResponse { mode: SearchMode::Semantic, results }),
			Err(
				err @ (ServiceError::EmbeddingUnavailable { .. } | ServiceError::IndexNotReady),
			) => {
				tracing::warn!(%err, "Semantic search unavailable; falling back to keyword match.");

				let results = self.store.keyword_search(query, limit as i64).await?;

				Ok(SearchResponse { mode: SearchMode::Keyword, results })
			},
			Err(err) => Err(err),
		}
	}

	async fn semantic_search(&self, query: &str, limit: usize) -> ServiceResult<Vec<Resource>> {
		let query_vec = self.embed_one(query).await?;
		// Pin one generation for both the search and the slot mapping.
		let index = self.ensure_index().await?;
		let hits = index.search(&query_vec, limit)?;
		let slots: Vec<usize> = hits.iter().map(|hit| hit.slot).collect();
		let resource_ids = index.resource_ids(&slots)?;
		let rows = self.store.fetch_resources_by_ids(&resource_ids).await?;
		let mut by_id: HashMap<i64, Resource> =
			rows.into_iter().map(|resource| (resource.id, resource)).collect();

		// Emit in retrieval order; ids gone from the catalog drop out.
		Ok(resource_ids.iter().filter_map(|id| by_id.remove(id)).collect())
	}
}
