use mentor_config::EmbeddingProviderConfig;
use mentor_index::VectorIndex;

use crate::{EmbeddingProvider, MentorService, ServiceError, ServiceResult, embedding_text};

/// Resources are embedded in batches; a failing batch retries item by item
/// so one bad resource costs one failure, not thirty-two.
const EMBED_BATCH: usize = 32;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ReindexReport {
	pub indexed: u64,
	pub embed_failures: u64,
	pub upsert_failures: u64,
}

impl MentorService {
	/// Bulk maintenance: re-embed the whole catalog, upsert the embedding
	/// store, then build and atomically publish a fresh index. Individual
	/// embed/upsert failures are counted, not fatal; only an index build
	/// failure aborts, leaving the prior index live.
	pub async fn reindex_all(&self) -> ServiceResult<ReindexReport> {
		let resources = self.store.fetch_resources().await?;

		if resources.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "no resources to index".to_string(),
			});
		}

		let entries: Vec<(i64, String)> = resources
			.iter()
			.map(|resource| {
				(
					resource.id,
					embedding_text(&resource.title, &resource.description, &resource.tag_list()),
				)
			})
			.collect();
		let (resource_ids, vectors, embed_failures) = embed_catalog(
			self.providers.embedding.as_ref(),
			&self.cfg.providers.embedding,
			&entries,
		)
		.await;

		if resource_ids.is_empty() {
			return Err(ServiceError::EmbeddingUnavailable {
				message: format!("all {} embedding calls failed", entries.len()),
			});
		}

		let model = self.cfg.providers.embedding.model.as_str();
		let mut upsert_failures = 0_u64;

		for (resource_id, vector) in resource_ids.iter().zip(vectors.iter()) {
			if let Err(err) = self.store.upsert_embedding(*resource_id, vector, model).await {
				upsert_failures += 1;

				tracing::warn!(resource_id, %err, "Failed to upsert an embedding.");
			}
		}

		let indexed = resource_ids.len() as u64;
		let index = VectorIndex::build(vectors, resource_ids)?;
		// Snapshot the generation this report describes, not whatever a
		// racing publish may have installed since.
		let published = self.index.publish(index);

		tracing::info!(indexed, embed_failures, upsert_failures, "Rebuilt the vector index.");

		let path = std::path::Path::new(&self.cfg.index.snapshot_path);

		if let Err(err) = published.save(path) {
			// The snapshot only buys a warm restart; the store can always
			// rebuild it.
			tracing::warn!(path = %path.display(), %err, "Failed to persist the index snapshot.");
		}

		Ok(ReindexReport { indexed, embed_failures, upsert_failures })
	}
}

/// Embed the catalog texts, returning aligned (resource id, vector) pairs
/// for every success plus the failure count. Vectors of the wrong width
/// count as failures; order follows the input regardless of batching.
pub(crate) async fn embed_catalog(
	provider: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
	entries: &[(i64, String)],
) -> (Vec<i64>, Vec<Vec<f32>>, u64) {
	let dim = cfg.dimensions as usize;
	let mut resource_ids = Vec::with_capacity(entries.len());
	let mut vectors = Vec::with_capacity(entries.len());
	let mut failures = 0_u64;

	for chunk in entries.chunks(EMBED_BATCH) {
		let texts: Vec<String> = chunk.iter().map(|(_, text)| text.clone()).collect();
		let batch = match provider.embed(cfg, &texts).await {
			Ok(batch) if batch.len() == chunk.len() => Some(batch),
			Ok(batch) => {
				tracing::warn!(
					expected = chunk.len(),
					got = batch.len(),
					"Embedding batch returned a mismatched count; retrying item by item.",
				);

				None
			},
			Err(err) => {
				tracing::warn!(%err, "Embedding batch failed; retrying item by item.");

				None
			},
		};

		match batch {
			Some(batch) =>
				for ((resource_id, _), vector) in chunk.iter().zip(batch) {
					if vector.len() == dim {
						resource_ids.push(*resource_id);
						vectors.push(vector);
					} else {
						failures += 1;

						tracing::warn!(
							resource_id,
							width = vector.len(),
							"Skipping embedding with the wrong dimension.",
						);
					}
				},
			None =>
				for (resource_id, text) in chunk {
					match provider.embed(cfg, std::slice::from_ref(text)).await {
						Ok(mut single) if single.len() == 1 && single[0].len() == dim => {
							resource_ids.push(*resource_id);
							vectors.push(single.remove(0));
						},
						Ok(_) => {
							failures += 1;

							tracing::warn!(resource_id, "Embedding call returned a malformed vector.");
						},
						Err(err) => {
							failures += 1;

							tracing::warn!(resource_id, %err, "Embedding call failed.");
						},
					}
				},
		}
	}

	(resource_ids, vectors, failures)
}
