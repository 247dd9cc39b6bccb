pub mod diversity;
pub mod feedback;
pub mod metrics;
pub mod recency;
pub mod recommend;
pub mod reindex;
pub mod resources;
pub mod search;
pub mod store;

use std::{future::Future, pin::Pin, sync::Arc};

use mentor_config::{Config, EmbeddingProviderConfig};
use mentor_index::{SharedIndex, VectorIndex};
use mentor_providers::embedding;
use mentor_storage::db::Db;

pub use feedback::{FeedbackRequest, FeedbackResponse};
pub use metrics::MetricsResponse;
pub use recommend::{RecommendRequest, RecommendResponse, RecommendationItem};
pub use reindex::ReindexReport;
pub use search::{SearchMode, SearchRequest, SearchResponse};
pub use store::{PgStore, Store};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Implementations uphold the adapter's contract: one vector per input, in
/// input order, at the configured dimensionality.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mentor_providers::Result<Vec<Vec<f32>>>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	NotFound { message: String },
	EmbeddingUnavailable { message: String },
	IndexNotReady,
	Storage { message: String },
	Index { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

pub struct MentorService {
	pub cfg: Config,
	pub store: Arc<dyn Store>,
	pub index: SharedIndex,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::NotFound { message } => write!(f, "Not found: {message}"),
			Self::EmbeddingUnavailable { message } => {
				write!(f, "Embedding provider unavailable: {message}")
			},
			Self::IndexNotReady => write!(f, "Vector index is not ready."),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
			Self::Index { message } => write!(f, "Index error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<mentor_storage::Error> for ServiceError {
	fn from(err: mentor_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<mentor_providers::Error> for ServiceError {
	fn from(err: mentor_providers::Error) -> Self {
		match &err {
			// A wrong-width vector is a model/config mismatch, not an outage;
			// the keyword fallback keys on `EmbeddingUnavailable` and must
			// not paper over it.
			mentor_providers::Error::Dimension { .. } => Self::Index { message: err.to_string() },
			_ => Self::EmbeddingUnavailable { message: err.to_string() },
		}
	}
}

impl From<mentor_index::Error> for ServiceError {
	fn from(err: mentor_index::Error) -> Self {
		Self::Index { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mentor_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

impl MentorService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::from_parts(cfg, Arc::new(PgStore::new(db)), Providers::default())
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self::from_parts(cfg, Arc::new(PgStore::new(db)), providers)
	}

	pub fn from_parts(cfg: Config, store: Arc<dyn Store>, providers: Providers) -> Self {
		Self { cfg, store, index: SharedIndex::new(), providers }
	}

	/// Boot-time index recovery. Failure leaves the service running: the
	/// first operation that needs the index retries the same path.
	pub async fn warm_start(&self) -> ServiceResult<()> {
		self.ensure_index().await.map(|_| ())
	}

	pub(crate) async fn embed_one(&self, text: &str) -> ServiceResult<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let vectors = self.providers.embedding.embed(cfg, &[text.to_string()]).await?;

		vectors.into_iter().next().ok_or_else(|| ServiceError::EmbeddingUnavailable {
			message: "provider returned no vectors".to_string(),
		})
	}

	/// Lazy index recovery: snapshot first, then a rebuild from the embedding
	/// store. Only after both fail does the caller see `IndexNotReady`.
	///
	/// Returns the generation the caller pins for the rest of its request:
	/// slot numbers are only valid within the generation that produced them,
	/// so one request never mixes a search from one publish with a mapping
	/// from the next.
	pub(crate) async fn ensure_index(&self) -> ServiceResult<Arc<VectorIndex>> {
		if let Some(index) = self.index.current() {
			return Ok(index);
		}

		let path = std::path::Path::new(&self.cfg.index.snapshot_path);

		match VectorIndex::load(path) {
			Ok(index) => {
				tracing::info!(
					slots = index.len(),
					path = %path.display(),
					"Loaded vector index snapshot.",
				);

				return Ok(self.index.publish(index));
			},
			Err(err) => {
				tracing::info!(
					path = %path.display(),
					%err,
					"No usable index snapshot; rebuilding from the embedding store.",
				);
			},
		}

		self.rebuild_from_store().await
	}

	pub(crate) async fn rebuild_from_store(&self) -> ServiceResult<Arc<VectorIndex>> {
		let model = self.cfg.providers.embedding.model.as_str();
		let rows = self.store.fetch_embeddings(model).await?;
		let mut resource_ids = Vec::with_capacity(rows.len());
		let mut vectors = Vec::with_capacity(rows.len());
		let mut parse_failures = 0_u64;

		for row in rows {
			match mentor_storage::parse_pg_vector(&row.vec_text) {
				Ok(vector) => {
					resource_ids.push(row.resource_id);
					vectors.push(vector);
				},
				Err(err) => {
					parse_failures += 1;

					tracing::warn!(resource_id = row.resource_id, %err, "Skipping stored embedding.");
				},
			}
		}

		if parse_failures > 0 {
			tracing::warn!(parse_failures, "Some stored embeddings were unreadable.");
		}
		if vectors.is_empty() {
			return Err(ServiceError::IndexNotReady);
		}

		let index = VectorIndex::build(vectors, resource_ids)?;

		tracing::info!(slots = index.len(), "Rebuilt vector index from the embedding store.");

		Ok(self.index.publish(index))
	}
}

/// Text embedded for one catalog resource.
pub(crate) fn embedding_text(title: &str, description: &str, tags: &[String]) -> String {
	format!("{title}. {description}. Tags: {}", tags.join(", "))
}

/// Synthetic query for a learner: profile label plus current difficulty
/// tags, falling back to fundamentals when none are active.
pub(crate) fn query_text(profile_label: &str, difficulties: &[String]) -> String {
	let diff_text = if difficulties.is_empty() {
		"fundamentals".to_string()
	} else {
		difficulties.join(", ")
	};

	format!("{profile_label}. Difficulties: {diff_text}")
}
