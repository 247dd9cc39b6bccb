//! End-to-end orchestration tests against an in-memory store: recency
//! suppression inside and outside the lookback window, empty candidate
//! sets, and reindex idempotence.

use std::sync::{
	Arc, Mutex,
	atomic::{AtomicI64, Ordering},
};

use serde_json::Value;
use time::{Duration, OffsetDateTime};

use mentor_config::{
	Config, EmbeddingProviderConfig, Index, Postgres, Ranking, Recency, Retrieval, Service,
	Storage,
};
use mentor_service::{
	BoxFuture, EmbeddingProvider, MentorService, Providers, RecommendRequest, Store,
};
use mentor_storage::models::{CandidateRow, EmbeddingRow, MetricsRow, Resource};

const MODEL: &str = "test-model";
const DIMS: u32 = 3;

fn axis(i: usize) -> Vec<f32> {
	let mut vector = vec![0.0; DIMS as usize];

	vector[i] = 1.0;

	vector
}

fn resource(id: i64, title: &str) -> Resource {
	Resource {
		id,
		title: title.to_string(),
		description: format!("{title} fundamentals."),
		resource_type: "video".to_string(),
		subject: "math".to_string(),
		difficulty_level: "beginner".to_string(),
		duration_minutes: Some(10),
		url: format!("https://example.test/{id}"),
		tags: Value::Array(vec![Value::String("math".to_string())]),
		created_at: OffsetDateTime::now_utc(),
	}
}

fn test_config(snapshot_path: String) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: "postgres://unused".to_string(), pool_max_conns: 1 },
		},
		providers: mentor_config::Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test".to_string(),
				path: "/v1/embeddings".to_string(),
				model: MODEL.to_string(),
				dimensions: DIMS,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
		},
		index: Index { snapshot_path },
		retrieval: Retrieval { min_candidates: 50, per_item_factor: 10, default_top_n: 5 },
		ranking: Ranking { mmr_lambda: 0.5 },
		recency: Recency {
			window_days: 7,
			positive_actions: vec![
				"clicked".to_string(),
				"completed".to_string(),
				"liked".to_string(),
			],
		},
	}
}

/// Maps each text to the vector of its first matching route; unknown texts
/// land on the first axis.
struct RouteProvider {
	routes: Vec<(&'static str, Vec<f32>)>,
}

impl EmbeddingProvider for RouteProvider {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mentor_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Ok(texts
				.iter()
				.map(|text| {
					self.routes
						.iter()
						.find(|(needle, _)| text.contains(needle))
						.map(|(_, vector)| vector.clone())
						.unwrap_or_else(|| {
							let mut vector = vec![0.0; cfg.dimensions as usize];

							vector[0] = 1.0;

							vector
						})
				})
				.collect())
		})
	}
}

struct FeedbackEntry {
	student_id: i64,
	resource_id: i64,
	action: String,
	feedback_at: OffsetDateTime,
}

#[derive(Default)]
struct MemoryInner {
	resources: Vec<Resource>,
	embeddings: Vec<(i64, String, Vec<f32>)>,
	recommendations: Vec<(i64, i64, i64)>,
	feedback: Vec<FeedbackEntry>,
}

struct MemoryStore {
	inner: Mutex<MemoryInner>,
	next_id: AtomicI64,
}

impl MemoryStore {
	fn new() -> Arc<Self> {
		Arc::new(Self { inner: Mutex::new(MemoryInner::default()), next_id: AtomicI64::new(1) })
	}

	fn add_resource(&self, id: i64, title: &str) {
		self.inner.lock().unwrap().resources.push(resource(id, title));
	}

	fn add_embedding(&self, resource_id: i64, vector: Vec<f32>) {
		self.inner.lock().unwrap().embeddings.push((resource_id, MODEL.to_string(), vector));
	}

	fn add_feedback(&self, student_id: i64, resource_id: i64, action: &str, at: OffsetDateTime) {
		self.inner.lock().unwrap().feedback.push(FeedbackEntry {
			student_id,
			resource_id,
			action: action.to_string(),
			feedback_at: at,
		});
	}

	fn embedding_count(&self) -> usize {
		self.inner.lock().unwrap().embeddings.len()
	}

	fn recommendation_count(&self) -> usize {
		self.inner.lock().unwrap().recommendations.len()
	}
}

impl Store for MemoryStore {
	fn fetch_resources<'a>(&'a self) -> BoxFuture<'a, mentor_storage::Result<Vec<Resource>>> {
		let rows = self.inner.lock().unwrap().resources.clone();

		Box::pin(async move { Ok(rows) })
	}

	fn fetch_resource<'a>(
		&'a self,
		resource_id: i64,
	) -> BoxFuture<'a, mentor_storage::Result<Option<Resource>>> {
		let row = self
			.inner
			.lock()
			.unwrap()
			.resources
			.iter()
			.find(|resource| resource.id == resource_id)
			.cloned();

		Box::pin(async move { Ok(row) })
	}

	fn fetch_resources_by_ids<'a>(
		&'a self,
		resource_ids: &'a [i64],
	) -> BoxFuture<'a, mentor_storage::Result<Vec<Resource>>> {
		let rows: Vec<Resource> = self
			.inner
			.lock()
			.unwrap()
			.resources
			.iter()
			.filter(|resource| resource_ids.contains(&resource.id))
			.cloned()
			.collect();

		Box::pin(async move { Ok(rows) })
	}

	fn keyword_search<'a>(
		&'a self,
		query: &'a str,
		limit: i64,
	) -> BoxFuture<'a, mentor_storage::Result<Vec<Resource>>> {
		let needle = query.to_lowercase();
		let mut rows: Vec<Resource> = self
			.inner
			.lock()
			.unwrap()
			.resources
			.iter()
			.filter(|resource| {
				resource.title.to_lowercase().contains(&needle)
					|| resource.description.to_lowercase().contains(&needle)
			})
			.cloned()
			.collect();

		rows.truncate(limit as usize);

		Box::pin(async move { Ok(rows) })
	}

	fn fetch_embeddings<'a>(
		&'a self,
		model: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<Vec<EmbeddingRow>>> {
		let mut rows: Vec<EmbeddingRow> = self
			.inner
			.lock()
			.unwrap()
			.embeddings
			.iter()
			.filter(|(_, row_model, _)| row_model == model)
			.map(|(resource_id, _, vector)| EmbeddingRow {
				resource_id: *resource_id,
				vec_text: mentor_storage::vector_to_pg(vector),
			})
			.collect();

		rows.sort_by_key(|row| row.resource_id);

		Box::pin(async move { Ok(rows) })
	}

	fn upsert_embedding<'a>(
		&'a self,
		resource_id: i64,
		embedding: &'a [f32],
		model: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<()>> {
		let vector = embedding.to_vec();
		let mut inner = self.inner.lock().unwrap();

		match inner
			.embeddings
			.iter_mut()
			.find(|(row_id, row_model, _)| *row_id == resource_id && row_model == model)
		{
			Some(row) => row.2 = vector,
			None => inner.embeddings.push((resource_id, model.to_string(), vector)),
		}

		drop(inner);

		Box::pin(async move { Ok(()) })
	}

	fn fetch_candidates<'a>(
		&'a self,
		resource_ids: &'a [i64],
		model: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<Vec<CandidateRow>>> {
		let inner = self.inner.lock().unwrap();
		let rows: Vec<CandidateRow> = resource_ids
			.iter()
			.filter_map(|&id| {
				let resource = inner.resources.iter().find(|resource| resource.id == id)?;
				let (_, _, vector) = inner
					.embeddings
					.iter()
					.find(|(row_id, row_model, _)| *row_id == id && row_model == model)?;

				Some(CandidateRow {
					resource_id: id,
					title: resource.title.clone(),
					description: resource.description.clone(),
					difficulty_level: resource.difficulty_level.clone(),
					url: resource.url.clone(),
					vec_text: mentor_storage::vector_to_pg(vector),
				})
			})
			.collect();

		drop(inner);

		Box::pin(async move { Ok(rows) })
	}

	fn insert_recommendation<'a>(
		&'a self,
		student_id: i64,
		resource_id: i64,
		_score: f32,
		_context: &'a Value,
	) -> BoxFuture<'a, mentor_storage::Result<i64>> {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);

		self.inner.lock().unwrap().recommendations.push((id, student_id, resource_id));

		Box::pin(async move { Ok(id) })
	}

	fn insert_feedback<'a>(
		&'a self,
		recommendation_id: i64,
		student_id: i64,
		action: &'a str,
		_time_spent_seconds: Option<i32>,
	) -> BoxFuture<'a, mentor_storage::Result<i64>> {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let mut inner = self.inner.lock().unwrap();
		let resource_id = inner
			.recommendations
			.iter()
			.find(|(rec_id, _, _)| *rec_id == recommendation_id)
			.map(|(_, _, resource_id)| *resource_id)
			.unwrap_or_default();

		inner.feedback.push(FeedbackEntry {
			student_id,
			resource_id,
			action: action.to_string(),
			feedback_at: OffsetDateTime::now_utc(),
		});
		drop(inner);

		Box::pin(async move { Ok(id) })
	}

	fn recently_engaged<'a>(
		&'a self,
		student_id: i64,
		resource_ids: &'a [i64],
		window_days: i32,
		positive_actions: &'a [String],
	) -> BoxFuture<'a, mentor_storage::Result<Vec<i64>>> {
		let cutoff = OffsetDateTime::now_utc() - Duration::days(window_days as i64);
		let mut ids: Vec<i64> = self
			.inner
			.lock()
			.unwrap()
			.feedback
			.iter()
			.filter(|entry| {
				entry.student_id == student_id
					&& entry.feedback_at >= cutoff
					&& positive_actions.contains(&entry.action)
					&& resource_ids.contains(&entry.resource_id)
			})
			.map(|entry| entry.resource_id)
			.collect();

		ids.sort_unstable();
		ids.dedup();

		Box::pin(async move { Ok(ids) })
	}

	fn has_recent_engagement<'a>(
		&'a self,
		student_id: i64,
		resource_id: i64,
		window_days: i32,
		positive_actions: &'a [String],
	) -> BoxFuture<'a, mentor_storage::Result<bool>> {
		let cutoff = OffsetDateTime::now_utc() - Duration::days(window_days as i64);
		let engaged = self.inner.lock().unwrap().feedback.iter().any(|entry| {
			entry.student_id == student_id
				&& entry.resource_id == resource_id
				&& entry.feedback_at >= cutoff
				&& positive_actions.contains(&entry.action)
		});

		Box::pin(async move { Ok(engaged) })
	}

	fn metrics<'a>(
		&'a self,
		click_action: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<MetricsRow>> {
		let inner = self.inner.lock().unwrap();
		let row = MetricsRow {
			recommendations: inner.recommendations.len() as i64,
			feedback: inner.feedback.len() as i64,
			clicks: inner.feedback.iter().filter(|entry| entry.action == click_action).count()
				as i64,
		};

		drop(inner);

		Box::pin(async move { Ok(row) })
	}
}

fn catalog_provider() -> Providers {
	Providers::new(Arc::new(RouteProvider {
		routes: vec![
			("Alpha", axis(0)),
			("Beta", axis(1)),
			("Gamma", axis(2)),
			// Query vector leaning toward Alpha, then Beta, then Gamma.
			("algebra", vec![0.8, 0.6, 0.0]),
		],
	}))
}

fn service(store: Arc<MemoryStore>, dir: &tempfile::TempDir) -> MentorService {
	let snapshot = dir.path().join("resources.index").to_string_lossy().into_owned();

	MentorService::from_parts(test_config(snapshot), store, catalog_provider())
}

fn seed_catalog(store: &MemoryStore) {
	for (id, title) in [(1, "Alpha"), (2, "Beta"), (3, "Gamma")] {
		store.add_resource(id, title);
		store.add_embedding(id, axis(id as usize - 1));
	}
}

fn request(top_n: Option<u32>) -> RecommendRequest {
	RecommendRequest {
		student_id: 42,
		profile_label: "algebra learner".to_string(),
		difficulties: Vec::new(),
		top_n,
	}
}

#[tokio::test]
async fn recently_engaged_resources_are_suppressed() {
	let dir = tempfile::tempdir().expect("tempdir failed");
	let store = MemoryStore::new();

	seed_catalog(&store);
	// The most relevant resource was clicked yesterday, well inside the
	// seven-day window.
	store.add_feedback(42, 1, "clicked", OffsetDateTime::now_utc() - Duration::days(1));

	let service = service(store.clone(), &dir);
	let response = service.recommend(request(Some(2))).await.expect("recommend failed");
	let ids: Vec<i64> = response.recommendations.iter().map(|item| item.resource_id).collect();

	// The next-best novel picks fill the slots instead of the list shrinking.
	assert_eq!(ids, vec![2, 3]);
	assert_eq!(store.recommendation_count(), 2);
}

#[tokio::test]
async fn engagement_older_than_the_window_no_longer_suppresses() {
	let dir = tempfile::tempdir().expect("tempdir failed");
	let store = MemoryStore::new();

	seed_catalog(&store);

	store.add_feedback(42, 1, "clicked", OffsetDateTime::now_utc() - Duration::days(30));

	let service = service(store.clone(), &dir);
	let response = service.recommend(request(Some(2))).await.expect("recommend failed");
	let ids: Vec<i64> = response.recommendations.iter().map(|item| item.resource_id).collect();

	assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn empty_candidate_set_yields_an_empty_response() {
	let dir = tempfile::tempdir().expect("tempdir failed");
	let store = MemoryStore::new();

	// Embeddings exist (the index builds) but the catalog rows behind them
	// are gone, so hydration produces no candidates.
	store.add_embedding(1, axis(0));
	store.add_embedding(2, axis(1));

	let service = service(store.clone(), &dir);
	let response = service.recommend(request(None)).await.expect("recommend failed");

	assert!(response.recommendations.is_empty());
	assert_eq!(store.recommendation_count(), 0);
}

#[tokio::test]
async fn reindexing_twice_is_idempotent() {
	let dir = tempfile::tempdir().expect("tempdir failed");
	let store = MemoryStore::new();

	for (id, title) in [(1, "Alpha"), (2, "Beta"), (3, "Gamma")] {
		store.add_resource(id, title);
	}

	let service = service(store.clone(), &dir);
	let first = service.reindex_all().await.expect("first reindex failed");
	let ids_after_first =
		service.index.current().expect("index must be live").all_resource_ids().to_vec();
	let second = service.reindex_all().await.expect("second reindex failed");
	let ids_after_second =
		service.index.current().expect("index must be live").all_resource_ids().to_vec();

	assert_eq!(first.indexed, 3);
	assert_eq!(first.embed_failures, 0);
	assert_eq!(first.upsert_failures, 0);
	assert_eq!(second.indexed, first.indexed);
	assert_eq!(second.embed_failures, 0);
	assert_eq!(second.upsert_failures, 0);
	// Upserts replace rather than duplicate, and the published mapping is
	// unchanged run over run.
	assert_eq!(store.embedding_count(), 3);
	assert_eq!(ids_after_first, ids_after_second);
}
