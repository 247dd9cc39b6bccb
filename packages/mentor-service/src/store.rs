//! Storage seam. The Postgres-backed implementation wraps the query layer;
//! tests drive the same orchestration against an in-memory stand-in, the way
//! the embedding provider is already swapped.

use serde_json::Value;

use mentor_storage::{
	db::Db,
	models::{CandidateRow, EmbeddingRow, MetricsRow, Resource},
	queries,
};

use crate::BoxFuture;

pub trait Store
where
	Self: Send + Sync,
{
	fn fetch_resources<'a>(&'a self) -> BoxFuture<'a, mentor_storage::Result<Vec<Resource>>>;

	fn fetch_resource<'a>(
		&'a self,
		resource_id: i64,
	) -> BoxFuture<'a, mentor_storage::Result<Option<Resource>>>;

	fn fetch_resources_by_ids<'a>(
		&'a self,
		resource_ids: &'a [i64],
	) -> BoxFuture<'a, mentor_storage::Result<Vec<Resource>>>;

	fn keyword_search<'a>(
		&'a self,
		query: &'a str,
		limit: i64,
	) -> BoxFuture<'a, mentor_storage::Result<Vec<Resource>>>;

	fn fetch_embeddings<'a>(
		&'a self,
		model: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<Vec<EmbeddingRow>>>;

	fn upsert_embedding<'a>(
		&'a self,
		resource_id: i64,
		embedding: &'a [f32],
		model: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<()>>;

	fn fetch_candidates<'a>(
		&'a self,
		resource_ids: &'a [i64],
		model: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<Vec<CandidateRow>>>;

	fn insert_recommendation<'a>(
		&'a self,
		student_id: i64,
		resource_id: i64,
		score: f32,
		context: &'a Value,
	) -> BoxFuture<'a, mentor_storage::Result<i64>>;

	fn insert_feedback<'a>(
		&'a self,
		recommendation_id: i64,
		student_id: i64,
		action: &'a str,
		time_spent_seconds: Option<i32>,
	) -> BoxFuture<'a, mentor_storage::Result<i64>>;

	fn recently_engaged<'a>(
		&'a self,
		student_id: i64,
		resource_ids: &'a [i64],
		window_days: i32,
		positive_actions: &'a [String],
	) -> BoxFuture<'a, mentor_storage::Result<Vec<i64>>>;

	fn has_recent_engagement<'a>(
		&'a self,
		student_id: i64,
		resource_id: i64,
		window_days: i32,
		positive_actions: &'a [String],
	) -> BoxFuture<'a, mentor_storage::Result<bool>>;

	fn metrics<'a>(
		&'a self,
		click_action: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<MetricsRow>>;
}

pub struct PgStore {
	db: Db,
}

impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

impl Store for PgStore {
	fn fetch_resources<'a>(&'a self) -> BoxFuture<'a, mentor_storage::Result<Vec<Resource>>> {
		Box::pin(queries::fetch_resources(&self.db))
	}

	fn fetch_resource<'a>(
		&'a self,
		resource_id: i64,
	) -> BoxFuture<'a, mentor_storage::Result<Option<Resource>>> {
		Box::pin(queries::fetch_resource(&self.db, resource_id))
	}

	fn fetch_resources_by_ids<'a>(
		&'a self,
		resource_ids: &'a [i64],
	) -> BoxFuture<'a, mentor_storage::Result<Vec<Resource>>> {
		Box::pin(queries::fetch_resources_by_ids(&self.db, resource_ids))
	}

	fn keyword_search<'a>(
		&'a self,
		query: &'a str,
		limit: i64,
	) -> BoxFuture<'a, mentor_storage::Result<Vec<Resource>>> {
		Box::pin(queries::keyword_search(&self.db, query, limit))
	}

	fn fetch_embeddings<'a>(
		&'a self,
		model: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<Vec<EmbeddingRow>>> {
		Box::pin(queries::fetch_embeddings(&self.db, model))
	}

	fn upsert_embedding<'a>(
		&'a self,
		resource_id: i64,
		embedding: &'a [f32],
		model: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<()>> {
		Box::pin(queries::upsert_embedding(&self.db, resource_id, embedding, model))
	}

	fn fetch_candidates<'a>(
		&'a self,
		resource_ids: &'a [i64],
		model: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<Vec<CandidateRow>>> {
		Box::pin(queries::fetch_candidates(&self.db, resource_ids, model))
	}

	fn insert_recommendation<'a>(
		&'a self,
		student_id: i64,
		resource_id: i64,
		score: f32,
		context: &'a Value,
	) -> BoxFuture<'a, mentor_storage::Result<i64>> {
		Box::pin(queries::insert_recommendation(&self.db, student_id, resource_id, score, context))
	}

	fn insert_feedback<'a>(
		&'a self,
		recommendation_id: i64,
		student_id: i64,
		action: &'a str,
		time_spent_seconds: Option<i32>,
	) -> BoxFuture<'a, mentor_storage::Result<i64>> {
		Box::pin(queries::insert_feedback(
			&self.db,
			recommendation_id,
			student_id,
			action,
			time_spent_seconds,
		))
	}

	fn recently_engaged<'a>(
		&'a self,
		student_id: i64,
		resource_ids: &'a [i64],
		window_days: i32,
		positive_actions: &'a [String],
	) -> BoxFuture<'a, mentor_storage::Result<Vec<i64>>> {
		Box::pin(queries::recently_engaged(
			&self.db,
			student_id,
			resource_ids,
			window_days,
			positive_actions,
		))
	}

	fn has_recent_engagement<'a>(
		&'a self,
		student_id: i64,
		resource_id: i64,
		window_days: i32,
		positive_actions: &'a [String],
	) -> BoxFuture<'a, mentor_storage::Result<bool>> {
		Box::pin(queries::has_recent_engagement(
			&self.db,
			student_id,
			resource_id,
			window_days,
			positive_actions,
		))
	}

	fn metrics<'a>(
		&'a self,
		click_action: &'a str,
	) -> BoxFuture<'a, mentor_storage::Result<MetricsRow>> {
		Box::pin(queries::metrics(&self.db, click_action))
	}
}
