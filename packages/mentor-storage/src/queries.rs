use serde_json::Value;

use crate::{
	Result, db::Db, models::{CandidateRow, EmbeddingRow, MetricsRow, Resource}, vector_to_pg,
};

pub async fn fetch_resources(db: &Db) -> Result<Vec<Resource>> {
	let rows = sqlx::query_as::<_, Resource>(
		"\
SELECT id, title, description, resource_type, subject, difficulty_level, duration_minutes, url,
	tags, created_at
FROM resources
ORDER BY created_at DESC, id DESC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn fetch_resource(db: &Db, resource_id: i64) -> Result<Option<Resource>> {
	let row = sqlx::query_as::<_, Resource>(
		"\
SELECT id, title, description, resource_type, subject, difficulty_level, duration_minutes, url,
	tags, created_at
FROM resources
WHERE id = $1",
	)
	.bind(resource_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

pub async fn fetch_resources_by_ids(db: &Db, resource_ids: &[i64]) -> Result<Vec<Resource>> {
	let rows = sqlx::query_as::<_, Resource>(
		"\
SELECT id, title, description, resource_type, subject, difficulty_level, duration_minutes, url,
	tags, created_at
FROM resources
WHERE id = ANY($1)",
	)
	.bind(resource_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn keyword_search(db: &Db, query: &str, limit: i64) -> Result<Vec<Resource>> {
	let pattern = format!("%{query}%");
	let rows = sqlx::query_as::<_, Resource>(
		"\
SELECT id, title, description, resource_type, subject, difficulty_level, duration_minutes, url,
	tags, created_at
FROM resources
WHERE title ILIKE $1 OR description ILIKE $1
ORDER BY created_at DESC, id DESC
LIMIT $2",
	)
	.bind(pattern)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// All stored embeddings for one model version, in resource-id order so an
/// index rebuilt from the same store is identical slot for slot.
pub async fn fetch_embeddings(db: &Db, model: &str) -> Result<Vec<EmbeddingRow>> {
	let rows = sqlx::query_as::<_, EmbeddingRow>(
		"\
SELECT resource_id, embedding::text AS vec_text
FROM resource_embeddings
WHERE embedding_model = $1
ORDER BY resource_id",
	)
	.bind(model)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn upsert_embedding(
	db: &Db,
	resource_id: i64,
	embedding: &[f32],
	model: &str,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO resource_embeddings (resource_id, embedding_model, embedding)
VALUES ($1, $2, $3::text::vector)
ON CONFLICT (resource_id, embedding_model)
	DO UPDATE SET embedding = EXCLUDED.embedding, created_at = NOW()",
	)
	.bind(resource_id)
	.bind(model)
	.bind(vector_to_pg(embedding))
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// One batched hydration round trip for a raw candidate set: metadata plus
/// the stored embedding. Ids absent from either side simply return no row.
pub async fn fetch_candidates(
	db: &Db,
	resource_ids: &[i64],
	model: &str,
) -> Result<Vec<CandidateRow>> {
	let rows = sqlx::query_as::<_, CandidateRow>(
		"\
SELECT r.id AS resource_id, r.title, r.description, r.difficulty_level, r.url,
	e.embedding::text AS vec_text
FROM resources r
JOIN resource_embeddings e ON e.resource_id = r.id AND e.embedding_model = $2
WHERE r.id = ANY($1)",
	)
	.bind(resource_ids)
	.bind(model)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn insert_recommendation(
	db: &Db,
	student_id: i64,
	resource_id: i64,
	score: f32,
	context: &Value,
) -> Result<i64> {
	let id: i64 = sqlx::query_scalar(
		"\
INSERT INTO recommendations (student_id, resource_id, recommendation_score, context)
VALUES ($1, $2, $3, $4)
RETURNING id",
	)
	.bind(student_id)
	.bind(resource_id)
	.bind(score)
	.bind(context)
	.fetch_one(&db.pool)
	.await?;

	Ok(id)
}

pub async fn insert_feedback(
	db: &Db,
	recommendation_id: i64,
	student_id: i64,
	action: &str,
	time_spent_seconds: Option<i32>,
) -> Result<i64> {
	let id: i64 = sqlx::query_scalar(
		"\
INSERT INTO recommendation_feedback (recommendation_id, student_id, action, time_spent_seconds)
VALUES ($1, $2, $3, $4)
RETURNING id",
	)
	.bind(recommendation_id)
	.bind(student_id)
	.bind(action)
	.bind(time_spent_seconds)
	.fetch_one(&db.pool)
	.await?;

	Ok(id)
}

/// Resource ids from the candidate set the learner has positively engaged
/// with inside the lookback window. One round trip for the whole set.
pub async fn recently_engaged(
	db: &Db,
	student_id: i64,
	resource_ids: &[i64],
	window_days: i32,
	positive_actions: &[String],
) -> Result<Vec<i64>> {
	let rows: Vec<i64> = sqlx::query_scalar(
		"\
SELECT DISTINCT r.resource_id
FROM recommendations r
JOIN recommendation_feedback f ON f.recommendation_id = r.id
WHERE r.student_id = $1
	AND r.resource_id = ANY($2)
	AND f.student_id = $1
	AND f.action = ANY($3)
	AND f.feedback_at >= NOW() - make_interval(days => $4)",
	)
	.bind(student_id)
	.bind(resource_ids)
	.bind(positive_actions)
	.bind(window_days)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn has_recent_engagement(
	db: &Db,
	student_id: i64,
	resource_id: i64,
	window_days: i32,
	positive_actions: &[String],
) -> Result<bool> {
	let exists: bool = sqlx::query_scalar(
		"\
SELECT EXISTS (
	SELECT 1
	FROM recommendations r
	JOIN recommendation_feedback f ON f.recommendation_id = r.id
	WHERE r.student_id = $1
		AND r.resource_id = $2
		AND f.student_id = $1
		AND f.action = ANY($3)
		AND f.feedback_at >= NOW() - make_interval(days => $4)
)",
	)
	.bind(student_id)
	.bind(resource_id)
	.bind(positive_actions)
	.bind(window_days)
	.fetch_one(&db.pool)
	.await?;

	Ok(exists)
}

pub async fn metrics(db: &Db, click_action: &str) -> Result<MetricsRow> {
	let row = sqlx::query_as::<_, MetricsRow>(
		"\
SELECT
	(SELECT COUNT(*) FROM recommendations) AS recommendations,
	(SELECT COUNT(*) FROM recommendation_feedback) AS feedback,
	(SELECT COUNT(*) FROM recommendation_feedback WHERE action = $1) AS clicks",
	)
	.bind(click_action)
	.fetch_one(&db.pool)
	.await?;

	Ok(row)
}
