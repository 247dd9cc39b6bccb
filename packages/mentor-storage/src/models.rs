use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Resource {
	pub id: i64,
	pub title: String,
	pub description: String,
	pub resource_type: String,
	pub subject: String,
	pub difficulty_level: String,
	pub duration_minutes: Option<i32>,
	pub url: String,
	pub tags: Value,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

impl Resource {
	/// Tag list as strings; non-array or non-string tag payloads flatten to
	/// their JSON rendering, matching how the catalog writes them.
	pub fn tag_list(&self) -> Vec<String> {
		match &self.tags {
			Value::Array(items) => items
				.iter()
				.map(|item| match item {
					Value::String(tag) => tag.clone(),
					other => other.to_string(),
				})
				.collect(),
			Value::Null => Vec::new(),
			other => vec![other.to_string()],
		}
	}
}

/// One stored embedding row; the vector arrives as pgvector text and is
/// parsed by the caller so unparsable rows can be counted, not swallowed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmbeddingRow {
	pub resource_id: i64,
	pub vec_text: String,
}

/// Hydration row for one raw candidate: catalog metadata joined with the
/// stored embedding the diversifier needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidateRow {
	pub resource_id: i64,
	pub title: String,
	pub description: String,
	pub difficulty_level: String,
	pub url: String,
	pub vec_text: String,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct MetricsRow {
	pub recommendations: i64,
	pub feedback: i64,
	pub clicks: i64,
}
