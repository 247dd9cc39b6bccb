use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub index: Index,
	pub retrieval: Retrieval,
	pub ranking: Ranking,
	pub recency: Recency,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Index {
	/// Durable location of the serialized index. Reconstructable from the
	/// embedding store at any time, so losing it only costs a rebuild.
	pub snapshot_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	/// Floor on raw candidates fetched per request.
	#[serde(default = "default_min_candidates")]
	pub min_candidates: u32,
	/// Raw candidates requested per final result slot.
	#[serde(default = "default_per_item_factor")]
	pub per_item_factor: u32,
	#[serde(default = "default_top_n")]
	pub default_top_n: u32,
}

#[derive(Debug, Deserialize)]
pub struct Ranking {
	/// MMR relevance/diversity trade-off. 1.0 is pure relevance.
	#[serde(default = "default_mmr_lambda")]
	pub mmr_lambda: f32,
}

#[derive(Debug, Deserialize)]
pub struct Recency {
	/// Days a positive interaction suppresses re-recommendation.
	#[serde(default = "default_window_days")]
	pub window_days: u32,
	#[serde(default = "default_positive_actions")]
	pub positive_actions: Vec<String>,
}

fn default_min_candidates() -> u32 {
	50
}

fn default_per_item_factor() -> u32 {
	10
}

fn default_top_n() -> u32 {
	5
}

fn default_mmr_lambda() -> f32 {
	0.5
}

fn default_window_days() -> u32 {
	7
}

fn default_positive_actions() -> Vec<String> {
	["clicked", "completed", "liked"].into_iter().map(str::to_string).collect()
}
