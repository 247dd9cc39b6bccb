use std::sync::Arc;

use mentor_service::MentorService;
use mentor_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MentorService>,
}
impl AppState {
	pub async fn new(config: mentor_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;
		let report = db.ensure_schema(config.providers.embedding.dimensions).await?;

		if !report.embeddings_enabled {
			tracing::warn!(
				reason = report.skipped_reason.as_deref().unwrap_or("unknown"),
				"Embeddings table unavailable; semantic features will degrade to keyword search.",
			);
		}

		let service = MentorService::new(config, db);

		if let Err(err) = service.warm_start().await {
			tracing::warn!(%err, "Vector index not warmed at boot; will retry lazily.");
		}

		Ok(Self { service: Arc::new(service) })
	}
}
