use crate::{MentorService, ServiceResult};

/// The action that counts as a click for CTR purposes.
const CLICK_ACTION: &str = "clicked";

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MetricsResponse {
	pub total_recommendations: i64,
	pub total_feedback: i64,
	pub click_through_rate: f32,
}

impl MentorService {
	pub async fn metrics(&self) -> ServiceResult<MetricsResponse> {
		let row = self.store.metrics(CLICK_ACTION).await?;
		let click_through_rate = if row.recommendations > 0 {
			row.clicks as f32 / row.recommendations as f32
		} else {
			0.0
		};

		Ok(MetricsResponse {
			total_recommendations: row.recommendations,
			total_feedback: row.feedback,
			click_through_rate,
		})
	}
}
