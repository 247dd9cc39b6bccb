use crate::{MentorService, ServiceError, ServiceResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeedbackRequest {
	pub recommendation_id: i64,
	pub student_id: i64,
	pub action: String,
	pub time_spent_seconds: Option<i32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeedbackResponse {
	pub feedback_id: i64,
}

impl MentorService {
	/// Append-only interaction record; the recency filter reads these back.
	pub async fn record_feedback(&self, req: FeedbackRequest) -> ServiceResult<FeedbackResponse> {
		let action = req.action.trim();

		if action.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "action must be non-empty".to_string(),
			});
		}

		let feedback_id = self
			.store
			.insert_feedback(req.recommendation_id, req.student_id, action, req.time_spent_seconds)
			.await?;

		Ok(FeedbackResponse { feedback_id })
	}
}
