use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use mentor_service::{
	FeedbackRequest, FeedbackResponse, MetricsResponse, RecommendRequest, RecommendResponse,
	ReindexReport, SearchRequest, SearchResponse, ServiceError,
};
use mentor_storage::models::Resource;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/resources/search", get(search))
		.route("/api/resources/index", post(reindex))
		.route("/api/resources/{resource_id}", get(resource))
		.route("/api/recommendations/student/{student_id}", post(recommend))
		.route("/api/recommendations/feedback", post(feedback))
		.route("/api/recommendations/metrics", get(metrics))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Query(params): Query<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(params).await?;

	Ok(Json(response))
}

async fn reindex(State(state): State<AppState>) -> Result<Json<ReindexReport>, ApiError> {
	let report = state.service.reindex_all().await?;

	Ok(Json(report))
}

async fn resource(
	State(state): State<AppState>,
	Path(resource_id): Path<i64>,
) -> Result<Json<Resource>, ApiError> {
	let resource = state.service.resource(resource_id).await?;

	Ok(Json(resource))
}

#[derive(Debug, Deserialize)]
struct RecommendBody {
	profile_label: String,
	#[serde(default)]
	difficulties: Vec<String>,
	top_n: Option<u32>,
}

async fn recommend(
	State(state): State<AppState>,
	Path(student_id): Path<i64>,
	Json(body): Json<RecommendBody>,
) -> Result<Json<RecommendResponse>, ApiError> {
	let response = state
		.service
		.recommend(RecommendRequest {
			student_id,
			profile_label: body.profile_label,
			difficulties: body.difficulties,
			top_n: body.top_n,
		})
		.await?;

	Ok(Json(response))
}

async fn feedback(
	State(state): State<AppState>,
	Json(payload): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
	let response = state.service.record_feedback(payload).await?;

	Ok(Json(response))
}

async fn metrics(State(state): State<AppState>) -> Result<Json<MetricsResponse>, ApiError> {
	let response = state.service.metrics().await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
			ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
			ServiceError::EmbeddingUnavailable { .. } =>
				(StatusCode::SERVICE_UNAVAILABLE, "embedding_unavailable"),
			ServiceError::IndexNotReady =>
				(StatusCode::SERVICE_UNAVAILABLE, "index_not_ready"),
			ServiceError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
			ServiceError::Index { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "index_error"),
		};

		Self { status, error_code, message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}
