use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use sift_domain::ScoredResult;
use sift_service::{SearchRequest, ServiceError};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/search", get(search))
		.with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
	status: &'static str,
}

async fn health() -> Json<HealthResponse> {
	Json(HealthResponse { status: "OK" })
}

#[derive(Debug, Deserialize)]
struct SearchParams {
	text: Option<String>,
	top_k: Option<u32>,
	threshold: Option<f32>,
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ScoredResult>>, ApiError> {
	let Some(caller_id) = headers.get("user_id").and_then(|value| value.to_str().ok()) else {
		return Err(json_error(
			StatusCode::BAD_REQUEST,
			"missing_parameter",
			"Missing user_id header.",
		));
	};
	let request = SearchRequest {
		caller_id: caller_id.to_string(),
		query: params.text.unwrap_or_default(),
		top_k: params.top_k,
		threshold: params.threshold,
	};
	let results = state.service.search(request).await?;

	Ok(Json(results))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
) -> ApiError {
	ApiError::new(status, code, message)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "missing_parameter", message),
			ServiceError::QuotaDenied =>
				json_error(StatusCode::TOO_MANY_REQUESTS, "rate_limited", "Rate limit exceeded."),
			// Store and scoring faults were already logged with request
			// context; callers get a generic failure.
			ServiceError::Storage { .. } | ServiceError::Scoring { .. } => json_error(
				StatusCode::INTERNAL_SERVER_ERROR,
				"internal_error",
				"Internal server error.",
			),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
