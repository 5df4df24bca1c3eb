use crate::models::{ItemId, RecommendationRequest, RecommendationResponse};
use crate::services::serving::ItemDetails;
use crate::utils::validation::{validate_batch_size, validate_recommendation_request};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const MAX_BATCH_SIZE: usize = 256;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRecommendationRequest {
    pub requests: Vec<RecommendationRequest>,
}

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::error(message.into())))
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, serde_json::Value>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".into());
    status.insert("service".to_string(), "latentrec".into());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").into());
    status.insert("item_count".to_string(), state.store.item_count().into());
    status.insert("factor_dimension".to_string(), state.store.factor_dimension().into());

    Json(ApiResponse::success(status))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<ApiResponse<RecommendationResponse>>, ApiError> {
    validate_recommendation_request(&request, &state.config.recommendation, &state.store)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let response = state.serving_service.serve(&request);
    Ok(Json(ApiResponse::success(response)))
}

async fn get_batch_recommendations(
    State(state): State<AppState>,
    Json(batch): Json<BatchRecommendationRequest>,
) -> Result<Json<ApiResponse<Vec<RecommendationResponse>>>, ApiError> {
    validate_batch_size(batch.requests.len(), MAX_BATCH_SIZE)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    for (position, request) in batch.requests.iter().enumerate() {
        validate_recommendation_request(request, &state.config.recommendation, &state.store).map_err(|e| {
            api_error(StatusCode::BAD_REQUEST, format!("request {}: {}", position, e))
        })?;
    }

    // Parallel CPU work stays off the async workers.
    let service = state.serving_service.clone();
    let responses = tokio::task::spawn_blocking(move || service.serve_batch(&batch.requests))
        .await
        .map_err(|e| {
            tracing::error!("Batch recommendation task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "batch recommendation failed")
        })?;

    Ok(Json(ApiResponse::success(responses)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<ApiResponse<ItemDetails>>, ApiError> {
    let item_id = ItemId::from(item_id);
    state
        .serving_service
        .item_details(&item_id)
        .map(|details| Json(ApiResponse::success(details)))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("unknown item {}", item_id)))
}

async fn get_stats(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, u64>>> {
    Json(ApiResponse::success(state.serving_service.get_serving_stats()))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommendations", post(get_recommendations))
        .route("/recommendations/batch", post(get_batch_recommendations))
        .route("/items/:item_id", get(get_item))
        .route("/stats", get(get_stats))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
