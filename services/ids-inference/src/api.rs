//! HTTP boundary: `/ml/predict` and `/ml/model_info`.

use crate::bundle::ModelInfo;
use crate::engine::InferenceEngine;
use crate::error::IdsError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, instrument};

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    /// Flow records keyed by feature name.
    pub records: Vec<Map<String, Value>>,
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub probabilities: Vec<f64>,
    pub labels: Vec<u8>,
    pub model_version: String,
}

#[derive(Debug)]
pub enum ApiError {
    Ids(IdsError),
    Internal(String),
}

impl From<IdsError> for ApiError {
    fn from(e: IdsError) -> Self { ApiError::Ids(e) }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ids(IdsError::SchemaMismatch(_) | IdsError::InvalidThreshold(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Ids(IdsError::NotFound { .. } | IdsError::MalformedName { .. } | IdsError::MissingArtifact { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Ids(e) => e.to_string(),
            ApiError::Internal(msg) => msg.clone(),
        };
        if status.is_server_error() {
            error!(%status, %detail, "request failed");
        }
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
}

// Artifact loads and scoring are blocking; keep them off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, IdsError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(res) => res.map_err(ApiError::from),
        Err(e) => Err(ApiError::Internal(format!("inference task failed: {e}"))),
    }
}

#[instrument(skip_all, fields(records = req.records.len()))]
pub async fn predict_handler(State(state): State<AppState>, Json(req): Json<PredictRequest>) -> Result<Json<PredictResponse>, ApiError> {
    let engine = state.engine.clone();
    let prediction = blocking(move || engine.predict_records(&req.records, req.threshold)).await?;
    Ok(Json(PredictResponse {
        model_version: prediction.version().to_string(),
        probabilities: prediction.probabilities,
        labels: prediction.labels,
    }))
}

#[instrument(skip_all)]
pub async fn model_info_handler(State(state): State<AppState>) -> Result<Json<ModelInfo>, ApiError> {
    let engine = state.engine.clone();
    Ok(Json(blocking(move || engine.model_info()).await?))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ml/predict", post(predict_handler))
        .route("/ml/model_info", get(model_info_handler))
        .with_state(state)
}
