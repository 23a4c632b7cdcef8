use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::{BatchPredictionRequest, BatchPredictionResponse, PredictionRequest, PredictionResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn predict_single(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let features = request.features()?;
    let delta_count_pred = state.model.predict(&features);

    tracing::info!(chip_id = %request.chip_id, model = state.model.name(), delta_count_pred, "Prediction");

    Ok(Json(PredictionResponse { delta_count_pred }))
}

pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchPredictionRequest>,
) -> Result<Json<BatchPredictionResponse>, ApiError> {
    let features = request.records.iter().map(PredictionRequest::features).collect::<Result<Vec<_>, _>>()?;

    let predictions = state
        .model
        .predict_batch(&features)
        .into_iter()
        .map(|delta_count_pred| PredictionResponse { delta_count_pred })
        .collect::<Vec<_>>();

    tracing::info!(records = predictions.len(), model = state.model.name(), "Batch prediction");

    Ok(Json(BatchPredictionResponse { predictions }))
}
