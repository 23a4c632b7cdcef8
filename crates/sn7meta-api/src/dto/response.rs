use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok".to_string() }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub delta_count_pred: f64,
}

/// Predictions in request order
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BatchPredictionResponse {
    pub predictions: Vec<PredictionResponse>,
}
