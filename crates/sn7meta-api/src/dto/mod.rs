mod request;
mod response;

pub use request::{BatchPredictionRequest, PredictionRequest};
pub use response::{BatchPredictionResponse, HealthResponse, PredictionResponse};
