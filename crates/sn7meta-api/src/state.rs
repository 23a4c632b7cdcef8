use std::sync::Arc;

use crate::model::DeltaModel;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn DeltaModel>,
}

impl AppState {
    pub fn new(model: Arc<dyn DeltaModel>) -> Self {
        Self { model }
    }
}
