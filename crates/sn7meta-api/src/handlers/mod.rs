mod health;
mod predict;

pub use health::health_check;
pub use predict::{predict_batch, predict_single};
