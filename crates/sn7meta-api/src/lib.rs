pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod model;
pub mod router;
pub mod state;

pub use config::ApiConfig;
pub use model::{DeltaModel, LinearDeltaModel};
pub use router::create_router;
pub use state::AppState;
