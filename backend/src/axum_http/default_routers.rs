use axum::response::IntoResponse;
use tracing::{debug, info};

use crate::usecases::errors::EngineError;

pub async fn not_found() -> impl IntoResponse {
    info!("backend router: not_found handler invoked");
    EngineError::NotFound("route not found".to_string())
}

pub async fn health_check() -> impl IntoResponse {
    debug!("backend router: health_check handler invoked");
    "OK"
}
