use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use billing::payments::method_registry::{MethodConfig, PaymentMethodRegistry};

use crate::usecases::errors::EngineError;

pub fn routes(registry: Arc<PaymentMethodRegistry>) -> Router {
    Router::new()
        .route("/", get(list_methods))
        .route("/types", get(list_types))
        .route("/types/:payment_type", get(list_by_type))
        .route("/channels/:channel", get(find_by_channel))
        .with_state(registry)
}

pub async fn list_methods(
    State(registry): State<Arc<PaymentMethodRegistry>>,
) -> Json<Vec<MethodConfig>> {
    Json(registry.list_methods().to_vec())
}

pub async fn list_types(State(registry): State<Arc<PaymentMethodRegistry>>) -> Json<Vec<String>> {
    Json(registry.list_types())
}

pub async fn list_by_type(
    State(registry): State<Arc<PaymentMethodRegistry>>,
    Path(payment_type): Path<String>,
) -> Json<Vec<MethodConfig>> {
    Json(registry.list_by_type(&payment_type))
}

pub async fn find_by_channel(
    State(registry): State<Arc<PaymentMethodRegistry>>,
    Path(channel): Path<String>,
) -> Result<Json<MethodConfig>, EngineError> {
    registry
        .find_by_channel(&channel)
        .cloned()
        .map(Json)
        .ok_or_else(|| EngineError::NotFound(format!("payment channel {} not found", channel)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = routes(Arc::new(PaymentMethodRegistry::bundled().unwrap()));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn channel_lookup() {
        let (status, body) = get_json("/channels/bca").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "bank_transfer");

        let (status, body) = get_json("/channels/ovo").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn types_are_listed_once() {
        let (status, body) = get_json("/types").await;
        assert_eq!(status, StatusCode::OK);

        let types: Vec<String> = serde_json::from_value(body).unwrap();
        assert_eq!(types.iter().filter(|t| *t == "bank_transfer").count(), 1);
        assert!(types.contains(&"cstore".to_string()));
    }
}
