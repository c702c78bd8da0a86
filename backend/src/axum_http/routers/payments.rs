use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use billing::{
    domain::repositories::{
        payment_transactions::PaymentTransactionRepository,
        subscription_orders::SubscriptionOrderRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            payment_transactions::PaymentTransactionPostgres,
            subscription_orders::SubscriptionOrderPostgres,
        },
    },
    payments::midtrans_client::MidtransClient,
};
use tracing::info;

use crate::usecases::{payments::PaymentGateway, webhook_reconciler::WebhookReconcilerUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>, gateway: Arc<MidtransClient>) -> Router {
    let transaction_repository = PaymentTransactionPostgres::new(Arc::clone(&db_pool));
    let order_repository = SubscriptionOrderPostgres::new(Arc::clone(&db_pool));
    let usecase = WebhookReconcilerUseCase::new(
        Arc::new(transaction_repository),
        Arc::new(order_repository),
        gateway,
    );

    notification_routes(Arc::new(usecase))
}

pub fn notification_routes<T, O, G>(usecase: Arc<WebhookReconcilerUseCase<T, O, G>>) -> Router
where
    T: PaymentTransactionRepository + Send + Sync + 'static,
    O: SubscriptionOrderRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    Router::new()
        .route("/notifications", post(notification::<T, O, G>))
        .with_state(usecase)
}

/// Gateway push endpoint. Duplicates and stale deliveries answer 200 so the
/// gateway stops retrying them.
pub async fn notification<T, O, G>(
    State(usecase): State<Arc<WebhookReconcilerUseCase<T, O, G>>>,
    body: Bytes,
) -> Response
where
    T: PaymentTransactionRepository + Send + Sync + 'static,
    O: SubscriptionOrderRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    info!(bytes = body.len(), "payments webhook: notification received");

    match usecase.apply_notification(&body).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}
