use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use billing::{
    domain::value_objects::subscription_orders::SubscriptionOrderModel,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            payment_transactions::PaymentTransactionPostgres,
            subscription_orders::SubscriptionOrderPostgres, subscriptions::SubscriptionPostgres,
            users::UserPostgres,
        },
    },
    payments::{method_registry::PaymentMethodRegistry, midtrans_client::MidtransClient},
};

use crate::{
    auth::AuthUser,
    usecases::{
        errors::EngineError, payments::ChargeUseCase,
        subscription_orders::SubscriptionOrderUseCase,
    },
};

pub type PgSubscriptionOrderUseCase = SubscriptionOrderUseCase<
    SubscriptionOrderPostgres,
    SubscriptionPostgres,
    UserPostgres,
    PaymentTransactionPostgres,
    MidtransClient,
>;

pub fn usecase(
    db_pool: Arc<PgPoolSquad>,
    gateway: Arc<MidtransClient>,
    registry: Arc<PaymentMethodRegistry>,
    currency: String,
) -> PgSubscriptionOrderUseCase {
    let transaction_repository = PaymentTransactionPostgres::new(Arc::clone(&db_pool));
    let charge_usecase = ChargeUseCase::new(Arc::new(transaction_repository), gateway, currency);

    SubscriptionOrderUseCase::new(
        Arc::new(SubscriptionOrderPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        Arc::new(charge_usecase),
        registry,
    )
}

pub fn routes(usecase: Arc<PgSubscriptionOrderUseCase>) -> Router {
    Router::new().route("/", get(list_orders)).with_state(usecase)
}

pub async fn list_orders(
    State(usecase): State<Arc<PgSubscriptionOrderUseCase>>,
    auth: AuthUser,
) -> Result<Json<Vec<SubscriptionOrderModel>>, EngineError> {
    usecase.list_orders(auth.user_id).await.map(Json)
}
