use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use billing::{
    domain::value_objects::{
        subscription_orders::SubscribeRequest,
        subscriptions::{
            ActiveSubscriptionDto, CreateSubscriptionPlanRequest, CreateSubscriptionRequest,
            SubscriptionDto,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{subscriptions::SubscriptionPostgres, users::UserPostgres},
    },
};
use serde_json::json;
use uuid::Uuid;

use super::{entitlements::PgEntitlementUseCase, orders::PgSubscriptionOrderUseCase};
use crate::{
    auth::AuthUser,
    usecases::{errors::EngineError, subscription_catalog::SubscriptionCatalogUseCase},
};

type PgCatalogUseCase = SubscriptionCatalogUseCase<SubscriptionPostgres, UserPostgres>;

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    order_usecase: Arc<PgSubscriptionOrderUseCase>,
    entitlement_usecase: Arc<PgEntitlementUseCase>,
) -> Router {
    let catalog_usecase = SubscriptionCatalogUseCase::new(
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
    );

    let catalog = Router::new()
        .route("/", get(list_subscriptions).post(create_subscription))
        .route("/:subscription_id", get(find_subscription))
        .route("/:subscription_id/plans", post(add_plan))
        .with_state(Arc::new(catalog_usecase));

    let ordering = Router::new()
        .route("/:subscription_id/subscribe", post(subscribe))
        .with_state(order_usecase);

    let current = Router::new()
        .route("/current", get(current_subscription))
        .with_state(entitlement_usecase);

    catalog.merge(ordering).merge(current)
}

pub async fn list_subscriptions(
    State(usecase): State<Arc<PgCatalogUseCase>>,
) -> Result<Json<Vec<SubscriptionDto>>, EngineError> {
    usecase.list_subscriptions().await.map(Json)
}

pub async fn find_subscription(
    State(usecase): State<Arc<PgCatalogUseCase>>,
    Path(subscription_id): Path<Uuid>,
) -> Result<Json<SubscriptionDto>, EngineError> {
    usecase.find_subscription(subscription_id).await.map(Json)
}

pub async fn create_subscription(
    State(usecase): State<Arc<PgCatalogUseCase>>,
    auth: AuthUser,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let id = usecase.create_subscription(auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn add_plan(
    State(usecase): State<Arc<PgCatalogUseCase>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
    Json(request): Json<CreateSubscriptionPlanRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let id = usecase
        .add_plan(auth.user_id, subscription_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn subscribe(
    State(usecase): State<Arc<PgSubscriptionOrderUseCase>>,
    auth: AuthUser,
    Path(subscription_id): Path<Uuid>,
    Json(request): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let response = usecase
        .subscribe(auth.user_id, subscription_id, &request.payment_channel)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn current_subscription(
    State(usecase): State<Arc<PgEntitlementUseCase>>,
    auth: AuthUser,
) -> Result<Json<Option<ActiveSubscriptionDto>>, EngineError> {
    usecase.active_subscription(auth.user_id).await.map(Json)
}
