use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use billing::{
    infra::db::postgres::postgres_connection::PgPoolSquad,
    payments::{method_registry::PaymentMethodRegistry, midtrans_client::MidtransClient},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    auth::JwtSecret,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::entitlements::EntitlementPolicy,
};

pub async fn start(
    config: Arc<DotEnvyConfig>,
    db_pool: Arc<PgPoolSquad>,
    registry: Arc<PaymentMethodRegistry>,
    gateway: Arc<MidtransClient>,
) -> Result<()> {
    let policy = EntitlementPolicy::new(config.entitlements.free_capabilities.iter().cloned());
    let entitlement_usecase = Arc::new(routers::entitlements::usecase(
        Arc::clone(&db_pool),
        policy,
    ));
    let order_usecase = Arc::new(routers::orders::usecase(
        Arc::clone(&db_pool),
        Arc::clone(&gateway),
        Arc::clone(&registry),
        config.payments.currency.clone(),
    ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/payment-methods",
            routers::payment_methods::routes(Arc::clone(&registry)),
        )
        .nest(
            "/api/v1/payments",
            routers::payments::routes(Arc::clone(&db_pool), Arc::clone(&gateway)),
        )
        .nest(
            "/api/v1/subscriptions",
            routers::subscriptions::routes(
                Arc::clone(&db_pool),
                Arc::clone(&order_usecase),
                Arc::clone(&entitlement_usecase),
            ),
        )
        .nest(
            "/api/v1/orders",
            routers::orders::routes(Arc::clone(&order_usecase)),
        )
        .nest(
            "/api/v1/entitlements",
            routers::entitlements::routes(Arc::clone(&entitlement_usecase)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(JwtSecret::new(
            config.auth.jwt_user_secret.clone(),
        )))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            config.backend_server.body_limit_bytes()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
