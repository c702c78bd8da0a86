use std::{sync::Arc, time::Duration};

use anyhow::Result;
use backend::{axum_http::http_serve, config::config_loader};
use billing::{
    infra::db::postgres::postgres_connection,
    payments::{method_registry::PaymentMethodRegistry, midtrans_client::MidtransClient},
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    billing::observability::init_observability("backend")?;

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let registry = PaymentMethodRegistry::load(dotenvy_env.payments.methods_path.as_deref())?;
    info!(
        methods = registry.list_methods().len(),
        "Payment method catalog has been loaded"
    );

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.max_connections,
    )?;
    info!("Postgres connection has been established");

    let gateway = MidtransClient::new(
        dotenvy_env.gateway.server_key.clone(),
        &dotenvy_env.gateway.base_url,
        Duration::from_secs(dotenvy_env.gateway.timeout_secs),
    )?;

    http_serve::start(
        Arc::new(dotenvy_env),
        Arc::new(postgres_pool),
        Arc::new(registry),
        Arc::new(gateway),
    )
    .await?;

    Ok(())
}
