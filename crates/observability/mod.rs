//! Process-wide tracing setup with optional operator alerts.
mod config;
mod dispatcher;
mod layer;
mod webhook;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt::time::ChronoLocal, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use config::ObservabilityConfig;
use dispatcher::AlertDispatcher;
use layer::AlertLayer;
use webhook::ChatWebhookSink;

/// Installs the global subscriber. Must run inside a tokio runtime when
/// `ALERT_WEBHOOK_URL` is set, since alert delivery is a spawned task.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let alert_layer = match config.alerts.as_ref() {
        Some(alerts) => {
            let sink = ChatWebhookSink::new(alerts.webhook_url.clone())?;
            let dispatcher = AlertDispatcher::spawn(vec![Arc::new(sink)]);
            Some(
                AlertLayer::new(dispatcher, config.service.clone(), alerts.min_level)
                    .with_filter(LevelFilter::from_level(alerts.min_level)),
            )
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_timer(ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config.warnings {
        warn!(component = %config.service.component, %warning, "observability: config warning");
    }

    info!(
        service = %config.service.service_name,
        stage = %config.service.stage,
        component = %config.service.component,
        alerts = config.alerts.is_some(),
        "observability: tracing initialized"
    );

    Ok(())
}
