use std::env;
use tracing::Level;
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) stage: String,
    pub(crate) component: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AlertConfig {
    pub(crate) webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service: ServiceContext,
    pub(crate) alerts: Option<AlertConfig>,
    /// Logged once tracing is up.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(component: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let component = component.trim().to_string();
        let mut warnings = Vec::new();

        let service = ServiceContext {
            service_name: value("SERVICE_NAME").unwrap_or_else(|| component.clone()),
            stage: value("STAGE").unwrap_or_else(|| "local".to_string()),
            component,
        };

        let webhook_url = value("ALERT_WEBHOOK_URL").and_then(|raw| match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(err) => {
                // The URL embeds a token, so only the parse error is reported.
                warnings.push(format!(
                    "ALERT_WEBHOOK_URL is invalid ({err}); operator alerts disabled"
                ));
                None
            }
        });

        let min_level = match value("ALERT_MIN_LEVEL") {
            None => Level::ERROR,
            Some(raw) => parse_level(&raw).unwrap_or_else(|| {
                warnings.push(format!("ALERT_MIN_LEVEL {raw:?} is not a level; using error"));
                Level::ERROR
            }),
        };

        Self {
            service,
            alerts: webhook_url.map(|webhook_url| AlertConfig {
                webhook_url,
                min_level,
            }),
            warnings,
        }
    }
}

fn parse_level(input: &str) -> Option<Level> {
    match input.to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        _ => None,
    }
}
