use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use billing::payments::midtrans_client::SANDBOX_BASE_URL;

use super::config_model::{
    AuthSecret, BackendServer, Database, DotEnvyConfig, Entitlements, Gateway, Payments,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DotEnvyConfig> {
    let env = Env { lookup };

    let backend_server = BackendServer {
        port: env.parsed("SERVER_PORT_BACKEND")?,
        body_limit: env.parsed("SERVER_BODY_LIMIT")?,
        timeout: env.parsed("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: env.required("DATABASE_URL")?,
        max_connections: env.parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
    };

    let auth = AuthSecret {
        jwt_user_secret: env.required("JWT_USER_SECRET")?,
    };

    let gateway = Gateway {
        server_key: env.required("GATEWAY_SERVER_KEY")?,
        base_url: env
            .optional("GATEWAY_BASE_URL")
            .unwrap_or_else(|| SANDBOX_BASE_URL.to_string()),
        timeout_secs: env.parsed_or("GATEWAY_TIMEOUT_SECS", 15)?,
    };

    backend_server.body_limit_bytes()?;

    // A request timeout shorter than the gateway call would drop the
    // response of a charge the gateway already accepted.
    if backend_server.timeout <= gateway.timeout_secs {
        bail!(
            "SERVER_TIMEOUT ({}s) must be greater than GATEWAY_TIMEOUT_SECS ({}s)",
            backend_server.timeout,
            gateway.timeout_secs
        );
    }

    let payments = Payments {
        currency: env
            .optional("PAYMENT_CURRENCY")
            .unwrap_or_else(|| "IDR".to_string()),
        methods_path: env.optional("PAYMENT_METHODS_PATH").map(PathBuf::from),
    };

    let entitlements = Entitlements {
        free_capabilities: env
            .optional("ENTITLEMENT_FREE_CAPABILITIES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        gateway,
        payments,
        entitlements,
    })
}

struct Env<F: Fn(&str) -> Option<String>> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .with_context(|| format!("{} is not set", key))
    }

    fn parsed<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.required(key)?
            .parse()
            .with_context(|| format!("{} is invalid", key))
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.optional(key) {
            Some(raw) => raw.parse().with_context(|| format!("{} is invalid", key)),
            None => Ok(default),
        }
    }
}
