use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: AuthSecret,
    pub gateway: Gateway,
    pub payments: Payments,
    pub entitlements: Entitlements,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// Seconds
    pub timeout: u64,
}

impl BackendServer {
    pub fn body_limit_bytes(&self) -> Result<usize> {
        self.body_limit
            .checked_mul(1024 * 1024)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .with_context(|| format!("SERVER_BODY_LIMIT {} MiB is too large", self.body_limit))
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthSecret {
    pub jwt_user_secret: String,
}

#[derive(Debug, Clone)]
pub struct Gateway {
    pub server_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Payments {
    pub currency: String,
    pub methods_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Entitlements {
    pub free_capabilities: Vec<String>,
}
