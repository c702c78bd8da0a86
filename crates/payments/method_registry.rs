use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

const BUNDLED_METHODS: &str = include_str!("payment_methods.json");

/// One payable channel. `payment_type` is the gateway's `payment_type`,
/// `channel` selects the bank or store inside that type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub payment_type: String,
    pub channel: String,
    pub min_amount: i64,
    pub max_amount: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl MethodConfig {
    pub fn accepts_amount(&self, amount_minor: i64) -> bool {
        (self.min_amount..=self.max_amount).contains(&amount_minor)
    }
}

/// Immutable catalog of payment methods, built once at startup and shared.
#[derive(Debug, Clone)]
pub struct PaymentMethodRegistry {
    methods: Vec<MethodConfig>,
}

impl PaymentMethodRegistry {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_METHODS).context("bundled payment methods are invalid")
    }

    /// Reads `path` when given, otherwise the bundled catalog.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::bundled();
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payment methods from {}", path.display()))?;
        let registry = Self::from_json(&raw)
            .with_context(|| format!("invalid payment methods in {}", path.display()))?;

        info!(
            path = %path.display(),
            methods = registry.methods.len(),
            "payment methods: loaded override file"
        );

        Ok(registry)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let methods: Vec<MethodConfig> = serde_json::from_str(raw)?;
        Self::new(methods)
    }

    pub fn new(methods: Vec<MethodConfig>) -> Result<Self> {
        if methods.is_empty() {
            bail!("payment method list is empty");
        }

        let mut channels = HashSet::new();
        for method in &methods {
            if method.name.trim().is_empty()
                || method.payment_type.trim().is_empty()
                || method.channel.trim().is_empty()
            {
                bail!("payment method entries need a name, type and channel: {:?}", method);
            }
            if method.min_amount <= 0 || method.min_amount > method.max_amount {
                bail!(
                    "payment method {} has an invalid amount range {}..={}",
                    method.channel,
                    method.min_amount,
                    method.max_amount
                );
            }
            if !channels.insert(method.channel.as_str()) {
                bail!("duplicate payment channel {}", method.channel);
            }
        }

        Ok(Self { methods })
    }

    pub fn list_methods(&self) -> &[MethodConfig] {
        &self.methods
    }

    pub fn list_by_type(&self, payment_type: &str) -> Vec<MethodConfig> {
        self.methods
            .iter()
            .filter(|method| method.payment_type == payment_type)
            .cloned()
            .collect()
    }

    pub fn find_by_channel(&self, channel: &str) -> Option<&MethodConfig> {
        self.methods.iter().find(|method| method.channel == channel)
    }

    /// Distinct payment types in catalog order.
    pub fn list_types(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.methods
            .iter()
            .filter(|method| seen.insert(method.payment_type.as_str()))
            .map(|method| method.payment_type.clone())
            .collect()
    }
}
