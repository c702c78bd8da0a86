use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    NoActiveSubscription,
    LimitReached { limit: i64, current: i64 },
    UnknownCapability(String),
    InvalidPlanLimit(String),
}

impl Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::NoActiveSubscription => f.write_str("no active subscription"),
            DenyReason::LimitReached { .. } => f.write_str("limit reached"),
            DenyReason::UnknownCapability(_) => f.write_str("unknown capability"),
            DenyReason::InvalidPlanLimit(_) => f.write_str("invalid plan limit"),
        }
    }
}

/// Outcome of an entitlement check. A denial is an expected result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementDecision {
    Allow,
    Deny(DenyReason),
}

impl EntitlementDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, EntitlementDecision::Allow)
    }
}

#[derive(Debug, Deserialize)]
pub struct EntitlementCheckRequest {
    pub capability: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EntitlementCheckResponse {
    pub capability: String,
    pub allowed: bool,
    pub reason: Option<String>,
}

impl EntitlementCheckResponse {
    pub fn new(capability: String, decision: &EntitlementDecision) -> Self {
        match decision {
            EntitlementDecision::Allow => Self {
                capability,
                allowed: true,
                reason: None,
            },
            EntitlementDecision::Deny(reason) => Self {
                capability,
                allowed: false,
                reason: Some(reason.to_string()),
            },
        }
    }
}
