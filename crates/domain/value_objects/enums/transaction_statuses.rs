use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Canonical payment state, independent of the gateway vocabulary.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Settled,
    Denied,
    Expired,
    Canceled,
    Refunded,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Settled => "settled",
            TransactionStatus::Denied => "denied",
            TransactionStatus::Expired => "expired",
            TransactionStatus::Canceled => "canceled",
            TransactionStatus::Refunded => "refunded",
            TransactionStatus::Failed => "failed",
        }
    }

    /// Every status except `Pending` is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Maps the gateway's `transaction_status` (and `fraud_status` for card
    /// captures) to a canonical status. Unrecognized values become `Failed`.
    pub fn from_provider(transaction_status: &str, fraud_status: Option<&str>) -> Self {
        match transaction_status.trim().to_ascii_lowercase().as_str() {
            "pending" => TransactionStatus::Pending,
            "settlement" => TransactionStatus::Settled,
            "capture" => match fraud_status.map(|f| f.trim().to_ascii_lowercase()) {
                Some(fraud) if fraud == "challenge" => TransactionStatus::Pending,
                Some(fraud) if fraud == "deny" => TransactionStatus::Denied,
                _ => TransactionStatus::Settled,
            },
            "deny" => TransactionStatus::Denied,
            "expire" => TransactionStatus::Expired,
            "cancel" => TransactionStatus::Canceled,
            "refund" | "partial_refund" => TransactionStatus::Refunded,
            "failure" => TransactionStatus::Failed,
            _ => TransactionStatus::Failed,
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(TransactionStatus::Pending),
            "settled" => Ok(TransactionStatus::Settled),
            "denied" => Ok(TransactionStatus::Denied),
            "expired" => Ok(TransactionStatus::Expired),
            "canceled" => Ok(TransactionStatus::Canceled),
            "refunded" => Ok(TransactionStatus::Refunded),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("Unknown transaction status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settlement_maps_to_settled() {
        assert_eq!(
            TransactionStatus::from_provider("settlement", None),
            TransactionStatus::Settled
        );
    }

    #[test]
    fn capture_depends_on_fraud_status() {
        assert_eq!(
            TransactionStatus::from_provider("capture", Some("accept")),
            TransactionStatus::Settled
        );
        assert_eq!(
            TransactionStatus::from_provider("capture", Some("challenge")),
            TransactionStatus::Pending
        );
        assert_eq!(
            TransactionStatus::from_provider("capture", None),
            TransactionStatus::Settled
        );
    }

    #[test]
    fn unknown_provider_status_never_settles() {
        for raw in ["authorize", "", "SETTLED", "paid", "settlement_pending"] {
            assert_eq!(
                TransactionStatus::from_provider(raw, Some("accept")),
                TransactionStatus::Failed,
                "{raw}"
            );
        }
    }

    #[test]
    fn only_pending_is_not_terminal() {
        assert!(!TransactionStatus::Pending.is_terminal());
        for status in [
            TransactionStatus::Settled,
            TransactionStatus::Denied,
            TransactionStatus::Expired,
            TransactionStatus::Canceled,
            TransactionStatus::Refunded,
            TransactionStatus::Failed,
        ] {
            assert!(status.is_terminal());
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
    }
}
