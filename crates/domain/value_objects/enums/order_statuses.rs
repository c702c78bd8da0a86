use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::transaction_statuses::TransactionStatus;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Settled,
    Failed,
    Expired,
    Canceled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Settled => "settled",
            OrderStatus::Failed => "failed",
            OrderStatus::Expired => "expired",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "pending" => OrderStatus::Pending,
            "settled" => OrderStatus::Settled,
            "expired" => OrderStatus::Expired,
            "canceled" => OrderStatus::Canceled,
            "refunded" => OrderStatus::Refunded,
            _ => OrderStatus::Failed,
        }
    }

    pub fn from_transaction_status(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => OrderStatus::Pending,
            TransactionStatus::Settled => OrderStatus::Settled,
            TransactionStatus::Expired => OrderStatus::Expired,
            TransactionStatus::Canceled => OrderStatus::Canceled,
            TransactionStatus::Refunded => OrderStatus::Refunded,
            TransactionStatus::Denied | TransactionStatus::Failed => OrderStatus::Failed,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
