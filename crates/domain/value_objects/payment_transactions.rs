use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::payment_transactions::{PaymentTransactionEntity, UpdatePaymentTransactionEntity},
    value_objects::enums::transaction_statuses::TransactionStatus,
};

/// Fields carried by one gateway notification. Absent fields never overwrite stored values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdateModel {
    pub status: Option<TransactionStatus>,
    pub fraud_status: Option<String>,
    pub transaction_time: Option<DateTime<Utc>>,
    pub settlement_time: Option<DateTime<Utc>>,
    pub expiry_time: Option<DateTime<Utc>>,
    pub signature_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeDecision {
    Apply(UpdatePaymentTransactionEntity),
    NoChange,
    RejectTerminal {
        current: TransactionStatus,
        attempted: TransactionStatus,
    },
}

/// Result of applying an update under the row lock.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionUpdateOutcome {
    Applied(PaymentTransactionEntity),
    Unchanged(PaymentTransactionEntity),
    RejectedTerminal {
        transaction: PaymentTransactionEntity,
        attempted: TransactionStatus,
    },
    NotFound,
}

impl PaymentTransactionEntity {
    /// Stored status. A value this build does not know is treated as `Failed`
    /// so it stays terminal.
    pub fn canonical_status(&self) -> TransactionStatus {
        self.status.parse().unwrap_or(TransactionStatus::Failed)
    }
}

impl TransactionUpdateModel {
    /// Decides which fields of `current` this update may change.
    ///
    /// A pending transaction takes every present field that differs. A terminal
    /// transaction keeps its status; only the settlement time (for settled
    /// transactions) and the signature key may be filled in when still empty.
    pub fn merge_into(&self, current: &PaymentTransactionEntity, now: DateTime<Utc>) -> MergeDecision {
        let current_status = current.canonical_status();
        let mut changes = UpdatePaymentTransactionEntity::default();

        if current_status.is_terminal() {
            if let Some(attempted) = self.status {
                if attempted != current_status {
                    return MergeDecision::RejectTerminal {
                        current: current_status,
                        attempted,
                    };
                }
            }

            if current_status == TransactionStatus::Settled && current.settlement_time.is_none() {
                changes.settlement_time = self.settlement_time;
            }
            if current.signature_key.is_none() {
                changes.signature_key = self.signature_key.clone();
            }
        } else {
            changes.status = self
                .status
                .filter(|status| *status != current_status)
                .map(|status| status.to_string());
            changes.fraud_status = changed(&self.fraud_status, &current.fraud_status);
            changes.transaction_time = changed(&self.transaction_time, &current.transaction_time);
            changes.settlement_time = changed(&self.settlement_time, &current.settlement_time);
            changes.expiry_time = changed(&self.expiry_time, &current.expiry_time);
            changes.signature_key = changed(&self.signature_key, &current.signature_key);
        }

        if changes == UpdatePaymentTransactionEntity::default() {
            return MergeDecision::NoChange;
        }

        changes.updated_at = Some(now);
        MergeDecision::Apply(changes)
    }
}

fn changed<T: Clone + PartialEq>(incoming: &Option<T>, stored: &Option<T>) -> Option<T> {
    match incoming {
        Some(value) if stored.as_ref() != Some(value) => Some(value.clone()),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentTransactionModel {
    pub id: Uuid,
    pub transaction_id: Option<String>,
    pub payment_type: String,
    pub payment_channel: String,
    pub fraud_status: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub status: TransactionStatus,
    pub transaction_time: Option<DateTime<Utc>>,
    pub settlement_time: Option<DateTime<Utc>>,
    pub expiry_time: Option<DateTime<Utc>>,
}

impl From<PaymentTransactionEntity> for PaymentTransactionModel {
    fn from(entity: PaymentTransactionEntity) -> Self {
        Self {
            status: entity.canonical_status(),
            id: entity.id,
            transaction_id: entity.transaction_id,
            payment_type: entity.payment_type,
            payment_channel: entity.payment_channel,
            fraud_status: entity.fraud_status,
            amount_minor: entity.amount_minor,
            currency: entity.currency,
            transaction_time: entity.transaction_time,
            settlement_time: entity.settlement_time,
            expiry_time: entity.expiry_time,
        }
    }
}
