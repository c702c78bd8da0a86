use anyhow::{Result, bail};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::subscription_orders::SubscriptionOrderEntity,
    value_objects::{
        enums::order_statuses::OrderStatus, payment_transactions::PaymentTransactionModel,
    },
};

/// Result of finishing the order linked to a terminal transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderCompletion {
    /// The order moved out of `pending` in this call.
    Completed(SubscriptionOrderEntity),
    /// An earlier delivery already finished it.
    AlreadyCompleted(SubscriptionOrderEntity),
    /// No order references the transaction.
    NoOrder,
}

/// Coverage window granted by a settled order: `duration_days` from
/// settlement. Subscribe refuses while the tier is still running, so a
/// settled order never overlaps live coverage of the same tier.
pub fn subscription_window(
    settled_at: DateTime<Utc>,
    duration_days: i32,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if duration_days <= 0 {
        bail!("subscription duration must be positive, got {} days", duration_days);
    }

    let Some(expires_at) = settled_at.checked_add_signed(Duration::days(duration_days.into()))
    else {
        bail!("subscription expiry overflows");
    };

    Ok((settled_at, expires_at))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionOrderModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub payment_transaction_id: Option<Uuid>,
    pub amount_minor: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionOrderEntity> for SubscriptionOrderModel {
    fn from(entity: SubscriptionOrderEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            subscription_id: entity.subscription_id,
            payment_transaction_id: entity.payment_transaction_id,
            amount_minor: entity.amount_minor,
            status: OrderStatus::from_str(&entity.status),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub payment_channel: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse<R> {
    pub order: SubscriptionOrderModel,
    pub transaction: PaymentTransactionModel,
    pub receipt: R,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settled_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn coverage_starts_at_settlement() {
        let (starts_at, expires_at) = subscription_window(settled_at(), 30).unwrap();

        assert_eq!(starts_at, settled_at());
        assert_eq!(expires_at, settled_at() + Duration::days(30));
    }

    #[test]
    fn overflowing_expiry_is_an_error() {
        assert!(subscription_window(DateTime::<Utc>::MAX_UTC, 1).is_err());
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        assert!(subscription_window(settled_at(), 0).is_err());
    }
}
