use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::subscription_orders::{InsertSubscriptionOrderEntity, SubscriptionOrderEntity},
    value_objects::{
        enums::order_statuses::OrderStatus, subscription_orders::OrderCompletion,
        subscriptions::InsertOutcome,
    },
};

#[automock]
#[async_trait]
pub trait SubscriptionOrderRepository {
    /// `Duplicate` when the user already has a pending order for the tier.
    async fn create_order(&self, order: InsertSubscriptionOrderEntity) -> Result<InsertOutcome>;

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<SubscriptionOrderEntity>>;

    /// Settled order whose granted subscription has not expired yet.
    async fn find_active_order(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionOrderEntity>>;

    async fn find_pending_order(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<Option<SubscriptionOrderEntity>>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SubscriptionOrderEntity>>;

    /// Moves the pending order linked to `payment_transaction_id` to `status`
    /// and, when settled, grants the user subscription in the same database
    /// transaction.
    async fn complete_for_transaction(
        &self,
        payment_transaction_id: Uuid,
        status: OrderStatus,
        settled_at: DateTime<Utc>,
    ) -> Result<OrderCompletion>;
}
