use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{
        InsertSubscriptionEntity, InsertSubscriptionPlanEntity, SubscriptionEntity,
        SubscriptionPlanEntity,
    },
    value_objects::subscriptions::InsertOutcome,
};

#[automock]
#[async_trait]
pub trait SubscriptionRepository {
    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionEntity>>;

    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    async fn create_subscription(&self, subscription: InsertSubscriptionEntity) -> Result<Uuid>;

    async fn list_plans(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionPlanEntity>>;

    async fn find_plan(
        &self,
        subscription_id: Uuid,
        name: &str,
    ) -> Result<Option<SubscriptionPlanEntity>>;

    /// `Duplicate` when the tier already has a plan with this name.
    async fn add_plan(&self, plan: InsertSubscriptionPlanEntity) -> Result<InsertOutcome>;
}
