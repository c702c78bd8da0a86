use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::user_subscriptions::UserSubscriptionEntity;

#[automock]
#[async_trait]
pub trait UserSubscriptionRepository {
    /// The single subscription in force at `now`: active, settled, started,
    /// not expired, most recent start first.
    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<UserSubscriptionEntity>>;
}
