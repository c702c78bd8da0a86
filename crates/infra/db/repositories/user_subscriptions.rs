use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{OptionalExtension, RunQueryDsl, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::user_subscriptions::UserSubscriptionEntity,
        repositories::user_subscriptions::UserSubscriptionRepository,
        value_objects::enums::transaction_statuses::TransactionStatus,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::user_subscriptions},
};

pub struct UserSubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserSubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserSubscriptionRepository for UserSubscriptionPostgres {
    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<UserSubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = user_subscriptions::table
            .filter(user_subscriptions::user_id.eq(user_id))
            .filter(user_subscriptions::is_active.eq(true))
            .filter(user_subscriptions::payment_status.eq(TransactionStatus::Settled.as_str()))
            .filter(user_subscriptions::starts_at.le(now))
            .filter(user_subscriptions::expires_at.gt(now))
            .order((
                user_subscriptions::starts_at.desc(),
                user_subscriptions::created_at.desc(),
                user_subscriptions::id.desc(),
            ))
            .select(UserSubscriptionEntity::as_select())
            .first::<UserSubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
