use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    Connection, OptionalExtension, RunQueryDsl,
    insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{subscription_orders, subscriptions, user_subscriptions},
    },
};
use domain::{
    entities::{
        subscription_orders::{InsertSubscriptionOrderEntity, SubscriptionOrderEntity},
        user_subscriptions::InsertUserSubscriptionEntity,
    },
    repositories::subscription_orders::SubscriptionOrderRepository,
    value_objects::{
        enums::{order_statuses::OrderStatus, transaction_statuses::TransactionStatus},
        subscription_orders::{OrderCompletion, subscription_window},
        subscriptions::InsertOutcome,
    },
};

pub struct SubscriptionOrderPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionOrderPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionOrderRepository for SubscriptionOrderPostgres {
    async fn create_order(&self, order: InsertSubscriptionOrderEntity) -> Result<InsertOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(subscription_orders::table)
            .values(&order)
            .returning(subscription_orders::id)
            .get_result::<Uuid>(&mut conn);

        match result {
            Ok(order_id) => Ok(InsertOutcome::Inserted(order_id)),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<SubscriptionOrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let order = subscription_orders::table
            .filter(subscription_orders::id.eq(order_id))
            .select(SubscriptionOrderEntity::as_select())
            .first::<SubscriptionOrderEntity>(&mut conn)
            .optional()?;

        Ok(order)
    }

    async fn find_active_order(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionOrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let order = subscription_orders::table
            .inner_join(
                user_subscriptions::table
                    .on(user_subscriptions::order_id.eq(subscription_orders::id.nullable())),
            )
            .filter(subscription_orders::user_id.eq(user_id))
            .filter(subscription_orders::subscription_id.eq(subscription_id))
            .filter(subscription_orders::status.eq(OrderStatus::Settled.as_str()))
            .filter(user_subscriptions::is_active.eq(true))
            .filter(user_subscriptions::expires_at.gt(now))
            .order(subscription_orders::created_at.desc())
            .select(SubscriptionOrderEntity::as_select())
            .first::<SubscriptionOrderEntity>(&mut conn)
            .optional()?;

        Ok(order)
    }

    async fn find_pending_order(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> Result<Option<SubscriptionOrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let order = subscription_orders::table
            .filter(subscription_orders::user_id.eq(user_id))
            .filter(subscription_orders::subscription_id.eq(subscription_id))
            .filter(subscription_orders::status.eq(OrderStatus::Pending.as_str()))
            .select(SubscriptionOrderEntity::as_select())
            .first::<SubscriptionOrderEntity>(&mut conn)
            .optional()?;

        Ok(order)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SubscriptionOrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let orders = subscription_orders::table
            .filter(subscription_orders::user_id.eq(user_id))
            .order(subscription_orders::created_at.desc())
            .select(SubscriptionOrderEntity::as_select())
            .load::<SubscriptionOrderEntity>(&mut conn)?;

        Ok(orders)
    }

    async fn complete_for_transaction(
        &self,
        payment_transaction_id: Uuid,
        status: OrderStatus,
        settled_at: DateTime<Utc>,
    ) -> Result<OrderCompletion> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let completion = conn.transaction::<OrderCompletion, anyhow::Error, _>(|tx| {
            let order = subscription_orders::table
                .filter(subscription_orders::payment_transaction_id.eq(payment_transaction_id))
                .select(SubscriptionOrderEntity::as_select())
                .for_update()
                .first::<SubscriptionOrderEntity>(tx)
                .optional()?;

            let Some(order) = order else {
                return Ok(OrderCompletion::NoOrder);
            };

            if order.status != OrderStatus::Pending.as_str() || status == OrderStatus::Pending {
                return Ok(OrderCompletion::AlreadyCompleted(order));
            }

            let completed = diesel::update(subscription_orders::table.find(order.id))
                .set((
                    subscription_orders::status.eq(status.as_str()),
                    subscription_orders::updated_at.eq(Utc::now()),
                ))
                .returning(SubscriptionOrderEntity::as_returning())
                .get_result::<SubscriptionOrderEntity>(tx)?;

            if status == OrderStatus::Settled {
                let duration_days = subscriptions::table
                    .find(order.subscription_id)
                    .select(subscriptions::duration_days)
                    .first::<i32>(tx)?;

                let (starts_at, expires_at) = subscription_window(settled_at, duration_days)?;

                insert_into(user_subscriptions::table)
                    .values(&InsertUserSubscriptionEntity {
                        user_id: order.user_id,
                        subscription_id: order.subscription_id,
                        order_id: Some(order.id),
                        starts_at,
                        expires_at,
                        is_active: true,
                        payment_status: TransactionStatus::Settled.to_string(),
                    })
                    .execute(tx)?;
            }

            Ok(OrderCompletion::Completed(completed))
        })?;

        Ok(completion)
    }
}
