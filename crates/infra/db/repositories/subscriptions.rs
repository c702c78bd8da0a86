use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    OptionalExtension, RunQueryDsl, insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{subscription_plans, subscriptions},
    },
};
use domain::{
    entities::subscriptions::{
        InsertSubscriptionEntity, InsertSubscriptionPlanEntity, SubscriptionEntity,
        SubscriptionPlanEntity,
    },
    repositories::subscriptions::SubscriptionRepository,
    value_objects::subscriptions::InsertOutcome,
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .order((subscriptions::price_minor.asc(), subscriptions::name.asc()))
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::id.eq(subscription_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn create_subscription(&self, subscription: InsertSubscriptionEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription_id = insert_into(subscriptions::table)
            .values(&subscription)
            .returning(subscriptions::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(subscription_id)
    }

    async fn list_plans(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionPlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscription_plans::table
            .filter(subscription_plans::subscription_id.eq(subscription_id))
            .order(subscription_plans::name.asc())
            .select(SubscriptionPlanEntity::as_select())
            .load::<SubscriptionPlanEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_plan(
        &self,
        subscription_id: Uuid,
        name: &str,
    ) -> Result<Option<SubscriptionPlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_plans::table
            .filter(subscription_plans::subscription_id.eq(subscription_id))
            .filter(subscription_plans::name.eq(name))
            .select(SubscriptionPlanEntity::as_select())
            .first::<SubscriptionPlanEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn add_plan(&self, plan: InsertSubscriptionPlanEntity) -> Result<InsertOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(subscription_plans::table)
            .values(&plan)
            .returning(subscription_plans::id)
            .get_result::<Uuid>(&mut conn);

        match result {
            Ok(plan_id) => Ok(InsertOutcome::Inserted(plan_id)),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(err) => Err(err.into()),
        }
    }
}
