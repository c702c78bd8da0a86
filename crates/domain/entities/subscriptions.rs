use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{subscription_plans, subscriptions};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub description: Option<String>,
    pub duration_days: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub name: String,
    pub price_minor: i64,
    pub description: Option<String>,
    pub duration_days: i32,
}

/// One capability row of a subscription tier. `value` is interpreted per capability.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plans)]
pub struct SubscriptionPlanEntity {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub name: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscription_plans)]
pub struct InsertSubscriptionPlanEntity {
    pub subscription_id: Uuid,
    pub name: String,
    pub value: String,
}
