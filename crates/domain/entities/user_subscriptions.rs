use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::user_subscriptions;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = user_subscriptions)]
pub struct UserSubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub order_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_subscriptions)]
pub struct InsertUserSubscriptionEntity {
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub order_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub payment_status: String,
}
