use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::subscription_orders;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_orders)]
pub struct SubscriptionOrderEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub payment_transaction_id: Option<Uuid>,
    pub amount_minor: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscription_orders)]
pub struct InsertSubscriptionOrderEntity {
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub payment_transaction_id: Option<Uuid>,
    pub amount_minor: i64,
    pub status: String,
}
