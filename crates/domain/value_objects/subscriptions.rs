use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{
    subscriptions::{SubscriptionEntity, SubscriptionPlanEntity},
    user_subscriptions::UserSubscriptionEntity,
};

/// Insert result for tables guarded by a unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Uuid),
    Duplicate,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionPlanDto {
    pub id: Uuid,
    pub name: String,
    pub value: String,
}

impl From<SubscriptionPlanEntity> for SubscriptionPlanDto {
    fn from(value: SubscriptionPlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            value: value.value,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub description: Option<String>,
    pub duration_days: i32,
    pub plans: Vec<SubscriptionPlanDto>,
}

impl SubscriptionDto {
    pub fn from_parts(subscription: SubscriptionEntity, plans: Vec<SubscriptionPlanEntity>) -> Self {
        Self {
            id: subscription.id,
            name: subscription.name,
            price_minor: subscription.price_minor,
            description: subscription.description,
            duration_days: subscription.duration_days,
            plans: plans.into_iter().map(SubscriptionPlanDto::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub name: String,
    pub price_minor: i64,
    pub description: Option<String>,
    pub duration_days: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionPlanRequest {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActiveSubscriptionDto {
    pub subscription_id: Uuid,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub plans: Vec<SubscriptionPlanDto>,
}

impl ActiveSubscriptionDto {
    pub fn from_parts(
        active: UserSubscriptionEntity,
        subscription: SubscriptionEntity,
        plans: Vec<SubscriptionPlanEntity>,
    ) -> Self {
        Self {
            subscription_id: subscription.id,
            name: subscription.name,
            starts_at: active.starts_at,
            expires_at: active.expires_at,
            plans: plans.into_iter().map(SubscriptionPlanDto::from).collect(),
        }
    }
}
