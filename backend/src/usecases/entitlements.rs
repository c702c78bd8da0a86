use std::{collections::HashSet, sync::Arc};

use billing::domain::{
    repositories::{
        resource_counts::ResourceCountRepository, subscriptions::SubscriptionRepository,
        user_subscriptions::UserSubscriptionRepository, users::UserRepository,
    },
    value_objects::{
        entitlements::{DenyReason, EntitlementDecision},
        enums::{
            capabilities::{Capability, ResourceKind},
            user_roles::UserRole,
        },
        subscriptions::ActiveSubscriptionDto,
    },
};
use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::errors::{EngineError, EngineResult};

/// Capabilities granted to every user, subscribed or not.
#[derive(Debug, Clone, Default)]
pub struct EntitlementPolicy {
    free_capabilities: HashSet<String>,
}

impl EntitlementPolicy {
    pub fn new<I, T>(free_capabilities: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            free_capabilities: free_capabilities
                .into_iter()
                .map(Into::into)
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn is_free(&self, capability: &str) -> bool {
        self.free_capabilities.contains(capability)
    }
}

pub struct EntitlementUseCase<U, A, S, R>
where
    U: UserRepository + Send + Sync + 'static,
    A: UserSubscriptionRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ResourceCountRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    user_subscription_repo: Arc<A>,
    subscription_repo: Arc<S>,
    resource_count_repo: Arc<R>,
    policy: EntitlementPolicy,
}

impl<U, A, S, R> EntitlementUseCase<U, A, S, R>
where
    U: UserRepository + Send + Sync + 'static,
    A: UserSubscriptionRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ResourceCountRepository + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        user_subscription_repo: Arc<A>,
        subscription_repo: Arc<S>,
        resource_count_repo: Arc<R>,
        policy: EntitlementPolicy,
    ) -> Self {
        Self {
            user_repo,
            user_subscription_repo,
            subscription_repo,
            resource_count_repo,
            policy,
        }
    }

    /// Decides whether `user_id` may use one more unit of `capability`.
    ///
    /// Capabilities the active plan does not mention are unrestricted. A plan
    /// row for a capability without a counting rule, or with a limit that is
    /// not a non-negative integer, denies. The count and the caller's later
    /// create are not atomic, so concurrent creates can overshoot a limit by
    /// the number of racing requests; every later check denies until the
    /// count drops below the limit again.
    pub async fn authorize(
        &self,
        user_id: Uuid,
        capability: &str,
    ) -> EngineResult<EntitlementDecision> {
        let capability = capability.trim();

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "entitlements: failed to load user");
                EngineError::Internal(err)
            })?
            .ok_or_else(|| EngineError::NotFound("user not found".to_string()))?;

        if UserRole::from_str(&user.role) == UserRole::Admin {
            debug!(%user_id, capability, "entitlements: admin bypass");
            return Ok(EntitlementDecision::Allow);
        }

        let active = self
            .user_subscription_repo
            .find_active_for_user(user_id, Utc::now())
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "entitlements: failed to load active subscription");
                EngineError::Internal(err)
            })?;

        let Some(active) = active else {
            if self.policy.is_free(capability) {
                return Ok(EntitlementDecision::Allow);
            }
            info!(%user_id, capability, "entitlements: denied, no active subscription");
            return Ok(EntitlementDecision::Deny(DenyReason::NoActiveSubscription));
        };

        let plan = self
            .subscription_repo
            .find_plan(active.subscription_id, capability)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    subscription_id = %active.subscription_id,
                    db_error = ?err,
                    "entitlements: failed to load plan"
                );
                EngineError::Internal(err)
            })?;

        let Some(plan) = plan else {
            return Ok(EntitlementDecision::Allow);
        };

        let Some(known) = Capability::from_key(capability) else {
            info!(%user_id, capability, "entitlements: denied, capability has no counting rule");
            return Ok(EntitlementDecision::Deny(DenyReason::UnknownCapability(
                capability.to_string(),
            )));
        };

        let limit = match plan.value.trim().parse::<i64>() {
            Ok(limit) if limit >= 0 => limit,
            _ => {
                error!(
                    plan_id = %plan.id,
                    value = %plan.value,
                    "entitlements: denied, plan limit is not a non-negative integer"
                );
                return Ok(EntitlementDecision::Deny(DenyReason::InvalidPlanLimit(
                    plan.value,
                )));
            }
        };

        let current = self.count_usage(user_id, known.resource_kind()).await?;

        if current >= limit {
            info!(%user_id, capability, limit, current, "entitlements: denied, limit reached");
            return Ok(EntitlementDecision::Deny(DenyReason::LimitReached {
                limit,
                current,
            }));
        }

        Ok(EntitlementDecision::Allow)
    }

    pub async fn active_subscription(
        &self,
        user_id: Uuid,
    ) -> EngineResult<Option<ActiveSubscriptionDto>> {
        let active = self
            .user_subscription_repo
            .find_active_for_user(user_id, Utc::now())
            .await
            .map_err(EngineError::Internal)?;

        let Some(active) = active else {
            return Ok(None);
        };

        let subscription = self
            .subscription_repo
            .find_by_id(active.subscription_id)
            .await
            .map_err(EngineError::Internal)?
            .ok_or_else(|| {
                EngineError::Internal(anyhow::anyhow!(
                    "active subscription {} points at a missing tier",
                    active.id
                ))
            })?;
        let plans = self
            .subscription_repo
            .list_plans(subscription.id)
            .await
            .map_err(EngineError::Internal)?;

        Ok(Some(ActiveSubscriptionDto::from_parts(
            active,
            subscription,
            plans,
        )))
    }

    async fn count_usage(&self, user_id: Uuid, kind: ResourceKind) -> EngineResult<i64> {
        let merchant_ids = self
            .user_repo
            .find_merchant_ids(user_id)
            .await
            .map_err(EngineError::Internal)?;

        let count = match kind {
            ResourceKind::Products => self.resource_count_repo.count_products(merchant_ids).await,
            ResourceKind::Categories => {
                self.resource_count_repo.count_categories(merchant_ids).await
            }
        };

        count.map_err(|err| {
            error!(%user_id, ?kind, db_error = ?err, "entitlements: failed to count resources");
            EngineError::Internal(err)
        })
    }
}
