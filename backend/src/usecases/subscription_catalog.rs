use std::sync::Arc;

use billing::domain::{
    entities::subscriptions::{
        InsertSubscriptionEntity, InsertSubscriptionPlanEntity, SubscriptionPlanEntity,
    },
    repositories::{subscriptions::SubscriptionRepository, users::UserRepository},
    value_objects::{
        enums::{capabilities::Capability, user_roles::UserRole},
        subscriptions::{
            CreateSubscriptionPlanRequest, CreateSubscriptionRequest, InsertOutcome,
            SubscriptionDto,
        },
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::errors::{EngineError, EngineResult};

pub struct SubscriptionCatalogUseCase<S, U>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    user_repo: Arc<U>,
}

impl<S, U> SubscriptionCatalogUseCase<S, U>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, user_repo: Arc<U>) -> Self {
        Self {
            subscription_repo,
            user_repo,
        }
    }

    pub async fn list_subscriptions(&self) -> EngineResult<Vec<SubscriptionDto>> {
        let subscriptions = self
            .subscription_repo
            .list_subscriptions()
            .await
            .map_err(|err| {
                error!(db_error = ?err, "catalog: failed to list subscriptions");
                EngineError::Internal(err)
            })?;

        let mut result = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            let plans = self.load_plans(subscription.id).await?;
            result.push(SubscriptionDto::from_parts(subscription, plans));
        }

        Ok(result)
    }

    pub async fn find_subscription(&self, subscription_id: Uuid) -> EngineResult<SubscriptionDto> {
        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "catalog: failed to load subscription");
                EngineError::Internal(err)
            })?
            .ok_or_else(|| EngineError::NotFound("subscription not found".to_string()))?;

        let plans = self.load_plans(subscription_id).await?;
        Ok(SubscriptionDto::from_parts(subscription, plans))
    }

    pub async fn create_subscription(
        &self,
        actor_id: Uuid,
        request: CreateSubscriptionRequest,
    ) -> EngineResult<Uuid> {
        self.ensure_admin(actor_id).await?;

        let name = request.name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("name is required".to_string()));
        }
        if request.price_minor <= 0 {
            return Err(EngineError::Validation(
                "price must be greater than zero".to_string(),
            ));
        }
        if request.duration_days <= 0 {
            return Err(EngineError::Validation(
                "duration_days must be greater than zero".to_string(),
            ));
        }

        let subscription_id = self
            .subscription_repo
            .create_subscription(InsertSubscriptionEntity {
                name: name.to_string(),
                price_minor: request.price_minor,
                description: request.description,
                duration_days: request.duration_days,
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "catalog: failed to create subscription");
                EngineError::Internal(err)
            })?;

        info!(%subscription_id, %actor_id, "catalog: subscription created");
        Ok(subscription_id)
    }

    pub async fn add_plan(
        &self,
        actor_id: Uuid,
        subscription_id: Uuid,
        request: CreateSubscriptionPlanRequest,
    ) -> EngineResult<Uuid> {
        self.ensure_admin(actor_id).await?;

        let name = request.name.trim().to_string();
        let value = request.value.trim().to_string();
        if name.is_empty() || value.is_empty() {
            return Err(EngineError::Validation(
                "plan name and value are required".to_string(),
            ));
        }

        match Capability::from_key(&name) {
            Some(_) => {
                if !value.parse::<i64>().is_ok_and(|limit| limit >= 0) {
                    return Err(EngineError::Validation(format!(
                        "{} limit must be a non-negative integer",
                        name
                    )));
                }
            }
            None => warn!(
                %subscription_id,
                capability = %name,
                "catalog: plan names an unknown capability; checks against it will deny"
            ),
        }

        self.ensure_subscription_exists(subscription_id).await?;

        let outcome = self
            .subscription_repo
            .add_plan(InsertSubscriptionPlanEntity {
                subscription_id,
                name: name.clone(),
                value,
            })
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "catalog: failed to add plan");
                EngineError::Internal(err)
            })?;

        match outcome {
            InsertOutcome::Inserted(plan_id) => {
                info!(%subscription_id, %plan_id, capability = %name, "catalog: plan added");
                Ok(plan_id)
            }
            InsertOutcome::Duplicate => Err(EngineError::Conflict(format!(
                "plan {} already exists for this subscription",
                name
            ))),
        }
    }

    async fn ensure_subscription_exists(&self, subscription_id: Uuid) -> EngineResult<()> {
        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(EngineError::Internal)?;

        match subscription {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound("subscription not found".to_string())),
        }
    }

    async fn load_plans(
        &self,
        subscription_id: Uuid,
    ) -> EngineResult<Vec<SubscriptionPlanEntity>> {
        self.subscription_repo
            .list_plans(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "catalog: failed to list plans");
                EngineError::Internal(err)
            })
    }

    async fn ensure_admin(&self, actor_id: Uuid) -> EngineResult<()> {
        let user = self.user_repo.find_by_id(actor_id).await.map_err(|err| {
            error!(%actor_id, db_error = ?err, "catalog: failed to load actor");
            EngineError::Internal(err)
        })?;

        match user {
            Some(user) if UserRole::from_str(&user.role) == UserRole::Admin => Ok(()),
            _ => {
                warn!(%actor_id, "catalog: non-admin attempted a catalog change");
                Err(EngineError::Forbidden("admin role required".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing::domain::{
        entities::{subscriptions::SubscriptionEntity, users::UserEntity},
        repositories::{subscriptions::MockSubscriptionRepository, users::MockUserRepository},
    };
    use chrono::Utc;

    fn user_with_role(id: Uuid, role: &str) -> UserEntity {
        UserEntity {
            id,
            name: "Ops".to_string(),
            email: "ops@example.com".to_string(),
            phone: None,
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    fn users_with_role(role: &'static str) -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(user_with_role(id, role))));
        users
    }

    fn existing_tier() -> MockSubscriptionRepository {
        let mut subscriptions = MockSubscriptionRepository::new();
        subscriptions.expect_find_by_id().returning(|id| {
            Ok(Some(SubscriptionEntity {
                id,
                name: "Pro".to_string(),
                price_minor: 150_000,
                description: None,
                duration_days: 30,
                created_at: Utc::now(),
            }))
        });
        subscriptions
    }

    fn plan(name: &str, value: &str) -> CreateSubscriptionPlanRequest {
        CreateSubscriptionPlanRequest {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn non_admin_cannot_change_catalog() {
        let mut subscriptions = MockSubscriptionRepository::new();
        subscriptions.expect_create_subscription().never();
        let usecase =
            SubscriptionCatalogUseCase::new(Arc::new(subscriptions), Arc::new(users_with_role("merchant")));

        let result = usecase
            .create_subscription(
                Uuid::new_v4(),
                CreateSubscriptionRequest {
                    name: "Pro".to_string(),
                    price_minor: 150_000,
                    description: None,
                    duration_days: 30,
                },
            )
            .await;

        assert!(matches!(result, Err(EngineError::Forbidden(_))));
    }

    #[tokio::test]
    async fn known_capability_needs_integer_limit() {
        let mut subscriptions = existing_tier();
        subscriptions.expect_add_plan().never();
        let usecase =
            SubscriptionCatalogUseCase::new(Arc::new(subscriptions), Arc::new(users_with_role("admin")));

        for value in ["five", "-1", "2.5"] {
            let result = usecase
                .add_plan(Uuid::new_v4(), Uuid::new_v4(), plan("product-slot", value))
                .await;
            assert!(matches!(result, Err(EngineError::Validation(_))), "{value}");
        }
    }

    #[tokio::test]
    async fn duplicate_plan_name_is_a_conflict() {
        let mut subscriptions = existing_tier();
        subscriptions
            .expect_add_plan()
            .returning(|_| Ok(InsertOutcome::Duplicate));
        let usecase =
            SubscriptionCatalogUseCase::new(Arc::new(subscriptions), Arc::new(users_with_role("admin")));

        let result = usecase
            .add_plan(Uuid::new_v4(), Uuid::new_v4(), plan("product-slot", "5"))
            .await;
        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }

    #[tokio::test]
    async fn unknown_capability_is_stored() {
        let plan_id = Uuid::new_v4();
        let mut subscriptions = existing_tier();
        subscriptions
            .expect_add_plan()
            .withf(|plan| plan.name == "storage-gb" && plan.value == "10")
            .returning(move |_| Ok(InsertOutcome::Inserted(plan_id)));
        let usecase =
            SubscriptionCatalogUseCase::new(Arc::new(subscriptions), Arc::new(users_with_role("admin")));

        let result = usecase
            .add_plan(Uuid::new_v4(), Uuid::new_v4(), plan(" storage-gb ", "10"))
            .await
            .unwrap();
        assert_eq!(result, plan_id);
    }

    #[tokio::test]
    async fn missing_subscription_is_not_found() {
        let mut subscriptions = MockSubscriptionRepository::new();
        subscriptions.expect_find_by_id().returning(|_| Ok(None));
        let usecase = SubscriptionCatalogUseCase::new(
            Arc::new(subscriptions),
            Arc::new(MockUserRepository::new()),
        );

        let result = usecase.find_subscription(Uuid::new_v4()).await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }
}
