use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::post,
};
use billing::{
    domain::{
        repositories::{
            resource_counts::ResourceCountRepository, subscriptions::SubscriptionRepository,
            user_subscriptions::UserSubscriptionRepository, users::UserRepository,
        },
        value_objects::{
            entitlements::{EntitlementCheckRequest, EntitlementCheckResponse, EntitlementDecision},
            enums::capabilities::Capability,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            resource_counts::ResourceCountPostgres, subscriptions::SubscriptionPostgres,
            user_subscriptions::UserSubscriptionPostgres, users::UserPostgres,
        },
    },
};
use tracing::info;

use crate::{
    auth::AuthUser,
    usecases::{
        entitlements::{EntitlementPolicy, EntitlementUseCase},
        errors::EngineError,
    },
};

pub type PgEntitlementUseCase = EntitlementUseCase<
    UserPostgres,
    UserSubscriptionPostgres,
    SubscriptionPostgres,
    ResourceCountPostgres,
>;

pub fn usecase(db_pool: Arc<PgPoolSquad>, policy: EntitlementPolicy) -> PgEntitlementUseCase {
    EntitlementUseCase::new(
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        Arc::new(UserSubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ResourceCountPostgres::new(Arc::clone(&db_pool))),
        policy,
    )
}

pub fn routes(usecase: Arc<PgEntitlementUseCase>) -> Router {
    Router::new()
        .route("/check", post(check))
        .with_state(usecase)
}

pub async fn check(
    State(usecase): State<Arc<PgEntitlementUseCase>>,
    auth: AuthUser,
    Json(request): Json<EntitlementCheckRequest>,
) -> Result<Json<EntitlementCheckResponse>, EngineError> {
    let decision = usecase.authorize(auth.user_id, &request.capability).await?;
    Ok(Json(EntitlementCheckResponse::new(
        request.capability.trim().to_string(),
        &decision,
    )))
}

/// State for [`require_capability`]: the capability a guarded route consumes.
pub struct CapabilityGuard<U, A, S, R>
where
    U: UserRepository + Send + Sync + 'static,
    A: UserSubscriptionRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ResourceCountRepository + Send + Sync + 'static,
{
    usecase: Arc<EntitlementUseCase<U, A, S, R>>,
    capability: Capability,
}

impl<U, A, S, R> CapabilityGuard<U, A, S, R>
where
    U: UserRepository + Send + Sync + 'static,
    A: UserSubscriptionRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ResourceCountRepository + Send + Sync + 'static,
{
    pub fn new(usecase: Arc<EntitlementUseCase<U, A, S, R>>, capability: Capability) -> Self {
        Self {
            usecase,
            capability,
        }
    }
}

impl<U, A, S, R> Clone for CapabilityGuard<U, A, S, R>
where
    U: UserRepository + Send + Sync + 'static,
    A: UserSubscriptionRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ResourceCountRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            usecase: Arc::clone(&self.usecase),
            capability: self.capability,
        }
    }
}

/// Route middleware that runs the entitlement check before the create
/// handler and answers 403 with the deny reason.
///
/// This engine owns no product or category endpoints. The services that do
/// mount it on their create routes:
///
/// ```text
/// let guard = CapabilityGuard::new(Arc::clone(&entitlement_usecase), Capability::ProductSlot);
/// Router::new().route(
///     "/products",
///     post(create_product).route_layer(middleware::from_fn_with_state(guard, require_capability)),
/// )
/// ```
pub async fn require_capability<U, A, S, R>(
    State(guard): State<CapabilityGuard<U, A, S, R>>,
    auth: AuthUser,
    request: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    A: UserSubscriptionRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ResourceCountRepository + Send + Sync + 'static,
{
    let capability = guard.capability.key();

    match guard.usecase.authorize(auth.user_id, capability).await {
        Ok(EntitlementDecision::Allow) => next.run(request).await,
        Ok(EntitlementDecision::Deny(reason)) => {
            info!(user_id = %auth.user_id, capability, %reason, "entitlements: request blocked");
            EngineError::Forbidden(reason.to_string()).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtSecret, UserClaims};
    use axum::{
        Extension,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        middleware,
    };
    use billing::domain::{
        entities::users::UserEntity,
        repositories::{
            resource_counts::MockResourceCountRepository,
            subscriptions::MockSubscriptionRepository,
            user_subscriptions::MockUserSubscriptionRepository, users::MockUserRepository,
        },
    };
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "entitlement-guard-test-secret";

    type MockGuard = CapabilityGuard<
        MockUserRepository,
        MockUserSubscriptionRepository,
        MockSubscriptionRepository,
        MockResourceCountRepository,
    >;

    fn guard_for(role: &'static str) -> MockGuard {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(move |user_id| {
            Ok(Some(UserEntity {
                id: user_id,
                name: "Sari".to_string(),
                email: "sari@example.com".to_string(),
                phone: None,
                role: role.to_string(),
                created_at: Utc::now(),
            }))
        });

        let mut user_subscription_repo = MockUserSubscriptionRepository::new();
        user_subscription_repo
            .expect_find_active_for_user()
            .returning(|_, _| Ok(None));

        let usecase = EntitlementUseCase::new(
            Arc::new(user_repo),
            Arc::new(user_subscription_repo),
            Arc::new(MockSubscriptionRepository::new()),
            Arc::new(MockResourceCountRepository::new()),
            EntitlementPolicy::default(),
        );

        CapabilityGuard::new(Arc::new(usecase), Capability::ProductSlot)
    }

    fn app(guard: MockGuard) -> Router {
        Router::new()
            .route(
                "/products",
                post(|| async { StatusCode::CREATED }).route_layer(middleware::from_fn_with_state(
                    guard,
                    require_capability::<
                        MockUserRepository,
                        MockUserSubscriptionRepository,
                        MockSubscriptionRepository,
                        MockResourceCountRepository,
                    >,
                )),
            )
            .layer(Extension(JwtSecret::new(SECRET)))
    }

    fn bearer() -> String {
        let claims = UserClaims {
            sub: Uuid::new_v4().to_string(),
            exp: 9999999999,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {}", token)
    }

    async fn create_product(guard: MockGuard, authorization: Option<String>) -> (StatusCode, String) {
        let mut request = Request::builder().method("POST").uri("/products");
        if let Some(value) = authorization {
            request = request.header("authorization", value);
        }

        let response = app(guard)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn admin_passes_through() {
        let (status, _) = create_product(guard_for("admin"), Some(bearer())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn denial_is_forbidden_with_reason() {
        let (status, body) = create_product(guard_for("merchant"), Some(bearer())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("no active subscription"));
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (status, _) = create_product(guard_for("merchant"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
