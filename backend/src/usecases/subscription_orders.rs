use std::sync::Arc;

use billing::{
    domain::{
        entities::{
            payment_transactions::PaymentTransactionEntity,
            subscription_orders::{InsertSubscriptionOrderEntity, SubscriptionOrderEntity},
        },
        repositories::{
            payment_transactions::PaymentTransactionRepository,
            subscription_orders::SubscriptionOrderRepository,
            subscriptions::SubscriptionRepository, users::UserRepository,
        },
        value_objects::{
            enums::order_statuses::OrderStatus,
            payment_transactions::PaymentTransactionModel,
            subscription_orders::{OrderCompletion, SubscribeResponse, SubscriptionOrderModel},
            subscriptions::InsertOutcome,
        },
    },
    payments::{method_registry::PaymentMethodRegistry, midtrans_client::ChargeResponse},
};
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    errors::{EngineError, EngineResult},
    payments::{ChargeUseCase, PaymentGateway},
};

/// Finishes the order linked to a terminal transaction. Safe to call on every
/// delivery: an order that already left `pending` is returned untouched.
pub async fn complete_order<O>(
    order_repo: &O,
    transaction: &PaymentTransactionEntity,
) -> EngineResult<OrderCompletion>
where
    O: SubscriptionOrderRepository + Send + Sync,
{
    let status = OrderStatus::from_transaction_status(transaction.canonical_status());
    if status == OrderStatus::Pending {
        return Ok(OrderCompletion::NoOrder);
    }

    let settled_at = transaction.settlement_time.unwrap_or(transaction.updated_at);

    let completion = order_repo
        .complete_for_transaction(transaction.id, status, settled_at)
        .await
        .map_err(|err| {
            error!(
                payment_transaction_id = %transaction.id,
                db_error = ?err,
                "orders: failed to complete order"
            );
            EngineError::Internal(err)
        })?;

    match &completion {
        OrderCompletion::Completed(order) => info!(
            order_id = %order.id,
            user_id = %order.user_id,
            status = %status,
            "orders: order completed"
        ),
        OrderCompletion::AlreadyCompleted(order) => info!(
            order_id = %order.id,
            status = %order.status,
            "orders: order already completed"
        ),
        OrderCompletion::NoOrder => warn!(
            payment_transaction_id = %transaction.id,
            "orders: no order references this transaction"
        ),
    }

    Ok(completion)
}

pub struct SubscriptionOrderUseCase<O, S, U, T, G>
where
    O: SubscriptionOrderRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    order_repo: Arc<O>,
    subscription_repo: Arc<S>,
    user_repo: Arc<U>,
    charge_usecase: Arc<ChargeUseCase<T, G>>,
    method_registry: Arc<PaymentMethodRegistry>,
}

impl<O, S, U, T, G> SubscriptionOrderUseCase<O, S, U, T, G>
where
    O: SubscriptionOrderRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(
        order_repo: Arc<O>,
        subscription_repo: Arc<S>,
        user_repo: Arc<U>,
        charge_usecase: Arc<ChargeUseCase<T, G>>,
        method_registry: Arc<PaymentMethodRegistry>,
    ) -> Self {
        Self {
            order_repo,
            subscription_repo,
            user_repo,
            charge_usecase,
            method_registry,
        }
    }

    pub async fn subscribe(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
        payment_channel: &str,
    ) -> EngineResult<SubscribeResponse<ChargeResponse>> {
        info!(%user_id, %subscription_id, payment_channel, "orders: subscribe requested");

        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "orders: failed to load subscription");
                EngineError::Internal(err)
            })?
            .ok_or_else(|| EngineError::NotFound("subscription not found".to_string()))?;

        // Advisory only; the pending-order unique index is the real guard.
        if self.find_active_order(user_id, subscription_id).await?.is_some() {
            return Err(EngineError::Conflict(
                "subscription is already active".to_string(),
            ));
        }
        let pending = self
            .order_repo
            .find_pending_order(user_id, subscription_id)
            .await
            .map_err(|err| {
                error!(%user_id, %subscription_id, db_error = ?err, "orders: failed to load pending order");
                EngineError::Internal(err)
            })?;
        if let Some(pending) = pending {
            info!(order_id = %pending.id, %user_id, "orders: pending order exists");
            return Err(EngineError::Conflict(
                "a payment for this subscription is already pending".to_string(),
            ));
        }

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "orders: failed to load user");
                EngineError::Internal(err)
            })?
            .ok_or_else(|| EngineError::NotFound("user not found".to_string()))?;

        let method = self
            .method_registry
            .find_by_channel(payment_channel)
            .ok_or_else(|| EngineError::NotFound("payment channel not found".to_string()))?;

        let charge = self
            .charge_usecase
            .create_payment(&user, Some(method), subscription.price_minor)
            .await?;

        let mut order = self
            .create_order(user_id, subscription_id, &charge.transaction, subscription.price_minor)
            .await?;

        if charge.transaction.canonical_status().is_terminal() {
            if let OrderCompletion::Completed(completed) =
                complete_order(self.order_repo.as_ref(), &charge.transaction).await?
            {
                order = completed;
            }
        }

        Ok(SubscribeResponse {
            order: order.into(),
            transaction: PaymentTransactionModel::from(charge.transaction),
            receipt: charge.receipt,
        })
    }

    /// Records the order for a freshly charged transaction.
    pub async fn create_order(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
        transaction: &PaymentTransactionEntity,
        amount_minor: i64,
    ) -> EngineResult<SubscriptionOrderEntity> {
        let insert = InsertSubscriptionOrderEntity {
            user_id,
            subscription_id,
            payment_transaction_id: Some(transaction.id),
            amount_minor,
            status: OrderStatus::Pending.to_string(),
        };

        let order_id = match self.order_repo.create_order(insert).await {
            Ok(InsertOutcome::Inserted(order_id)) => order_id,
            Ok(InsertOutcome::Duplicate) => {
                error!(
                    %user_id,
                    %subscription_id,
                    payment_transaction_id = %transaction.id,
                    transaction_id = ?transaction.transaction_id,
                    "orders: concurrent subscribe lost the race after charging; transaction has no order"
                );
                return Err(EngineError::Conflict(
                    "a payment for this subscription is already pending".to_string(),
                ));
            }
            Err(err) => {
                error!(
                    %user_id,
                    payment_transaction_id = %transaction.id,
                    db_error = ?err,
                    "orders: failed to create order for charged transaction"
                );
                return Err(EngineError::Internal(err));
            }
        };

        info!(%order_id, %user_id, %subscription_id, "orders: order created");

        self.order_repo
            .find_by_id(order_id)
            .await
            .map_err(EngineError::Internal)?
            .ok_or_else(|| EngineError::Internal(anyhow::anyhow!("order {} vanished", order_id)))
    }

    pub async fn find_active_order(
        &self,
        user_id: Uuid,
        subscription_id: Uuid,
    ) -> EngineResult<Option<SubscriptionOrderEntity>> {
        self.order_repo
            .find_active_order(user_id, subscription_id, Utc::now())
            .await
            .map_err(|err| {
                error!(%user_id, %subscription_id, db_error = ?err, "orders: failed to load active order");
                EngineError::Internal(err)
            })
    }

    pub async fn list_orders(&self, user_id: Uuid) -> EngineResult<Vec<SubscriptionOrderModel>> {
        let orders = self.order_repo.list_by_user(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "orders: failed to list orders");
            EngineError::Internal(err)
        })?;

        Ok(orders.into_iter().map(SubscriptionOrderModel::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::payments::MockPaymentGateway;
    use billing::domain::{
        entities::{subscriptions::SubscriptionEntity, users::UserEntity},
        repositories::{
            payment_transactions::MockPaymentTransactionRepository,
            subscription_orders::MockSubscriptionOrderRepository,
            subscriptions::MockSubscriptionRepository, users::MockUserRepository,
        },
    };
    use mockall::predicate::eq;

    type TestUseCase = SubscriptionOrderUseCase<
        MockSubscriptionOrderRepository,
        MockSubscriptionRepository,
        MockUserRepository,
        MockPaymentTransactionRepository,
        MockPaymentGateway,
    >;

    struct Mocks {
        orders: MockSubscriptionOrderRepository,
        subscriptions: MockSubscriptionRepository,
        users: MockUserRepository,
        transactions: MockPaymentTransactionRepository,
        gateway: MockPaymentGateway,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                orders: MockSubscriptionOrderRepository::new(),
                subscriptions: MockSubscriptionRepository::new(),
                users: MockUserRepository::new(),
                transactions: MockPaymentTransactionRepository::new(),
                gateway: MockPaymentGateway::new(),
            }
        }

        fn build(self) -> TestUseCase {
            let charge = ChargeUseCase::new(
                Arc::new(self.transactions),
                Arc::new(self.gateway),
                "IDR".to_string(),
            );
            SubscriptionOrderUseCase::new(
                Arc::new(self.orders),
                Arc::new(self.subscriptions),
                Arc::new(self.users),
                Arc::new(charge),
                Arc::new(PaymentMethodRegistry::bundled().unwrap()),
            )
        }
    }

    fn tier(id: Uuid) -> SubscriptionEntity {
        SubscriptionEntity {
            id,
            name: "Pro".to_string(),
            price_minor: 150_000,
            description: None,
            duration_days: 30,
            created_at: Utc::now(),
        }
    }

    fn user(id: Uuid) -> UserEntity {
        UserEntity {
            id,
            name: "Sari".to_string(),
            email: "sari@example.com".to_string(),
            phone: Some("08123456789".to_string()),
            role: "merchant".to_string(),
            created_at: Utc::now(),
        }
    }

    fn order(user_id: Uuid, subscription_id: Uuid, status: OrderStatus) -> SubscriptionOrderEntity {
        let now = Utc::now();
        SubscriptionOrderEntity {
            id: Uuid::new_v4(),
            user_id,
            subscription_id,
            payment_transaction_id: Some(Uuid::new_v4()),
            amount_minor: 150_000,
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn transaction_from(
        insert: billing::domain::entities::payment_transactions::InsertPaymentTransactionEntity,
    ) -> PaymentTransactionEntity {
        let now = Utc::now();
        PaymentTransactionEntity {
            id: insert.id,
            transaction_id: insert.transaction_id,
            payment_type: insert.payment_type,
            payment_channel: insert.payment_channel,
            fraud_status: insert.fraud_status,
            amount_minor: insert.amount_minor,
            currency: insert.currency,
            status: insert.status,
            transaction_time: insert.transaction_time,
            settlement_time: insert.settlement_time,
            expiry_time: insert.expiry_time,
            signature_key: insert.signature_key,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn expect_no_existing_orders(mocks: &mut Mocks) {
        mocks
            .orders
            .expect_find_active_order()
            .returning(|_, _, _| Ok(None));
        mocks
            .orders
            .expect_find_pending_order()
            .returning(|_, _| Ok(None));
    }

    fn expect_successful_charge(mocks: &mut Mocks, user_id: Uuid, subscription_id: Uuid) {
        mocks
            .subscriptions
            .expect_find_by_id()
            .with(eq(subscription_id))
            .returning(|id| Ok(Some(tier(id))));
        mocks
            .users
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(|id| Ok(Some(user(id))));
        mocks.gateway.expect_charge().times(1).returning(|_| {
            Ok(ChargeResponse {
                status_code: Some("201".to_string()),
                transaction_id: Some("abc123".to_string()),
                transaction_status: Some("pending".to_string()),
                ..Default::default()
            })
        });
        mocks
            .transactions
            .expect_insert()
            .returning(|insert| Ok(transaction_from(insert)));
    }

    #[tokio::test]
    async fn subscribe_links_order_to_transaction() {
        let user_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let mut mocks = Mocks::new();

        expect_no_existing_orders(&mut mocks);
        expect_successful_charge(&mut mocks, user_id, subscription_id);
        mocks
            .orders
            .expect_create_order()
            .withf(|insert| insert.payment_transaction_id.is_some() && insert.status == "pending")
            .times(1)
            .returning(move |_| Ok(InsertOutcome::Inserted(order_id)));
        mocks
            .orders
            .expect_find_by_id()
            .with(eq(order_id))
            .returning(move |id| {
                let mut order = order(user_id, subscription_id, OrderStatus::Pending);
                order.id = id;
                Ok(Some(order))
            });
        mocks.orders.expect_complete_for_transaction().never();

        let response = mocks
            .build()
            .subscribe(user_id, subscription_id, "bca")
            .await
            .unwrap();

        assert_eq!(response.order.id, order_id);
        assert_eq!(response.order.status, OrderStatus::Pending);
        assert_eq!(response.transaction.transaction_id.as_deref(), Some("abc123"));
        assert_eq!(response.transaction.amount_minor, 150_000);
    }

    #[tokio::test]
    async fn active_subscription_blocks_resubscribe_before_charging() {
        let user_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let mut mocks = Mocks::new();

        mocks
            .subscriptions
            .expect_find_by_id()
            .returning(|id| Ok(Some(tier(id))));
        mocks
            .orders
            .expect_find_active_order()
            .returning(move |user_id, subscription_id, _| {
                Ok(Some(order(user_id, subscription_id, OrderStatus::Settled)))
            });
        mocks.gateway.expect_charge().never();

        let result = mocks.build().subscribe(user_id, subscription_id, "bca").await;
        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }

    #[tokio::test]
    async fn pending_order_blocks_second_charge() {
        let mut mocks = Mocks::new();

        mocks
            .subscriptions
            .expect_find_by_id()
            .returning(|id| Ok(Some(tier(id))));
        mocks
            .orders
            .expect_find_active_order()
            .returning(|_, _, _| Ok(None));
        mocks
            .orders
            .expect_find_pending_order()
            .returning(|user_id, subscription_id| {
                Ok(Some(order(user_id, subscription_id, OrderStatus::Pending)))
            });
        mocks.gateway.expect_charge().never();

        let result = mocks
            .build()
            .subscribe(Uuid::new_v4(), Uuid::new_v4(), "bca")
            .await;
        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }

    #[tokio::test]
    async fn lost_insert_race_is_a_conflict() {
        let user_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();
        let mut mocks = Mocks::new();

        expect_no_existing_orders(&mut mocks);
        expect_successful_charge(&mut mocks, user_id, subscription_id);
        mocks
            .orders
            .expect_create_order()
            .returning(|_| Ok(InsertOutcome::Duplicate));

        let result = mocks.build().subscribe(user_id, subscription_id, "bca").await;
        assert!(matches!(result, Err(EngineError::Conflict(_))));
    }

    #[tokio::test]
    async fn unknown_channel_and_tier_are_not_found() {
        let mut mocks = Mocks::new();
        mocks.subscriptions.expect_find_by_id().returning(|_| Ok(None));
        let result = mocks
            .build()
            .subscribe(Uuid::new_v4(), Uuid::new_v4(), "bca")
            .await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));

        let mut mocks = Mocks::new();
        expect_no_existing_orders(&mut mocks);
        mocks
            .subscriptions
            .expect_find_by_id()
            .returning(|id| Ok(Some(tier(id))));
        mocks
            .users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id))));
        mocks.gateway.expect_charge().never();
        let result = mocks
            .build()
            .subscribe(Uuid::new_v4(), Uuid::new_v4(), "ovo")
            .await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn complete_order_maps_transaction_status() {
        let mut orders = MockSubscriptionOrderRepository::new();
        let now = Utc::now();
        let transaction = PaymentTransactionEntity {
            id: Uuid::new_v4(),
            transaction_id: Some("abc123".to_string()),
            payment_type: "bank_transfer".to_string(),
            payment_channel: "bca".to_string(),
            fraud_status: None,
            amount_minor: 150_000,
            currency: "IDR".to_string(),
            status: "denied".to_string(),
            transaction_time: None,
            settlement_time: None,
            expiry_time: None,
            signature_key: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        let transaction_pk = transaction.id;

        orders
            .expect_complete_for_transaction()
            .with(eq(transaction_pk), eq(OrderStatus::Failed), eq(now))
            .times(1)
            .returning(|_, _, _| Ok(OrderCompletion::NoOrder));

        let completion = complete_order(&orders, &transaction).await.unwrap();
        assert_eq!(completion, OrderCompletion::NoOrder);
    }
}
