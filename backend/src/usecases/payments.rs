use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use billing::{
    domain::{
        entities::{
            payment_transactions::{InsertPaymentTransactionEntity, PaymentTransactionEntity},
            users::UserEntity,
        },
        repositories::payment_transactions::PaymentTransactionRepository,
        value_objects::enums::transaction_statuses::TransactionStatus,
    },
    payments::{
        method_registry::MethodConfig,
        midtrans_client::{ChargeRequest, ChargeResponse, CustomerDetails, MidtransClient},
        notifications::parse_gateway_time,
    },
};
use tracing::{error, info};
use uuid::Uuid;

use super::errors::{EngineError, EngineResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: ChargeRequest) -> AnyResult<ChargeResponse>;

    fn verify_notification(
        &self,
        order_id: &str,
        status_code: &str,
        gross_amount: &str,
        signature_key: &str,
    ) -> bool;
}

#[async_trait]
impl PaymentGateway for MidtransClient {
    async fn charge(&self, request: ChargeRequest) -> AnyResult<ChargeResponse> {
        MidtransClient::charge(self, &request).await
    }

    fn verify_notification(
        &self,
        order_id: &str,
        status_code: &str,
        gross_amount: &str,
        signature_key: &str,
    ) -> bool {
        self.verify_notification_signature(order_id, status_code, gross_amount, signature_key)
    }
}

#[derive(Debug, Clone)]
pub struct ChargeResult {
    pub transaction: PaymentTransactionEntity,
    pub receipt: ChargeResponse,
}

pub struct ChargeUseCase<T, G>
where
    T: PaymentTransactionRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    transaction_repo: Arc<T>,
    gateway: Arc<G>,
    currency: String,
}

impl<T, G> ChargeUseCase<T, G>
where
    T: PaymentTransactionRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(transaction_repo: Arc<T>, gateway: Arc<G>, currency: String) -> Self {
        Self {
            transaction_repo,
            gateway,
            currency,
        }
    }

    /// Charges `customer` through the gateway and records the transaction.
    ///
    /// No retry happens here. A caller that retries gets a fresh order id,
    /// so a retry can never be mistaken for the first attempt by the gateway.
    pub async fn create_payment(
        &self,
        customer: &UserEntity,
        method: Option<&MethodConfig>,
        amount_minor: i64,
    ) -> EngineResult<ChargeResult> {
        let method = method
            .ok_or_else(|| EngineError::Validation("payment method is required".to_string()))?;
        let customer_details = contact_details(customer)?;

        if amount_minor <= 0 {
            return Err(EngineError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if !method.accepts_amount(amount_minor) {
            return Err(EngineError::Validation(format!(
                "amount {} is outside the {} range {}..={}",
                amount_minor, method.channel, method.min_amount, method.max_amount
            )));
        }

        let order_id = Uuid::new_v4();
        let request = ChargeRequest {
            order_id: order_id.to_string(),
            gross_amount: amount_minor,
            payment_type: method.payment_type.clone(),
            channel: method.channel.clone(),
            customer: customer_details,
        };

        info!(
            %order_id,
            user_id = %customer.id,
            payment_type = %method.payment_type,
            channel = %method.channel,
            amount_minor,
            "payments: sending charge"
        );

        // Detached so a dropped request cannot stop between an accepted
        // charge and its local row.
        let task = tokio::spawn(charge_and_record(
            Arc::clone(&self.transaction_repo),
            Arc::clone(&self.gateway),
            PendingCharge {
                order_id,
                request,
                method: method.clone(),
                amount_minor,
                currency: self.currency.clone(),
            },
        ));

        task.await.map_err(|err| {
            error!(%order_id, join_error = ?err, "payments: charge task did not complete");
            EngineError::Internal(err.into())
        })?
    }
}

struct PendingCharge {
    order_id: Uuid,
    request: ChargeRequest,
    method: MethodConfig,
    amount_minor: i64,
    currency: String,
}

async fn charge_and_record<T, G>(
    transaction_repo: Arc<T>,
    gateway: Arc<G>,
    charge: PendingCharge,
) -> EngineResult<ChargeResult>
where
    T: PaymentTransactionRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    let PendingCharge {
        order_id,
        request,
        method,
        amount_minor,
        currency,
    } = charge;

    let receipt = gateway.charge(request).await.map_err(|err| {
        error!(%order_id, gateway_error = ?err, "payments: charge failed");
        EngineError::Gateway(err.to_string())
    })?;

    // A charge response without a status is still waiting on the payer.
    let status = receipt
        .transaction_status
        .as_deref()
        .map(|status| TransactionStatus::from_provider(status, receipt.fraud_status.as_deref()))
        .unwrap_or_default();

    let insert = InsertPaymentTransactionEntity {
        id: order_id,
        transaction_id: receipt.transaction_id.clone(),
        payment_type: method.payment_type,
        payment_channel: method.channel,
        fraud_status: receipt.fraud_status.clone(),
        amount_minor,
        currency,
        status: status.to_string(),
        transaction_time: parse_gateway_time(receipt.transaction_time.as_deref()),
        settlement_time: parse_gateway_time(receipt.settlement_time.as_deref()),
        expiry_time: parse_gateway_time(receipt.expiry_time.as_deref()),
        signature_key: None,
    };

    let transaction = transaction_repo.insert(insert).await.map_err(|err| {
        error!(
            %order_id,
            transaction_id = ?receipt.transaction_id,
            amount_minor,
            db_error = ?err,
            "payments: ORPHANED CHARGE, gateway accepted the charge but it was not recorded"
        );
        EngineError::OrphanedCharge {
            order_id,
            transaction_id: receipt.transaction_id.clone(),
        }
    })?;

    info!(
        %order_id,
        transaction_id = ?transaction.transaction_id,
        status = %status,
        "payments: transaction recorded"
    );

    Ok(ChargeResult {
        transaction,
        receipt,
    })
}

fn contact_details(customer: &UserEntity) -> EngineResult<CustomerDetails> {
    Ok(CustomerDetails {
        first_name: required_contact(Some(customer.name.as_str()), "name")?,
        email: required_contact(Some(customer.email.as_str()), "email")?,
        phone: required_contact(customer.phone.as_deref(), "phone")?,
    })
}

fn required_contact(value: Option<&str>, name: &str) -> EngineResult<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| EngineError::Validation(format!("customer {} is required", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing::domain::repositories::payment_transactions::MockPaymentTransactionRepository;
    use chrono::{TimeZone, Utc};
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    fn customer() -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            name: "Sari".to_string(),
            email: "sari@example.com".to_string(),
            phone: Some("08123456789".to_string()),
            role: "merchant".to_string(),
            created_at: Utc::now(),
        }
    }

    fn bca() -> MethodConfig {
        MethodConfig {
            name: "BCA Virtual Account".to_string(),
            payment_type: "bank_transfer".to_string(),
            channel: "bca".to_string(),
            min_amount: 10_000,
            max_amount: 1_000_000,
            description: None,
        }
    }

    fn pending_receipt() -> ChargeResponse {
        ChargeResponse {
            status_code: Some("201".to_string()),
            transaction_id: Some("abc123".to_string()),
            transaction_status: Some("pending".to_string()),
            fraud_status: Some("accept".to_string()),
            transaction_time: Some("2025-03-01 15:00:00".to_string()),
            expiry_time: Some("garbage".to_string()),
            ..Default::default()
        }
    }

    fn stored(insert: InsertPaymentTransactionEntity) -> PaymentTransactionEntity {
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

    #[tokio::test]
    async fn records_transaction_keyed_by_local_order_id() {
        let mut gateway = MockPaymentGateway::new();
        let mut repo = MockPaymentTransactionRepository::new();

        gateway
            .expect_charge()
            .withf(|request| {
                request.payment_type == "bank_transfer"
                    && request.channel == "bca"
                    && request.gross_amount == 150_000
                    && Uuid::parse_str(&request.order_id).is_ok()
            })
            .times(1)
            .returning(|_| Ok(pending_receipt()));
        repo.expect_insert()
            .withf(|insert| insert.transaction_id.as_deref() == Some("abc123"))
            .times(1)
            .returning(|insert| Ok(stored(insert)));

        let usecase = ChargeUseCase::new(Arc::new(repo), Arc::new(gateway), "IDR".to_string());
        let result = usecase
            .create_payment(&customer(), Some(&bca()), 150_000)
            .await
            .unwrap();

        assert_eq!(result.transaction.status, "pending");
        assert_eq!(result.transaction.currency, "IDR");
        assert_eq!(
            result.transaction.transaction_time,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap())
        );
        // Unparsable gateway time is dropped, not fatal.
        assert_eq!(result.transaction.expiry_time, None);
        assert_eq!(result.receipt.transaction_id.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_gateway() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_charge().never();
        let usecase = ChargeUseCase::new(
            Arc::new(MockPaymentTransactionRepository::new()),
            Arc::new(gateway),
            "IDR".to_string(),
        );

        let mut no_phone = customer();
        no_phone.phone = None;

        for (user, method, amount) in [
            (customer(), None, 150_000),
            (customer(), Some(bca()), 0),
            (customer(), Some(bca()), 5_000),
            (no_phone, Some(bca()), 150_000),
        ] {
            let result = usecase.create_payment(&user, method.as_ref(), amount).await;
            assert!(matches!(result, Err(EngineError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn gateway_failure_is_a_gateway_error() {
        let mut gateway = MockPaymentGateway::new();
        let mut repo = MockPaymentTransactionRepository::new();
        gateway
            .expect_charge()
            .returning(|_| Err(anyhow::anyhow!("payment gateway timed out")));
        repo.expect_insert().never();

        let usecase = ChargeUseCase::new(Arc::new(repo), Arc::new(gateway), "IDR".to_string());
        let result = usecase.create_payment(&customer(), Some(&bca()), 150_000).await;

        match result {
            Err(EngineError::Gateway(message)) => assert_eq!(message, "payment gateway timed out"),
            other => panic!("expected gateway error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn persistence_failure_after_charge_is_orphaned() {
        let mut gateway = MockPaymentGateway::new();
        let mut repo = MockPaymentTransactionRepository::new();
        gateway.expect_charge().returning(|_| Ok(pending_receipt()));
        repo.expect_insert()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let usecase = ChargeUseCase::new(Arc::new(repo), Arc::new(gateway), "IDR".to_string());
        let result = usecase.create_payment(&customer(), Some(&bca()), 150_000).await;

        match result {
            Err(EngineError::OrphanedCharge { transaction_id, .. }) => {
                assert_eq!(transaction_id.as_deref(), Some("abc123"))
            }
            other => panic!("expected orphaned charge, got {other:?}"),
        }
    }

    /// Accepts every charge after a fixed delay.
    struct SlowGateway(Duration);

    #[async_trait]
    impl PaymentGateway for SlowGateway {
        async fn charge(&self, _request: ChargeRequest) -> AnyResult<ChargeResponse> {
            tokio::time::sleep(self.0).await;
            Ok(pending_receipt())
        }

        fn verify_notification(&self, _: &str, _: &str, _: &str, _: &str) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn abandoned_request_still_records_the_accepted_charge() {
        let recorded = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&recorded);
        let mut repo = MockPaymentTransactionRepository::new();
        repo.expect_insert().times(1).returning(move |insert| {
            flag.store(true, Ordering::SeqCst);
            Ok(stored(insert))
        });

        let usecase = ChargeUseCase::new(
            Arc::new(repo),
            Arc::new(SlowGateway(Duration::from_millis(200))),
            "IDR".to_string(),
        );

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            usecase.create_payment(&customer(), Some(&bca()), 150_000),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(recorded.load(Ordering::SeqCst));
    }
}
