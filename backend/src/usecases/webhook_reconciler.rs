use std::sync::Arc;

use billing::{
    domain::{
        repositories::{
            payment_transactions::PaymentTransactionRepository,
            subscription_orders::SubscriptionOrderRepository,
        },
        value_objects::{
            enums::transaction_statuses::TransactionStatus,
            payment_transactions::TransactionUpdateOutcome,
        },
    },
    payments::notifications::MidtransNotification,
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::{
    errors::{EngineError, EngineResult},
    payments::PaymentGateway,
    subscription_orders::complete_order,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Applied { status: TransactionStatus },
    Duplicate { status: TransactionStatus },
    /// The transaction was already terminal; the notification was ignored.
    Stale {
        status: TransactionStatus,
        attempted: TransactionStatus,
    },
}

pub struct WebhookReconcilerUseCase<T, O, G>
where
    T: PaymentTransactionRepository + Send + Sync + 'static,
    O: SubscriptionOrderRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    transaction_repo: Arc<T>,
    order_repo: Arc<O>,
    gateway: Arc<G>,
}

impl<T, O, G> WebhookReconcilerUseCase<T, O, G>
where
    T: PaymentTransactionRepository + Send + Sync + 'static,
    O: SubscriptionOrderRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(transaction_repo: Arc<T>, order_repo: Arc<O>, gateway: Arc<G>) -> Self {
        Self {
            transaction_repo,
            order_repo,
            gateway,
        }
    }

    /// Applies one gateway notification. Replays and out-of-order deliveries
    /// are accepted without changing a terminal transaction.
    pub async fn apply_notification(&self, body: &[u8]) -> EngineResult<ReconcileOutcome> {
        let notification = MidtransNotification::parse(body).map_err(|err| {
            warn!(parse_error = %err, "webhook: malformed notification");
            EngineError::Validation("malformed notification payload".to_string())
        })?;

        let transaction_id = required(&notification.transaction_id, "transaction_id")?;
        let order_id = required(&notification.order_id, "order_id")?;
        let status_code = required(&notification.status_code, "status_code")?;
        let gross_amount = required(&notification.gross_amount, "gross_amount")?;
        required(&notification.transaction_status, "transaction_status")?;

        let signature_key = notification
            .signature_key
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                warn!(transaction_id, "webhook: notification without signature");
                EngineError::Unauthorized("missing notification signature".to_string())
            })?;

        if !self
            .gateway
            .verify_notification(order_id, status_code, gross_amount, signature_key)
        {
            warn!(transaction_id, order_id, "webhook: signature mismatch");
            return Err(EngineError::Unauthorized(
                "invalid notification signature".to_string(),
            ));
        }

        let stored = self
            .transaction_repo
            .find_by_transaction_id(transaction_id)
            .await
            .map_err(|err| {
                error!(transaction_id, db_error = ?err, "webhook: failed to load transaction");
                EngineError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(transaction_id, "webhook: unknown transaction");
                EngineError::NotFound("payment transaction not found".to_string())
            })?;

        if stored.id.to_string() != order_id {
            warn!(
                transaction_id,
                order_id,
                stored_order_id = %stored.id,
                "webhook: order_id does not match the stored transaction"
            );
            return Err(EngineError::Validation(
                "notification order_id does not match transaction".to_string(),
            ));
        }

        let update = notification.to_update_model();
        let outcome = self
            .transaction_repo
            .apply_update(transaction_id, update)
            .await
            .map_err(|err| {
                error!(transaction_id, db_error = ?err, "webhook: failed to apply update");
                EngineError::Internal(err)
            })?;

        let (transaction, result) = match outcome {
            TransactionUpdateOutcome::Applied(transaction) => {
                let status = transaction.canonical_status();
                info!(transaction_id, status = %status, "webhook: transaction updated");
                (transaction, ReconcileOutcome::Applied { status })
            }
            TransactionUpdateOutcome::Unchanged(transaction) => {
                let status = transaction.canonical_status();
                info!(transaction_id, status = %status, "webhook: duplicate notification");
                (transaction, ReconcileOutcome::Duplicate { status })
            }
            TransactionUpdateOutcome::RejectedTerminal {
                transaction,
                attempted,
            } => {
                let status = transaction.canonical_status();
                warn!(
                    transaction_id,
                    current = %status,
                    attempted = %attempted,
                    "webhook: ignoring transition out of terminal state"
                );
                (transaction, ReconcileOutcome::Stale { status, attempted })
            }
            TransactionUpdateOutcome::NotFound => {
                return Err(EngineError::NotFound(
                    "payment transaction not found".to_string(),
                ));
            }
        };

        // Re-run on duplicates too, so an order left pending by an earlier
        // failed delivery is still completed.
        if transaction.canonical_status().is_terminal() {
            complete_order(self.order_repo.as_ref(), &transaction).await?;
        }

        Ok(result)
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> EngineResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| EngineError::Validation(format!("notification is missing {}", field)))
}
