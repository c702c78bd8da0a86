use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::payment_transactions::{InsertPaymentTransactionEntity, PaymentTransactionEntity},
    value_objects::payment_transactions::{TransactionUpdateModel, TransactionUpdateOutcome},
};

#[automock]
#[async_trait]
pub trait PaymentTransactionRepository {
    async fn insert(
        &self,
        transaction: InsertPaymentTransactionEntity,
    ) -> Result<PaymentTransactionEntity>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentTransactionEntity>>;

    /// Looks up by the gateway's transaction id, which is the reconciliation key.
    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentTransactionEntity>>;

    /// Merges `update` into the transaction while holding its row lock.
    async fn apply_update(
        &self,
        transaction_id: &str,
        update: TransactionUpdateModel,
    ) -> Result<TransactionUpdateOutcome>;
}
