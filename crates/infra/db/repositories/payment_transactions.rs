use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{Connection, OptionalExtension, RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payment_transactions},
};
use domain::{
    entities::payment_transactions::{InsertPaymentTransactionEntity, PaymentTransactionEntity},
    repositories::payment_transactions::PaymentTransactionRepository,
    value_objects::payment_transactions::{
        MergeDecision, TransactionUpdateModel, TransactionUpdateOutcome,
    },
};

pub struct PaymentTransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentTransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentTransactionRepository for PaymentTransactionPostgres {
    async fn insert(
        &self,
        transaction: InsertPaymentTransactionEntity,
    ) -> Result<PaymentTransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(payment_transactions::table)
            .values(&transaction)
            .returning(PaymentTransactionEntity::as_returning())
            .get_result::<PaymentTransactionEntity>(&mut conn)?;

        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let transaction = payment_transactions::table
            .filter(payment_transactions::id.eq(id))
            .filter(payment_transactions::deleted_at.is_null())
            .select(PaymentTransactionEntity::as_select())
            .first::<PaymentTransactionEntity>(&mut conn)
            .optional()?;

        Ok(transaction)
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let transaction = payment_transactions::table
            .filter(payment_transactions::transaction_id.eq(transaction_id))
            .filter(payment_transactions::deleted_at.is_null())
            .select(PaymentTransactionEntity::as_select())
            .first::<PaymentTransactionEntity>(&mut conn)
            .optional()?;

        Ok(transaction)
    }

    async fn apply_update(
        &self,
        transaction_id: &str,
        update: TransactionUpdateModel,
    ) -> Result<TransactionUpdateOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The row lock serializes concurrent notifications for the same transaction.
        let outcome = conn.transaction::<TransactionUpdateOutcome, anyhow::Error, _>(|tx| {
            let current = payment_transactions::table
                .filter(payment_transactions::transaction_id.eq(transaction_id))
                .filter(payment_transactions::deleted_at.is_null())
                .select(PaymentTransactionEntity::as_select())
                .for_update()
                .first::<PaymentTransactionEntity>(tx)
                .optional()?;

            let Some(current) = current else {
                return Ok(TransactionUpdateOutcome::NotFound);
            };

            match update.merge_into(&current, Utc::now()) {
                MergeDecision::NoChange => Ok(TransactionUpdateOutcome::Unchanged(current)),
                MergeDecision::RejectTerminal { attempted, .. } => {
                    Ok(TransactionUpdateOutcome::RejectedTerminal {
                        transaction: current,
                        attempted,
                    })
                }
                MergeDecision::Apply(changes) => {
                    let updated = diesel::update(payment_transactions::table.find(current.id))
                        .set(&changes)
                        .returning(PaymentTransactionEntity::as_returning())
                        .get_result::<PaymentTransactionEntity>(tx)?;

                    Ok(TransactionUpdateOutcome::Applied(updated))
                }
            }
        })?;

        Ok(outcome)
    }
}
