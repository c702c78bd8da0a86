use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payment_transactions;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_transactions)]
pub struct PaymentTransactionEntity {
    pub id: Uuid,
    pub transaction_id: Option<String>,
    pub payment_type: String,
    pub payment_channel: String,
    pub fraud_status: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub transaction_time: Option<DateTime<Utc>>,
    pub settlement_time: Option<DateTime<Utc>>,
    pub expiry_time: Option<DateTime<Utc>>,
    pub signature_key: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_transactions)]
pub struct InsertPaymentTransactionEntity {
    pub id: Uuid,
    pub transaction_id: Option<String>,
    pub payment_type: String,
    pub payment_channel: String,
    pub fraud_status: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub transaction_time: Option<DateTime<Utc>>,
    pub settlement_time: Option<DateTime<Utc>>,
    pub expiry_time: Option<DateTime<Utc>>,
    pub signature_key: Option<String>,
}

/// Partial update: `None` fields are skipped by diesel, so they keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = payment_transactions)]
pub struct UpdatePaymentTransactionEntity {
    pub status: Option<String>,
    pub fraud_status: Option<String>,
    pub transaction_time: Option<DateTime<Utc>>,
    pub settlement_time: Option<DateTime<Utc>>,
    pub expiry_time: Option<DateTime<Utc>>,
    pub signature_key: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}
