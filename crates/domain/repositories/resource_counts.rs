use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

/// Live (not soft-deleted) resource counts used by plan limits.
#[automock]
#[async_trait]
pub trait ResourceCountRepository {
    async fn count_products(&self, merchant_ids: Vec<Uuid>) -> Result<i64>;
    async fn count_categories(&self, merchant_ids: Vec<Uuid>) -> Result<i64>;
}
