use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, dsl::count_star, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::repositories::resource_counts::ResourceCountRepository,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{categories, products},
    },
};

pub struct ResourceCountPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ResourceCountPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ResourceCountRepository for ResourceCountPostgres {
    async fn count_products(&self, merchant_ids: Vec<Uuid>) -> Result<i64> {
        if merchant_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = products::table
            .filter(products::merchant_id.eq_any(merchant_ids))
            .filter(products::deleted_at.is_null())
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(total)
    }

    async fn count_categories(&self, merchant_ids: Vec<Uuid>) -> Result<i64> {
        if merchant_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = categories::table
            .filter(categories::merchant_id.eq_any(merchant_ids))
            .filter(categories::deleted_at.is_null())
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(total)
    }
}
