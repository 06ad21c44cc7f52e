use async_trait::async_trait;
use kharcha_core::{CategorizedTransaction, UserCategoryMapping};
use kharcha_sms::{InsertOutcome, StoreError, TransactionStore};

use crate::db::{self, DbPool};

/// SQLite-backed store for the sync coordinator.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn exists(&self, raw_message: &str) -> Result<bool, StoreError> {
        db::transaction_exists(&self.pool, raw_message)
            .await
            .map_err(backend)
    }

    async fn insert(&self, tx: &CategorizedTransaction) -> Result<InsertOutcome, StoreError> {
        let id = db::insert_transaction(&self.pool, tx).await.map_err(backend)?;
        Ok(match id {
            Some(id) => InsertOutcome::Inserted(id),
            None => InsertOutcome::Duplicate,
        })
    }

    async fn user_mappings(&self) -> Result<Vec<UserCategoryMapping>, StoreError> {
        db::get_user_mappings(&self.pool).await.map_err(backend)
    }
}
