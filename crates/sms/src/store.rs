use async_trait::async_trait;
use kharcha_core::{CategorizedTransaction, UserCategoryMapping};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    /// A record with the same raw message already exists; nothing written.
    Duplicate,
}

/// Persistence seam for the sync coordinator.
/// `insert` must be insert-or-ignore keyed on the raw message text so that
/// racing writers can never produce two records for one message.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn exists(&self, raw_message: &str) -> Result<bool, StoreError>;

    async fn insert(&self, tx: &CategorizedTransaction) -> Result<InsertOutcome, StoreError>;

    /// All user mappings in insertion order.
    async fn user_mappings(&self) -> Result<Vec<UserCategoryMapping>, StoreError>;
}

// ── In-memory store (always available, used for tests) ────────────────────────

#[derive(Debug, Default)]
struct MemoryState {
    transactions: Vec<CategorizedTransaction>,
    mappings: Vec<UserCategoryMapping>,
    next_id: i64,
}

/// Keeps everything in a `Vec` behind an async mutex. Useful for exercising
/// the pipeline without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mappings(mappings: Vec<UserCategoryMapping>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                mappings,
                ..MemoryState::default()
            }),
        }
    }

    /// Insert-or-replace by pattern, keeping the original position.
    pub async fn add_mapping(&self, mapping: UserCategoryMapping) {
        let mut state = self.state.lock().await;
        match state.mappings.iter_mut().find(|m| m.pattern == mapping.pattern) {
            Some(existing) => *existing = mapping,
            None => state.mappings.push(mapping),
        }
    }

    pub async fn transactions(&self) -> Vec<CategorizedTransaction> {
        self.state.lock().await.transactions.clone()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn exists(&self, raw_message: &str) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .any(|t| t.candidate.raw_message == raw_message))
    }

    async fn insert(&self, tx: &CategorizedTransaction) -> Result<InsertOutcome, StoreError> {
        let mut state = self.state.lock().await;
        if state
            .transactions
            .iter()
            .any(|t| t.candidate.raw_message == tx.candidate.raw_message)
        {
            return Ok(InsertOutcome::Duplicate);
        }
        state.next_id += 1;
        let id = state.next_id;
        let mut stored = tx.clone();
        stored.id = Some(id);
        state.transactions.push(stored);
        Ok(InsertOutcome::Inserted(id))
    }

    async fn user_mappings(&self) -> Result<Vec<UserCategoryMapping>, StoreError> {
        Ok(self.state.lock().await.mappings.clone())
    }
}
