pub mod extract;
pub mod notify;
pub mod patterns;
pub mod pipeline;
pub mod store;

pub use extract::Extractor;
pub use notify::{TracingNotifier, UnknownCategoryNotifier};
pub use patterns::{DirectionPriority, MerchantStrategy};
pub use pipeline::{SyncCoordinator, SyncSummary};
pub use store::{InsertOutcome, MemoryStore, StoreError, TransactionStore};
