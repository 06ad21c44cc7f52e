pub mod db;
pub mod store;

pub use db::{
    create_db, create_memory_db, delete_transaction, get_distinct_banks, get_transaction_by_id,
    get_transactions, get_user_mappings, insert_transaction, insert_user_mapping,
    transaction_exists, update_transaction_category, DbPool, TransactionFilter,
};
pub use store::SqliteStore;
