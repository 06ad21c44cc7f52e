pub mod category;
pub mod money;
pub mod period;
pub mod transaction;

pub use category::{
    selectable_categories, Category, CategoryError, Classification, UserCategoryMapping,
};
pub use money::Money;
pub use period::DateRange;
pub use transaction::{
    CategorizedTransaction, Direction, RawMessage, Totals, TransactionCandidate, UNKNOWN_MERCHANT,
};
