pub mod classifier;
pub mod rules;

pub use classifier::{find_user_mapping, Classifier};
pub use rules::{CategoryRule, CategoryRuleTable, RulePosition, RuleTableError, RuleTarget};
