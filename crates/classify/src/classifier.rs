use kharcha_core::{Classification, TransactionCandidate, UserCategoryMapping};

use crate::rules::CategoryRuleTable;

/// Assigns categories: user mappings first, then the rule table.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: CategoryRuleTable,
}

impl Classifier {
    pub fn new(table: CategoryRuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CategoryRuleTable {
        &self.table
    }

    pub fn classify(
        &self,
        candidate: &TransactionCandidate,
        mappings: &[UserCategoryMapping],
    ) -> Classification {
        self.classify_text(&candidate.merchant, &candidate.raw_message, mappings)
    }

    pub fn classify_text(
        &self,
        merchant: &str,
        message: &str,
        mappings: &[UserCategoryMapping],
    ) -> Classification {
        let lower_merchant = merchant.to_lowercase();
        let lower_message = message.to_lowercase();

        if let Some(mapping) = find_user_mapping(mappings, &lower_merchant, &lower_message) {
            return mapping.classification();
        }

        let category = self.table.categorize(merchant, message);
        if category.is_unknown() {
            tracing::debug!(merchant, "no category rule matched; user input needed");
        }
        Classification::builtin(category)
    }
}

/// First mapping, in insertion order, whose pattern occurs in either text.
/// Both texts must already be lowercased.
pub fn find_user_mapping<'a>(
    mappings: &'a [UserCategoryMapping],
    lower_merchant: &str,
    lower_message: &str,
) -> Option<&'a UserCategoryMapping> {
    mappings
        .iter()
        .find(|m| m.matches(lower_merchant) || m.matches(lower_message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kharcha_core::{Category, Direction, Money, UNKNOWN_MERCHANT};

    fn candidate(merchant: &str, message: &str) -> TransactionCandidate {
        TransactionCandidate {
            amount: Money::from_paise(4500),
            direction: Direction::Debit,
            merchant: merchant.to_string(),
            bank: "AXISBK".to_string(),
            account_number: None,
            transaction_at: None,
            raw_message: message.to_string(),
            sender: "VM-AXISBK".to_string(),
            received_at: Utc.with_ymd_and_hms(2024, 6, 5, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn user_label_beats_builtin_rule() {
        let classifier = Classifier::default();
        let mappings = vec![UserCategoryMapping::new("acme", Category::Unknown)];
        let c = classifier.classify(&candidate("ACME online store", "Rs 45 spent at ACME"), &mappings);
        assert_eq!(c, Classification::user_defined("acme"));
    }

    #[test]
    fn user_builtin_mapping_beats_builtin_rule() {
        let classifier = Classifier::default();
        let mappings = vec![UserCategoryMapping::new("amazon", Category::Entertainment)];
        let c = classifier.classify(&candidate("AMAZON", "Rs 45 spent at AMAZON"), &mappings);
        assert_eq!(c, Classification::builtin(Category::Entertainment));
    }

    #[test]
    fn first_inserted_mapping_wins() {
        let classifier = Classifier::default();
        let mappings = vec![
            UserCategoryMapping::new("prime", Category::Entertainment),
            UserCategoryMapping::new("amazon", Category::Shopping),
        ];
        let c = classifier.classify(&candidate("Amazon Prime", "Rs 179 paid"), &mappings);
        assert_eq!(c.category, Category::Entertainment);
    }

    #[test]
    fn mapping_can_match_message_text_only() {
        let classifier = Classifier::default();
        let mappings = vec![UserCategoryMapping::new("salary", Category::Unknown)];
        let c = classifier.classify(
            &candidate(UNKNOWN_MERCHANT, "Rs 50,000 credited SALARY JUNE"),
            &mappings,
        );
        assert_eq!(c.user_label.as_deref(), Some("salary"));
    }

    #[test]
    fn unknown_merchant_without_mapping_is_unknown() {
        let classifier = Classifier::default();
        let c = classifier.classify(&candidate(UNKNOWN_MERCHANT, "Rs 99 debited"), &[]);
        assert!(c.is_unknown());
    }

    #[test]
    fn p2a_marker_classifies_person_transfer() {
        let classifier = Classifier::default();
        let c = classifier.classify(
            &candidate("johndoe", "Rs 45.00 debited UPI/P2A/12345/johndoe/Axis Bank"),
            &[],
        );
        assert_eq!(c, Classification::builtin(Category::SpendToPerson));
    }

    #[test]
    fn find_user_mapping_none_when_empty() {
        assert!(find_user_mapping(&[], "amazon", "rs 5 at amazon").is_none());
    }

    #[test]
    fn rules_see_raw_mixed_case_text() {
        let classifier = Classifier::default();
        let result = classifier.classify_text("Big BAZAAR Mall", "Rs 5 Via Upi/P2m/1/x", &[]);
        assert_eq!(result.category, Category::Shopping);
        let result = classifier.classify_text("Someone", "Rs 5 Via Upi/P2m/1/x", &[]);
        assert_eq!(result.category, Category::UpiTransfer);
    }
}
