use kharcha_core::Category;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FOOD_KEYWORDS: &[&str] = &["zomato", "swiggy", "restaurant", "cafe", "pizza", "food", "dine"];
pub const BAR_ALCOHOL_KEYWORDS: &[&str] = &["bar", "pub"];
pub const TRAVEL_KEYWORDS: &[&str] = &[
    "uber", "ola", "taxi", "cab", "flight", "hotel", "travel", "irctc", "redbus", "bus", "train",
];
pub const SHOPPING_KEYWORDS: &[&str] = &[
    "amazon", "flipkart", "store", "shop", "mall", "online", "myntra", "shopify",
];
pub const BILLS_UTILITIES_KEYWORDS: &[&str] = &[
    "electricity", "utility", "bill", "water", "gas", "rent", "emi", "broadband", "recharge",
];
pub const ENTERTAINMENT_KEYWORDS: &[&str] = &["movie", "cinema", "ticket", "event", "netflix", "spotify"];
pub const HEALTH_KEYWORDS: &[&str] = &["pharmacy", "hospital", "clinic", "doctor", "medical"];

pub const UPI_P2A_MARKER: &str = "upi/p2a";
pub const UPI_P2M_MARKER: &str = "upi/p2m";

#[derive(Debug, Error)]
pub enum RuleTableError {
    #[error("Failed to parse rule file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Rule '{0}' has no keywords")]
    EmptyRule(String),
}

/// Which lowercased text a rule's keywords are tested against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleTarget {
    #[default]
    Merchant,
    Message,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub target: RuleTarget,
    pub keywords: Vec<String>,
    pub category: Category,
}

impl CategoryRule {
    pub fn new(name: &str, target: RuleTarget, keywords: &[&str], category: Category) -> Self {
        Self {
            name: name.to_string(),
            target,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            category,
        }
    }

    /// Both inputs must already be lowercased.
    fn matches(&self, merchant: &str, message: &str) -> bool {
        let text = match self.target {
            RuleTarget::Merchant => merchant,
            RuleTarget::Message => message,
        };
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && text.contains(k.as_str()))
    }
}

/// Where rules loaded from a file land relative to the existing table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RulePosition {
    Before,
    #[default]
    After,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleFileEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleFileEntry {
    #[serde(flatten)]
    rule: CategoryRule,
    #[serde(default)]
    position: RulePosition,
}

/// Ordered keyword rules, evaluated top to bottom; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRuleTable {
    rules: Vec<CategoryRule>,
}

impl Default for CategoryRuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryRuleTable {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let rules = rules.into_iter().map(normalize).collect();
        Self { rules }
    }

    /// The stock table. Specific signals (redbus, UPI person transfers) sit
    /// above the generic merchant buckets; UPI merchant payments come last.
    pub fn builtin() -> Self {
        use RuleTarget::{Merchant, Message};
        Self::new(vec![
            CategoryRule::new("redbus", Merchant, &["redbus"], Category::Travel),
            CategoryRule::new("upi-person", Message, &[UPI_P2A_MARKER], Category::SpendToPerson),
            CategoryRule::new("food", Merchant, FOOD_KEYWORDS, Category::Food),
            CategoryRule::new("bar-alcohol", Merchant, BAR_ALCOHOL_KEYWORDS, Category::BarAlcohol),
            CategoryRule::new("travel", Merchant, TRAVEL_KEYWORDS, Category::Travel),
            CategoryRule::new("shopping", Merchant, SHOPPING_KEYWORDS, Category::Shopping),
            CategoryRule::new(
                "bills-utilities",
                Merchant,
                BILLS_UTILITIES_KEYWORDS,
                Category::BillsUtilities,
            ),
            CategoryRule::new(
                "entertainment",
                Merchant,
                ENTERTAINMENT_KEYWORDS,
                Category::Entertainment,
            ),
            CategoryRule::new("health", Merchant, HEALTH_KEYWORDS, Category::Health),
            CategoryRule::new("upi-merchant", Message, &[UPI_P2M_MARKER], Category::UpiTransfer),
        ])
    }

    /// Parses a `[[rules]]` TOML document and splices its rules into this
    /// table, ahead of the existing rules or after them per entry.
    pub fn extend_from_toml(mut self, toml_content: &str) -> Result<Self, RuleTableError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        let mut before = Vec::new();
        for entry in file.rules {
            if entry.rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(RuleTableError::EmptyRule(entry.rule.name));
            }
            let rule = normalize(entry.rule);
            match entry.position {
                RulePosition::Before => before.push(rule),
                RulePosition::After => self.rules.push(rule),
            }
        }
        before.append(&mut self.rules);
        self.rules = before;
        Ok(self)
    }

    pub fn push(&mut self, rule: CategoryRule) {
        self.rules.push(normalize(rule));
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Takes raw text; matching is case-insensitive.
    pub fn find_matching_rule(&self, merchant: &str, message: &str) -> Option<&CategoryRule> {
        let merchant = merchant.to_lowercase();
        let message = message.to_lowercase();
        self.rules.iter().find(|r| r.matches(&merchant, &message))
    }

    pub fn categorize(&self, merchant: &str, message: &str) -> Category {
        self.find_matching_rule(merchant, message)
            .map(|r| r.category)
            .unwrap_or(Category::Unknown)
    }
}

fn normalize(mut rule: CategoryRule) -> CategoryRule {
    rule.keywords = rule
        .keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    rule
}
