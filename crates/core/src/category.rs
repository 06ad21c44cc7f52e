use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("Unknown category: '{0}'")]
    UnknownName(String),
}

/// Built-in spending categories. Anything outside this set is carried as a
/// user label on [`Classification`] with `Category::Unknown` as the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Food,
    BarAlcohol,
    Travel,
    Shopping,
    BillsUtilities,
    Entertainment,
    Health,
    Transport,
    UpiTransfer,
    SpendToPerson,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Food,
        Category::BarAlcohol,
        Category::Travel,
        Category::Shopping,
        Category::BillsUtilities,
        Category::Entertainment,
        Category::Health,
        Category::Transport,
        Category::UpiTransfer,
        Category::SpendToPerson,
        Category::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "FOOD",
            Category::BarAlcohol => "BAR_ALCOHOL",
            Category::Travel => "TRAVEL",
            Category::Shopping => "SHOPPING",
            Category::BillsUtilities => "BILLS_UTILITIES",
            Category::Entertainment => "ENTERTAINMENT",
            Category::Health => "HEALTH",
            Category::Transport => "TRANSPORT",
            Category::UpiTransfer => "UPI_TRANSFER",
            Category::SpendToPerson => "SPEND_TO_PERSON",
            Category::Unknown => "UNKNOWN",
        }
    }

    pub fn is_unknown(self) -> bool {
        self == Category::Unknown
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    /// Accepts `BILLS_UTILITIES`, `bills_utilities` and `bills-utilities`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| CategoryError::UnknownName(s.to_string()))
    }
}

/// The outcome of classifying a transaction: a built-in tag, optionally
/// refined by a free-text label the user defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_label: Option<String>,
}

impl Classification {
    pub fn builtin(category: Category) -> Self {
        Self { category, user_label: None }
    }

    pub fn user_defined(label: impl Into<String>) -> Self {
        Self {
            category: Category::Unknown,
            user_label: Some(label.into()),
        }
    }

    pub fn unknown() -> Self {
        Self::builtin(Category::Unknown)
    }

    /// True only when nothing, not even a user label, was assigned.
    pub fn is_unknown(&self) -> bool {
        self.category.is_unknown() && self.user_label.is_none()
    }

    pub fn display_name(&self) -> &str {
        self.user_label.as_deref().unwrap_or(self.category.as_str())
    }

    /// Interprets a name picked by the user: a built-in name selects that
    /// category, anything else becomes a user label.
    pub fn from_choice(choice: &str) -> Self {
        let choice = choice.trim();
        if choice.is_empty() {
            return Self::unknown();
        }
        match choice.parse::<Category>() {
            Ok(category) => Self::builtin(category),
            Err(_) => Self::user_defined(choice.to_lowercase()),
        }
    }
}

/// A user-maintained `(pattern, category)` override. The pattern is stored
/// lowercase and matched as a substring of lowercased text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCategoryMapping {
    pub pattern: String,
    pub category: Category,
}

impl UserCategoryMapping {
    pub fn new(pattern: &str, category: Category) -> Self {
        Self {
            pattern: pattern.trim().to_lowercase(),
            category,
        }
    }

    /// A brand-new user category: the label doubles as the match pattern.
    pub fn custom(label: &str) -> Self {
        Self::new(label, Category::Unknown)
    }

    pub fn is_user_defined(&self) -> bool {
        self.category.is_unknown()
    }

    /// `lowercase_text` must already be lowercased.
    pub fn matches(&self, lowercase_text: &str) -> bool {
        !self.pattern.is_empty() && lowercase_text.contains(&self.pattern)
    }

    pub fn classification(&self) -> Classification {
        if self.is_user_defined() {
            Classification::user_defined(self.pattern.clone())
        } else {
            Classification::builtin(self.category)
        }
    }
}

/// Names offered when the user picks a category by hand: every built-in
/// except UNKNOWN, then user-defined labels in the order they were added.
pub fn selectable_categories(mappings: &[UserCategoryMapping]) -> Vec<String> {
    let mut names: Vec<String> = Category::ALL
        .into_iter()
        .filter(|c| !c.is_unknown())
        .map(|c| c.as_str().to_string())
        .collect();
    for mapping in mappings.iter().filter(|m| m.is_user_defined()) {
        if !names.contains(&mapping.pattern) {
            names.push(mapping.pattern.clone());
        }
    }
    names
}
