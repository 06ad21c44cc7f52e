use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::category::{Category, CategoryError, Classification};
use super::money::Money;

/// Merchant label used when no extraction strategy produced one.
pub const UNKNOWN_MERCHANT: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Credit,
    Debit,
    Unknown,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Credit => "CREDIT",
            Direction::Debit => "DEBIT",
            Direction::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CREDIT" => Ok(Direction::Credit),
            "DEBIT" => Ok(Direction::Debit),
            "UNKNOWN" => Ok(Direction::Unknown),
            other => Err(format!("Unknown direction: '{other}'")),
        }
    }
}

/// One inbox message as handed over by the message source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub body: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(body: impl Into<String>, sender: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            body: body.into(),
            sender: sender.into(),
            received_at,
        }
    }
}

/// An extracted but not yet categorized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCandidate {
    /// Always positive.
    pub amount: Money,
    pub direction: Direction,
    pub merchant: String,
    pub bank: String,
    pub account_number: Option<String>,
    /// Parsed from the message text; distinct from `received_at`.
    pub transaction_at: Option<NaiveDateTime>,
    /// Verbatim message body. Also the dedup key.
    pub raw_message: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
}

impl TransactionCandidate {
    /// The calendar day the transaction belongs to: the date printed in the
    /// message when there is one, otherwise the day it arrived.
    pub fn occurred_on(&self) -> NaiveDate {
        self.transaction_at
            .map(|dt| dt.date())
            .unwrap_or_else(|| self.received_at.date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    /// Assigned by the store; `None` until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub candidate: TransactionCandidate,
    #[serde(flatten)]
    pub classification: Classification,
}

impl CategorizedTransaction {
    pub fn new(candidate: TransactionCandidate, classification: Classification) -> Self {
        Self {
            id: None,
            candidate,
            classification,
        }
    }

    pub fn category(&self) -> Category {
        self.classification.category
    }

    /// Applies a manual re-categorization, e.g. from a picker.
    pub fn recategorize(&mut self, choice: &str) -> Result<(), CategoryError> {
        if choice.trim().is_empty() {
            return Err(CategoryError::UnknownName(choice.to_string()));
        }
        self.classification = Classification::from_choice(choice);
        Ok(())
    }
}

/// Spend and credit sums over a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub spend: Money,
    pub credit: Money,
    pub count: usize,
}

impl Totals {
    /// Debits count as spend, credits as credit; UNKNOWN directions are
    /// counted in `count` only.
    pub fn from_transactions(transactions: &[CategorizedTransaction]) -> Self {
        let mut totals = Totals {
            spend: Money::zero(),
            credit: Money::zero(),
            count: transactions.len(),
        };
        for tx in transactions {
            match tx.candidate.direction {
                Direction::Debit => totals.spend = totals.spend + tx.candidate.amount,
                Direction::Credit => totals.credit = totals.credit + tx.candidate.amount,
                Direction::Unknown => {}
            }
        }
        totals
    }

    pub fn net(&self) -> Money {
        self.credit - self.spend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(paise: i64, direction: Direction) -> TransactionCandidate {
        TransactionCandidate {
            amount: Money::from_paise(paise),
            direction,
            merchant: "AMAZON".to_string(),
            bank: "HDFC".to_string(),
            account_number: Some("XX1234".to_string()),
            transaction_at: None,
            raw_message: format!("Rs {paise} {direction}"),
            sender: "AD-HDFCBK".to_string(),
            received_at: Utc.with_ymd_and_hms(2024, 6, 5, 20, 0, 0).unwrap(),
        }
    }

    #[test]
    fn occurred_on_prefers_message_date() {
        let mut c = candidate(100, Direction::Debit);
        assert_eq!(c.occurred_on(), NaiveDate::from_ymd_opt(2024, 6, 5).unwrap());

        c.transaction_at = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 15, 0);
        assert_eq!(c.occurred_on(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn direction_parse() {
        assert_eq!("debit".parse::<Direction>().unwrap(), Direction::Debit);
        assert_eq!("CREDIT".parse::<Direction>().unwrap(), Direction::Credit);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn totals_split_by_direction() {
        let txs = vec![
            CategorizedTransaction::new(candidate(10_000, Direction::Debit), Classification::unknown()),
            CategorizedTransaction::new(candidate(2_550, Direction::Debit), Classification::unknown()),
            CategorizedTransaction::new(candidate(50_000, Direction::Credit), Classification::unknown()),
            CategorizedTransaction::new(candidate(999, Direction::Unknown), Classification::unknown()),
        ];
        let totals = Totals::from_transactions(&txs);
        assert_eq!(totals.spend, Money::from_paise(12_550));
        assert_eq!(totals.credit, Money::from_paise(50_000));
        assert_eq!(totals.count, 4);
        assert_eq!(totals.net(), Money::from_paise(37_450));
    }

    #[test]
    fn recategorize_switches_between_builtin_and_label() {
        let mut tx = CategorizedTransaction::new(candidate(100, Direction::Debit), Classification::unknown());
        tx.recategorize("shopping").unwrap();
        assert_eq!(tx.category(), Category::Shopping);
        assert_eq!(tx.classification.user_label, None);

        tx.recategorize("Gym").unwrap();
        assert_eq!(tx.category(), Category::Unknown);
        assert_eq!(tx.classification.user_label.as_deref(), Some("gym"));

        assert!(tx.recategorize("").is_err());
    }

    #[test]
    fn categorized_serializes_flat() {
        let tx = CategorizedTransaction::new(
            candidate(4500, Direction::Debit),
            Classification::builtin(Category::Shopping),
        );
        let v: serde_json::Value = serde_json::to_value(&tx).unwrap();
        assert_eq!(v["category"], "SHOPPING");
        assert_eq!(v["direction"], "DEBIT");
        assert_eq!(v["merchant"], "AMAZON");
        assert!(v.get("id").is_none());
        assert!(v.get("user_label").is_none());
    }
}
