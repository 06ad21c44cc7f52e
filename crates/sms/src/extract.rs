use chrono::{DateTime, Utc};
use kharcha_core::{RawMessage, TransactionCandidate, UNKNOWN_MERCHANT};

use crate::patterns::{
    match_account_number, match_amount, match_bank, match_direction, match_merchant,
    match_transaction_datetime, DirectionPriority,
};

// ── Public extraction API ─────────────────────────────────────────────────────

/// Turns one notification into a [`TransactionCandidate`]. Only the amount
/// is mandatory; every other field degrades to its documented fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    direction_priority: DirectionPriority,
}

impl Extractor {
    pub fn new(direction_priority: DirectionPriority) -> Self {
        Self { direction_priority }
    }

    pub fn direction_priority(&self) -> DirectionPriority {
        self.direction_priority
    }

    /// `None` when no positive currency-marked amount is present. That is
    /// the only rejection path.
    pub fn extract(
        &self,
        raw_message: &str,
        sender: &str,
        received_at: DateTime<Utc>,
    ) -> Option<TransactionCandidate> {
        let Some(amount) = match_amount(raw_message) else {
            tracing::debug!(sender, "no currency-marked amount; not a transaction");
            return None;
        };
        if !amount.is_positive() {
            tracing::debug!(sender, %amount, "non-positive amount; not a transaction");
            return None;
        }

        Some(TransactionCandidate {
            amount,
            direction: match_direction(raw_message, self.direction_priority),
            merchant: match_merchant(raw_message).unwrap_or_else(|| UNKNOWN_MERCHANT.to_string()),
            bank: match_bank(raw_message, sender),
            account_number: match_account_number(raw_message),
            transaction_at: match_transaction_datetime(raw_message),
            raw_message: raw_message.to_string(),
            sender: sender.to_string(),
            received_at,
        })
    }

    pub fn extract_message(&self, message: &RawMessage) -> Option<TransactionCandidate> {
        self.extract(&message.body, &message.sender, message.received_at)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
