//! Named matchers over bank notification text. Every matcher is total:
//! a message it cannot read yields `None`, never an error.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use kharcha_core::{Direction, Money};
use regex::Regex;
use serde::{Deserialize, Serialize};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_amount,
    r"(?:\bRs\.?|\bRS\.?|\bINR)\s*(\d[\d,]*(?:\.\d{1,2})?)");

re!(re_merchant_upi,
    r"(?i)\bUPI/P2[AM]/(?:\d+/)*([^/\n;]+?)\s*(?:\.(?:\s|$)|;|/|\n|\s+on\s+\d|$)");
re!(re_merchant_info,
    r"(?i)\bInfo:\s*([^\n]+?)\s*(?:\.(?:\s|$)|\n|$)");
re!(re_merchant_for,
    r"(?i)\bfor\s+(.+?)\s*(?:\.\s|\.?\n|\.?$)");
re!(re_merchant_at,
    r"(?i)\bat\s+([\w&'*]+(?:[ \t]+[\w&'*]+)*)");
re!(re_merchant_to,
    r"(?i)\bto\s+([\w&'*]+(?:[ \t]+[\w&'*]+)*)");
re!(re_merchant_from,
    r"(?i)\bfrom\s+([\w&'*]+(?:[ \t]+[\w&'*]+)*)");

re!(re_bank,
    r"\b(?i:from|in|at|with|on)\s+([A-Za-z0-9 ]+?)\s*(?:Pvt Ltd|Ltd|Bank|bank|BANK|A/c|Acct|account|card)\b");
re!(re_sender_code,
    r"^[A-Za-z]{2}-([A-Za-z0-9]{3,8})(?:-[A-Za-z])?$");

re!(re_account,
    r"(?i)\bA/c(?:\s*no\.?)?\s*([x*\d]+)");

re!(re_datetime,
    r"\b(\d{2})-(\d{2})-(\d{2}),\s*(\d{2}):(\d{2}):(\d{2})\b");
re!(re_date_abbr_month,
    r"(?i)\b(\d{2})-(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)-(\d{2})\b");

// ── Amount ───────────────────────────────────────────────────────────────────

/// First currency-marked number (`Rs`, `Rs.`, `INR`). Zero is returned as
/// found; rejecting non-positive amounts is the extractor's job.
pub fn match_amount(text: &str) -> Option<Money> {
    let c = re_amount().captures(text)?;
    Money::parse_grouped(c.get(1)?.as_str())
}

// ── Direction ────────────────────────────────────────────────────────────────

pub const CREDIT_KEYWORDS: &[&str] = &[
    "credited", "received", "added", "deposited", "deposit", "refund", "credit",
];
pub const DEBIT_KEYWORDS: &[&str] = &[
    "debited", "spent", "paid", "deducted", "purchase", "payment", "withdrawal",
];

/// Which keyword set decides when a message contains words from both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionPriority {
    #[default]
    CreditFirst,
    DebitFirst,
}

pub fn match_direction(text: &str, priority: DirectionPriority) -> Direction {
    let lower = text.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
    let order = match priority {
        DirectionPriority::CreditFirst => [
            (CREDIT_KEYWORDS, Direction::Credit),
            (DEBIT_KEYWORDS, Direction::Debit),
        ],
        DirectionPriority::DebitFirst => [
            (DEBIT_KEYWORDS, Direction::Debit),
            (CREDIT_KEYWORDS, Direction::Credit),
        ],
    };
    order
        .into_iter()
        .find(|(keywords, _)| has_any(*keywords))
        .map(|(_, direction)| direction)
        .unwrap_or(Direction::Unknown)
}

// ── Merchant ─────────────────────────────────────────────────────────────────

/// Words that end a prepositional merchant phrase ("at AMAZON on 05-06-24").
const MERCHANT_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "your", "on", "in", "via", "ref", "using", "with", "by", "for", "from",
    "to", "at", "is", "has", "and", "avl", "bal", "txn", "dated", "upi", "info",
];

/// Merchant extraction strategies, tried in [`MerchantStrategy::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerchantStrategy {
    /// `UPI/P2M/<ref>/<merchant>` or `UPI/P2A/<ref>/<payee>`.
    UpiReference,
    /// `Info: <merchant>`.
    InfoSegment,
    /// `for <clause>` up to the next sentence break.
    ForClause,
    /// `at|to|from <words>`, cut at the first stop word.
    Preposition,
}

impl MerchantStrategy {
    pub const ORDER: [MerchantStrategy; 4] = [
        MerchantStrategy::UpiReference,
        MerchantStrategy::InfoSegment,
        MerchantStrategy::ForClause,
        MerchantStrategy::Preposition,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MerchantStrategy::UpiReference => "upi",
            MerchantStrategy::InfoSegment => "info",
            MerchantStrategy::ForClause => "for",
            MerchantStrategy::Preposition => "preposition",
        }
    }

    pub fn apply(self, text: &str) -> Option<String> {
        match self {
            MerchantStrategy::UpiReference => first_capture(re_merchant_upi(), text),
            MerchantStrategy::InfoSegment => first_capture(re_merchant_info(), text),
            MerchantStrategy::ForClause => first_capture(re_merchant_for(), text),
            MerchantStrategy::Preposition => [re_merchant_at(), re_merchant_to(), re_merchant_from()]
                .into_iter()
                .find_map(|re| {
                    re.captures_iter(text)
                        .filter_map(|c| c.get(1))
                        .find_map(|m| cut_at_stop_word(m.as_str()))
                }),
        }
    }
}

/// The first strategy that yields a non-empty merchant, with its name.
pub fn match_merchant_with_strategy(text: &str) -> Option<(MerchantStrategy, String)> {
    MerchantStrategy::ORDER
        .into_iter()
        .find_map(|s| s.apply(text).map(|m| (s, m)))
}

pub fn match_merchant(text: &str) -> Option<String> {
    match_merchant_with_strategy(text).map(|(_, m)| m)
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    let c = re.captures(text)?;
    clean_label(c.get(1)?.as_str())
}

fn cut_at_stop_word(phrase: &str) -> Option<String> {
    let kept: Vec<&str> = phrase
        .split_whitespace()
        .take_while(|w| !MERCHANT_STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    clean_label(&kept.join(" "))
}

fn clean_label(s: &str) -> Option<String> {
    let trimmed = s
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '-'))
        .trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ── Bank ─────────────────────────────────────────────────────────────────────

const BANK_PREPOSITIONS: &[&str] = &["from", "in", "at", "with", "on"];

/// Issuer name from `<prep> <name> Bank|Ltd|A/c|...`, else the code inside
/// a `XX-CODE[-S]` sender header, else the sender unchanged.
pub fn match_bank(text: &str, sender: &str) -> String {
    re_bank()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find_map(|m| clean_bank_name(m.as_str()))
        .or_else(|| bank_code_from_sender(sender))
        .unwrap_or_else(|| sender.to_string())
}

fn clean_bank_name(name: &str) -> Option<String> {
    let words: Vec<&str> = name.split_whitespace().collect();
    // The pattern anchors on the first preposition; the name follows the last.
    let start = words
        .iter()
        .rposition(|w| BANK_PREPOSITIONS.contains(&w.to_lowercase().as_str()))
        .map_or(0, |i| i + 1);
    let words: Vec<&str> = words[start..]
        .iter()
        .copied()
        .skip_while(|w| matches!(w.to_lowercase().as_str(), "your" | "the" | "a"))
        .collect();
    let name = words.join(" ");
    match name.to_lowercase().as_str() {
        "" | "credit" | "debit" => None,
        _ => Some(name),
    }
}

pub fn bank_code_from_sender(sender: &str) -> Option<String> {
    let c = re_sender_code().captures(sender.trim())?;
    Some(c.get(1)?.as_str().to_string())
}

// ── Account number ───────────────────────────────────────────────────────────

/// Masked account reference after `A/c` / `A/c no.`, e.g. `XX1234`, `**9876`.
pub fn match_account_number(text: &str) -> Option<String> {
    re_account()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|s| s.chars().any(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

// ── Transaction date-time ────────────────────────────────────────────────────

/// `dd-mm-yy, HH:MM:SS`, then `dd-MMM-yy` (midnight). Impossible dates or
/// times fall through to the next form and finally to `None`.
pub fn match_transaction_datetime(text: &str) -> Option<NaiveDateTime> {
    try_datetime(text).or_else(|| try_date_abbr_month(text))
}

fn try_datetime(text: &str) -> Option<NaiveDateTime> {
    re_datetime().captures_iter(text).find_map(|c| {
        let day: u32 = c.get(1)?.as_str().parse().ok()?;
        let month: u32 = c.get(2)?.as_str().parse().ok()?;
        let year = expand_year(c.get(3)?.as_str().parse().ok()?);
        let hour: u32 = c.get(4)?.as_str().parse().ok()?;
        let minute: u32 = c.get(5)?.as_str().parse().ok()?;
        let second: u32 = c.get(6)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    })
}

fn try_date_abbr_month(text: &str) -> Option<NaiveDateTime> {
    re_date_abbr_month().captures_iter(text).find_map(|c| {
        let day: u32 = c.get(1)?.as_str().parse().ok()?;
        let month = abbr_month_to_num(c.get(2)?.as_str())?;
        let year = expand_year(c.get(3)?.as_str().parse().ok()?);
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
    })
}

fn expand_year(y: i32) -> i32 {
    if y < 100 { 2000 + y } else { y }
}

fn abbr_month_to_num(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "jan" => Some(1), "feb" => Some(2), "mar" => Some(3), "apr" => Some(4),
        "may" => Some(5), "jun" => Some(6), "jul" => Some(7), "aug" => Some(8),
        "sep" => Some(9), "oct" => Some(10), "nov" => Some(11), "dec" => Some(12),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    // ── Amount ───────────────────────────────────────────────────────────────

    #[test]
    fn amount_with_separators_and_decimals() {
        assert_eq!(match_amount("Rs. 1,250.50 debited"), Some(Money::from_paise(125050)));
        assert_eq!(match_amount("INR 45 spent"), Some(Money::from_paise(4500)));
        assert_eq!(match_amount("Rs45.5 paid"), Some(Money::from_paise(4550)));
        assert_eq!(match_amount("RS.1,00,000.00 credited"), Some(Money::from_paise(10_000_000)));
    }

    #[test]
    fn amount_takes_first_marked_number() {
        let text = "Rs 200 debited. Avl Bal Rs 10,000.00";
        assert_eq!(match_amount(text), Some(Money::from_paise(20000)));
    }

    #[test]
    fn amount_requires_currency_marker() {
        assert_eq!(match_amount("1,250.50 debited from your account"), None);
        assert_eq!(match_amount("Your OTP is 123456"), None);
        assert_eq!(match_amount("Members get 20% off"), None);
    }

    #[test]
    fn amount_zero_is_reported_as_zero() {
        assert_eq!(match_amount("Rs 0.00 debited at Store"), Some(Money::zero()));
    }

    // ── Direction ────────────────────────────────────────────────────────────

    #[test]
    fn direction_keywords() {
        let p = DirectionPriority::default();
        assert_eq!(match_direction("Rs 10 DEBITED from a/c", p), Direction::Debit);
        assert_eq!(match_direction("You have spent Rs 10", p), Direction::Debit);
        assert_eq!(match_direction("Rs 10 credited to a/c", p), Direction::Credit);
        assert_eq!(match_direction("Refund of Rs 10 processed", p), Direction::Credit);
        assert_eq!(match_direction("Your OTP is 1234", p), Direction::Unknown);
    }

    #[test]
    fn direction_priority_decides_mixed_messages() {
        let text = "Refund for payment of Rs 500 initiated";
        assert_eq!(match_direction(text, DirectionPriority::CreditFirst), Direction::Credit);
        assert_eq!(match_direction(text, DirectionPriority::DebitFirst), Direction::Debit);
    }

    // ── Merchant ─────────────────────────────────────────────────────────────

    #[test]
    fn merchant_upi_person_skips_reference() {
        let text = "Rs 45.00 debited UPI/P2A/12345/johndoe/Axis Bank";
        assert_eq!(
            match_merchant_with_strategy(text),
            Some((MerchantStrategy::UpiReference, "johndoe".to_string()))
        );
    }

    #[test]
    fn merchant_upi_is_case_insensitive_and_allows_several_refs() {
        let text = "Rs 200 debited upi/p2m/4455/998877/SWIGGY/HDFC";
        assert_eq!(match_merchant(text).as_deref(), Some("SWIGGY"));
    }

    #[test]
    fn merchant_upi_stops_at_sentence_break() {
        let text = "Rs 250.00 debited via UPI/P2M/412345678/RAMESH KIRANA. Avl bal Rs 1,000. Not you? Block it online";
        assert_eq!(match_merchant(text).as_deref(), Some("RAMESH KIRANA"));
        assert_eq!(
            match_merchant("Rs 80 debited UPI/P2M/99/DMART on 05-06-24, 14:30:00").as_deref(),
            Some("DMART")
        );
        assert_eq!(
            match_merchant("Rs 80 debited UPI/P2A/77/asha; Ref 5521").as_deref(),
            Some("asha")
        );
    }

    #[test]
    fn merchant_upi_wins_over_preposition() {
        let text = "Rs 99 paid to VPA via UPI/P2M/1234/BigBasket";
        assert_eq!(match_merchant(text).as_deref(), Some("BigBasket"));
    }

    #[test]
    fn merchant_info_segment() {
        let text = "Rs 649.00 debited from A/c XX12. Info: BIL*ONL*NETFLIX. Avl Bal Rs 100";
        assert_eq!(
            match_merchant_with_strategy(text),
            Some((MerchantStrategy::InfoSegment, "BIL*ONL*NETFLIX".to_string()))
        );
    }

    #[test]
    fn merchant_for_clause_to_sentence_end() {
        let text = "Rs 1,499 debited for Airtel broadband bill. Avl bal Rs 50";
        assert_eq!(match_merchant(text).as_deref(), Some("Airtel broadband bill"));
        let tail = "Rs 300 paid for Cult Fit";
        assert_eq!(match_merchant(tail).as_deref(), Some("Cult Fit"));
    }

    #[test]
    fn merchant_at_phrase_stops_at_stop_word() {
        let text = "Rs. 1,250.50 debited from A/c no. XX1234 at AMAZON on 05-06-24, 14:30:00";
        assert_eq!(
            match_merchant_with_strategy(text),
            Some((MerchantStrategy::Preposition, "AMAZON".to_string()))
        );
    }

    #[test]
    fn merchant_multi_word_stops_at_punctuation() {
        let text = "Rs 80 spent at Cafe Coffee Day, Koramangala";
        assert_eq!(match_merchant(text).as_deref(), Some("Cafe Coffee Day"));
    }

    #[test]
    fn merchant_skips_possessive_to_phrase() {
        let text = "Rs 5,000 credited to your A/c XX99 from RAHUL KUMAR";
        assert_eq!(match_merchant(text).as_deref(), Some("RAHUL KUMAR"));
    }

    #[test]
    fn merchant_none_without_any_phrase() {
        assert_eq!(match_merchant("Rs 99 debited. Avl bal Rs 1"), None);
    }

    // ── Bank ─────────────────────────────────────────────────────────────────

    #[test]
    fn bank_from_prepositional_phrase() {
        assert_eq!(match_bank("Rs 10 debited from HDFC Bank A/c XX1", "AD-HDFCBK"), "HDFC");
        assert_eq!(match_bank("Rs 10 spent on your ICICI card", "x"), "ICICI");
        assert_eq!(match_bank("Rs 10 credited in Kotak Mahindra Bank", "x"), "Kotak Mahindra");
    }

    #[test]
    fn bank_name_follows_last_preposition() {
        assert_eq!(match_bank("Rs 500 spent at DMart on HDFC Bank card", "x"), "HDFC");
        assert_eq!(
            match_bank("Rs 500 debited from your account at Zomato with ICICI Bank", "x"),
            "ICICI"
        );
    }

    #[test]
    fn bank_falls_back_to_sender_code() {
        assert_eq!(match_bank("Rs 10 debited", "VM-SBIINB"), "SBIINB");
        assert_eq!(match_bank("Rs 10 debited", "AX-AXISBK-S"), "AXISBK");
    }

    #[test]
    fn bank_falls_back_to_raw_sender() {
        assert_eq!(match_bank("Rs 10 debited", "+919876543210"), "+919876543210");
        assert_eq!(match_bank("Rs 10 debited", "PAYTM"), "PAYTM");
    }

    #[test]
    fn bank_ignores_account_reference_without_name() {
        let text = "Rs. 1,250.50 debited from A/c no. XX1234 at AMAZON on 05-06-24, 14:30:00";
        assert_eq!(match_bank(text, "AD-HDFCBK"), "HDFCBK");
    }

    // ── Account ──────────────────────────────────────────────────────────────

    #[test]
    fn account_number_forms() {
        assert_eq!(match_account_number("from A/c no. XX1234 at").as_deref(), Some("XX1234"));
        assert_eq!(match_account_number("to A/c XX9876").as_deref(), Some("XX9876"));
        assert_eq!(match_account_number("a/c **4321 debited").as_deref(), Some("**4321"));
        assert_eq!(match_account_number("A/c no.1234").as_deref(), Some("1234"));
    }

    #[test]
    fn account_number_needs_digits() {
        assert_eq!(match_account_number("Your A/c is blocked"), None);
        assert_eq!(match_account_number("no account here"), None);
    }

    // ── Date-time ────────────────────────────────────────────────────────────

    #[test]
    fn datetime_numeric_form() {
        assert_eq!(
            match_transaction_datetime("at AMAZON on 05-06-24, 14:30:00"),
            Some(dt(2024, 6, 5, 14, 30, 0))
        );
        assert_eq!(
            match_transaction_datetime("on 31-12-23,23:59:59."),
            Some(dt(2023, 12, 31, 23, 59, 59))
        );
    }

    #[test]
    fn datetime_abbreviated_month_is_midnight() {
        assert_eq!(
            match_transaction_datetime("debited on 07-Mar-24 at DMart"),
            Some(dt(2024, 3, 7, 0, 0, 0))
        );
    }

    #[test]
    fn datetime_malformed_is_none() {
        assert_eq!(match_transaction_datetime("on 32-13-24, 14:30:00"), None);
        assert_eq!(match_transaction_datetime("on 05-06-24, 25:61:00"), None);
        assert_eq!(match_transaction_datetime("on 30-Feb-24"), None);
        assert_eq!(match_transaction_datetime("no date here"), None);
    }

    #[test]
    fn datetime_malformed_numeric_falls_through_to_month_form() {
        let text = "ref 99-99-99, 99:99:99 posted 01-Jan-25";
        assert_eq!(match_transaction_datetime(text), Some(dt(2025, 1, 1, 0, 0, 0)));
    }
}
