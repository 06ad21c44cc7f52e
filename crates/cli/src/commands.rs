use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use kharcha_core::{
    selectable_categories, CategorizedTransaction, Category, Classification, DateRange, RawMessage,
    Totals, UserCategoryMapping,
};
use kharcha_sms::SyncCoordinator;
use kharcha_storage::{DbPool, SqliteStore, TransactionFilter};
use std::path::Path;

use crate::config::Config;
use crate::source;

/// Bank/date narrowing shared by `list` and `totals`.
#[derive(Debug, Clone, Default)]
pub struct FilterArgs {
    pub bank: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> TransactionFilter {
        TransactionFilter {
            bank: self.bank.clone(),
            range: DateRange::from_bounds(self.from, self.to),
        }
    }
}

fn coordinator(pool: &DbPool, config: &Config) -> Result<SyncCoordinator<SqliteStore>> {
    Ok(SyncCoordinator::new(
        SqliteStore::new(pool.clone()),
        config.extractor(),
        config.classifier()?,
    ))
}

pub async fn sync(pool: &DbPool, config: &Config, csv_path: &Path, json: bool) -> Result<()> {
    let messages = source::read_messages(csv_path)?;
    let summary = coordinator(pool, config)?
        .sync(messages)
        .await
        .context("sync messages")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Seen {} messages: {} new, {} already recorded, {} not transactions",
            summary.total_seen, summary.processed, summary.already_recorded, summary.rejected
        );
    }
    Ok(())
}

pub async fn ingest(
    pool: &DbPool,
    config: &Config,
    body: String,
    sender: String,
    at: Option<String>,
) -> Result<()> {
    let received_at = match at {
        Some(s) => match source::parse_timestamp(&s) {
            Some(ts) => ts,
            None => bail!("invalid timestamp '{s}' (epoch millis or RFC 3339)"),
        },
        None => Utc::now(),
    };
    let message = RawMessage::new(body, sender, received_at);

    match coordinator(pool, config)?.ingest(message).await? {
        Some(tx) => print_transaction(&tx),
        None => println!("Skipped: already recorded or not a transaction"),
    }
    Ok(())
}

pub async fn list(pool: &DbPool, filter: &FilterArgs, json: bool) -> Result<()> {
    let transactions = kharcha_storage::get_transactions(pool, &filter.to_filter()).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }
    if transactions.is_empty() {
        println!("No transactions");
    }
    for tx in &transactions {
        print_transaction(tx);
    }
    Ok(())
}

pub async fn banks(pool: &DbPool) -> Result<()> {
    for bank in kharcha_storage::get_distinct_banks(pool).await? {
        println!("{bank}");
    }
    Ok(())
}

pub async fn totals(pool: &DbPool, filter: &FilterArgs, json: bool) -> Result<()> {
    let transactions = kharcha_storage::get_transactions(pool, &filter.to_filter()).await?;
    let totals = Totals::from_transactions(&transactions);
    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    } else {
        println!("Transactions: {}", totals.count);
        println!("Spent:        {}", totals.spend);
        println!("Received:     {}", totals.credit);
        println!("Net:          {}", totals.net());
    }
    Ok(())
}

pub async fn categorize(pool: &DbPool, id: i64, choice: &str) -> Result<()> {
    if choice.trim().is_empty() {
        bail!("category must not be empty");
    }
    let classification = Classification::from_choice(choice);
    if !kharcha_storage::update_transaction_category(pool, id, &classification).await? {
        bail!("no transaction with id {id}");
    }
    println!("Transaction {id} → {}", classification.display_name());
    Ok(())
}

pub async fn delete(pool: &DbPool, id: i64) -> Result<()> {
    if !kharcha_storage::delete_transaction(pool, id).await? {
        bail!("no transaction with id {id}");
    }
    println!("Deleted transaction {id}");
    Ok(())
}

pub async fn categories(pool: &DbPool) -> Result<()> {
    let mappings = kharcha_storage::get_user_mappings(pool).await?;
    for name in selectable_categories(&mappings) {
        println!("{name}");
    }
    Ok(())
}

pub async fn add_category(pool: &DbPool, label: &str) -> Result<()> {
    if label.trim().is_empty() {
        bail!("category label must not be empty");
    }
    let mapping = UserCategoryMapping::custom(label);
    kharcha_storage::insert_user_mapping(pool, &mapping).await?;
    println!("Added category '{}'", mapping.pattern);
    Ok(())
}

pub async fn map(pool: &DbPool, pattern: &str, category: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        bail!("pattern must not be empty");
    }
    let category: Category = category.parse()?;
    let mapping = UserCategoryMapping::new(pattern, category);
    kharcha_storage::insert_user_mapping(pool, &mapping).await?;
    println!("'{}' → {}", mapping.pattern, category);
    Ok(())
}

fn print_transaction(tx: &CategorizedTransaction) {
    let c = &tx.candidate;
    let id = tx.id.map(|id| id.to_string()).unwrap_or_default();
    println!(
        "{:>5}  {}  {:<10} {:<7} {:>14}  {}  [{}]",
        id,
        c.occurred_on(),
        c.bank,
        c.direction,
        c.amount.to_string(),
        c.merchant,
        tx.classification.display_name(),
    );
}
