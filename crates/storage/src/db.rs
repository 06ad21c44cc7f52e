use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use kharcha_core::{
    CategorizedTransaction, Category, Classification, DateRange, Direction, Money,
    TransactionCandidate, UserCategoryMapping,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const TRANSACTION_COLUMNS: &str = "id, amount, direction, merchant, bank, account_number, \
     transaction_at, raw_message, sender, received_at, category, user_category";

type TransactionRow = (
    i64,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
    String,
    Option<String>,
);

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// A private database that lives as long as the pool's single connection.
pub async fn create_memory_db() -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount TEXT NOT NULL,
            direction TEXT NOT NULL,
            merchant TEXT NOT NULL,
            bank TEXT NOT NULL,
            account_number TEXT,
            transaction_at TEXT,
            occurred_on TEXT NOT NULL,
            raw_message TEXT NOT NULL UNIQUE,
            sender TEXT NOT NULL,
            received_at TEXT NOT NULL,
            category TEXT NOT NULL,
            user_category TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_occurred_on ON transactions (occurred_on)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_category_mappings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pattern TEXT NOT NULL UNIQUE,
            category TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── Transactions ──────────────────────────────────────────────────────────────

/// Optional narrowing for transaction listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub bank: Option<String>,
    pub range: Option<DateRange>,
}

pub async fn transaction_exists(pool: &DbPool, raw_message: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64,)>("SELECT 1 FROM transactions WHERE raw_message = ? LIMIT 1")
        .bind(raw_message)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Returns the new row id, or `None` when a row with the same raw message
/// already exists.
pub async fn insert_transaction(
    pool: &DbPool,
    tx: &CategorizedTransaction,
) -> Result<Option<i64>, sqlx::Error> {
    let c = &tx.candidate;
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO transactions (
            amount, direction, merchant, bank, account_number, transaction_at,
            occurred_on, raw_message, sender, received_at, category, user_category
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(c.amount.as_decimal().to_string())
    .bind(c.direction.as_str())
    .bind(&c.merchant)
    .bind(&c.bank)
    .bind(&c.account_number)
    .bind(c.transaction_at.map(|dt| dt.format(TIMESTAMP_FORMAT).to_string()))
    .bind(c.occurred_on().to_string())
    .bind(&c.raw_message)
    .bind(&c.sender)
    .bind(c.received_at.to_rfc3339())
    .bind(tx.classification.category.as_str())
    .bind(&tx.classification.user_label)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(result.last_insert_rowid()))
}

/// Newest first.
pub async fn get_transactions(
    pool: &DbPool,
    filter: &TransactionFilter,
) -> Result<Vec<CategorizedTransaction>, sqlx::Error> {
    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions \
         WHERE (?1 IS NULL OR bank = ?1) \
           AND (?2 IS NULL OR occurred_on >= ?2) \
           AND (?3 IS NULL OR occurred_on <= ?3) \
         ORDER BY occurred_on DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, TransactionRow>(&sql)
        .bind(filter.bank.as_deref())
        .bind(filter.range.map(|r| r.start.to_string()))
        .bind(filter.range.map(|r| r.end.to_string()))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(row_to_transaction).collect()
}

pub async fn get_transaction_by_id(
    pool: &DbPool,
    id: i64,
) -> Result<Option<CategorizedTransaction>, sqlx::Error> {
    let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?");
    let row = sqlx::query_as::<_, TransactionRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(row_to_transaction).transpose()
}

pub async fn get_distinct_banks(pool: &DbPool) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String,)>("SELECT DISTINCT bank FROM transactions ORDER BY bank")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Returns false when no transaction has that id.
pub async fn update_transaction_category(
    pool: &DbPool,
    id: i64,
    classification: &Classification,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE transactions SET category = ?, user_category = ? WHERE id = ?")
        .bind(classification.category.as_str())
        .bind(&classification.user_label)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_transaction(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn row_to_transaction(r: TransactionRow) -> Result<CategorizedTransaction, sqlx::Error> {
    let amount: Money = r.1.parse().map_err(decode_error)?;
    let direction: Direction = r.2.parse().map_err(decode_error)?;
    let transaction_at = r
        .6
        .map(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT))
        .transpose()
        .map_err(decode_error)?;
    let received_at = DateTime::parse_from_rfc3339(&r.9)
        .map_err(decode_error)?
        .with_timezone(&Utc);
    let category: Category = r.10.parse().map_err(decode_error)?;

    let candidate = TransactionCandidate {
        amount,
        direction,
        merchant: r.3,
        bank: r.4,
        account_number: r.5,
        transaction_at,
        raw_message: r.7,
        sender: r.8,
        received_at,
    };
    let classification = Classification {
        category,
        user_label: r.11,
    };

    Ok(CategorizedTransaction {
        id: Some(r.0),
        candidate,
        classification,
    })
}

fn decode_error<E>(err: E) -> sqlx::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    sqlx::Error::Decode(err.into())
}

// ── User category mappings ────────────────────────────────────────────────────

/// Re-adding a pattern replaces its category but keeps its position.
pub async fn insert_user_mapping(
    pool: &DbPool,
    mapping: &UserCategoryMapping,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_category_mappings (pattern, category) VALUES (?, ?) \
         ON CONFLICT(pattern) DO UPDATE SET category = excluded.category",
    )
    .bind(&mapping.pattern)
    .bind(mapping.category.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_user_mappings(pool: &DbPool) -> Result<Vec<UserCategoryMapping>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT pattern, category FROM user_category_mappings ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(pattern, category)| {
            let category: Category = category.parse().map_err(decode_error)?;
            Ok(UserCategoryMapping { pattern, category })
        })
        .collect()
}
