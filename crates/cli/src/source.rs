use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use kharcha_core::RawMessage;
use serde::Deserialize;
use std::io;
use std::path::Path;

/// One exported inbox row: `body,sender,timestamp`.
#[derive(Debug, Deserialize)]
struct MessageRow {
    body: String,
    sender: String,
    timestamp: String,
}

/// Epoch milliseconds or RFC 3339.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<i64>() {
        return Utc.timestamp_millis_opt(ms).single();
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn read_messages(path: &Path) -> Result<Vec<RawMessage>> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(messages_from_reader(file))
}

/// Rows that fail to decode are logged and skipped.
pub fn messages_from_reader<R: io::Read>(reader: R) -> Vec<RawMessage> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut messages = Vec::new();
    for (index, result) in rdr.deserialize::<MessageRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(row = index + 1, "skipping unreadable message row: {e}");
                continue;
            }
        };
        let Some(received_at) = parse_timestamp(&row.timestamp) else {
            tracing::warn!(row = index + 1, timestamp = %row.timestamp, "skipping row with bad timestamp");
            continue;
        };
        messages.push(RawMessage::new(row.body, row.sender, received_at));
    }
    messages
}
