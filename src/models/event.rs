use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};

/// A normalized activity record attributed to one module. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub module_id: String,
    pub event_type: String,
    pub summary_text: String,
    pub metadata: Option<Value>,
}

impl<'r> FromRow<'r, SqliteRow> for Event {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let metadata: Option<Json<Value>> = row.try_get("metadata_json")?;
        Ok(Self {
            id: row.try_get("id")?,
            timestamp: row.try_get("timestamp")?,
            module_id: row.try_get("module_id")?,
            event_type: row.try_get("event_type")?,
            summary_text: row.try_get("summary_text")?,
            metadata: metadata.map(|Json(v)| v),
        })
    }
}

/// An event produced by a sync pass, not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub timestamp: DateTime<Utc>,
    pub module_id: String,
    pub event_type: String,
    pub summary_text: String,
    pub metadata: Option<Value>,
}

impl NewEvent {
    pub fn new<Tz: TimeZone>(
        timestamp: DateTime<Tz>,
        module_id: impl Into<String>,
        event_type: impl Into<String>,
        summary_text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.with_timezone(&Utc),
            module_id: module_id.into(),
            event_type: event_type.into(),
            summary_text: summary_text.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
