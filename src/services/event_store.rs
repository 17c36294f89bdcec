//! The shared event log. Sync passes append through [`insert_events`]; widgets read through
//! the query helpers below.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::{Event, NewEvent};

/// Timestamps are stored as fixed-width UTC text so range filters can compare them as strings.
pub fn sql_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Insert a whole sync pass in one transaction. Nothing is visible until the commit.
pub async fn insert_events(pool: &SqlitePool, events: &[NewEvent]) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for event in events {
        let result = sqlx::query(
            r#"
            INSERT INTO events (timestamp, module_id, event_type, summary_text, metadata_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(sql_timestamp(&event.timestamp))
        .bind(&event.module_id)
        .bind(&event.event_type)
        .bind(&event.summary_text)
        .bind(event.metadata.as_ref().map(Json))
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Most recent events for a module, newest first.
pub async fn recent_events(
    pool: &SqlitePool,
    module_id: &str,
    limit: i64,
) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        r#"
        SELECT id, timestamp, module_id, event_type, summary_text, metadata_json
        FROM events
        WHERE module_id = ?1
        ORDER BY timestamp DESC, id DESC
        LIMIT ?2
        "#,
    )
    .bind(module_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Events for a module inside `[now - window, now]`, lower bound inclusive.
pub async fn count_in_window(
    pool: &SqlitePool,
    module_id: &str,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM events
        WHERE module_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
        "#,
    )
    .bind(module_id)
    .bind(sql_timestamp(&(now - window)))
    .bind(sql_timestamp(&now))
    .fetch_one(pool)
    .await
}

/// Timestamps of one GitHub-style event kind for a module since `since`, oldest first.
/// A row matches on its `event_type`, or on `metadata_json.kind` for rows imported from a
/// local export, which all share one event type.
pub async fn timestamps_since(
    pool: &SqlitePool,
    module_id: &str,
    kind: &str,
    since: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        r#"
        SELECT timestamp
        FROM events
        WHERE module_id = ?1
          AND (event_type = ?2 OR json_extract(metadata_json, '$.kind') = ?2)
          AND timestamp >= ?3
        ORDER BY timestamp
        "#,
    )
    .bind(module_id)
    .bind(kind)
    .bind(sql_timestamp(&since))
    .fetch_all(pool)
    .await
}

/// Per event type counts for a module since `since`, most frequent first.
pub async fn count_by_type_since(
    pool: &SqlitePool,
    module_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT event_type, COUNT(*) AS total
        FROM events
        WHERE module_id = ?1 AND timestamp >= ?2
        GROUP BY event_type
        ORDER BY total DESC, event_type
        "#,
    )
    .bind(module_id)
    .bind(sql_timestamp(&since))
    .fetch_all(pool)
    .await
}

pub async fn count_for_module(pool: &SqlitePool, module_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE module_id = ?1")
        .bind(module_id)
        .fetch_one(pool)
        .await
}
