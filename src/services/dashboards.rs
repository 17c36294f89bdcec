use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::Dashboard;
use crate::services::event_store::sql_timestamp;

/// Returns the stored dashboard, or an empty layout if it was never saved.
pub async fn get_dashboard(
    pool: &SqlitePool,
    dashboard_id: &str,
) -> Result<Dashboard, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, Json<Value>, DateTime<Utc>)>(
        "SELECT id, config_json, updated_at FROM dashboards WHERE id = ?1",
    )
    .bind(dashboard_id)
    .fetch_optional(pool)
    .await?;

    Ok(match row {
        Some((id, Json(config_json), updated_at)) => Dashboard {
            id,
            config_json,
            updated_at: Some(updated_at),
        },
        None => Dashboard::empty(dashboard_id),
    })
}

pub async fn upsert_dashboard(
    pool: &SqlitePool,
    dashboard_id: &str,
    config_json: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO dashboards (id, config_json, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (id)
        DO UPDATE SET config_json = excluded.config_json, updated_at = excluded.updated_at
        "#,
    )
    .bind(dashboard_id)
    .bind(Json(config_json))
    .bind(sql_timestamp(&Utc::now()))
    .execute(pool)
    .await?;
    Ok(())
}
