use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row, SqlitePool};

use crate::models::ModuleConfig;
use crate::services::event_store::sql_timestamp;

impl<'r> FromRow<'r, SqliteRow> for ModuleConfig {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let Json(config): Json<Value> = row.try_get("config_json")?;
        Ok(ModuleConfig {
            module_id: row.try_get("module_id")?,
            config,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

pub async fn get_module_config(
    pool: &SqlitePool,
    module_id: &str,
) -> Result<Option<ModuleConfig>, sqlx::Error> {
    sqlx::query_as::<_, ModuleConfig>(
        "SELECT module_id, config_json, updated_at FROM module_configs WHERE module_id = ?1",
    )
    .bind(module_id)
    .fetch_optional(pool)
    .await
}

/// Insert or replace the config for a module, refreshing `updated_at`.
pub async fn upsert_module_config(
    pool: &SqlitePool,
    module_id: &str,
    config: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO module_configs (module_id, config_json, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (module_id)
        DO UPDATE SET config_json = excluded.config_json, updated_at = excluded.updated_at
        "#,
    )
    .bind(module_id)
    .bind(Json(config))
    .bind(sql_timestamp(&Utc::now()))
    .execute(pool)
    .await?;

    tracing::info!(module_id, "Module config saved");
    Ok(())
}
