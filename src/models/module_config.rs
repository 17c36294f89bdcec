use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Persisted settings for one module, keyed by module id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleConfig {
    pub module_id: String,
    pub config: Value,
    pub updated_at: DateTime<Utc>,
}

/// Trimmed string field of a config object; empty strings read as absent.
pub fn str_field(config: &Value, key: &str) -> Option<String> {
    config
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
