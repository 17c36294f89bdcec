use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A saved dashboard layout. The layout JSON is owned by the front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub id: String,
    pub config_json: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Dashboard {
    /// What an unsaved dashboard looks like.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config_json: serde_json::json!({ "widgets": [] }),
            updated_at: None,
        }
    }
}
