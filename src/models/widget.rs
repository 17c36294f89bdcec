use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const VISUAL_TIMELINE: &str = "timeline";
pub const VISUAL_COUNTER: &str = "counter";
pub const VISUAL_PIE: &str = "pie";
pub const VISUAL_UNKNOWN: &str = "unknown";

/// Widget query parameters, e.g. `limit`. Values come from JSON or a query string.
pub type WidgetParams = HashMap<String, Value>;

/// Static, module-authored description of one widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    pub id: String,
    pub title: String,
    pub visual_type: String,
    pub description: Option<String>,
    #[serde(default = "empty_object")]
    pub config_schema: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl WidgetDescriptor {
    pub fn new(id: &str, title: &str, visual_type: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            visual_type: visual_type.to_string(),
            description: None,
            config_schema: empty_object(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_config_schema(mut self, schema: Value) -> Self {
        self.config_schema = schema;
        self
    }
}

/// Freshly computed payload for one widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetData {
    pub visual_type: String,
    pub data: Value,
}

impl WidgetData {
    pub fn new(visual_type: &str, data: Value) -> Self {
        Self {
            visual_type: visual_type.to_string(),
            data,
        }
    }

    /// Returned for widget ids the module does not know. Callers looping over widgets
    /// never have to handle an error for a stale id.
    pub fn unknown() -> Self {
        Self::new(VISUAL_UNKNOWN, Value::Null)
    }

    pub fn counter(value: i64) -> Self {
        Self::new(VISUAL_COUNTER, serde_json::json!({ "value": value }))
    }
}

/// Reads a non-negative integer parameter given either as a JSON number or a numeric string.
pub fn param_usize(params: &WidgetParams, key: &str) -> Option<usize> {
    match params.get(key)? {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
