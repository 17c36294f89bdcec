//! GitHub activity module.
//!
//! Two providers feed the same event log: the REST API (`provider = "api"`, the default) and a
//! local `ghexport` dump (`provider = "hpi"`). Settings come from the stored module config and
//! fall back to the process-wide credentials in [`Config`].

pub mod client;
pub mod hpi;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, Utc};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::DatabasePool;
use crate::metrics::{commit_streak, STREAK_LOOKBACK_DAYS};
use crate::models::module_config::str_field;
use crate::models::widget::{param_usize, VISUAL_COUNTER, VISUAL_PIE, VISUAL_TIMELINE};
use crate::models::{NewEvent, WidgetData, WidgetDescriptor, WidgetParams};
use crate::modules::{Module, ModuleContext, ModuleError, SyncReport};
use crate::services::{event_store, module_configs};

use client::{GitHubApi, GitHubClient};
use hpi::{GhExportSource, HpiError, LocalEventSource, SourceItem};

pub const MODULE_ID: &str = "github";
pub const EVENTS_PER_SYNC: u32 = 30;
pub const STREAK_EVENT_TYPE: &str = "PushEvent";
const DEFAULT_TIMELINE_LIMIT: usize = 30;
const MAX_TIMELINE_LIMIT: usize = 1000;
const MIN_TOKEN_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Api,
    Hpi,
}

impl FromStr for Provider {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Provider::Api),
            "hpi" => Ok(Provider::Hpi),
            _ => Err(ModuleError::InvalidConfig(
                "github.provider must be 'api' or 'hpi'".to_string(),
            )),
        }
    }
}

/// Effective settings for one sync or test call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub provider: Provider,
    pub username: Option<String>,
    pub token: Option<String>,
    pub hpi_path: Option<PathBuf>,
}

fn provider_of(config: &Value) -> Result<Provider, ModuleError> {
    match str_field(config, "provider") {
        Some(provider) => provider.parse(),
        None => Ok(Provider::Api),
    }
}

/// Stored config first; without a stored username the process-wide credentials apply.
pub fn resolve_settings(
    stored: Option<&Value>,
    defaults: &Config,
) -> Result<ResolvedSettings, ModuleError> {
    let empty = Value::Null;
    let stored = stored.unwrap_or(&empty);

    let provider = provider_of(stored)?;
    let (username, token) = match str_field(stored, "username") {
        Some(username) => (Some(username), str_field(stored, "token")),
        None => (
            defaults.github_username.clone(),
            defaults.github_token.clone(),
        ),
    };
    let hpi_path = str_field(stored, "hpi_path")
        .map(PathBuf::from)
        .or_else(|| defaults.hpi_export_path.clone());

    Ok(ResolvedSettings {
        provider,
        username,
        token,
        hpi_path,
    })
}

/// Turn raw API events into rows. Items without a usable `created_at` are skipped.
pub fn normalize_api_events(username: &str, raw: &[Value]) -> (Vec<NewEvent>, usize) {
    let mut events = Vec::with_capacity(raw.len());
    let mut skipped = 0;

    for item in raw {
        let Some(ts) = item
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        else {
            skipped += 1;
            continue;
        };

        let event_type = item.get("type").and_then(Value::as_str).unwrap_or("event");
        let mut summary = format!("{}: {}", username, event_type);
        if let Some(repo) = item.pointer("/repo/name").and_then(Value::as_str) {
            summary = format!("{} ({})", summary, repo);
        }

        events.push(
            NewEvent::new(ts, MODULE_ID, event_type, summary).with_metadata(item.clone()),
        );
    }

    (events, skipped)
}

/// Row limit for the timeline widget, never above [`MAX_TIMELINE_LIMIT`].
fn timeline_limit(params: &WidgetParams) -> i64 {
    let limit = param_usize(params, "limit")
        .unwrap_or(DEFAULT_TIMELINE_LIMIT)
        .min(MAX_TIMELINE_LIMIT);
    i64::try_from(limit).unwrap_or(MAX_TIMELINE_LIMIT as i64)
}

pub struct GitHubModule {
    db_pool: DatabasePool,
    defaults: Arc<Config>,
    api: Arc<dyn GitHubApi>,
    local_source: Arc<dyn LocalEventSource>,
}

impl GitHubModule {
    pub fn new(
        db_pool: DatabasePool,
        defaults: Arc<Config>,
        api: Arc<dyn GitHubApi>,
        local_source: Arc<dyn LocalEventSource>,
    ) -> Self {
        Self {
            db_pool,
            defaults,
            api,
            local_source,
        }
    }

    pub fn from_context(ctx: &ModuleContext) -> anyhow::Result<Self> {
        let api = GitHubClient::new(&ctx.config.github_api_url)?;
        Ok(Self::new(
            ctx.db_pool.clone(),
            ctx.config.clone(),
            Arc::new(api),
            Arc::new(GhExportSource),
        ))
    }

    async fn settings(&self) -> Result<ResolvedSettings, ModuleError> {
        let stored = module_configs::get_module_config(&self.db_pool, MODULE_ID).await?;
        resolve_settings(stored.as_ref().map(|c| &c.config), &self.defaults)
    }

    async fn read_local(&self, path: Option<PathBuf>) -> Result<Vec<SourceItem>, HpiError> {
        let source = self.local_source.clone();
        tokio::task::spawn_blocking(move || source.read_events(path.as_deref()))
            .await
            .map_err(|e| HpiError::ImportFailed(e.to_string()))?
    }

    async fn sync_hpi(&self, path: Option<PathBuf>) -> Result<SyncReport, ModuleError> {
        let items = match self.read_local(path).await {
            Ok(items) => items,
            Err(HpiError::Empty) => {
                info!(module_id = MODULE_ID, "HPI export has no data, nothing to sync");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut first_error: Option<String> = None;
        let mut skipped = 0;
        let mut events = Vec::new();
        for item in items {
            match item {
                SourceItem::Record(record) => events.push(record.into_event(MODULE_ID)),
                SourceItem::Error(message) => {
                    warn!(module_id = MODULE_ID, error = %message, "HPI record skipped");
                    skipped += 1;
                    first_error.get_or_insert(message);
                }
            }
        }

        if events.is_empty() {
            if let Some(message) = first_error {
                return Err(ModuleError::HpiSource(message));
            }
        }

        let inserted = event_store::insert_events(&self.db_pool, &events).await?;
        Ok(SyncReport { inserted, skipped })
    }

    async fn sync_api(&self, settings: ResolvedSettings) -> Result<SyncReport, ModuleError> {
        let Some(username) = settings.username else {
            info!(module_id = MODULE_ID, "No GitHub username configured, nothing to sync");
            return Ok(SyncReport::default());
        };

        let raw = self
            .api
            .user_events(&username, settings.token.as_deref(), EVENTS_PER_SYNC)
            .await?;
        let (events, skipped) = normalize_api_events(&username, &raw);

        let inserted = event_store::insert_events(&self.db_pool, &events).await?;
        Ok(SyncReport { inserted, skipped })
    }

    async fn recent_activity(&self, params: &WidgetParams) -> Result<WidgetData, ModuleError> {
        let rows =
            event_store::recent_events(&self.db_pool, MODULE_ID, timeline_limit(params)).await?;

        let data: Vec<Value> = rows
            .into_iter()
            .map(|e| {
                json!({
                    "timestamp": e.timestamp.to_rfc3339(),
                    "summary_text": e.summary_text,
                    "event_type": e.event_type,
                })
            })
            .collect();
        Ok(WidgetData::new(VISUAL_TIMELINE, Value::Array(data)))
    }

    async fn events_7d(&self) -> Result<WidgetData, ModuleError> {
        let count = event_store::count_in_window(
            &self.db_pool,
            MODULE_ID,
            Utc::now(),
            Duration::days(7),
        )
        .await?;
        Ok(WidgetData::counter(count))
    }

    async fn streak(&self) -> Result<WidgetData, ModuleError> {
        let now = Local::now();
        let since = now.with_timezone(&Utc) - Duration::days(STREAK_LOOKBACK_DAYS);
        let timestamps =
            event_store::timestamps_since(&self.db_pool, MODULE_ID, STREAK_EVENT_TYPE, since)
                .await?;
        Ok(WidgetData::counter(commit_streak(timestamps, &now) as i64))
    }

    async fn event_types(&self) -> Result<WidgetData, ModuleError> {
        let since = Utc::now() - Duration::days(30);
        let counts = event_store::count_by_type_since(&self.db_pool, MODULE_ID, since).await?;
        let (labels, values): (Vec<String>, Vec<i64>) = counts.into_iter().unzip();
        Ok(WidgetData::new(
            VISUAL_PIE,
            json!({ "labels": labels, "values": values }),
        ))
    }
}

#[async_trait]
impl Module for GitHubModule {
    fn id(&self) -> &str {
        MODULE_ID
    }

    async fn sync(&self) -> Result<SyncReport, ModuleError> {
        let settings = self.settings().await?;
        let report = match settings.provider {
            Provider::Hpi => self.sync_hpi(settings.hpi_path).await?,
            Provider::Api => self.sync_api(settings).await?,
        };
        info!(
            module_id = MODULE_ID,
            inserted = report.inserted,
            skipped = report.skipped,
            "Sync complete"
        );
        Ok(report)
    }

    fn get_widgets(&self) -> Vec<WidgetDescriptor> {
        vec![
            WidgetDescriptor::new("recent_activity", "Recent GitHub activity", VISUAL_TIMELINE)
                .with_config_schema(json!({
                    "limit": { "type": "integer", "default": DEFAULT_TIMELINE_LIMIT }
                })),
            WidgetDescriptor::new("events_7d", "GitHub events (7 days)", VISUAL_COUNTER),
            WidgetDescriptor::new("commit_streak", "Commit streak", VISUAL_COUNTER)
                .with_description("Consecutive days with at least one push"),
            WidgetDescriptor::new("event_types", "GitHub event types (30 days)", VISUAL_PIE),
        ]
    }

    async fn get_widget_data(
        &self,
        widget_id: &str,
        params: &WidgetParams,
    ) -> Result<WidgetData, ModuleError> {
        match widget_id {
            "recent_activity" => self.recent_activity(params).await,
            "events_7d" => self.events_7d().await,
            "commit_streak" => self.streak().await,
            "event_types" => self.event_types().await,
            _ => Ok(WidgetData::unknown()),
        }
    }

    fn validate_config(&self, config: &Value) -> Result<(), ModuleError> {
        if provider_of(config)? == Provider::Hpi {
            return Ok(());
        }

        if str_field(config, "username").is_none() {
            return Err(ModuleError::InvalidConfig(
                "github.username is required".to_string(),
            ));
        }
        if str_field(config, "token").is_some_and(|t| t.len() < MIN_TOKEN_LEN) {
            return Err(ModuleError::InvalidConfig(
                "github.token looks too short".to_string(),
            ));
        }
        Ok(())
    }

    async fn test_connection(&self, config: &Value) -> Result<(), ModuleError> {
        self.validate_config(config)?;

        match provider_of(config)? {
            Provider::Hpi => {
                let path = str_field(config, "hpi_path")
                    .map(PathBuf::from)
                    .or_else(|| self.defaults.hpi_export_path.clone());
                match self.read_local(path).await {
                    Ok(items) => match items.into_iter().next() {
                        Some(SourceItem::Error(message)) => Err(ModuleError::HpiSource(message)),
                        _ => Ok(()),
                    },
                    Err(HpiError::Empty) => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
            Provider::Api => {
                let username = str_field(config, "username").unwrap_or_default();
                let token = str_field(config, "token");
                self.api.check_credentials(&username, token.as_deref()).await
            }
        }
    }
}
