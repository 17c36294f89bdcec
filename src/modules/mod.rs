//! The module plugin contract.
//!
//! A module owns one data source: it pulls raw activity into the shared event log on
//! [`Module::sync`] and turns committed events into widget payloads on
//! [`Module::get_widget_data`]. Modules are trait objects held by the [`ModuleRegistry`].

pub mod github;
pub mod registry;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::database::DatabasePool;
use crate::models::{WidgetData, WidgetDescriptor, WidgetParams};

pub use github::hpi::HpiError;
pub use registry::{ModuleFactory, ModuleMap, ModuleRegistry, RegistryError};

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("{0}")]
    InvalidConfig(String),

    #[error("Upstream fetch failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    HpiUnavailable(#[from] HpiError),

    #[error("{0}")]
    HpiSource(String),

    #[error("No test implemented for this module")]
    NoConnectionTest,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Rows committed by this pass.
    pub inserted: u64,
    /// Upstream items dropped: missing timestamps or inline source errors.
    pub skipped: usize,
}

/// What every module constructor gets to work with.
#[derive(Clone)]
pub struct ModuleContext {
    pub db_pool: DatabasePool,
    pub config: Arc<Config>,
}

#[async_trait]
pub trait Module: Send + Sync {
    fn id(&self) -> &str;

    /// Fetch new upstream data and commit it as events in one transaction.
    /// Re-running is safe; already seen upstream events may be stored again.
    async fn sync(&self) -> Result<SyncReport, ModuleError>;

    /// Static widget list, stable for a given module version.
    fn get_widgets(&self) -> Vec<WidgetDescriptor>;

    /// Compute one widget. Unknown ids yield [`WidgetData::unknown`], never an error.
    async fn get_widget_data(
        &self,
        widget_id: &str,
        params: &WidgetParams,
    ) -> Result<WidgetData, ModuleError>;

    /// Check a config payload before it is stored.
    fn validate_config(&self, _config: &Value) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Probe the upstream source with the given config without writing anything.
    async fn test_connection(&self, _config: &Value) -> Result<(), ModuleError> {
        Err(ModuleError::NoConnectionTest)
    }
}
