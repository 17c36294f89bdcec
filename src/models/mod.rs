//! Shared types: stored events, per-module config, dashboards and widget payloads.
//! Timestamps are chrono instants normalized to UTC before they reach the store.

pub mod dashboard;
pub mod event;
pub mod module_config;
pub mod widget;

pub use dashboard::Dashboard;
pub use event::{Event, NewEvent};
pub use module_config::ModuleConfig;
pub use widget::{WidgetData, WidgetDescriptor, WidgetParams};
