pub mod dashboards;
pub mod event_store;
pub mod module_configs;
