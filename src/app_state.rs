use std::sync::Arc;

use crate::config::Config;
use crate::database::DatabasePool;
use crate::modules::{ModuleContext, ModuleRegistry};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabasePool,
    pub config: Arc<Config>,
    pub registry: Arc<ModuleRegistry>,
}

impl AppState {
    /// State with the modules that ship with the server.
    pub fn new(db_pool: DatabasePool, config: Arc<Config>) -> Self {
        let registry = ModuleRegistry::with_builtin_modules(ModuleContext {
            db_pool: db_pool.clone(),
            config: config.clone(),
        });
        Self::with_registry(db_pool, config, Arc::new(registry))
    }

    pub fn with_registry(
        db_pool: DatabasePool,
        config: Arc<Config>,
        registry: Arc<ModuleRegistry>,
    ) -> Self {
        Self {
            db_pool,
            config,
            registry,
        }
    }
}
