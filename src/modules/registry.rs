use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::github::GitHubModule;
use super::{Module, ModuleContext, ModuleError};

/// Builds one module instance. The registry calls each factory exactly once.
pub type ModuleFactory =
    Box<dyn Fn(&ModuleContext) -> anyhow::Result<Arc<dyn Module>> + Send + Sync>;

/// Module id to instance, iterated in id order.
pub type ModuleMap = BTreeMap<String, Arc<dyn Module>>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Module id {0:?} is registered more than once")]
    DuplicateModule(String),

    #[error("Failed to construct module: {0}")]
    Construction(String),
}

/// Every module that ships with the server.
pub fn builtin_factories() -> Vec<ModuleFactory> {
    let github: ModuleFactory =
        Box::new(|ctx: &ModuleContext| -> anyhow::Result<Arc<dyn Module>> {
            Ok(Arc::new(GitHubModule::from_context(ctx)?))
        });
    vec![github]
}

pub struct ModuleRegistry {
    context: ModuleContext,
    factories: Vec<ModuleFactory>,
    modules: OnceCell<ModuleMap>,
}

impl ModuleRegistry {
    pub fn new(context: ModuleContext, factories: Vec<ModuleFactory>) -> Self {
        Self {
            context,
            factories,
            modules: OnceCell::new(),
        }
    }

    pub fn with_builtin_modules(context: ModuleContext) -> Self {
        Self::new(context, builtin_factories())
    }

    /// Instantiates every module on first call and caches the map for the life of the
    /// registry. Later calls return the same map without running the factories again.
    pub fn load_modules(&self) -> Result<&ModuleMap, RegistryError> {
        self.modules.get_or_try_init(|| {
            let mut modules = ModuleMap::new();
            for factory in &self.factories {
                let module = factory(&self.context)
                    .map_err(|e| RegistryError::Construction(e.to_string()))?;
                let id = module.id().to_string();
                if modules.contains_key(&id) {
                    return Err(RegistryError::DuplicateModule(id));
                }
                info!(module_id = %id, "Module registered");
                modules.insert(id, module);
            }
            Ok(modules)
        })
    }

    pub fn get_module(&self, module_id: &str) -> Result<Arc<dyn Module>, ModuleError> {
        self.load_modules()?
            .get(module_id)
            .cloned()
            .ok_or_else(|| ModuleError::UnknownModule(module_id.to_string()))
    }
}
