use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::modules::ModuleRegistry;

/// Periodic sync of every registered module. Only started when a cron expression is configured.
pub struct BackgroundScheduler {
    scheduler: JobScheduler,
}

impl BackgroundScheduler {
    pub async fn new(registry: Arc<ModuleRegistry>, cron: &str) -> anyhow::Result<Self> {
        let scheduler = JobScheduler::new().await?;

        scheduler
            .add(Job::new_async(cron, move |_uuid, _l| {
                let registry = registry.clone();
                Box::pin(async move {
                    sync_all(&registry).await;
                })
            })?)
            .await?;

        scheduler.start().await?;
        info!(cron, "Background sync scheduled");

        Ok(Self { scheduler })
    }

    pub async fn shutdown(mut self) {
        if let Err(e) = self.scheduler.shutdown().await {
            error!("Background scheduler shutdown failed: {}", e);
        }
        info!("Background scheduler stopped");
    }
}

/// Sync modules one after another. A failing module is logged and does not stop the rest.
pub async fn sync_all(registry: &ModuleRegistry) -> usize {
    let modules = match registry.load_modules() {
        Ok(modules) => modules,
        Err(e) => {
            error!("Background sync could not load modules: {}", e);
            return 0;
        }
    };

    let mut succeeded = 0;
    for (module_id, module) in modules {
        match module.sync().await {
            Ok(report) => {
                succeeded += 1;
                info!(
                    module_id = %module_id,
                    inserted = report.inserted,
                    "Background sync finished"
                );
            }
            Err(e) => error!(module_id = %module_id, "Background sync failed: {}", e),
        }
    }
    succeeded
}
