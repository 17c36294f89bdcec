//! Module registry: one-shot loading, lookup and duplicate detection.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use synapsesync::background::scheduler::sync_all;
use synapsesync::models::{WidgetData, WidgetDescriptor, WidgetParams};
use synapsesync::modules::registry::ModuleFactory;
use synapsesync::modules::{
    Module, ModuleContext, ModuleError, ModuleRegistry, RegistryError, SyncReport,
};

use test_helpers::*;

async fn context() -> ModuleContext {
    ModuleContext {
        db_pool: setup_test_db().await,
        config: Arc::new(test_config()),
    }
}

fn counting_factory(counter: Arc<AtomicUsize>) -> ModuleFactory {
    Box::new(move |ctx: &ModuleContext| -> anyhow::Result<Arc<dyn Module>> {
        counter.fetch_add(1, Ordering::SeqCst);
        let module: Arc<dyn Module> = Arc::new(github_module(
            &ctx.db_pool,
            test_config(),
            Arc::new(StubGitHubApi::default()),
            StubExport::Empty,
        ));
        Ok(module)
    })
}

#[tokio::test]
async fn load_modules_runs_factories_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = ModuleRegistry::new(context().await, vec![counting_factory(counter.clone())]);

    let first = registry.load_modules().unwrap() as *const _;
    let second = registry.load_modules().unwrap() as *const _;

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(std::ptr::eq(first, second));
    assert!(registry.get_module("github").is_ok());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_module_is_its_own_error_kind() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = ModuleRegistry::new(context().await, vec![counting_factory(counter)]);

    let err = registry.get_module("gitlab").err().unwrap();

    assert!(matches!(err, ModuleError::UnknownModule(ref id) if id == "gitlab"));
}

#[tokio::test]
async fn duplicate_ids_fail_loading() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = ModuleRegistry::new(
        context().await,
        vec![
            counting_factory(counter.clone()),
            counting_factory(counter.clone()),
        ],
    );

    let err = registry.load_modules().err().unwrap();

    assert!(matches!(err, RegistryError::DuplicateModule(ref id) if id == "github"));
}

#[tokio::test]
async fn failing_constructor_is_reported() {
    let failing: ModuleFactory =
        Box::new(|_ctx: &ModuleContext| -> anyhow::Result<Arc<dyn Module>> {
            anyhow::bail!("no client")
        });
    let registry = ModuleRegistry::new(context().await, vec![failing]);

    let err = registry.load_modules().err().unwrap();

    assert!(matches!(err, RegistryError::Construction(ref m) if m.contains("no client")));
}

#[tokio::test]
async fn builtin_registry_ships_github() {
    let registry = ModuleRegistry::with_builtin_modules(context().await);

    let ids: Vec<_> = registry.load_modules().unwrap().keys().cloned().collect();

    assert_eq!(ids, vec!["github".to_string()]);
}

/// Minimal module that only counts its syncs.
struct TallyModule {
    syncs: Arc<AtomicUsize>,
}

#[async_trait]
impl Module for TallyModule {
    fn id(&self) -> &str {
        "tally"
    }

    async fn sync(&self) -> Result<SyncReport, ModuleError> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(SyncReport::default())
    }

    fn get_widgets(&self) -> Vec<WidgetDescriptor> {
        Vec::new()
    }

    async fn get_widget_data(
        &self,
        _widget_id: &str,
        _params: &WidgetParams,
    ) -> Result<WidgetData, ModuleError> {
        Ok(WidgetData::unknown())
    }
}

#[tokio::test]
async fn sync_all_keeps_going_past_a_failing_module() {
    let ctx = context().await;
    // "github" sorts before "tally", so the failing module runs first.
    let failing: ModuleFactory =
        Box::new(|ctx: &ModuleContext| -> anyhow::Result<Arc<dyn Module>> {
            Ok(Arc::new(github_module(
                &ctx.db_pool,
                test_config(),
                Arc::new(StubGitHubApi::default()),
                StubExport::NotConfigured,
            )))
        });
    let syncs = Arc::new(AtomicUsize::new(0));
    let tally_syncs = syncs.clone();
    let tally: ModuleFactory =
        Box::new(move |_ctx: &ModuleContext| -> anyhow::Result<Arc<dyn Module>> {
            Ok(Arc::new(TallyModule {
                syncs: tally_syncs.clone(),
            }))
        });
    save_github_config(&ctx.db_pool, serde_json::json!({"provider": "hpi"})).await;
    let registry = ModuleRegistry::new(ctx, vec![failing, tally]);

    assert_eq!(sync_all(&registry).await, 1);
    assert_eq!(syncs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sync_all_counts_successful_modules() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = ModuleRegistry::new(context().await, vec![counting_factory(counter)]);

    assert_eq!(sync_all(&registry).await, 1);
}
