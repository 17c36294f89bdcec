// Run one sync pass without the HTTP server.
// Usage: cargo run --bin sync_module -- [--all | <module_id>]

use clap::Parser;
use std::sync::Arc;

use synapsesync::background::scheduler::sync_all;
use synapsesync::{database, AppState, Config};

#[derive(Parser)]
#[command(about = "Sync SynapseSync modules into the event store")]
struct Args {
    /// Module to sync, e.g. "github"
    #[arg(required_unless_present = "all")]
    module_id: Option<String>,

    /// Sync every registered module
    #[arg(long, conflicts_with = "module_id")]
    all: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "synapsesync=info".into()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);
    let db_pool = database::new_pool(&config.database_url).await?;
    let state = AppState::new(db_pool, config);

    if args.all {
        let total = state.registry.load_modules()?.len();
        let succeeded = sync_all(&state.registry).await;
        println!("Synced {}/{} modules", succeeded, total);
        if succeeded < total {
            std::process::exit(1);
        }
        return Ok(());
    }

    let module_id = args.module_id.unwrap_or_default();
    let module = state.registry.get_module(&module_id)?;
    let report = module.sync().await?;
    println!(
        "{}: inserted {} events, skipped {}",
        module_id, report.inserted, report.skipped
    );

    Ok(())
}
