// KidPoint headless shell
// Loads the snapshot, wires the sync reconciler, and runs the periodic
// pull loop until ctrl-c. The real UI shells consume the library the same
// way; this binary is the minimal host.

use anyhow::Result;
use kidpoint::{
    spawn_periodic_pull, DetachedPush, PointsEngine, SqliteStore, SyncReconciler,
    DEFAULT_PULL_INTERVAL,
};
use std::sync::{Arc, Mutex};

const DB_PATH: &str = "kidpoint.db";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let store = SqliteStore::open(DB_PATH)?;
    let engine = PointsEngine::init(store);

    println!("KidPoint v{}", kidpoint::VERSION);
    for account in engine.accounts() {
        println!("  {} - {} points", account.name, account.total_points);
    }

    let settings = engine.settings().clone();
    if settings.is_configured() {
        println!(
            "Syncing with {} every {:?}",
            settings.sheet_url, DEFAULT_PULL_INTERVAL
        );
    } else {
        println!("No sheet configured; running local-only.");
    }
    println!("Family id: {}", settings.family_id);

    let reconciler = Arc::new(SyncReconciler::new(
        settings.sheet_url.clone(),
        settings.family_id.clone(),
    ));
    let engine = Arc::new(Mutex::new(
        engine.with_push_sink(Arc::new(DetachedPush::new(Arc::clone(&reconciler)))),
    ));

    let service = spawn_periodic_pull(Arc::clone(&engine), reconciler, DEFAULT_PULL_INTERVAL);

    tokio::signal::ctrl_c().await?;
    service.shutdown();
    println!("\nSync loop stopped. Local state is saved in {}", DB_PATH);

    Ok(())
}
