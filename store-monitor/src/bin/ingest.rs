//! 导入 CSV 数据: timezones → business hours → status polls
//!
//! ```text
//! DATA_DIR=./store-monitoring-data cargo run --bin ingest
//! ```

use anyhow::Context;
use store_monitor::db::DbService;
use store_monitor::{run_full_ingestion, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = setup_environment();
    config.validate()?;
    config
        .ensure_work_dir_structure()
        .context("Failed to create work directory structure")?;

    let db = DbService::new(&config.database_path).await?;

    tracing::info!(database = %config.database_path, "Starting ingestion");
    let summary = run_full_ingestion(&db.pool, &config)
        .await
        .context("Ingestion failed")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.reference_time.is_none() {
        anyhow::bail!("No valid status polls ingested; reference time was not set");
    }
    Ok(())
}
