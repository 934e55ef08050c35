use bazaar_api::auth;
use bazaar_api::config::AppConfig;
use bazaar_api::db::DatabaseManager;
use bazaar_api::seed;
use bazaar_api::storage::DatabaseStorage;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;

    println!("🌱 Seeding database...");
    let db = DatabaseManager::connect(&config).await?;
    db.run_migrations().await?;

    let storage = DatabaseStorage::new(Arc::new(db));
    auth::ensure_admin_exists(&storage, &config).await?;

    let summary = seed::run(&storage).await?;

    println!(
        "✅ Seeding complete: {} categories created, {} shops created, {} shops updated",
        summary.categories_created, summary.shops_created, summary.shops_updated
    );
    Ok(())
}
