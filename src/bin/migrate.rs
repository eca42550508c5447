use clinic_booking_api::db::create_pool;

/// Applies `migrations/` and exits; the server binary does the same on startup.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,clinic_booking_api=debug".into()),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let pool = create_pool(&database_url).await?;

    let migrator = sqlx::migrate!("./migrations");
    migrator.run(&pool).await?;
    tracing::info!(count = migrator.iter().count(), "migrations applied");
    Ok(())
}
