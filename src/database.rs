use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::configuration::DatabaseSettings;

pub fn get_connection_pool(configuration: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    Ok(PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(
            configuration.acquire_timeout,
        ))
        .max_connections(configuration.max_connections)
        .connect_lazy_with(configuration.with_db()?))
}

#[tracing::instrument(name = "Migrate database", skip(config))]
pub async fn run_migrations(config: &DatabaseSettings) -> Result<(), anyhow::Error> {
    let connection_pool = PgPool::connect_with(config.with_db()?).await?;
    sqlx::migrate!("./migrations").run(&connection_pool).await?;
    tracing::info!("Migrations applied successfully");
    Ok(())
}
