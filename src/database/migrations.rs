use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_names_table(pool).await?;
    create_caps_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_names_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS names (
            id INTEGER PRIMARY KEY,
            rsn TEXT UNIQUE NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_caps_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS caps (
            id INTEGER PRIMARY KEY,
            rsn TEXT UNIQUE NOT NULL,
            last_cap_time DATETIME,
            announced_at DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
