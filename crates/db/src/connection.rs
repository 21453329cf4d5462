use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use platzbot_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let timeout_secs = timeout_secs.max(1);
    // Writers wait out the same interval a caller is willing to wait for a
    // pool slot before SQLITE_BUSY surfaces.
    let busy_pragma = format!("PRAGMA busy_timeout = {}", timeout_secs.saturating_mul(1000));

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs))
        .after_connect(move |conn, _meta| {
            let busy_pragma = busy_pragma.clone();
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query(&busy_pragma).execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}
