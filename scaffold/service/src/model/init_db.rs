//! Connection pool of module_name_example.

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;

/// Environment variable holding the MySQL connection string
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Open the pool every DAO of module_name_example shares
pub async fn init_db(url: &str) -> sqlx::Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await
}

/// Same as [`init_db`], reading the URL from `DATABASE_URL`
pub async fn init_db_from_env() -> sqlx::Result<MySqlPool> {
    let url = std::env::var(DATABASE_URL_ENV)
        .map_err(|e| sqlx::Error::Configuration(Box::new(e)))?;
    init_db(&url).await
}
