use crate::config::parameter;
use crate::error::config_error::ConfigError;
use crate::error::store_error::StoreError;
use sqlx::{PgPool, Pool, Postgres, pool::PoolOptions};
use std::time::Duration;
use tracing::info;

pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    pub async fn init() -> Result<Self, StoreError> {
        let database_url = parameter::get_required("DATABASE_URL")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let max_connections = pool_size("DB_MAX_CONNECTIONS", parameter::get_u64_or("DB_MAX_CONNECTIONS", 20))
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let min_connections = pool_size("DB_MIN_CONNECTIONS", parameter::get_u64_or("DB_MIN_CONNECTIONS", 5))
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let acquire_timeout_seconds = parameter::get_u64_or("DB_ACQUIRE_TIMEOUT_SECONDS", 30);
        let idle_timeout_seconds = parameter::get_u64_or("DB_IDLE_TIMEOUT_SECONDS", 600);
        let max_lifetime_seconds = parameter::get_u64_or("DB_MAX_LIFETIME_SECONDS", 1800);

        let pool = PoolOptions::<Postgres>::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(max_lifetime_seconds))
            .connect(&database_url)
            .await?;

        if crate::config::logging::get_config().allow_detailed_errors() {
            info!(
                "Database pool configured: max={}, min={}, acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
                max_connections, min_connections, acquire_timeout_seconds, idle_timeout_seconds, max_lifetime_seconds
            );
        } else {
            info!("Database pool configured successfully");
        }

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}

fn pool_size(name: &str, value: u64) -> Result<u32, ConfigError> {
    u32::try_from(value).map_err(|_| ConfigError::Invalid {
        name: name.to_string(),
        reason: format!("out of range: {value}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_rejects_values_beyond_u32() {
        assert_eq!(pool_size("DB_MAX_CONNECTIONS", 20).unwrap(), 20);
        assert_eq!(pool_size("DB_MAX_CONNECTIONS", u64::from(u32::MAX)).unwrap(), u32::MAX);

        let err = pool_size("DB_MAX_CONNECTIONS", u64::from(u32::MAX) + 1).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref name, .. } if name == "DB_MAX_CONNECTIONS"));
    }
}
