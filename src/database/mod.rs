pub mod models;
pub mod queries;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::GovernanceError;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, GovernanceError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| GovernanceError::ConfigError(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| GovernanceError::DatabaseError(format!("Failed to connect: {}", e)))?;

        info!("Connected to database {}", database_url);
        Ok(Database { pool })
    }

    /// Single-connection in-memory database with the schema applied.
    /// The connection is never recycled, otherwise the data would vanish.
    pub async fn new_in_memory() -> Result<Self, GovernanceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                GovernanceError::DatabaseError(format!("Failed to open in-memory db: {}", e))
            })?;

        let database = Database { pool };
        database.run_migrations().await?;
        Ok(database)
    }

    pub async fn run_migrations(&self) -> Result<(), GovernanceError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Schema migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
