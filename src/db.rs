use crate::config::AppConfig;
use crate::error::{ApiError, Result};
use libsql::{Builder, Connection, Database};
use tracing::info;

pub struct DatabaseManager {
    _db: Database,
    conn: Connection,
}

impl DatabaseManager {
    /// Connect to the configured database: remote Turso when LIBSQL_URL and
    /// LIBSQL_AUTH_TOKEN are set, otherwise a local SQLite file (or ":memory:").
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let db = match (&config.libsql_url, &config.libsql_auth_token) {
            (Some(url), Some(token)) => {
                info!("Connecting to Turso database at {}", url);
                Builder::new_remote(url.clone(), token.clone())
                    .build()
                    .await
                    .map_err(|e| ApiError::Database {
                        message: format!("Failed to connect to database: {e}"),
                    })?
            }
            _ => {
                info!("Opening local database at {}", config.database_url);
                Builder::new_local(&config.database_url)
                    .build()
                    .await
                    .map_err(|e| ApiError::Database {
                        message: format!("Failed to open database: {e}"),
                    })?
            }
        };

        // One underlying connection, cloned per use. Keeps ":memory:"
        // databases coherent and carries the migration pragmas everywhere.
        let conn = db.connect().map_err(|e| ApiError::Database {
            message: format!("Failed to get database connection: {e}"),
        })?;

        Ok(Self { _db: db, conn })
    }

    /// Get a connection to the database.
    pub fn connection(&self) -> Connection {
        self.conn.clone()
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.connection();

        for migration_sql in [
            include_str!("../migrations/001_create_tables.sql"),
            include_str!("../migrations/002_indexes_and_pragmas.sql"),
        ] {
            conn.execute_batch(migration_sql)
                .await
                .map_err(|e| ApiError::Database {
                    message: format!("Failed to run migrations: {e}"),
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }
}
