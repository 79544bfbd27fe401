use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use tracing::info;

use crate::{config::PoolConfig, content::Movies, error::AppResult, reviews::Reviews};

/// Process-wide store handle. Built once at startup and passed to whatever needs it.
#[derive(Clone, Debug)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub async fn connect(database_url: &str, pool: &PoolConfig) -> AppResult<Self> {
        let mut opts = ConnectOptions::new(database_url.to_string());
        opts.max_connections(pool.max_connections)
            .min_connections(pool.min_connections)
            .idle_timeout(pool.idle_timeout)
            .connect_timeout(pool.connect_timeout)
            .acquire_timeout(pool.acquire_timeout);

        let db = Database::connect(opts).await?;

        if db.get_database_backend() == DatabaseBackend::Sqlite {
            for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
                db.execute(Statement::from_string(DatabaseBackend::Sqlite, pragma.to_string()))
                    .await?;
            }
        }

        Migrator::up(&db, None).await?;
        info!(
            max_connections = pool.max_connections,
            min_connections = pool.min_connections,
            "store connected"
        );

        Ok(Self { db })
    }

    /// In-memory SQLite store on a single connection.
    pub async fn in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:", &PoolConfig::single()).await
    }

    pub fn movies(&self) -> Movies {
        Movies::new(self.db.clone())
    }

    pub fn reviews(&self) -> Reviews {
        Reviews::new(self.db.clone())
    }

    pub async fn close(self) -> AppResult<()> {
        self.db.close().await?;
        info!("store closed");
        Ok(())
    }
}
