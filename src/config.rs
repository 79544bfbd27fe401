use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub site_url: String,
    pub revalidate_rps: u32,
    pub pool: PoolConfig,
}

/// Connection pool bounds for the store.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    /// How long a query waits for a free pooled connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 5,
            idle_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            acquire_timeout: Duration::from_secs(45),
        }
    }
}

impl PoolConfig {
    /// A single long-lived connection, required for `sqlite::memory:` where
    /// every connection sees its own database.
    pub fn single() -> Self {
        Self { max_connections: 1, min_connections: 1, ..Self::default() }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("DATABASE_URL must be set")?;

        let site_url = std::env::var("SITE_URL")
            .unwrap_or_else(|_| "https://slowcinemaclub.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let revalidate_rps: u32 =
            std::env::var("REVALIDATE_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(5);

        let defaults = PoolConfig::default();
        let max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_connections);
        let min_connections: u32 = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.min_connections)
            .min(max_connections);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            site_url,
            revalidate_rps,
            pool: PoolConfig { max_connections, min_connections, ..defaults },
        })
    }
}
