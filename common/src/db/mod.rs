//! Connection management and the ledger's domain operations.
//!
//! Single-statement operations are generic over an `Executor`, so they run
//! against the pool or inside a caller's transaction unchanged. Operations that
//! need more than one statement take the pool and manage their own transaction.

pub mod query;
pub mod stats;
pub mod transactions;
pub mod trivia;
pub mod users;
pub mod wallets;

use std::{env, str::FromStr, time::Duration};

use dotenv::dotenv;
use sqlx::{
    migrate::Migrator,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{LedgerError, LedgerResult};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_WATCHDOG_INTERVAL_SECS: u64 = 30;

/// TLS modes that never validate the server certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    Disable,
    Allow,
    Prefer,
    Require,
}

impl TlsMode {
    fn to_pg(self) -> PgSslMode {
        match self {
            TlsMode::Disable => PgSslMode::Disable,
            TlsMode::Allow => PgSslMode::Allow,
            TlsMode::Prefer => PgSslMode::Prefer,
            TlsMode::Require => PgSslMode::Require,
        }
    }
}

impl FromStr for TlsMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(TlsMode::Disable),
            "allow" => Ok(TlsMode::Allow),
            "prefer" => Ok(TlsMode::Prefer),
            "require" => Ok(TlsMode::Require),
            "verify-ca" | "verify-full" => Err(LedgerError::Config(format!(
                "DATABASE_SSL_MODE={} validates certificates, which this service does not support",
                s
            ))),
            other => Err(LedgerError::Config(format!(
                "unknown DATABASE_SSL_MODE: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub tls_mode: TlsMode,
    pub acquire_timeout: Duration,
    pub watchdog_interval: Duration,
}

impl DbConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            tls_mode: TlsMode::Prefer,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            watchdog_interval: Duration::from_secs(DEFAULT_WATCHDOG_INTERVAL_SECS),
        }
    }

    pub fn from_env() -> LedgerResult<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LedgerResult<Self> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| LedgerError::Config("DATABASE_URL must be set".to_string()))?;
        let mut config = Self::new(database_url);

        if let Some(value) = lookup("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = lookup("DATABASE_SSL_MODE") {
            config.tls_mode = value.parse()?;
        }
        if let Some(value) = lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            config.acquire_timeout =
                Duration::from_secs(parse_var("DATABASE_ACQUIRE_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = lookup("DATABASE_WATCHDOG_INTERVAL_SECS") {
            config.watchdog_interval =
                Duration::from_secs(parse_var("DATABASE_WATCHDOG_INTERVAL_SECS", &value)?);
        }

        if config.max_connections == 0 {
            return Err(LedgerError::Config(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if config.watchdog_interval.is_zero() {
            return Err(LedgerError::Config(
                "DATABASE_WATCHDOG_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> LedgerResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LedgerError::Config(format!("{} must be a number, got {:?}", key, value)))
}

/// Process-wide connection pool. Create once at startup and call
/// [`Database::close`] on the way out.
pub struct Database {
    pool: PgPool,
    watchdog: Option<JoinHandle<()>>,
}

impl Database {
    pub async fn connect(config: &DbConfig) -> LedgerResult<Self> {
        let options =
            PgConnectOptions::from_str(&config.database_url)?.ssl_mode(config.tls_mode.to_pg());

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        info!(
            max_connections = config.max_connections,
            tls_mode = ?config.tls_mode,
            "Connected to PostgreSQL"
        );

        let watchdog = spawn_watchdog(pool.clone(), config.watchdog_interval);

        Ok(Self {
            pool,
            watchdog: Some(watchdog),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> LedgerResult<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(mut self) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.abort();
        }
        self.pool.close().await;
        info!("Database pool closed");
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.abort();
        }
    }
}

/// Pings the pool on an interval so broken idle connections are reported
/// and recycled. Errors are logged; the process keeps running.
fn spawn_watchdog(pool: PgPool, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if pool.is_closed() {
                break;
            }
            if let Err(e) = sqlx::query("SELECT 1").execute(&pool).await {
                error!(
                    error = %e,
                    idle = pool.num_idle(),
                    size = pool.size(),
                    "Unexpected error on idle connection"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn config_defaults_to_permissive_tls() {
        let config = DbConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/ledger")]))
            .unwrap();

        assert_eq!(config.database_url, "postgres://localhost/ledger");
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.tls_mode, TlsMode::Prefer);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn config_reads_overrides() {
        let config = DbConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/ledger"),
            ("DATABASE_MAX_CONNECTIONS", "3"),
            ("DATABASE_SSL_MODE", "Require"),
            ("DATABASE_WATCHDOG_INTERVAL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 3);
        assert_eq!(config.tls_mode, TlsMode::Require);
        assert_eq!(config.watchdog_interval, Duration::from_secs(60));
    }

    #[test]
    fn config_requires_database_url() {
        let err = DbConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn config_rejects_bad_numbers_and_verifying_tls() {
        assert!(DbConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/ledger"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ]))
        .is_err());
        assert!(DbConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/ledger"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]))
        .is_err());
        assert!(DbConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/ledger"),
            ("DATABASE_SSL_MODE", "verify-full"),
        ]))
        .is_err());
    }
}
