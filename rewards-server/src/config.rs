use std::env;

use common::{
    db::DbConfig,
    utils::Chain,
    LedgerError, LedgerResult,
};
use dotenv::dotenv;

const DEFAULT_SOLANA_RPC: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_ETH_RPC: &str = "https://eth.llamarpc.com";
const DEFAULT_CRONOS_RPC: &str = "https://evm.cronos.org";

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub allowed_origins: Vec<String>,

    pub database: DbConfig,

    // Display-only chain endpoints
    pub solana_rpc: String,
    pub eth_rpc: String,
    pub cronos_rpc: String,
}

impl Config {
    pub fn from_env() -> LedgerResult<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LedgerResult<Self> {
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = match lookup("SERVER_PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|_| LedgerError::Config(format!("SERVER_PORT must be a valid port number, got {:?}", port)))?,
            None => 8080,
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database = DbConfig::from_lookup(&lookup)?;

        Ok(Config {
            server_host,
            server_port,
            allowed_origins,
            database,
            solana_rpc: lookup("SOLANA_RPC").unwrap_or_else(|| DEFAULT_SOLANA_RPC.to_string()),
            eth_rpc: lookup("ETH_RPC").unwrap_or_else(|| DEFAULT_ETH_RPC.to_string()),
            cronos_rpc: lookup("CRONOS_RPC").unwrap_or_else(|| DEFAULT_CRONOS_RPC.to_string()),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn rpc_endpoint(&self, chain: Chain) -> &str {
        match chain {
            Chain::Solana => &self.solana_rpc,
            Chain::Ethereum => &self.eth_rpc,
            Chain::Cronos => &self.cronos_rpc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn defaults_apply_when_only_the_database_is_set() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/neuro")])).unwrap();

        assert_eq!(config.server_address(), "0.0.0.0:8080");
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000".to_string()]);
        assert_eq!(config.rpc_endpoint(Chain::Solana), DEFAULT_SOLANA_RPC);
        assert_eq!(config.database.database_url, "postgres://localhost/neuro");
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/neuro"),
            ("ALLOWED_ORIGINS", "https://a.test, https://b.test,"),
            ("CRONOS_RPC", "https://cronos.test"),
        ]))
        .unwrap();

        assert_eq!(config.allowed_origins, vec!["https://a.test", "https://b.test"]);
        assert_eq!(config.rpc_endpoint(Chain::Cronos), "https://cronos.test");
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/neuro"),
            ("SERVER_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn missing_database_url_is_rejected() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }
}
