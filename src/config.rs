use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("unknown store kind {0:?}, expected \"sqlite\" or \"mongodb\"")]
    UnknownStore(String),
    #[error("MONGODB_URI is required when LEDGER_STORE=mongodb")]
    MissingMongoUri,
    #[error("invalid LEDGER_BIND address {0:?}")]
    InvalidBind(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreConfig {
    Sqlite { path: PathBuf },
    Mongo { uri: String, database: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub store: StoreConfig,
    pub bind: SocketAddr,
}

impl Config {
    pub const DEFAULT_SQLITE_PATH: &'static str = "pay.db";
    pub const DEFAULT_DATABASE: &'static str = "PayLedger";
    pub const DEFAULT_BIND: &'static str = "0.0.0.0:8787";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let store = match get("LEDGER_STORE", "sqlite").trim().to_ascii_lowercase().as_str() {
            "sqlite" => StoreConfig::Sqlite {
                path: PathBuf::from(get("LEDGER_SQLITE_PATH", Self::DEFAULT_SQLITE_PATH)),
            },
            "mongodb" | "mongo" => StoreConfig::Mongo {
                uri: lookup("MONGODB_URI")
                    .filter(|uri| !uri.trim().is_empty())
                    .ok_or(ConfigError::MissingMongoUri)?,
                database: get("LEDGER_MONGODB_DATABASE", Self::DEFAULT_DATABASE),
            },
            other => return Err(ConfigError::UnknownStore(other.to_string())),
        };

        let bind = get("LEDGER_BIND", Self::DEFAULT_BIND);
        let bind = bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind.clone()))?;

        Ok(Self { store, bind })
    }
}
