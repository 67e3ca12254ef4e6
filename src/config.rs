//! Service configuration.
//!
//! Defaults are merged under `config.toml`, which in turn is merged under
//! `GREENGRADE_*` environment variables (nested keys split on `__`, e.g.
//! `GREENGRADE_SERVER__PORT=9000`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| panic!("configuration error: {e}"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub database_url: String,
    pub loglevel: String,
    pub cookie: CookieConfig,
    pub admin: AdminConfig,
    /// Escalation address shown when a CAS number is not in the dataset.
    pub contact_email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            dataset: DatasetConfig::default(),
            database_url: "sqlite:data/greengrade.sqlite".to_string(),
            loglevel: "info".to_string(),
            cookie: CookieConfig::default(),
            admin: AdminConfig::default(),
            contact_email: "liwei@scies.org".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("GREENGRADE_").split("__"))
            .extract()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/chemicals.csv"),
        }
    }
}

/// Session cookie settings: name, signing key and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub name: String,
    /// Signing/encryption key material, at least 32 bytes.
    pub key: String,
    pub expiry_days: i64,
    /// Drops the `Secure` attribute for plain-HTTP deployments.
    pub insecure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "greengrade_session".to_string(),
            key: "insecure-dev-signing-key-change-me-0123456789".to_string(),
            expiry_days: 30,
            insecure: false,
        }
    }
}

/// Bootstrap identity for the protected `admin` account. Only consulted
/// when the account does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub display_name: String,
    pub email: String,
    pub initial_password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            display_name: "管理员".to_string(),
            email: "liwei@scies.org".to_string(),
            initial_password: "admin123".to_string(),
        }
    }
}
